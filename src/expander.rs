use crate::ast::{ParsedLine, Pipeline, Stage};
use crate::parser::{Word, WordSegment};

/// Expand every stage of a parsed line into program + argument strings.
///
/// A stage whose words all expand to nothing (e.g. a lone unset `$VAR`) is an
/// error, since there is no program to run.
pub fn expand_line(line: &ParsedLine, last_status: i32) -> Result<Pipeline, String> {
    let mut stages = Vec::with_capacity(line.stages.len());

    for raw in &line.stages {
        let mut argv = expand_words(&raw.words, last_status).into_iter();
        let Some(program) = argv.next() else {
            return Err(format!("mini-shell: {}: empty command", raw.text));
        };
        stages.push(Stage {
            program,
            args: argv.collect(),
            text: raw.text.clone(),
        });
    }

    Ok(Pipeline {
        stages,
        background: line.background,
        text: line.text.clone(),
    })
}

/// Expand a list of parsed words into final argument strings.
pub fn expand_words(words: &[Word], last_status: i32) -> Vec<String> {
    words
        .iter()
        .flat_map(|word| expand_word(word, last_status))
        .collect()
}

/// Expand a single word (which may have mixed quoting) into zero or more
/// strings. An unquoted word that expands to nothing disappears.
fn expand_word(segments: &[WordSegment], last_status: i32) -> Vec<String> {
    let mut combined = String::new();
    let mut is_globbable = false;
    let mut quoted = false;

    for segment in segments {
        match segment {
            WordSegment::SingleQuoted(text) => {
                quoted = true;
                combined.push_str(text);
            }
            WordSegment::DoubleQuoted(text) => {
                quoted = true;
                combined.push_str(&expand_variables(text, last_status));
            }
            WordSegment::Unquoted(text) => {
                let expanded = expand_tilde(text);
                let expanded = expand_variables(&expanded, last_status);
                if contains_glob_chars(&expanded) {
                    is_globbable = true;
                }
                combined.push_str(&expanded);
            }
        }
    }

    if is_globbable {
        expand_globs(&combined)
    } else if combined.is_empty() && !quoted {
        Vec::new()
    } else {
        vec![combined]
    }
}

// ── Tilde Expansion ──

fn expand_tilde(token: &str) -> String {
    if token == "~" {
        return home_dir();
    }
    match token.strip_prefix("~/") {
        Some(rest) => format!("{}/{rest}", home_dir()),
        // ~username is left alone
        None => token.to_string(),
    }
}

fn home_dir() -> String {
    std::env::var("HOME").unwrap_or_else(|_| "~".to_string())
}

// ── Variable Expansion ──

fn expand_variables(input: &str, last_status: i32) -> String {
    let mut result = String::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        match chars.peek() {
            Some(&'?') => {
                chars.next();
                result.push_str(&last_status.to_string());
            }
            Some(&'$') => {
                chars.next();
                result.push_str(&std::process::id().to_string());
            }
            Some(&'0') => {
                chars.next();
                result.push_str("mini-shell");
            }
            Some(&'{') => {
                chars.next();
                let name: String = chars.by_ref().take_while(|c| *c != '}').collect();
                if name.is_empty() {
                    result.push_str("${}");
                } else {
                    result.push_str(&std::env::var(&name).unwrap_or_default());
                }
            }
            Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                result.push_str(&std::env::var(&name).unwrap_or_default());
            }
            // Trailing `$` or `$` before a non-name character stays literal.
            _ => result.push('$'),
        }
    }

    result
}

// ── Glob Expansion ──

fn contains_glob_chars(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

fn expand_globs(pattern: &str) -> Vec<String> {
    let Ok(paths) = glob::glob(pattern) else {
        return vec![pattern.to_string()];
    };

    let mut matches: Vec<String> = paths
        .filter_map(|entry| entry.ok())
        .map(|path| path.to_string_lossy().into_owned())
        .collect();

    if matches.is_empty() {
        // No matches: keep the pattern literal
        return vec![pattern.to_string()];
    }
    matches.sort();
    matches
}
