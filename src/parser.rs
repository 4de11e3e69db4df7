use crate::ast::{ParsedLine, RawStage};

/// A segment of a word, tagged with its quote context.
/// The expander uses this to decide what expansions to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum WordSegment {
    /// Unquoted text — all expansions apply (tilde, variable, glob)
    Unquoted(String),
    /// Double-quoted text — variable expansion only
    DoubleQuoted(String),
    /// Single-quoted or backslash-escaped text — literal
    SingleQuoted(String),
}

/// A single word (argument) made up of one or more segments.
/// Mixed quoting like `he"llo"'world'` produces multiple segments in one word.
pub type Word = Vec<WordSegment>;

/// States for the tokenizer state machine.
enum State {
    /// Between tokens — whitespace is skipped
    Normal,
    /// Building an unquoted word — whitespace or `|` ends it
    InWord,
    /// Inside double quotes — whitespace and `|` are preserved
    InDoubleQuote,
    /// Inside single quotes — everything is literal
    InSingleQuote,
}

/// Accumulates words and stages while the state machine runs.
struct Builder<'a> {
    input: &'a str,
    stages: Vec<RawStage>,
    words: Vec<Word>,
    word: Word,
    segment: String,
    stage_start: usize,
}

impl<'a> Builder<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            stages: Vec::new(),
            words: Vec::new(),
            word: Vec::new(),
            segment: String::new(),
            stage_start: 0,
        }
    }

    fn flush_unquoted(&mut self) {
        if !self.segment.is_empty() {
            self.word
                .push(WordSegment::Unquoted(std::mem::take(&mut self.segment)));
        }
    }

    fn finish_word(&mut self) {
        self.flush_unquoted();
        if !self.word.is_empty() {
            self.words.push(std::mem::take(&mut self.word));
        }
    }

    /// Close the stage that ends at byte offset `end`.
    fn finish_stage(&mut self, end: usize) {
        self.finish_word();
        self.stages.push(RawStage {
            words: std::mem::take(&mut self.words),
            text: self.input[self.stage_start..end].trim().to_string(),
        });
        self.stage_start = end + 1;
    }

    fn push_escaped(&mut self, next: Option<char>) {
        self.flush_unquoted();
        let literal = next.map_or_else(|| "\\".to_string(), |c| c.to_string());
        self.word.push(WordSegment::SingleQuoted(literal));
    }
}

/// Split `input` into pipeline stages of quote-aware words.
///
/// An unquoted `|` ends a stage. Unterminated quotes keep their context up to
/// the end of the input.
pub fn split_stages(input: &str) -> Vec<RawStage> {
    let mut b = Builder::new(input);
    let mut state = State::Normal;
    let mut chars = input.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match (&state, ch) {
            // ── Normal state: between tokens ──
            (State::Normal, ' ' | '\t') => {}
            (State::Normal | State::InWord, '|') => {
                b.finish_stage(pos);
                state = State::Normal;
            }
            (State::Normal, '"') => state = State::InDoubleQuote,
            (State::Normal, '\'') => state = State::InSingleQuote,
            (State::Normal, '\\') => {
                // Escaped char is literal, so the expander leaves it alone
                b.push_escaped(chars.next().map(|(_, c)| c));
                state = State::InWord;
            }
            (State::Normal, c) => {
                b.segment.push(c);
                state = State::InWord;
            }

            // ── InWord state: building an unquoted token ──
            (State::InWord, ' ' | '\t') => {
                b.finish_word();
                state = State::Normal;
            }
            (State::InWord, '"') => {
                b.flush_unquoted();
                state = State::InDoubleQuote;
            }
            (State::InWord, '\'') => {
                b.flush_unquoted();
                state = State::InSingleQuote;
            }
            (State::InWord, '\\') => b.push_escaped(chars.next().map(|(_, c)| c)),
            (State::InWord, c) => b.segment.push(c),

            // ── InDoubleQuote state: inside "..." ──
            (State::InDoubleQuote, '"') => {
                // "" is a valid empty argument
                b.word
                    .push(WordSegment::DoubleQuoted(std::mem::take(&mut b.segment)));
                state = State::InWord;
            }
            (State::InDoubleQuote, '\\') => match chars.peek() {
                Some(&(_, next @ ('"' | '\\' | '$' | '`'))) => {
                    chars.next();
                    b.segment.push(next);
                }
                _ => b.segment.push('\\'),
            },
            (State::InDoubleQuote, c) => b.segment.push(c),

            // ── InSingleQuote state: inside '...' ──
            (State::InSingleQuote, '\'') => {
                b.word
                    .push(WordSegment::SingleQuoted(std::mem::take(&mut b.segment)));
                state = State::InWord;
            }
            (State::InSingleQuote, c) => b.segment.push(c),
        }
    }

    // Flush whatever the input ended inside of.
    match state {
        State::InDoubleQuote if !b.segment.is_empty() => {
            let text = std::mem::take(&mut b.segment);
            b.word.push(WordSegment::DoubleQuoted(text));
        }
        State::InSingleQuote if !b.segment.is_empty() => {
            let text = std::mem::take(&mut b.segment);
            b.word.push(WordSegment::SingleQuoted(text));
        }
        _ => {}
    }
    b.finish_stage(input.len());

    b.stages
}

/// Whether the last non-blank character of `input` is an `&` that is neither
/// quoted nor escaped. Quote rules match [`split_stages`].
fn ends_with_background_marker(input: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut marker = false;

    for ch in input.chars() {
        if escaped {
            escaped = false;
            marker = false;
            continue;
        }
        match (quote, ch) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => {}
            (Some(_), '\\') => escaped = true,
            (Some(_), '"') => quote = None,
            (Some(_), _) => {}
            (None, '\\') => escaped = true,
            (None, '\'' | '"') => quote = Some(ch),
            (None, '&') => {
                marker = true;
                continue;
            }
            (None, ' ' | '\t') => continue,
            (None, _) => {}
        }
        marker = false;
    }

    quote.is_none() && marker
}

/// Tokenize one input line.
///
/// Returns `Ok(None)` for a blank line. A trailing unquoted `&` marks the line
/// as a background request and is stripped, together with the whitespace
/// before it, from the command text.
pub fn parse_line(input: &str) -> Result<Option<ParsedLine>, String> {
    let mut text = input.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let background = ends_with_background_marker(text);
    if background {
        text = text.strip_suffix('&').unwrap_or(text).trim_end();
        if text.is_empty() {
            return Err("mini-shell: syntax error near unexpected token `&'".to_string());
        }
    }

    let stages = split_stages(text);
    if stages.iter().any(|stage| stage.words.is_empty()) {
        return Err("mini-shell: syntax error near unexpected token `|'".to_string());
    }

    Ok(Some(ParsedLine {
        stages,
        background,
        text: text.to_string(),
    }))
}

/// Flatten words into plain strings, discarding quote context.
#[cfg(test)]
pub fn words_to_strings(words: &[Word]) -> Vec<String> {
    words
        .iter()
        .map(|word| {
            word.iter()
                .map(|seg| match seg {
                    WordSegment::Unquoted(s)
                    | WordSegment::DoubleQuoted(s)
                    | WordSegment::SingleQuoted(s) => s.as_str(),
                })
                .collect()
        })
        .collect()
}
