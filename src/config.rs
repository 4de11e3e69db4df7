use log::LevelFilter;

/// Fixed job table capacity.
pub const MAX_JOBS: usize = 5;

/// Longest command text kept for display, in bytes.
pub const COMMAND_TEXT_MAX: usize = 80;

/// Number of input lines remembered by `history`.
pub const MAX_HISTORY: usize = 80;

/// Seconds until the fork-bomb alarm fires when nothing overrides it.
pub const DEFAULT_ALARM_SECS: u32 = 120;

pub const ALARM_ENV: &str = "MINISH_ALARM_SECS";
pub const LOG_ENV: &str = "MINISH_LOG";

/// Process-wide settings, resolved once at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellConfig {
    /// Wall-clock self-termination alarm; `0` disables it.
    pub alarm_secs: u32,
    pub log_level: LevelFilter,
    /// Print the prompt only when stdin is a terminal.
    pub interactive: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            alarm_secs: DEFAULT_ALARM_SECS,
            log_level: LevelFilter::Off,
            interactive: false,
        }
    }
}

impl ShellConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), stdin_is_terminal())
    }

    /// Build a config from an arbitrary variable lookup. Unparseable values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, interactive: bool) -> Self {
        let defaults = Self::default();

        let alarm_secs = lookup(ALARM_ENV)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults.alarm_secs);

        let log_level = lookup(LOG_ENV)
            .and_then(|v| v.trim().parse::<LevelFilter>().ok())
            .unwrap_or(defaults.log_level);

        Self {
            alarm_secs,
            log_level,
            interactive,
        }
    }
}

fn stdin_is_terminal() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
}

/// Truncate `text` to at most [`COMMAND_TEXT_MAX`] bytes without splitting a
/// character.
pub fn bounded_command_text(text: &str) -> String {
    if text.len() <= COMMAND_TEXT_MAX {
        return text.to_string();
    }
    let mut end = COMMAND_TEXT_MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = ShellConfig::from_lookup(lookup_from(&[]), false);
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.alarm_secs, 120);
    }

    #[test]
    fn environment_overrides() {
        let config = ShellConfig::from_lookup(
            lookup_from(&[(ALARM_ENV, "30"), (LOG_ENV, "debug")]),
            true,
        );
        assert_eq!(config.alarm_secs, 30);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert!(config.interactive);
    }

    #[test]
    fn garbage_values_fall_back() {
        let config = ShellConfig::from_lookup(
            lookup_from(&[(ALARM_ENV, "soon"), (LOG_ENV, "loud")]),
            false,
        );
        assert_eq!(config.alarm_secs, DEFAULT_ALARM_SECS);
        assert_eq!(config.log_level, LevelFilter::Off);
    }

    #[test]
    fn command_text_is_bounded() {
        assert_eq!(bounded_command_text("sleep 5"), "sleep 5");
        let long = "x".repeat(200);
        assert_eq!(bounded_command_text(&long).len(), COMMAND_TEXT_MAX);
        // 'é' is two bytes; never cut one in half.
        let accented = "é".repeat(60);
        let bounded = bounded_command_text(&accented);
        assert!(bounded.len() <= COMMAND_TEXT_MAX);
        assert!(bounded.chars().all(|c| c == 'é'));
    }
}
