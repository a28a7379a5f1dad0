use std::env;
use tracing::warn;

pub const DEFAULT_PROMPT: &str = "osh> ";

/// Longest accepted input line, not counting the line terminator.
pub const DEFAULT_MAX_LINE: usize = 80;

/// Interpreter settings. Built from defaults, then overridden by
/// `OSH_PROMPT`, `OSH_MAX_LINE` and `NO_COLOR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    pub max_line: usize,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prompt: String::from(DEFAULT_PROMPT),
            max_line: DEFAULT_MAX_LINE,
            color: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config::from_vars(|key| env::var(key).ok())
    }

    fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(prompt) = lookup("OSH_PROMPT") {
            config.prompt = prompt;
        }
        if let Some(raw) = lookup("OSH_MAX_LINE") {
            match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => config.max_line = limit,
                _ => warn!(value = %raw, "ignoring invalid OSH_MAX_LINE"),
            }
        }
        // https://no-color.org: any non-empty value disables colour
        if lookup("NO_COLOR").map_or(false, |v| !v.is_empty()) {
            config.color = false;
        }
        config
    }
}
