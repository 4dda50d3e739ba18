//! Runner configuration loaded from environment variables.

use std::str::FromStr;

use domain::DEFAULT_DEFECT_RATE_THRESHOLD;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Runner configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DEFECT_RATE_THRESHOLD`: alert threshold for orders created without
///   one (default: `0.10`)
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_format: LogFormat,
    pub default_defect_rate_threshold: f64,

    /// Variables that were set but could not be parsed, with their raw
    /// values. Logged once tracing is up.
    pub ignored: Vec<(&'static str, String)>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(level) = lookup("RUST_LOG") {
            config.log_level = level;
        }

        if let Some(raw) = lookup("LOG_FORMAT") {
            match raw.parse::<LogFormat>() {
                Ok(format) => config.log_format = format,
                Err(_) => config.ignored.push(("LOG_FORMAT", raw)),
            }
        }

        if let Some(raw) = lookup("DEFECT_RATE_THRESHOLD") {
            match raw.trim().parse::<f64>() {
                Ok(threshold) if (0.0..=1.0).contains(&threshold) => {
                    config.default_defect_rate_threshold = threshold;
                }
                _ => config.ignored.push(("DEFECT_RATE_THRESHOLD", raw)),
            }
        }

        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            default_defect_rate_threshold: DEFAULT_DEFECT_RATE_THRESHOLD,
            ignored: Vec::new(),
        }
    }
}
