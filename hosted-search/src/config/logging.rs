//! Log output format selection.

use std::env;
use std::str::FromStr;

use crate::AppError;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    Json,

    /// Multi-line human readable output.
    #[default]
    Pretty,
}

impl LogFormat {
    /// Read the format from `LOG_FORMAT` ("json" or "pretty", default: pretty).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the format from an arbitrary variable lookup.
    ///
    /// Runs before the subscriber exists, so an unknown value is a
    /// configuration error rather than a logged fallback.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("LOG_FORMAT").filter(|value| !value.trim().is_empty()) {
            Some(value) => value.parse(),
            None => Ok(Self::default()),
        }
    }
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "console" => Ok(Self::Pretty),
            other => Err(AppError::config(format!(
                "Invalid LOG_FORMAT '{}', expected 'json' or 'pretty'",
                other
            ))),
        }
    }
}
