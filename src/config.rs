use crate::error::LogError;
use crate::sink::Stream;
use serde::Serialize;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Environment variable holding the verbosity threshold.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Log severity. A higher rank is more verbose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error = 0,
    Warn = 1,
    #[default]
    Info = 2,
    Debug = 3,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Severity::Error, Severity::Warn, Severity::Info, Severity::Debug];

    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Name as it appears in the `level` field of a record.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }

    /// ERROR goes to stderr, everything else to stdout.
    pub fn stream(self) -> Stream {
        match self {
            Severity::Error => Stream::Stderr,
            _ => Stream::Stdout,
        }
    }

    /// Lenient parse used for configuration: anything unrecognized is INFO.
    pub fn resolve(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warn" => Ok(Severity::Warn),
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            _ => Err(LogError::UnknownLevel { value: s.to_string() }),
        }
    }
}

/// Snapshot of logger configuration, resolved once per `Logger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoggerConfig {
    pub level: Severity,
}

impl LoggerConfig {
    pub fn with_level(level: Severity) -> Self {
        Self { level }
    }

    /// Reads `LOG_LEVEL` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves the config through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup(LOG_LEVEL_ENV);
        Self {
            level: Severity::resolve(raw.as_deref()),
        }
    }
}
