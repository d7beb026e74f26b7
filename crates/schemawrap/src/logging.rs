//! Subscriber setup for the `tracing` events emitted by schemawrap.
//!
//! The engine and top-level crates only emit events: schema construction
//! at `debug`, each load/validate outcome at `debug`, and container
//! wrapping and undeclared keys at `trace`. Nothing is printed until the
//! application installs a subscriber, either its own or the one from
//! [`init_logging`], called once at startup:
//!
//! ```
//! use schemawrap::logging::{init_logging, LogFormat, LogLevel};
//!
//! let level: LogLevel = "debug".parse().unwrap_or(LogLevel::Info);
//! init_logging(LogFormat::Json, level);
//! ```

use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> tracing::level_filters::LevelFilter {
        match self {
            LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
            LogLevel::Warn => tracing::level_filters::LevelFilter::WARN,
            LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
            LogLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported log format: {other}")),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("unsupported log level: {other}")),
        }
    }
}

/// Install a global stderr subscriber.
///
/// Returns `true` when this call installed it. Once any global subscriber
/// is set (by an earlier call or by the application), later calls change
/// nothing and return `false`.
pub fn init_logging(format: LogFormat, level: LogLevel) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };
    if installed {
        tracing::debug!(?format, ?level, "schemawrap logging initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats_and_levels() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" Text ".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn only_the_first_init_installs() {
        // Another test may already have installed the subscriber.
        let _ = init_logging(LogFormat::Text, LogLevel::Trace);
        assert!(!init_logging(LogFormat::Json, LogLevel::Error));
    }

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(
            LogLevel::Warn.as_filter(),
            tracing::level_filters::LevelFilter::WARN
        );
        assert!(LogLevel::Trace.as_filter() > LogLevel::Error.as_filter());
    }
}
