//! Telemetry and tracing utilities
//!
//! Subscriber setup for the relay binary. Library code only emits `tracing`
//! events (targets `chat_relay::http` and `chat_relay::stream`); installing a
//! subscriber is left to the application.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chat_relay::telemetry::{OutputFormat, SubscriberConfig, init_subscriber};
//!
//! # fn main() -> Result<(), chat_relay::telemetry::TelemetryError> {
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const ENV_LOG_LEVEL: &str = "CHAT_RELAY_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "CHAT_RELAY_LOG_FORMAT";
pub const ENV_LOG_FILE: &str = "CHAT_RELAY_LOG_FILE";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log level: {0}. Valid options: trace, debug, info, warn, error")]
    InvalidLevel(String),
    #[error("Invalid log format: {0}. Valid options: text, json, json-compact")]
    InvalidFormat(String),
    #[error("Invalid log file path: {0}")]
    InvalidLogFile(String),
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    Json,
    /// Single-line JSON
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(TelemetryError::InvalidFormat(s.to_string())),
        }
    }
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Read `CHAT_RELAY_LOG_*` through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TelemetryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();
        if let Some(level) = get(ENV_LOG_LEVEL) {
            builder = builder.log_level_str(&level)?;
        }
        if let Some(format) = get(ENV_LOG_FORMAT) {
            builder = builder.output_format(format.parse()?);
        }
        if let Some(path) = get(ENV_LOG_FILE) {
            builder = builder.log_file(PathBuf::from(path));
        }
        Ok(builder.build())
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, TelemetryError> {
        let parsed = match level.trim().to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => return Err(TelemetryError::InvalidLevel(level.to_string())),
        };
        self.log_level = Some(parsed);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            log_file: self.log_file,
        }
    }
}

fn level_str(level: tracing::Level) -> &'static str {
    match level {
        tracing::Level::TRACE => "trace",
        tracing::Level::DEBUG => "debug",
        tracing::Level::INFO => "info",
        tracing::Level::WARN => "warn",
        tracing::Level::ERROR => "error",
    }
}

/// Directives for the env filter: the crate at the configured level, HTTP
/// internals kept quiet.
pub fn filter_directives(level: tracing::Level) -> String {
    let level = level_str(level);
    format!("chat_relay={level},tower_http=warn,hyper=warn,reqwest=warn")
}

fn file_writer(path: &std::path::Path) -> Result<(BoxMakeWriter, WorkerGuard), TelemetryError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| TelemetryError::InvalidLogFile(path.display().to_string()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((BoxMakeWriter::new(writer), guard))
}

/// Initialize tracing subscriber with the given configuration
///
/// Returns the appender guard when logging to a file; keep it alive for the
/// lifetime of the program or buffered lines are lost. Calling this when a
/// global subscriber is already installed is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, TelemetryError> {
    let filter = filter_directives(config.log_level);
    let (writer, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (writer, Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };
    let ansi = config.log_file.is_none();

    let init_result = match config.output_format {
        OutputFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .json()
            .flatten_event(true)
            .try_init(),
        OutputFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) if e.to_string().contains("already been set") => Ok(None),
        Err(e) => Err(TelemetryError::Init(e.to_string())),
    }
}

/// Initialize from `CHAT_RELAY_LOG_LEVEL`, `CHAT_RELAY_LOG_FORMAT` and
/// `CHAT_RELAY_LOG_FILE`.
pub fn init_from_env() -> Result<Option<WorkerGuard>, TelemetryError> {
    init_subscriber(SubscriberConfig::from_lookup(|var| std::env::var(var).ok())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_parses_all_settings() {
        let config = SubscriberConfig::from_lookup(|var| match var {
            ENV_LOG_LEVEL => Some("DEBUG".into()),
            ENV_LOG_FORMAT => Some("json-compact".into()),
            ENV_LOG_FILE => Some("/tmp/relay.log".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/relay.log")));
    }

    #[test]
    fn unset_values_use_defaults() {
        assert_eq!(
            SubscriberConfig::from_lookup(|_| None).unwrap(),
            SubscriberConfig::default()
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            SubscriberConfig::builder().log_level_str("loud"),
            Err(TelemetryError::InvalidLevel(_))
        ));
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(TelemetryError::InvalidFormat(_))
        ));
    }

    #[test]
    fn filter_targets_the_crate() {
        assert!(filter_directives(tracing::Level::WARN).starts_with("chat_relay=warn"));
    }
}
