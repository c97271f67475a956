//! `tracing` subscriber setup.
//!
//! Library code only emits events through the `tracing` macros; binaries call
//! [`init_logging`] once at startup. `RUST_LOG` overrides the configured level.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Minimum level of events that reach the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Logging configuration for the exporter binaries.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Include the event target (module path) in each line.
    pub with_target: bool,
    /// Emit ANSI colour codes.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_target: false,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.ansi = enable;
        self
    }

    /// Verbose configuration used by `-v`.
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            with_target: true,
            ansi: true,
        }
    }
}

/// Install the global subscriber. Logs go to stderr so that stdout stays
/// free for command output.
///
/// Calling this more than once is harmless: later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_tracing_level().as_str()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.with_target)
        .with_ansi(config.ansi);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
