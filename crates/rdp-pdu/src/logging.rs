//! Leveled diagnostics handle
//!
//! Components that emit diagnostics are handed a [`Logger`] at construction
//! instead of reading a process-wide level. The handle wraps a `tracing`
//! dispatcher; work run through [`Logger::scope`] reports to it.

use std::fmt;
use std::str::FromStr;
use tracing::{Dispatch, Level};
use tracing_subscriber::FmtSubscriber;

/// Minimum level a [`Logger`] lets through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub fn as_tracing(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// Explicit logger handle
#[derive(Clone)]
pub struct Logger {
    level: Option<LogLevel>,
    dispatch: Dispatch,
}

impl Logger {
    /// Logger writing formatted events at `level` and above to stderr
    pub fn new(level: LogLevel) -> Self {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level.as_tracing())
            .with_writer(std::io::stderr)
            .finish();
        Self {
            level: Some(level),
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Logger that drops every event
    pub fn disabled() -> Self {
        Self {
            level: None,
            dispatch: Dispatch::none(),
        }
    }

    /// Wrap an existing dispatcher, e.g. one shared with the host application
    pub fn from_dispatch(dispatch: Dispatch, level: LogLevel) -> Self {
        Self {
            level: Some(level),
            dispatch,
        }
    }

    pub fn level(&self) -> Option<LogLevel> {
        self.level
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.level.is_some_and(|min| level >= min)
    }

    /// Run `f` with this logger as the current dispatcher
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("level", &self.level).finish()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}
