/// Structured logging for the river monitoring core
///
/// Provides context-rich logging tagged with the emitting component and the
/// sensor/alert id it concerns. Events go through `tracing`; `init_logger`
/// installs a `tracing-subscriber` formatter on the console and, for daemon
/// operation, an append-only log file.

use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{EnvFilter, Layer, fmt as tracing_fmt, prelude::*};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Simulation,
    Alerts,
    Notifier,
    Scheduler,
    Session,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Simulation => write!(f, "SIM"),
            Component::Alerts => write!(f, "ALERT"),
            Component::Notifier => write!(f, "NOTIFY"),
            Component::Scheduler => write!(f, "SCHED"),
            Component::Session => write!(f, "SESSION"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Fault Classification
// ---------------------------------------------------------------------------

/// Where a recoverable fault happened. None of these stop the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A field could not be advanced and kept its previous value.
    Simulation,
    /// A threshold check was skipped for the current pass.
    Evaluation,
    /// A notification was not delivered; the alert still counts as fired.
    Notifier,
}

impl FaultKind {
    pub fn component(self) -> Component {
        match self {
            FaultKind::Simulation => Component::Simulation,
            FaultKind::Evaluation => Component::Alerts,
            FaultKind::Notifier => Component::Notifier,
        }
    }

    /// Level a fault of this kind is logged at.
    ///
    /// A lost notification is the only fault a user can notice, so it is
    /// logged as an error; the others only cause staleness.
    pub fn level(self) -> LogLevel {
        match self {
            FaultKind::Simulation | FaultKind::Evaluation => LogLevel::Warning,
            FaultKind::Notifier => LogLevel::Error,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::Simulation => write!(f, "SIMULATION"),
            FaultKind::Evaluation => write!(f, "EVALUATION"),
            FaultKind::Notifier => write!(f, "NOTIFIER"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Initialize the global subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `min_level`. Calling this
/// twice returns `LoggingError::Install`.
pub fn init_logger(
    min_level: LogLevel,
    log_file: Option<&str>,
    console_timestamps: bool,
) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.as_filter()));

    let console = tracing_fmt::layer().with_target(false);
    let console = if console_timestamps {
        console.boxed()
    } else {
        console.without_time().boxed()
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::LogFile {
                    path: path.to_string(),
                    source,
                })?;
            Some(
                tracing_fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

fn emit(level: LogLevel, component: Component, entity: Option<&str>, message: &str) {
    let entity = entity.unwrap_or("-");
    match level {
        LogLevel::Debug => tracing::debug!(component = %component, entity, "{}", message),
        LogLevel::Info => tracing::info!(component = %component, entity, "{}", message),
        LogLevel::Warning => tracing::warn!(component = %component, entity, "{}", message),
        LogLevel::Error => tracing::error!(component = %component, entity, "{}", message),
    }
}

/// Log a general informational message
pub fn info(component: Component, entity: Option<&str>, message: &str) {
    emit(LogLevel::Info, component, entity, message);
}

/// Log a warning message
pub fn warn(component: Component, entity: Option<&str>, message: &str) {
    emit(LogLevel::Warning, component, entity, message);
}

/// Log an error message
pub fn error(component: Component, entity: Option<&str>, message: &str) {
    emit(LogLevel::Error, component, entity, message);
}

/// Log a debug message
pub fn debug(component: Component, entity: Option<&str>, message: &str) {
    emit(LogLevel::Debug, component, entity, message);
}

// ---------------------------------------------------------------------------
// Structured Fault Logging
// ---------------------------------------------------------------------------

pub fn format_fault(kind: FaultKind, operation: &str, err: &dyn std::error::Error) -> String {
    format!("{} failed [{}]: {}", operation, kind, err)
}

/// Log a recoverable fault at the level its kind calls for.
pub fn log_fault(kind: FaultKind, entity: &str, operation: &str, err: &dyn std::error::Error) {
    emit(kind.level(), kind.component(), Some(entity), &format_fault(kind, operation, err));
}

// ---------------------------------------------------------------------------
// Tick Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one tick. Quiet ticks are logged at debug level.
pub fn log_tick_summary(tick: u64, emitted: usize, cleared: usize, faults: usize) {
    let message = format!(
        "Tick {} complete: {} alert(s) emitted, {} cleared, {} fault(s)",
        tick, emitted, cleared, faults
    );

    if faults > 0 {
        warn(Component::Session, None, &message);
    } else if emitted > 0 {
        info(Component::Session, None, &message);
    } else {
        debug(Component::Session, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldError;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!(" info ".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_fault_classification() {
        assert_eq!(FaultKind::Notifier.level(), LogLevel::Error);
        assert_eq!(FaultKind::Simulation.level(), LogLevel::Warning);
        assert_eq!(FaultKind::Evaluation.component(), Component::Alerts);
    }

    #[test]
    fn test_fault_message_names_operation_and_kind() {
        let err = FieldError::NonFinite {
            field: "ph",
            value: f64::NAN,
        };
        let message = format_fault(FaultKind::Simulation, "advance field", &err);
        assert!(message.starts_with("advance field failed [SIMULATION]: ph"));
    }
}
