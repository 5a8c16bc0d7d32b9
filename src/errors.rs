use std::path::PathBuf;

use chrono::NaiveTime;
use thiserror::Error;

// Re-export a simple Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error set.
#[derive(Error, Debug)]
pub enum Error {
    // ---- Parsing ------------------------------------------------------------
    /// Malformed values (targets, filters, offsets, coordinates).
    #[error("Parse error: {0}")]
    Parse(String),

    // ---- Config -------------------------------------------------------------
    /// Any issue initializing/reading config (file missing, invalid JSON, etc.)
    #[error("Config error: {0}")]
    Config(String),

    // ---- Domain -------------------------------------------------------------
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Telescope(#[from] TelescopeError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    // ---- Plumbing / Wrappers ------------------------------------------------
    /// IO passthrough (sockets, queue files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serde JSON passthrough (config, wire messages).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Helper to create a parse error from any displayable value.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Error::Parse(msg.into())
    }
    /// Helper to create a generic config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}

/// Admission and queue-file failures.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue server is disabled; request rejected.")]
    Disabled,

    #[error("Admission window is closed until twilight ({twilight}).")]
    WindowClosed { twilight: NaiveTime },

    #[error("Invalid queue entry: {0}")]
    InvalidEntry(String),

    #[error("Unable to open queue file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed entry in {} at line {line}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Queue I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported across the hardware boundary. These never terminate the
/// process on their own; callers decide whether they are recoverable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelescopeError {
    #[error("Command '{command}' failed: {reason}")]
    Command { command: String, reason: String },

    #[error("Telemetry is missing '{key}'")]
    MissingTelemetry { key: String },

    #[error("Telemetry value for '{key}' is invalid: '{value}'")]
    InvalidTelemetry { key: String, value: String },
}

/// Which capture step of a session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Science,
    Dark,
    Bias,
    Filter,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Science => write!(f, "science exposure"),
            FrameKind::Dark => write!(f, "dark frame"),
            FrameKind::Bias => write!(f, "bias frame"),
            FrameKind::Filter => write!(f, "filter change"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Session has no targets.")]
    NoTargets,

    #[error("Unable to open the dome; weather or hardware not ready.")]
    DomeUnavailable,

    #[error("Failed to capture {kind} '{frame}'.")]
    Capture { frame: String, kind: FrameKind },

    #[error("Demo session refused: the telescope channel would drive real hardware.")]
    DemoOnHardware,

    #[error("Session cancelled by operator.")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Unable to load queue: {0}")]
    Load(#[from] QueueError),

    #[error("Session {index} for '{user}' failed: {source}")]
    SessionFailed {
        index: usize,
        user: String,
        #[source]
        source: SessionError,
    },

    #[error("Execution cancelled after {completed} completed session(s).")]
    Cancelled { completed: usize },
}

// ----------------------- Small result helpers --------------------------------

/// Map an `Option<T>` into `Result<T, Error::Parse>` with a custom message.
pub fn require_parse<T, S: Into<String>>(opt: Option<T>, msg: S) -> Result<T> {
    opt.ok_or_else(|| Error::Parse(msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_constructor_wraps_message() {
        let err = Error::parse("bad target");
        match err {
            Error::Parse(msg) => assert_eq!(msg, "bad target"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn config_constructor_wraps_message() {
        let err = Error::config("config missing");
        match err {
            Error::Config(msg) => assert_eq!(msg, "config missing"),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn require_parse_returns_value_when_present() {
        let value = require_parse(Some(4), "missing").unwrap();
        assert_eq!(value, 4);
    }

    #[test]
    fn require_parse_errors_with_message_when_missing() {
        let err = require_parse::<i32, _>(None, "missing").unwrap_err();
        match err {
            Error::Parse(msg) => assert_eq!(msg, "missing"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn window_closed_formats_twilight() {
        let err = QueueError::WindowClosed {
            twilight: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "Admission window is closed until twilight (18:30:00)."
        );
    }

    #[test]
    fn queue_error_is_transparent_through_crate_error() {
        let err = Error::from(QueueError::Disabled);
        assert_eq!(err.to_string(), "Queue server is disabled; request rejected.");
    }

    #[test]
    fn session_failure_names_index_and_user() {
        let err = ExecutionError::SessionFailed {
            index: 2,
            user: "vega".into(),
            source: SessionError::Capture {
                frame: "m31_clear".into(),
                kind: FrameKind::Science,
            },
        };
        assert_eq!(
            err.to_string(),
            "Session 2 for 'vega' failed: Failed to capture science exposure 'm31_clear'."
        );
    }

    #[test]
    fn io_error_formats_message() {
        let raw = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err = Error::from(raw);
        assert_eq!(err.to_string(), "I/O error: disk");
    }

    #[test]
    fn json_error_formats_message() {
        let raw = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let expected = format!("JSON error: {}", raw);
        let err = Error::from(raw);
        assert_eq!(err.to_string(), expected);
    }
}
