//! Error types for the turn engine.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::format::EngineFamily;

/// Result type for turn operations.
pub type TurnResult<T> = Result<T, TurnError>;

/// Broad failure classes. Every class is terminal for the turn; none are
/// retried by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Game file or interpreter binary missing; nothing was spawned.
    NotFound,
    /// The interpreter crashed, exited non-zero, or timed out.
    InterpreterFatal,
    /// The interpreter's reply did not match the expected protocol.
    Protocol,
    /// The current game state does not accept this turn; nothing was spawned.
    State,
    /// Local filesystem failure.
    Io,
}

/// Errors that can occur while running a turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("game file not found in {}", .dir.display())]
    GameFileNotFound { dir: PathBuf },

    #[error("unrecognized game format: {}", .path.display())]
    UnrecognizedFormat { path: PathBuf },

    #[error("interpreter binary not found for {family} games{}", display_path(.path.as_ref()))]
    InterpreterNotFound {
        family: EngineFamily,
        path: Option<PathBuf>,
    },

    #[error("no input window: the game is not accepting input")]
    NoInputWindow,

    #[error("interpreter is waiting for special input ({kind}); it cannot be answered with a command")]
    SpecialInputPending { kind: String },

    #[error("interpreter failed with exit code {}: {stderr}", display_code(.code))]
    InterpreterFailed { code: Option<i32>, stderr: String },

    #[error("interpreter timed out after {timeout:?}")]
    TimedOut { timeout: Duration },

    #[error("failed to parse interpreter output: {message}; output began: {preview:?}")]
    ParseOutput { message: String, preview: String },

    #[error("interpreter reported an error: {message}")]
    InterpreterError { message: String },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl TurnError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TurnError::GameFileNotFound { .. }
            | TurnError::UnrecognizedFormat { .. }
            | TurnError::InterpreterNotFound { .. } => ErrorKind::NotFound,
            TurnError::NoInputWindow | TurnError::SpecialInputPending { .. } => ErrorKind::State,
            TurnError::InterpreterFailed { .. } | TurnError::TimedOut { .. } => {
                ErrorKind::InterpreterFatal
            }
            TurnError::ParseOutput { .. } | TurnError::InterpreterError { .. } => {
                ErrorKind::Protocol
            }
            TurnError::Io(_) => ErrorKind::Io,
        }
    }
}

fn display_path(path: Option<&PathBuf>) -> String {
    match path {
        Some(path) => format!(" at {}", path.display()),
        None => " (no path configured)".to_string(),
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (killed by signal)".to_string(),
    }
}
