//! Stable exit codes for ifrun CLI commands.

use crate::error::ErrorKind;

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid arguments or config, or a local I/O failure.
pub const INVALID: i32 = 1;
/// Game file or interpreter binary missing.
pub const NOT_FOUND: i32 = 2;
/// The game is not accepting this turn (ended, or waiting for special input).
pub const STATE: i32 = 3;
/// The interpreter crashed, exited non-zero, or timed out.
pub const INTERPRETER: i32 = 4;
/// The interpreter's reply could not be understood.
pub const PROTOCOL: i32 = 5;

pub fn for_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::NotFound => NOT_FOUND,
        ErrorKind::State => STATE,
        ErrorKind::InterpreterFatal => INTERPRETER,
        ErrorKind::Protocol => PROTOCOL,
        ErrorKind::Io => INVALID,
    }
}
