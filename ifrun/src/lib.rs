//! Turn-at-a-time driver for RemGlk interactive-fiction interpreters.
//!
//! Each move runs a fresh glulxe or bocfel process in single-turn mode. The
//! interpreter restores from its own autosave, receives at most one input
//! event, prints one JSON update, autosaves, and exits. The crate keeps a
//! small metadata record next to the autosave so the following turn knows
//! which window and generation to address.
//!
//! - **[`core`]**: Pure logic (format sniffing, RemGlk types, rendering, turn
//!   bookkeeping). No I/O.
//! - **[`io`]**: Filesystem and process side effects, behind seams that tests
//!   replace.
//!
//! [`turn::TurnEngine`] ties the two together.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;

pub use error::{ErrorKind, TurnError, TurnResult};
pub use turn::{GameStatus, TurnEngine, TurnOutcome};
