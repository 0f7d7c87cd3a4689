//! Turn bookkeeping shared between the engine and the metadata store.
//!
//! These types are pure data. Deriving the next record from an update is
//! deterministic and performs no I/O.

use serde::{Deserialize, Serialize};

use crate::core::remglk::{InputType, SpecialInput, Update, Window};

/// Persisted conversational cursor for one game directory (`metadata.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnMetadata {
    /// Generation of the last update the interpreter produced (0 before any turn).
    #[serde(alias = "gen")]
    pub generation: u64,
    /// Window awaiting input, or `None` once the game stopped asking.
    pub input_window: Option<u32>,
    pub input_type: InputType,
    /// Last known window layout.
    pub windows: Vec<Window>,
    /// Number of commands delivered so far.
    pub turn: u32,
    pub last_command: Option<String>,
    pub last_output: Option<String>,
    /// Outstanding non-text request. Cleared by the next update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_input: Option<SpecialInput>,
}

impl Default for TurnMetadata {
    fn default() -> Self {
        Self {
            generation: 0,
            input_window: None,
            input_type: InputType::Line,
            windows: Vec::new(),
            turn: 0,
            last_command: None,
            last_output: None,
            special_input: None,
        }
    }
}

impl TurnMetadata {
    /// Build the record that follows `self` after `update` was received.
    ///
    /// `command` is the command delivered this turn (if any) and `text` the
    /// rendered output.
    pub fn advance(&self, update: &Update, command: Option<&str>, text: &str) -> Self {
        let (input_window, input_type) = match update.first_input() {
            Some(input) => (Some(input.id), input.kind),
            None => (None, InputType::Line),
        };
        let windows = update
            .windows
            .clone()
            .unwrap_or_else(|| self.windows.clone());
        let (turn, last_command) = match command {
            Some(command) => (self.turn + 1, Some(command.to_string())),
            None => (self.turn, self.last_command.clone()),
        };
        Self {
            generation: update.generation,
            input_window,
            input_type,
            windows,
            turn,
            last_command,
            last_output: Some(text.to_string()),
            special_input: update.specialinput.clone(),
        }
    }

    pub fn special_input_pending(&self) -> bool {
        self.special_input.is_some()
    }
}

/// Where a game directory stands between turns.
///
/// Derived from the autosave blob and [`TurnMetadata`]; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// No autosave: the next turn starts a new game.
    Fresh,
    /// Autosave present and a window is waiting for input.
    Resuming { window: u32, input_type: InputType },
    /// The interpreter is waiting on a file prompt.
    BlockedOnSpecialInput,
    /// The last update requested no input.
    Ended,
}

impl TurnState {
    pub fn derive(has_autosave: bool, metadata: &TurnMetadata) -> Self {
        if !has_autosave {
            return TurnState::Fresh;
        }
        if metadata.special_input_pending() {
            return TurnState::BlockedOnSpecialInput;
        }
        match metadata.input_window {
            Some(window) => TurnState::Resuming {
                window,
                input_type: metadata.input_type,
            },
            None => TurnState::Ended,
        }
    }
}
