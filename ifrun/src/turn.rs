//! Orchestration for a single interpreter turn.
//!
//! The interpreter keeps nothing in memory between turns. Each turn spawns a
//! fresh process that restores from its own autosave, receives at most one
//! input event, and prints one RemGlk update. [`TurnMetadata`] on disk carries
//! what the next turn needs to build its input event.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::format::{EngineFamily, GameFormat};
use crate::core::remglk::{Envelope, InputEvent, Update, parse_stdout};
use crate::core::render::render;
use crate::core::types::{TurnMetadata, TurnState};
use crate::error::{TurnError, TurnResult};
use crate::io::config::EngineConfig;
use crate::io::interpreter::{InterpreterFamily, STATE_DIR, family_for};
use crate::io::locator::locate;
use crate::io::metadata_store::{load_metadata, remove_metadata, save_metadata};
use crate::io::process::CommandOutput;
use crate::io::spawn::{ProcessSpawner, SpawnRequest, Spawner};

/// Result of a successful turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Rendered game output.
    pub text: String,
    /// Metadata as persisted after the turn.
    pub metadata: TurnMetadata,
}

/// Snapshot of a game directory between turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStatus {
    pub game_file: PathBuf,
    pub format: GameFormat,
    pub state: TurnState,
    pub metadata: TurnMetadata,
}

/// Drives one game directory, one turn at a time.
///
/// Holds no state between calls beyond its configuration: everything a turn
/// needs is read back from the game directory. Turns against the same
/// directory must not run concurrently.
pub struct TurnEngine<S: Spawner = ProcessSpawner> {
    game_dir: PathBuf,
    config: EngineConfig,
    spawner: S,
}

struct ResolvedGame {
    path: PathBuf,
    format: GameFormat,
    family: &'static dyn InterpreterFamily,
}

impl TurnEngine<ProcessSpawner> {
    pub fn new(game_dir: impl Into<PathBuf>, config: EngineConfig) -> Self {
        Self::with_spawner(game_dir, config, ProcessSpawner)
    }
}

impl<S: Spawner> TurnEngine<S> {
    pub fn with_spawner(game_dir: impl Into<PathBuf>, config: EngineConfig, spawner: S) -> Self {
        Self {
            game_dir: game_dir.into(),
            config,
            spawner,
        }
    }

    pub fn game_dir(&self) -> &Path {
        &self.game_dir
    }

    /// Interpreter-owned autosave directory.
    pub fn state_dir(&self) -> PathBuf {
        self.game_dir.join(STATE_DIR)
    }

    /// Whether the interpreter has an autosave for this game.
    pub fn has_state(&self) -> bool {
        match self.resolve_game() {
            Ok(game) => game.family.has_autosave(&self.state_dir()),
            Err(_) => false,
        }
    }

    /// Describe the game directory without running anything.
    pub fn status(&self) -> TurnResult<GameStatus> {
        let game = self.resolve_game()?;
        let metadata = load_metadata(&self.game_dir);
        let state = TurnState::derive(game.family.has_autosave(&self.state_dir()), &metadata);
        Ok(GameStatus {
            game_file: game.path,
            format: game.format,
            state,
            metadata,
        })
    }

    /// Discard the autosave and metadata so the next turn starts a new game.
    ///
    /// Succeeds when there is nothing to remove.
    #[instrument(skip_all, fields(game_dir = %self.game_dir.display()))]
    pub fn reset(&self) -> TurnResult<()> {
        if !self.game_dir.is_dir() {
            return Err(TurnError::GameFileNotFound {
                dir: self.game_dir.clone(),
            });
        }
        let state_dir = self.state_dir();
        match fs::remove_dir_all(&state_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == IoErrorKind::NotFound => {}
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("remove state dir {}", state_dir.display()))
                    .into());
            }
        }
        remove_metadata(&self.game_dir)?;
        info!("game state reset");
        Ok(())
    }

    /// Run one turn.
    ///
    /// `command` is `None` to start (or resume without input). Fails before
    /// spawning anything when the game or interpreter is missing, the game
    /// has ended, or a special-input prompt is pending. On any failure the
    /// metadata on disk is left as it was.
    #[instrument(skip_all, fields(game_dir = %self.game_dir.display(), has_command = command.is_some()))]
    pub fn run_turn(&self, command: Option<&str>) -> TurnResult<TurnOutcome> {
        let game = self.resolve_game()?;
        let binary = self.resolve_binary(game.family.family())?;
        let state_dir = self.state_dir();

        let has_autosave = game.family.has_autosave(&state_dir);
        let metadata = load_metadata(&self.game_dir);
        let state = TurnState::derive(has_autosave, &metadata);
        debug!(?state, generation = metadata.generation, "derived turn state");

        let event = match (state, command) {
            (TurnState::Ended, _) => return Err(TurnError::NoInputWindow),
            (TurnState::BlockedOnSpecialInput, Some(_)) => {
                let kind = metadata
                    .special_input
                    .as_ref()
                    .map(|special| special.kind.clone())
                    .unwrap_or_default();
                return Err(TurnError::SpecialInputPending { kind });
            }
            (TurnState::Resuming { window, input_type }, Some(command)) => Some(InputEvent::new(
                input_type,
                metadata.generation,
                window,
                command,
            )),
            (TurnState::Fresh, Some(command)) => {
                warn!(command, "no saved game; starting a new game instead of sending command");
                None
            }
            (_, None) => None,
        };
        let delivered = event.as_ref().and(command);

        // A missing autosave means a new game: stale metadata must not leak into it.
        let base = if state == TurnState::Fresh {
            TurnMetadata::default()
        } else {
            metadata
        };

        let stdin = match &event {
            Some(event) => Some(serde_json::to_vec(event).context("serialize input event")?),
            None => None,
        };
        fs::create_dir_all(&state_dir)
            .with_context(|| format!("create state dir {}", state_dir.display()))?;

        let restore = has_autosave && game.family.uses_restore_flag();
        let request = SpawnRequest {
            program: binary,
            args: game.family.build_args(&game.path, &state_dir, restore),
            env: game.family.build_env(&state_dir),
            workdir: self.game_dir.clone(),
            stdin,
            timeout: self.config.turn_timeout(),
            output_limit_bytes: self.config.output_limit_bytes,
        };
        info!(
            interpreter = game.family.name(),
            format = %game.format,
            restore,
            sends_event = request.stdin.is_some(),
            "running turn"
        );

        let output = self.spawner.spawn(&request)?;
        let update = self.decode(&output)?;

        let windows = update.windows.as_deref().unwrap_or(base.windows.as_slice());
        let text = render(&update, windows);
        let next = base.advance(&update, delivered, &text);
        if let Some(special) = &next.special_input {
            info!(kind = %special.kind, "interpreter is waiting for special input");
        }

        save_metadata(&self.game_dir, &next)?;
        info!(
            generation = next.generation,
            input_window = ?next.input_window,
            turn = next.turn,
            "turn complete"
        );
        Ok(TurnOutcome {
            text,
            metadata: next,
        })
    }

    fn decode(&self, output: &CommandOutput) -> TurnResult<Update> {
        if output.timed_out {
            warn!("interpreter timed out");
            return Err(TurnError::TimedOut {
                timeout: self.config.turn_timeout(),
            });
        }
        if !output.success() {
            let mut diagnostic = output.stderr_text();
            if diagnostic.is_empty() {
                diagnostic = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
            }
            warn!(exit_code = ?output.exit_code, "interpreter failed");
            return Err(TurnError::InterpreterFailed {
                code: output.exit_code,
                stderr: diagnostic,
            });
        }

        match parse_stdout(&output.stdout) {
            Ok(Envelope::Update(update)) => Ok(update),
            Ok(Envelope::Error { message }) => {
                warn!(%message, "interpreter reported an error");
                Err(TurnError::InterpreterError { message })
            }
            Err(failure) => {
                let mut message = failure.message;
                if output.stdout_truncated > 0 {
                    message.push_str(&format!(
                        " (stdout truncated {} bytes)",
                        output.stdout_truncated
                    ));
                }
                Err(TurnError::ParseOutput {
                    message,
                    preview: failure.preview,
                })
            }
        }
    }

    fn resolve_game(&self) -> TurnResult<ResolvedGame> {
        let located = locate(&self.game_dir).ok_or_else(|| TurnError::GameFileNotFound {
            dir: self.game_dir.clone(),
        })?;
        let format = located.format.ok_or_else(|| TurnError::UnrecognizedFormat {
            path: located.path.clone(),
        })?;
        Ok(ResolvedGame {
            path: located.path,
            format,
            family: family_for(format),
        })
    }

    fn resolve_binary(&self, family: EngineFamily) -> TurnResult<PathBuf> {
        match self.config.interpreter_path(family) {
            Some(path) if path.is_file() => Ok(path.to_path_buf()),
            path => Err(TurnError::InterpreterNotFound {
                family,
                path: path.map(Path::to_path_buf),
            }),
        }
    }
}
