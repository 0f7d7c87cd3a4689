//! Command-line conventions of the two supported interpreter families.
//!
//! Both interpreters are RemGlk builds run in single-turn mode. They differ in
//! how autosave is enabled, where the autosave directory comes from, how a
//! restore is requested, and how the autosave file is named.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use crate::core::format::{EngineFamily, GameFormat};

/// Name of the interpreter-owned autosave directory inside a game directory.
pub const STATE_DIR: &str = "state";

/// Environment variable bocfel reads its autosave directory from.
pub const BOCFEL_AUTOSAVE_ENV: &str = "BOCFEL_AUTOSAVE_DIRECTORY";

/// Glulxe's fixed autosave file name.
pub const GLULXE_AUTOSAVE_FILE: &str = "autosave.json";

/// Per-family invocation capability.
pub trait InterpreterFamily: Sync {
    fn family(&self) -> EngineFamily;

    /// Human-readable interpreter name (used in errors).
    fn name(&self) -> &'static str;

    /// Arguments after the program name.
    fn build_args(&self, game_file: &Path, state_dir: &Path, restore: bool) -> Vec<OsString>;

    /// Environment overrides for the child.
    fn build_env(&self, state_dir: &Path) -> Vec<(OsString, OsString)>;

    /// Whether restoring needs an explicit flag (as opposed to being implied
    /// by the autosave file's presence).
    fn uses_restore_flag(&self) -> bool;

    /// Whether an autosave blob exists in `state_dir`.
    fn has_autosave(&self, state_dir: &Path) -> bool;
}

/// Glulxe: autosave is opt-in and the directory is passed as a flag.
#[derive(Debug, Clone, Copy)]
pub struct Glulxe;

impl InterpreterFamily for Glulxe {
    fn family(&self) -> EngineFamily {
        EngineFamily::Glulx
    }

    fn name(&self) -> &'static str {
        "glulxe"
    }

    fn build_args(&self, game_file: &Path, state_dir: &Path, restore: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-singleturn".into(),
            "-fm".into(),
            "--autosave".into(),
            "--autodir".into(),
            state_dir.as_os_str().to_owned(),
        ];
        if restore {
            args.push("--autorestore".into());
        }
        args.push(game_file.as_os_str().to_owned());
        args
    }

    fn build_env(&self, _state_dir: &Path) -> Vec<(OsString, OsString)> {
        Vec::new()
    }

    fn uses_restore_flag(&self) -> bool {
        true
    }

    fn has_autosave(&self, state_dir: &Path) -> bool {
        state_dir.join(GLULXE_AUTOSAVE_FILE).is_file()
    }
}

/// Bocfel: autosave is always on, the directory comes from the environment,
/// and restore happens whenever a matching autosave exists.
#[derive(Debug, Clone, Copy)]
pub struct Bocfel;

impl InterpreterFamily for Bocfel {
    fn family(&self) -> EngineFamily {
        EngineFamily::Zcode
    }

    fn name(&self) -> &'static str {
        "bocfel"
    }

    fn build_args(&self, game_file: &Path, _state_dir: &Path, _restore: bool) -> Vec<OsString> {
        vec![
            "-singleturn".into(),
            "-fm".into(),
            game_file.as_os_str().to_owned(),
        ]
    }

    fn build_env(&self, state_dir: &Path) -> Vec<(OsString, OsString)> {
        vec![(
            BOCFEL_AUTOSAVE_ENV.into(),
            state_dir.as_os_str().to_owned(),
        )]
    }

    fn uses_restore_flag(&self) -> bool {
        false
    }

    /// Bocfel names its autosave `<basename>-<story id>.json`, so any JSON
    /// file in the state directory counts.
    fn has_autosave(&self, state_dir: &Path) -> bool {
        let Ok(entries) = fs::read_dir(state_dir) else {
            return false;
        };
        entries.flatten().any(|entry| {
            let path = entry.path();
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
    }
}

/// Pick the interpreter family for a game format.
pub fn family_for(format: GameFormat) -> &'static dyn InterpreterFamily {
    match format.family() {
        EngineFamily::Glulx => &Glulxe,
        EngineFamily::Zcode => &Bocfel,
    }
}
