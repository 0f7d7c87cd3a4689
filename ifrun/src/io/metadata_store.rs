//! Turn metadata storage (`<game dir>/metadata.json`).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::types::TurnMetadata;

pub const METADATA_FILE: &str = "metadata.json";

pub fn metadata_path(game_dir: &Path) -> PathBuf {
    game_dir.join(METADATA_FILE)
}

/// Load metadata for a game directory.
///
/// Never fails: a missing, unreadable or corrupt file yields the default
/// record, since the interpreter's autosave remains the durable state.
pub fn load_metadata(game_dir: &Path) -> TurnMetadata {
    let path = metadata_path(game_dir);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no metadata, using defaults");
            return TurnMetadata::default();
        }
        Err(err) => {
            warn!(path = %path.display(), err = %err, "unreadable metadata, using defaults");
            return TurnMetadata::default();
        }
    };
    match serde_json::from_str::<TurnMetadata>(&contents) {
        Ok(metadata) => {
            debug!(generation = metadata.generation, turn = metadata.turn, "metadata loaded");
            metadata
        }
        Err(err) => {
            warn!(path = %path.display(), err = %err, "corrupt metadata, using defaults");
            TurnMetadata::default()
        }
    }
}

/// Atomically write metadata (temp file + rename).
pub fn save_metadata(game_dir: &Path, metadata: &TurnMetadata) -> Result<()> {
    let path = metadata_path(game_dir);
    debug!(path = %path.display(), generation = metadata.generation, turn = metadata.turn, "writing metadata");
    let mut buf = serde_json::to_string_pretty(metadata).context("serialize metadata")?;
    buf.push('\n');
    write_atomic(&path, &buf)
}

/// Remove the metadata file if present.
pub fn remove_metadata(game_dir: &Path) -> Result<()> {
    let path = metadata_path(game_dir);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove metadata {}", path.display())),
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("metadata path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp metadata {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace metadata {}", path.display()))?;
    Ok(())
}
