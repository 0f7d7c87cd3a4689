//! Games directory layout: one sub-directory per game.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Serialize;

use crate::core::format::GameFormat;
use crate::io::interpreter::{STATE_DIR, family_for};
use crate::io::locator::locate;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]").expect("valid regex"));

/// Directory name for a game: lowercased, every character outside
/// `[a-z0-9_-]` replaced by `_`.
pub fn game_dir_name(name: &str) -> String {
    UNSAFE_CHARS
        .replace_all(&name.to_lowercase(), "_")
        .into_owned()
}

/// Directory for the game `name` under `games_dir`.
///
/// A blank name is rejected: it would resolve to `games_dir` itself.
pub fn game_dir(games_dir: &Path, name: &str) -> Result<PathBuf> {
    if name.trim().is_empty() {
        bail!("game name must not be empty");
    }
    Ok(games_dir.join(game_dir_name(name)))
}

/// One installed game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameListing {
    pub name: String,
    pub game_file: PathBuf,
    pub format: Option<GameFormat>,
    pub has_state: bool,
}

/// List game directories under `games_dir`, sorted by name.
///
/// Sub-directories without a recognizable game file are skipped. A missing
/// games directory lists as empty.
pub fn list_games(games_dir: &Path) -> Result<Vec<GameListing>> {
    if !games_dir.exists() {
        return Ok(Vec::new());
    }
    let entries =
        fs::read_dir(games_dir).with_context(|| format!("read {}", games_dir.display()))?;
    let mut games = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", games_dir.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(game) = locate(&path) else {
            continue;
        };
        let has_state = game
            .format
            .is_some_and(|format| family_for(format).has_autosave(&path.join(STATE_DIR)));
        games.push(GameListing {
            name: entry.file_name().to_string_lossy().into_owned(),
            game_file: game.path,
            format: game.format,
            has_state,
        });
    }
    games.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(games)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_sanitized() {
        assert_eq!(game_dir_name("My Game! (v2)"), "my_game___v2_");
        assert_eq!(game_dir_name("ADVENT"), "advent");
        assert_eq!(game_dir_name("my-game_v2"), "my-game_v2");
        assert_eq!(game_dir_name("../etc"), "___etc");
    }

    #[test]
    fn blank_names_are_rejected() {
        let root = Path::new("/srv/games");
        assert_eq!(
            game_dir(root, "Advent").expect("game dir"),
            root.join("advent")
        );
        for name in ["", "   "] {
            let err = game_dir(root, name).unwrap_err();
            assert!(err.to_string().contains("must not be empty"), "{name:?}");
        }
    }

    #[test]
    fn lists_games_with_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let advent = temp.path().join("advent");
        fs::create_dir_all(advent.join(STATE_DIR)).expect("mkdir");
        fs::write(advent.join("game.ulx"), b"Glul\0\0\0\0").expect("write");
        fs::write(advent.join(STATE_DIR).join("autosave.json"), "{}").expect("write");

        let empty = temp.path().join("empty");
        fs::create_dir_all(&empty).expect("mkdir");

        let mut zork = vec![0u8; 64];
        zork[0] = 3;
        zork[18..24].copy_from_slice(b"880429");
        fs::create_dir_all(temp.path().join("zork")).expect("mkdir");
        fs::write(temp.path().join("zork").join("game.z3"), zork).expect("write");

        let games = list_games(temp.path()).expect("list");
        let names: Vec<&str> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["advent", "zork"]);
        assert!(games[0].has_state);
        assert_eq!(games[0].format, Some(GameFormat::GlulxBinary));
        assert!(!games[1].has_state);
        assert_eq!(games[1].format, Some(GameFormat::Z3));
    }

    #[test]
    fn missing_games_dir_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(list_games(&temp.path().join("none")).expect("list").is_empty());
    }
}
