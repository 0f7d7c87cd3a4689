//! Locate the game file inside a game directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::format::{GameFormat, classify};

/// Extensions in preference order. The generic Blorb extensions are ranked
/// after sniffing their bytes.
const RANKED_EXTENSIONS: &[&str] = &[
    "ulx", "gblorb", "glb", "z3", "z4", "z5", "z6", "z7", "z8", "zblorb", "zlb",
];
const GENERIC_BLORB_EXTENSIONS: &[&str] = &["blorb", "blb"];

/// A located game file and the format it was resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameFile {
    pub path: PathBuf,
    /// Format from the file's bytes, falling back to its extension.
    pub format: Option<GameFormat>,
}

/// Find the game file in `dir`.
///
/// Plain Glulx wins over Blorb containers, and any Glulx-family file wins
/// over any Z-code file. Ties are broken by a fixed ranking, never by
/// directory order. Returns `None` when the directory is missing or has no
/// recognizable game file.
pub fn find_game_file(dir: &Path) -> Option<PathBuf> {
    locate(dir).map(|game| game.path)
}

/// Like [`find_game_file`], also resolving the format.
pub fn locate(dir: &Path) -> Option<GameFile> {
    let entries = fs::read_dir(dir).ok()?;
    let mut best: Option<(usize, PathBuf)> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(rank) = rank(&path) else {
            continue;
        };
        let better = match &best {
            Some((best_rank, best_path)) => (rank, &path) < (*best_rank, best_path),
            None => true,
        };
        if better {
            best = Some((rank, path));
        }
    }

    let (_, path) = best?;
    let format = resolve_format(&path);
    debug!(path = %path.display(), ?format, "located game file");
    Some(GameFile { path, format })
}

/// Format of `path`: sniffed from its bytes, else implied by its extension.
pub fn resolve_format(path: &Path) -> Option<GameFormat> {
    let sniffed = fs::read(path).ok().and_then(|data| classify(&data));
    sniffed.or_else(|| extension(path).and_then(|ext| GameFormat::from_extension(&ext)))
}

fn rank(path: &Path) -> Option<usize> {
    let ext = extension(path)?;
    if let Some(rank) = RANKED_EXTENSIONS.iter().position(|known| *known == ext) {
        return Some(rank);
    }
    if !GENERIC_BLORB_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    let sniffed = fs::read(path).ok().and_then(|data| classify(&data));
    let rank_as = match sniffed {
        Some(format) => format.extension(),
        // Unidentified container: after everything else.
        None => return Some(RANKED_EXTENSIONS.len()),
    };
    RANKED_EXTENSIONS.iter().position(|known| *known == rank_as)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
