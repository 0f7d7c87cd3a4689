//! CLI tests: spawn the ifrun binary and check exit codes and output.

use std::process::{Command, Output};

use ifrun::core::types::TurnMetadata;
use ifrun::exit_codes;
use ifrun::io::metadata_store::save_metadata;
use ifrun::test_support::{GameDir, glulx_bytes};

fn ifrun(game: &GameDir, args: &[&str]) -> Output {
    let config = game.config();
    let glulxe = config.glulxe_path.expect("glulxe path");
    Command::new(env!("CARGO_BIN_EXE_ifrun"))
        .current_dir(game.root())
        .arg("--games-dir")
        .arg(&config.games_dir)
        .arg("--glulxe")
        .arg(glulxe)
        .args(args)
        .output()
        .expect("run ifrun")
}

#[test]
fn detect_prints_format_and_family() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("story.bin");
    std::fs::write(&path, glulx_bytes()).expect("write");

    let output = Command::new(env!("CARGO_BIN_EXE_ifrun"))
        .current_dir(temp.path())
        .arg("detect")
        .arg(&path)
        .output()
        .expect("ifrun detect");
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "glulx-binary\tglulx\n");
}

#[test]
fn detect_unknown_file_is_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("notes.txt");
    std::fs::write(&path, "just some notes").expect("write");

    let status = Command::new(env!("CARGO_BIN_EXE_ifrun"))
        .current_dir(temp.path())
        .arg("detect")
        .arg(&path)
        .status()
        .expect("ifrun detect");
    assert_eq!(status.code(), Some(exit_codes::NOT_FOUND));
}

#[test]
fn play_missing_game_exits_not_found() {
    let game = GameDir::glulx().expect("game");
    let output = ifrun(&game, &["play", "no-such-game", "look"]);
    assert_eq!(output.status.code(), Some(exit_codes::NOT_FOUND));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("game file not found"));
    assert!(stderr.contains("available games: testgame"));
    assert!(output.stdout.is_empty());
}

#[test]
fn blank_game_name_is_rejected_without_touching_games_dir() {
    let game = GameDir::glulx().expect("game");
    let games_dir = game.config().games_dir;
    std::fs::create_dir_all(games_dir.join("state")).expect("mkdir");
    std::fs::write(games_dir.join("metadata.json"), "{}").expect("write");

    for args in [&["play", ""][..], &["reset", ""][..], &["reset", "  "][..]] {
        let output = ifrun(&game, args);
        assert_eq!(output.status.code(), Some(exit_codes::INVALID), "{args:?}");
        assert!(String::from_utf8_lossy(&output.stderr).contains("must not be empty"));
    }
    assert!(games_dir.join("state").is_dir());
    assert!(games_dir.join("metadata.json").is_file());
}

#[test]
fn play_after_game_end_exits_with_state_code() {
    let game = GameDir::glulx().expect("game");
    game.write_autosave("autosave.json").expect("autosave");
    save_metadata(game.path(), &TurnMetadata::default()).expect("save");

    let output = ifrun(&game, &["play", "testgame", "look"]);
    assert_eq!(output.status.code(), Some(exit_codes::STATE));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no input window"));
}

#[test]
fn play_warns_about_save() {
    let game = GameDir::glulx().expect("game");
    game.write_autosave("autosave.json").expect("autosave");
    save_metadata(game.path(), &TurnMetadata::default()).expect("save");

    let output = ifrun(&game, &["play", "TestGame", "save"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("autosaved every turn"));
    assert_eq!(output.status.code(), Some(exit_codes::STATE));
}

#[test]
fn list_and_status_describe_games() {
    let game = GameDir::glulx().expect("game");

    let output = ifrun(&game, &["list"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "testgame\tglulx-binary\tnew\n");

    let output = ifrun(&game, &["status", "testgame"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).expect("status json");
    assert_eq!(status["format"], "glulx-binary");
    assert_eq!(status["state"], "fresh");
}

#[test]
fn reset_removes_state() {
    let game = GameDir::glulx().expect("game");
    game.write_autosave("autosave.json").expect("autosave");

    let output = ifrun(&game, &["reset", "testgame"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(!game.state_dir().exists());
}
