//! Command-line driver: play RemGlk interactive fiction one move per invocation.
//!
//! Each `play` runs a single interpreter turn against `<games-dir>/<game>/`
//! and prints the rendered game text to stdout. Diagnostics go to stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use ifrun::core::format::classify;
use ifrun::exit_codes;
use ifrun::io::config::{EngineConfig, load_config};
use ifrun::io::games::{game_dir, list_games};
use ifrun::{TurnEngine, TurnError, logging};

#[derive(Parser)]
#[command(
    name = "ifrun",
    version,
    about = "Run RemGlk interactive fiction one turn at a time"
)]
struct Cli {
    /// Engine config file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "ifrun.toml")]
    config: PathBuf,

    /// Override `games_dir` from the config.
    #[arg(long, global = true)]
    games_dir: Option<PathBuf>,

    /// Override the glulxe binary path.
    #[arg(long, global = true)]
    glulxe: Option<PathBuf>,

    /// Override the bocfel binary path.
    #[arg(long, global = true)]
    bocfel: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one turn. Without a command, starts the game or resumes without input.
    Play {
        game: String,
        command: Option<String>,
    },
    /// Delete the autosave and metadata so the next turn starts over.
    Reset { game: String },
    /// Print the game's current turn state as JSON.
    Status { game: String },
    /// List installed games.
    List,
    /// Print the format and interpreter family of a game file.
    Detect { file: PathBuf },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    match cli.command {
        Command::Play { game, command } => cmd_play(&config, &game, command.as_deref()),
        Command::Reset { game } => cmd_reset(&config, &game),
        Command::Status { game } => cmd_status(&config, &game),
        Command::List => cmd_list(&config),
        Command::Detect { file } => cmd_detect(&file),
    }
}

fn build_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = load_config(&cli.config)?;
    if let Some(dir) = &cli.games_dir {
        config.games_dir = dir.clone();
    }
    if let Some(path) = &cli.glulxe {
        config.glulxe_path = Some(path.clone());
    }
    if let Some(path) = &cli.bocfel {
        config.bocfel_path = Some(path.clone());
    }
    Ok(config)
}

fn engine_for(config: &EngineConfig, game: &str) -> Result<TurnEngine> {
    Ok(TurnEngine::new(
        game_dir(&config.games_dir, game)?,
        config.clone(),
    ))
}

/// Point at the installed games when the requested one is missing.
fn note_available_games(config: &EngineConfig, err: TurnError) -> TurnError {
    if matches!(err, TurnError::GameFileNotFound { .. }) {
        match list_games(&config.games_dir) {
            Ok(games) if !games.is_empty() => {
                let names: Vec<&str> = games.iter().map(|game| game.name.as_str()).collect();
                eprintln!("available games: {}", names.join(", "));
            }
            Ok(_) => eprintln!("no games installed in {}", config.games_dir.display()),
            Err(list_err) => debug!(err = %list_err, "could not list games"),
        }
    }
    err
}

fn cmd_play(config: &EngineConfig, game: &str, command: Option<&str>) -> Result<()> {
    if let Some(command) = command.filter(|command| is_save_or_restore(command)) {
        eprintln!(
            "warning: progress is autosaved every turn; '{command}' is passed to the game as-is"
        );
    }
    let outcome = engine_for(config, game)?
        .run_turn(command)
        .map_err(|err| note_available_games(config, err))?;
    println!("{}", outcome.text);
    Ok(())
}

fn cmd_reset(config: &EngineConfig, game: &str) -> Result<()> {
    engine_for(config, game)?
        .reset()
        .map_err(|err| note_available_games(config, err))?;
    Ok(())
}

fn cmd_status(config: &EngineConfig, game: &str) -> Result<()> {
    let status = engine_for(config, game)?
        .status()
        .map_err(|err| note_available_games(config, err))?;
    print_json(&status)
}

fn cmd_list(config: &EngineConfig) -> Result<()> {
    for game in list_games(&config.games_dir)? {
        let format = game
            .format
            .map_or_else(|| "unknown".to_string(), |format| format.to_string());
        let state = if game.has_state { "in progress" } else { "new" };
        println!("{}\t{}\t{}", game.name, format, state);
    }
    Ok(())
}

fn cmd_detect(file: &Path) -> Result<()> {
    let data = fs::read(file).with_context(|| format!("read {}", file.display()))?;
    let format = classify(&data).ok_or_else(|| TurnError::UnrecognizedFormat {
        path: file.to_path_buf(),
    })?;
    println!("{}\t{}", format, format.family());
    Ok(())
}

/// Serialize `value` to pretty-printed JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}

fn is_save_or_restore(command: &str) -> bool {
    let command = command.trim();
    command.eq_ignore_ascii_case("save") || command.eq_ignore_ascii_case("restore")
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<TurnError>() {
        Some(err) => exit_codes::for_kind(err.kind()),
        None => exit_codes::INVALID,
    }
}
