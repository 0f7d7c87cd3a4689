//! Test-only helpers: scratch game directories, a scripted spawner, and
//! RemGlk update builders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::io::config::EngineConfig;
use crate::io::interpreter::STATE_DIR;
use crate::io::metadata_store::metadata_path;
use crate::io::process::CommandOutput;
use crate::io::spawn::{SpawnRequest, Spawner};

/// Minimal Glulx story: magic bytes plus padding.
pub fn glulx_bytes() -> Vec<u8> {
    let mut data = b"Glul".to_vec();
    data.extend_from_slice(&[0; 256]);
    data
}

/// Minimal Z-code v5 story header with a printable serial.
pub fn zcode_bytes() -> Vec<u8> {
    let mut data = vec![0u8; 64];
    data[0] = 5;
    data[18..24].copy_from_slice(b"250101");
    data
}

/// Temporary layout: `<root>/games/testgame/` plus fake interpreter binaries
/// under `<root>/bin/`.
pub struct GameDir {
    temp: TempDir,
    path: PathBuf,
}

impl GameDir {
    /// Game directory holding `game.ulx`.
    pub fn glulx() -> Result<Self> {
        Self::with_file("game.ulx", &glulx_bytes())
    }

    /// Game directory holding `game.z5`.
    pub fn zcode() -> Result<Self> {
        Self::with_file("game.z5", &zcode_bytes())
    }

    /// Game directory with no game file.
    pub fn empty() -> Result<Self> {
        Self::scaffold()
    }

    pub fn with_file(name: &str, contents: &[u8]) -> Result<Self> {
        let dir = Self::scaffold()?;
        fs::write(dir.path.join(name), contents).with_context(|| format!("write {name}"))?;
        Ok(dir)
    }

    fn scaffold() -> Result<Self> {
        let temp = tempfile::tempdir().context("tempdir")?;
        let path = temp.path().join("games").join("testgame");
        fs::create_dir_all(&path).context("create game dir")?;
        let bin = temp.path().join("bin");
        fs::create_dir_all(&bin).context("create bin dir")?;
        for name in ["glulxe", "bocfel"] {
            fs::write(bin.join(name), "#!/bin/sh\n").with_context(|| format!("write {name}"))?;
        }
        Ok(Self { temp, path })
    }

    /// Scratch root (parent of `games/` and `bin/`).
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state_dir(&self) -> PathBuf {
        self.path.join(STATE_DIR)
    }

    pub fn metadata_path(&self) -> PathBuf {
        metadata_path(&self.path)
    }

    /// Create an autosave file as the interpreter would.
    pub fn write_autosave(&self, name: &str) -> Result<()> {
        fs::create_dir_all(self.state_dir()).context("create state dir")?;
        fs::write(self.state_dir().join(name), "{}").with_context(|| format!("write {name}"))
    }

    /// Config pointing at the fake binaries.
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            games_dir: self.temp.path().join("games"),
            glulxe_path: Some(self.temp.path().join("bin").join("glulxe")),
            bocfel_path: Some(self.temp.path().join("bin").join("bocfel")),
            ..EngineConfig::default()
        }
    }
}

/// One scripted interpreter run.
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    pub output: CommandOutput,
    /// Autosave file created in the request's state dir, as a real interpreter would.
    pub autosave: Option<String>,
}

impl ScriptedReply {
    /// Successful run printing `update` and leaving `state/autosave.json`.
    pub fn update(update: Value) -> Self {
        Self::stdout(remglk_stdout(&update))
    }

    /// Successful run printing raw bytes and leaving `state/autosave.json`.
    pub fn stdout(stdout: Vec<u8>) -> Self {
        Self {
            output: CommandOutput {
                exit_code: Some(0),
                stdout,
                ..CommandOutput::default()
            },
            autosave: Some("autosave.json".to_string()),
        }
    }

    /// Failed run with the given exit code and stderr; writes no autosave.
    pub fn failure(code: i32, stderr: &str) -> Self {
        Self {
            output: CommandOutput {
                exit_code: Some(code),
                stderr: stderr.as_bytes().to_vec(),
                ..CommandOutput::default()
            },
            autosave: None,
        }
    }

    /// Run that hit the timeout.
    pub fn timeout() -> Self {
        Self {
            output: CommandOutput {
                timed_out: true,
                ..CommandOutput::default()
            },
            autosave: None,
        }
    }

    pub fn with_autosave(mut self, name: &str) -> Self {
        self.autosave = Some(name.to_string());
        self
    }
}

/// Spawner that replays queued replies and records every request.
pub struct ScriptedSpawner {
    replies: RefCell<VecDeque<ScriptedReply>>,
    requests: RefCell<Vec<SpawnRequest>>,
}

impl ScriptedSpawner {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SpawnRequest> {
        self.requests.borrow().clone()
    }

    /// Stdin of the most recent request, parsed as JSON.
    pub fn last_stdin_json(&self) -> Option<Value> {
        let requests = self.requests.borrow();
        let stdin = requests.last()?.stdin.as_ref()?;
        serde_json::from_slice(stdin).ok()
    }
}

impl Spawner for ScriptedSpawner {
    fn spawn(&self, request: &SpawnRequest) -> Result<CommandOutput> {
        self.requests.borrow_mut().push(request.clone());
        let reply = self
            .replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted reply left"))?;
        if let Some(name) = &reply.autosave {
            let state_dir = request.workdir.join(STATE_DIR);
            fs::create_dir_all(&state_dir).context("create state dir")?;
            fs::write(state_dir.join(name), "{}").context("write autosave")?;
        }
        Ok(reply.output)
    }
}

/// RemGlk update with one buffer window (id 0) holding `text`.
///
/// `input` is `(window, "line" | "char")`; `None` omits the `input` field.
pub fn update_json(generation: u64, text: &str, input: Option<(u32, &str)>) -> Value {
    let mut update = json!({
        "type": "update",
        "gen": generation,
        "windows": [{"id": 0, "type": "buffer", "rock": 201}],
        "content": [
            {"id": 0, "text": [{"content": [{"style": "normal", "text": text}]}]}
        ],
    });
    if let Some((window, kind)) = input {
        update["input"] = json!([{"id": window, "type": kind, "gen": generation}]);
    }
    update
}

/// Encode an update the way a RemGlk interpreter prints it (JSON + blank line).
pub fn remglk_stdout(update: &Value) -> Vec<u8> {
    let mut out = update.to_string().into_bytes();
    out.extend_from_slice(b"\n\n");
    out
}
