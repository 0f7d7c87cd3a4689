//! RemGlk wire types: the update envelope read from interpreter stdout and
//! the input event written to its stdin.
//!
//! The envelope is decoded into a closed set of variants keyed by its `type`
//! field. Unknown top-level shapes are rejected rather than passed through as
//! loose JSON.

use serde::{Deserialize, Serialize};

/// Keyword RemGlk uses for the Return key in char input events.
pub const RETURN_KEY: &str = "return";

/// One message from the interpreter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    Update(Update),
    Error { message: String },
}

/// A RemGlk `update` message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Update {
    #[serde(rename = "gen")]
    pub generation: u64,
    /// Present only when the window layout changed.
    #[serde(default)]
    pub windows: Option<Vec<Window>>,
    #[serde(default)]
    pub content: Vec<ContentEntry>,
    /// Absent or empty once the game stops accepting input.
    #[serde(default)]
    pub input: Option<Vec<InputRequest>>,
    #[serde(default)]
    pub specialinput: Option<SpecialInput>,
}

impl Update {
    /// First input request, if any. Later entries are ignored.
    pub fn first_input(&self) -> Option<&InputRequest> {
        self.input.as_ref().and_then(|input| input.first())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: WindowKind,
    #[serde(default)]
    pub rock: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Buffer,
    Grid,
    Graphics,
    Pair,
    #[serde(other)]
    Other,
}

/// Content delivered to one window.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentEntry {
    pub id: u32,
    #[serde(default)]
    pub clear: bool,
    /// Buffer window paragraphs.
    #[serde(default)]
    pub text: Option<Vec<TextRun>>,
    /// Grid window lines.
    #[serde(default)]
    pub lines: Option<Vec<GridLine>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub append: bool,
    #[serde(default)]
    pub content: Vec<SpanItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridLine {
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub content: Vec<SpanItem>,
}

/// A span in a `content` array.
///
/// Newer RemGlk emits `{"style": .., "text": ..}` objects; older builds emit a
/// flat array alternating style and text strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SpanItem {
    Styled {
        #[serde(default = "normal_style")]
        style: String,
        #[serde(default)]
        text: String,
    },
    Bare(String),
}

fn normal_style() -> String {
    "normal".to_string()
}

/// A resolved `(style, text)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub style: &'a str,
    pub text: &'a str,
}

/// Resolve a content array into spans, pairing up bare strings.
pub fn spans(items: &[SpanItem]) -> Vec<Span<'_>> {
    let mut out = Vec::with_capacity(items.len());
    let mut pending_style: Option<&str> = None;
    for item in items {
        match item {
            SpanItem::Styled { style, text } => {
                pending_style = None;
                out.push(Span { style, text });
            }
            SpanItem::Bare(value) => match pending_style.take() {
                Some(style) => out.push(Span { style, text: value }),
                None => pending_style = Some(value),
            },
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputRequest {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: InputType,
    #[serde(default, rename = "gen")]
    pub generation: Option<u64>,
}

/// Kind of input event a window is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Line,
    Char,
}

/// Interpreter request for a non-text operation (e.g. picking a save file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialInput {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filemode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
}

/// Event written to interpreter stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputEvent {
    #[serde(rename = "type")]
    pub kind: InputType,
    #[serde(rename = "gen")]
    pub generation: u64,
    pub window: u32,
    pub value: String,
}

impl InputEvent {
    /// Build the event for `command` against the pending window.
    ///
    /// Line input is sent verbatim. Char input is reduced to one key: empty
    /// becomes a space, a lone newline becomes [`RETURN_KEY`], anything else
    /// keeps only its first character.
    pub fn new(kind: InputType, generation: u64, window: u32, command: &str) -> Self {
        let value = match kind {
            InputType::Line => command.to_string(),
            InputType::Char => char_value(command),
        };
        Self {
            kind,
            generation,
            window,
            value,
        }
    }
}

fn char_value(command: &str) -> String {
    if command == "\n" {
        return RETURN_KEY.to_string();
    }
    match command.chars().next() {
        Some(c) => c.to_string(),
        None => " ".to_string(),
    }
}

/// Failure to extract an envelope from interpreter stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    pub preview: String,
}

const PREVIEW_BYTES: usize = 200;

/// Parse the first JSON object from interpreter stdout.
///
/// The object is terminated by a blank line; anything after the delimiter is
/// ignored. Output without a delimiter is parsed whole.
pub fn parse_stdout(stdout: &[u8]) -> Result<Envelope, ParseFailure> {
    let body = match find_delimiter(stdout) {
        Some(end) => &stdout[..end],
        None => stdout,
    };
    serde_json::from_slice(body).map_err(|err| ParseFailure {
        message: err.to_string(),
        preview: preview(stdout),
    })
}

fn find_delimiter(bytes: &[u8]) -> Option<usize> {
    let lf = bytes.windows(2).position(|w| w == b"\n\n");
    let crlf = bytes.windows(4).position(|w| w == b"\r\n\r\n");
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn preview(bytes: &[u8]) -> String {
    let end = bytes.len().min(PREVIEW_BYTES);
    let mut text = String::from_utf8_lossy(&bytes[..end]).into_owned();
    if bytes.len() > end {
        text.push_str(&format!("... [{} more bytes]", bytes.len() - end));
    }
    text
}
