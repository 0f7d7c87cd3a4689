//! Plain-text rendering of RemGlk updates.

use crate::core::remglk::{ContentEntry, InputType, Span, Update, Window, WindowKind, spans};

/// Appended when the game waits for a single keypress.
pub const KEYPRESS_NOTICE: &str = "[Waiting for keypress]";
/// Line placed above and below grid window output.
pub const GRID_RULE: &str = "===";
/// Grid lines at or beyond this index are dropped.
pub const MAX_GRID_LINES: usize = 1000;

/// Render `update` as text, using `windows` to know each window's kind.
///
/// Content is processed in emission order. Buffer windows accumulate
/// paragraphs (honoring `clear` and `append`); grid windows are rendered line
/// by line between [`GRID_RULE`] markers.
pub fn render(update: &Update, windows: &[Window]) -> String {
    let mut sections: Vec<Section> = Vec::new();

    for entry in &update.content {
        let index = match sections.iter().position(|s| s.window == entry.id) {
            Some(index) => index,
            None => {
                sections.push(Section::new(entry.id));
                sections.len() - 1
            }
        };
        let section = &mut sections[index];
        match window_kind(entry, windows) {
            WindowKind::Grid => section.apply_grid(entry),
            _ => section.apply_buffer(entry),
        }
    }

    let mut out = sections
        .iter()
        .filter_map(Section::render)
        .collect::<Vec<_>>()
        .join("\n\n");

    if update.first_input().map(|input| input.kind) == Some(InputType::Char) {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(KEYPRESS_NOTICE);
    }
    out
}

/// Apply the span style table to `text`.
pub fn apply_style(style: &str, text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    match style {
        "emphasized" => format!("*{text}*"),
        "header" => format!("**{text}**"),
        "preformatted" => format!("`{text}`"),
        "user1" => format!("[{text}]"),
        "blockquote" => format!("\"{text}\""),
        "input" => format!("> {text}"),
        _ => text.to_string(),
    }
}

fn window_kind(entry: &ContentEntry, windows: &[Window]) -> WindowKind {
    if let Some(window) = windows.iter().find(|w| w.id == entry.id) {
        return window.kind;
    }
    // Unknown window: infer from the payload shape.
    if entry.lines.is_some() && entry.text.is_none() {
        WindowKind::Grid
    } else {
        WindowKind::Buffer
    }
}

fn styled(items: &[Span<'_>]) -> String {
    items
        .iter()
        .map(|span| apply_style(span.style, span.text))
        .collect()
}

struct Section {
    window: u32,
    paragraphs: Vec<String>,
    grid: Option<Vec<String>>,
}

impl Section {
    fn new(window: u32) -> Self {
        Self {
            window,
            paragraphs: Vec::new(),
            grid: None,
        }
    }

    fn apply_buffer(&mut self, entry: &ContentEntry) {
        if entry.clear {
            self.paragraphs.clear();
        }
        for run in entry.text.iter().flatten() {
            let text = styled(&spans(&run.content));
            match self.paragraphs.last_mut() {
                Some(last) if run.append => last.push_str(&text),
                _ => self.paragraphs.push(text),
            }
        }
    }

    fn apply_grid(&mut self, entry: &ContentEntry) {
        let grid = self.grid.get_or_insert_with(Vec::new);
        if entry.clear {
            grid.clear();
        }
        for line in entry.lines.iter().flatten() {
            let index = line.line as usize;
            if index >= MAX_GRID_LINES {
                continue;
            }
            if grid.len() <= index {
                grid.resize(index + 1, String::new());
            }
            grid[index] = styled(&spans(&line.content));
        }
    }

    fn render(&self) -> Option<String> {
        if let Some(grid) = &self.grid {
            if grid.iter().all(|line| line.trim().is_empty()) {
                return None;
            }
            return Some(format!("{GRID_RULE}\n{}\n{GRID_RULE}", grid.join("\n")));
        }
        let text = self.paragraphs.join("\n");
        let trimmed = text.trim_matches('\n');
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
