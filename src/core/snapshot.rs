//! Deterministic snapshot generation
//!
//! Snapshots capture what a renderer would draw: the displayed grid (with
//! any synchronized-output freeze and display offset applied), the cursor,
//! and which buffer is active. Given the same byte stream, the terminal
//! produces identical snapshots.

use serde::{Deserialize, Serialize};

use super::buffer::{Buffer, BufferKind};
use super::cell::{Cell, Color};
use super::line::LineTag;

/// A complete snapshot of the displayed terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cols: usize,
    pub rows: usize,
    /// Visible grid content (row-major)
    pub grid: Vec<Vec<CellSnapshot>>,
    /// Semantic tag per visible row
    pub tags: Vec<Option<LineTag>>,
    pub cursor: CursorSnapshot,
    pub alternate_screen: bool,
    pub scrollback_lines: usize,
    pub display_offset: usize,
    /// Filled in by the terminal; buffers know nothing about modes
    #[serde(default)]
    pub modes: ModesSnapshot,
}

/// Snapshot of negotiated modes and semantic prompt state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModesSnapshot {
    #[serde(default, skip_serializing_if = "is_false")]
    pub application_cursor: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bracketed_paste: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub synchronized_output: bool,
    pub kitty_flags: u8,
    pub modify_other_keys: u8,
    pub semantic_state: String,
    pub prompt_marks: usize,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Snapshot of a single cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub content: String,
    #[serde(default, skip_serializing_if = "is_default_color")]
    pub fg: Color,
    #[serde(default, skip_serializing_if = "is_default_color")]
    pub bg: Color,
    /// 0 for continuation, 1 normal, 2 wide
    pub width: u8,
}

fn is_default_color(color: &Color) -> bool {
    *color == Color::Default
}

/// Snapshot of cursor state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub col: usize,
    pub row: usize,
    pub visible: bool,
}

impl From<&Cell> for CellSnapshot {
    fn from(cell: &Cell) -> Self {
        CellSnapshot {
            content: cell.content().to_string(),
            fg: cell.attrs.fg,
            bg: cell.attrs.bg,
            width: cell.width(),
        }
    }
}

impl Snapshot {
    /// Capture the displayed lines of a buffer
    pub fn from_buffer(buffer: &Buffer, cursor_visible: bool) -> Self {
        let mut grid = Vec::with_capacity(buffer.rows());
        let mut tags = Vec::with_capacity(buffer.rows());
        for row in 0..buffer.rows() {
            let line = buffer.visible_line(row);
            grid.push(line.cells().iter().map(CellSnapshot::from).collect());
            tags.push(line.tag());
        }

        Snapshot {
            cols: buffer.cols(),
            rows: buffer.rows(),
            grid,
            tags,
            cursor: CursorSnapshot {
                col: buffer.cursor().col,
                row: buffer.cursor().row,
                visible: cursor_visible,
            },
            alternate_screen: buffer.kind() == BufferKind::Alternate,
            scrollback_lines: buffer.scrollback_len(),
            display_offset: buffer.display_offset(),
            modes: ModesSnapshot::default(),
        }
    }

    /// Convert snapshot to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse snapshot from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Plain text of the grid, trailing spaces and blank rows removed
    pub fn to_text(&self) -> String {
        let mut result = String::new();

        for row in &self.grid {
            for cell in row {
                if cell.width == 0 {
                    continue;
                }
                if cell.content.is_empty() {
                    result.push(' ');
                } else {
                    result.push_str(&cell.content);
                }
            }
            while result.ends_with(' ') {
                result.pop();
            }
            result.push('\n');
        }

        while result.ends_with("\n\n") {
            result.pop();
        }

        result
    }
}
