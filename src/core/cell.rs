//! Terminal cell representation
//!
//! Each cell holds a grapheme cluster (empty for a blank cell), the display
//! attributes it was written with, and its column width. A wide character
//! occupies two cells: the first has width 2, the second is a width-0
//! placeholder.

use serde::{Deserialize, Serialize};

/// Terminal color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Color {
    /// The renderer's default foreground or background
    #[default]
    Default,
    /// Palette index (0-255)
    Indexed(u8),
    /// 24-bit color
    Rgb(u8, u8, u8),
}

/// Attributes that affect how a cell is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellAttributes {
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Bold text (SGR 1)
    pub bold: bool,
    /// Faint/dim text (SGR 2)
    pub faint: bool,
    /// Italic text (SGR 3)
    pub italic: bool,
    /// Underlined text (SGR 4)
    pub underline: bool,
    /// Blinking text (SGR 5)
    pub blink: bool,
    /// Inverse/reverse video (SGR 7)
    pub inverse: bool,
    /// Hidden/invisible text (SGR 8)
    pub hidden: bool,
    /// Strikethrough text (SGR 9)
    pub strikethrough: bool,
}

impl CellAttributes {
    /// Reset all attributes to default
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A single cell in the terminal grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Grapheme cluster stored in this cell, empty when blank
    content: String,
    /// Display attributes
    pub attrs: CellAttributes,
    /// 1 for normal, 2 for wide, 0 for the placeholder after a wide cell
    width: u8,
}

impl Cell {
    /// Create a blank cell
    pub fn new() -> Self {
        Self {
            content: String::new(),
            attrs: CellAttributes::default(),
            width: 1,
        }
    }

    /// Create a blank cell carrying the given attributes
    pub fn blank(attrs: CellAttributes) -> Self {
        Self {
            content: String::new(),
            attrs,
            width: 1,
        }
    }

    /// Create a cell with content, attributes and width
    pub fn with_content(content: &str, attrs: CellAttributes, width: u8) -> Self {
        Self {
            content: content.to_string(),
            attrs,
            width: width.min(2),
        }
    }

    /// Create the width-0 placeholder that follows a wide cell
    pub fn placeholder(attrs: CellAttributes) -> Self {
        Self {
            content: String::new(),
            attrs,
            width: 0,
        }
    }

    /// Get the character content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the content and width in place
    pub fn set_content(&mut self, content: &str, width: u8) {
        self.content.clear();
        self.content.push_str(content);
        self.width = width.min(2);
    }

    /// Get the display width of this cell
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Last scalar of the content, if any
    pub fn last_char(&self) -> Option<char> {
        self.content.chars().next_back()
    }

    /// Check if cell is blank
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() || self.content == " "
    }

    /// Check if this is the placeholder half of a wide character
    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Check if this cell holds a wide character
    pub fn is_wide(&self) -> bool {
        self.width == 2
    }

    /// Clear the cell, keeping the given attributes
    pub fn clear(&mut self, attrs: CellAttributes) {
        self.content.clear();
        self.attrs = attrs;
        self.width = 1;
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}
