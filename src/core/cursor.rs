//! Cursor state management
//!
//! Handles cursor position, pending wrap and the saved cursor (DECSC/DECRC).
//! Visibility is a mode and lives in the mode registry.

use serde::{Deserialize, Serialize};

use super::cell::CellAttributes;

/// Cursor state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Column position (0-indexed)
    pub col: usize,
    /// Row position (0-indexed)
    pub row: usize,
    /// Attributes applied to newly written cells
    pub attrs: CellAttributes,
    /// Cursor sits past the right margin; the next printable wraps first
    pub pending_wrap: bool,
}

/// Saved cursor state (DECSC)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCursor {
    pub col: usize,
    pub row: usize,
    pub attrs: CellAttributes,
    pub pending_wrap: bool,
}

impl Cursor {
    /// Create a new cursor at the home position
    pub fn new() -> Self {
        Self::default()
    }

    /// Column including the pending wrap, in `0..=cols`
    pub fn logical_col(&self) -> usize {
        self.col + usize::from(self.pending_wrap)
    }

    /// Move cursor to absolute position, clamping to bounds
    pub fn move_to(&mut self, col: usize, row: usize, cols: usize, rows: usize) {
        self.col = col.min(cols.saturating_sub(1));
        self.row = row.min(rows.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Move cursor up by n rows, stopping at `top`
    pub fn move_up(&mut self, n: usize, top: usize) {
        let min_row = if self.row >= top { top } else { 0 };
        self.row = self.row.saturating_sub(n).max(min_row);
        self.pending_wrap = false;
    }

    /// Move cursor down by n rows, stopping at `bottom`
    pub fn move_down(&mut self, n: usize, bottom: usize, rows: usize) {
        let max_row = if self.row <= bottom {
            bottom
        } else {
            rows.saturating_sub(1)
        };
        self.row = (self.row + n).min(max_row);
        self.pending_wrap = false;
    }

    /// Move cursor left by n columns, stopping at column 0
    pub fn move_left(&mut self, n: usize) {
        self.col = self.col.saturating_sub(n);
        self.pending_wrap = false;
    }

    /// Move cursor right by n columns, stopping at the right margin
    pub fn move_right(&mut self, n: usize, cols: usize) {
        self.col = (self.col + n).min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Advance by n columns as a printed character does. Reaching the right
    /// margin parks the cursor on the last column with a pending wrap.
    pub fn advance(&mut self, n: usize, cols: usize, autowrap: bool) {
        let target = self.logical_col() + n;
        if target >= cols {
            self.col = cols.saturating_sub(1);
            self.pending_wrap = autowrap;
        } else {
            self.col = target;
            self.pending_wrap = false;
        }
    }

    /// Step back one column, undoing a pending wrap first
    pub fn retreat(&mut self) {
        if self.pending_wrap {
            self.pending_wrap = false;
        } else {
            self.col = self.col.saturating_sub(1);
        }
    }

    /// Carriage return - move to column 0
    pub fn carriage_return(&mut self) {
        self.col = 0;
        self.pending_wrap = false;
    }

    /// Save cursor state
    pub fn save(&self) -> SavedCursor {
        SavedCursor {
            col: self.col,
            row: self.row,
            attrs: self.attrs,
            pending_wrap: self.pending_wrap,
        }
    }

    /// Restore cursor state
    pub fn restore(&mut self, saved: &SavedCursor, cols: usize, rows: usize) {
        self.col = saved.col.min(cols.saturating_sub(1));
        self.row = saved.row.min(rows.saturating_sub(1));
        self.attrs = saved.attrs;
        self.pending_wrap = saved.pending_wrap;
    }

    /// Reset cursor to default state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
