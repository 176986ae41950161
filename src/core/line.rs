//! Terminal line representation
//!
//! A line is a fixed-length row of cells plus a dirty flag and an optional
//! semantic tag. Any cell mutation, bulk copy or length-changing resize
//! marks the line dirty; a resize to the current length does not.

use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellAttributes};

/// Semantic role of a line, set by OSC 133 prompt markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineTag {
    /// The shell started drawing a prompt on this line
    PromptStart,
    /// User input started on this line
    Input,
    /// Command output started on this line
    Output,
    /// Command output finished on this line
    OutputEnd,
}

/// A single line in the terminal grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Cells in this line
    cells: Vec<Cell>,
    /// Whether this line was soft-wrapped into the next one
    pub wrapped: bool,
    /// Set on mutation, cleared by the consumer after redrawing
    dirty: bool,
    /// Semantic prompt tag
    tag: Option<LineTag>,
}

impl Line {
    /// Create a new line with the specified number of columns
    pub fn new(cols: usize) -> Self {
        Self::with_attrs(cols, CellAttributes::default())
    }

    /// Create a new line whose blank cells carry the given attributes
    pub fn with_attrs(cols: usize, attrs: CellAttributes) -> Self {
        Self {
            cells: vec![Cell::blank(attrs); cols],
            wrapped: false,
            dirty: true,
            tag: None,
        }
    }

    /// Get the number of columns
    pub fn cols(&self) -> usize {
        self.cells.len()
    }

    /// Get a reference to a cell
    pub fn get(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    /// Get cell at column, panics if out of bounds
    pub fn cell(&self, col: usize) -> &Cell {
        &self.cells[col]
    }

    /// Mutable cell access. Counts as a mutation.
    pub fn cell_mut(&mut self, col: usize) -> &mut Cell {
        self.dirty = true;
        &mut self.cells[col]
    }

    /// All cells
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Replace the cell at `col`
    pub fn set_cell(&mut self, col: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(col) {
            *slot = cell;
            self.dirty = true;
        }
    }

    /// Whether the line changed since the last [`Line::clear_dirty`]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force the dirty flag on
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Acknowledge the line as drawn
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Semantic prompt tag
    pub fn tag(&self) -> Option<LineTag> {
        self.tag
    }

    /// Set or remove the semantic prompt tag
    pub fn set_tag(&mut self, tag: Option<LineTag>) {
        self.tag = tag;
    }

    /// Clear the entire line with given attributes
    pub fn clear(&mut self, attrs: CellAttributes) {
        for cell in &mut self.cells {
            cell.clear(attrs);
        }
        self.wrapped = false;
        self.dirty = true;
    }

    /// Fill cells in `start..end` with a copy of `cell`
    fn fill_range(&mut self, start: usize, end: usize, cell: &Cell) {
        let end = end.min(self.cells.len());
        if start >= end {
            return;
        }
        for slot in &mut self.cells[start..end] {
            slot.clone_from(cell);
        }
        self.dirty = true;
    }

    /// Replace cells in `start..end` with blanks carrying `attrs`
    pub fn replace_cells(&mut self, start: usize, end: usize, attrs: CellAttributes) {
        self.fill_range(start, end, &Cell::blank(attrs));
        self.repair_wide_cells();
    }

    /// Clear from column to end of line
    pub fn clear_from(&mut self, col: usize, attrs: CellAttributes) {
        let len = self.cells.len();
        self.replace_cells(col, len, attrs);
    }

    /// Clear from start of line to column (inclusive)
    pub fn clear_to(&mut self, col: usize, attrs: CellAttributes) {
        self.replace_cells(0, col + 1, attrs);
    }

    /// Resize the line to a new column count
    pub fn resize(&mut self, cols: usize, attrs: CellAttributes) {
        if cols == self.cells.len() {
            return;
        }
        self.cells.resize_with(cols, || Cell::blank(attrs));
        self.repair_wide_cells();
        self.dirty = true;
    }

    /// Insert n blank cells at column, shifting cells right.
    /// Cells that shift past the end are lost.
    pub fn insert_cells(&mut self, col: usize, n: usize, attrs: CellAttributes) {
        let len = self.cells.len();
        if col >= len {
            return;
        }
        let n = n.min(len - col);
        self.cells[col..].rotate_right(n);
        for cell in &mut self.cells[col..col + n] {
            cell.clear(attrs);
        }
        self.repair_wide_cells();
        self.dirty = true;
    }

    /// Delete n cells at column, shifting cells left.
    /// New cells at the end are blank.
    pub fn delete_cells(&mut self, col: usize, n: usize, attrs: CellAttributes) {
        let len = self.cells.len();
        if col >= len {
            return;
        }
        let n = n.min(len - col);
        self.cells[col..].rotate_left(n);
        for cell in &mut self.cells[len - n..] {
            cell.clear(attrs);
        }
        self.repair_wide_cells();
        self.dirty = true;
    }

    /// Blank wide cells that lost their placeholder (or sit in the last
    /// column) and placeholders that lost their wide cell
    fn repair_wide_cells(&mut self) {
        let len = self.cells.len();
        for col in 0..len {
            let broken = if self.cells[col].is_wide() {
                col + 1 >= len || !self.cells[col + 1].is_continuation()
            } else if self.cells[col].is_continuation() {
                col == 0 || !self.cells[col - 1].is_wide()
            } else {
                false
            };
            if broken {
                let attrs = self.cells[col].attrs;
                self.cells[col].clear(attrs);
            }
        }
    }

    /// Get the text content of this line, trailing blanks trimmed
    pub fn text(&self) -> String {
        let mut result = String::new();
        for cell in &self.cells {
            if cell.is_continuation() {
                continue;
            }
            let content = cell.content();
            if content.is_empty() {
                result.push(' ');
            } else {
                result.push_str(content);
            }
        }
        result.trim_end().to_string()
    }

    /// Check if the line is blank
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }
}
