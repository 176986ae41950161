//! Terminal buffer
//!
//! A buffer is the visible grid of lines plus its cursor, scroll region,
//! tab stops and (for the primary buffer) scrollback history. The terminal
//! owns two of them, primary and alternate, and exactly one is active.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellAttributes};
use super::cursor::{Cursor, SavedCursor};
use super::line::Line;

/// Which of the two buffers this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferKind {
    Primary,
    Alternate,
}

/// Where the last character was written, and the grid size at the time.
/// A later combining character may only merge into it while the size is
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePosition {
    pub col: usize,
    pub row: usize,
    pub cols: usize,
    pub rows: usize,
}

/// A primary or alternate terminal buffer
#[derive(Debug, Clone)]
pub struct Buffer {
    kind: BufferKind,
    cols: usize,
    rows: usize,
    /// Visible lines, top to bottom
    lines: Vec<Line>,
    /// Lines scrolled off the top, oldest first
    scrollback: VecDeque<Line>,
    scrollback_limit: usize,
    /// Lines dropped from the front of history, so absolute rows stay put
    evicted_lines: usize,
    /// How many lines the view is scrolled back into history
    display_offset: usize,
    /// Every visible row must be redrawn (view moved or buffer swapped)
    all_dirty: bool,
    cursor: Cursor,
    saved_cursor: Option<SavedCursor>,
    /// Scroll region, 0-indexed and inclusive
    scroll_top: usize,
    scroll_bottom: usize,
    tab_stops: Vec<bool>,
    tab_width: usize,
    last_write: Option<WritePosition>,
}

impl Buffer {
    /// Create a buffer. The alternate buffer never keeps scrollback.
    pub fn new(kind: BufferKind, cols: usize, rows: usize, scrollback_limit: usize, tab_width: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let tab_width = tab_width.max(1);
        Self {
            kind,
            cols,
            rows,
            lines: (0..rows).map(|_| Line::new(cols)).collect(),
            scrollback: VecDeque::new(),
            scrollback_limit: match kind {
                BufferKind::Primary => scrollback_limit,
                BufferKind::Alternate => 0,
            },
            evicted_lines: 0,
            display_offset: 0,
            all_dirty: true,
            cursor: Cursor::new(),
            saved_cursor: None,
            scroll_top: 0,
            scroll_bottom: rows - 1,
            tab_stops: default_tab_stops(cols, tab_width),
            tab_width,
            last_write: None,
        }
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    /// Visible line at `row` of the live grid, panics if out of bounds
    pub fn line(&self, row: usize) -> &Line {
        &self.lines[row]
    }

    /// Mutable visible line, panics if out of bounds
    pub fn line_mut(&mut self, row: usize) -> &mut Line {
        &mut self.lines[row]
    }

    /// Visible lines of the live grid
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Number of lines held in scrollback
    pub fn scrollback_len(&self) -> usize {
        self.scrollback.len()
    }

    /// Scrollback line, 0 is the oldest
    pub fn scrollback_line(&self, index: usize) -> Option<&Line> {
        self.scrollback.get(index)
    }

    /// Scroll region as (top, bottom), 0-indexed and inclusive
    pub fn scroll_region(&self) -> (usize, usize) {
        (self.scroll_top, self.scroll_bottom)
    }

    /// Last written cell position
    pub fn last_write(&self) -> Option<WritePosition> {
        self.last_write
    }

    /// Lines that have left history for good since the buffer was created
    pub fn evicted_lines(&self) -> usize {
        self.evicted_lines
    }

    /// Row index counted from the first line this buffer ever held.
    /// Stable while lines move into and out of scrollback.
    pub fn absolute_row(&self, row: usize) -> usize {
        self.evicted_lines + self.scrollback.len() + row
    }

    // ------------------------------------------------------------------
    // Display offset
    // ------------------------------------------------------------------

    /// Lines the view is scrolled back into history (0 = live bottom)
    pub fn display_offset(&self) -> usize {
        self.display_offset
    }

    /// Move the view by `delta` lines; positive scrolls back into history
    pub fn scroll_display(&mut self, delta: isize) {
        let max = self.scrollback.len() as isize;
        let offset = (self.display_offset as isize + delta).clamp(0, max) as usize;
        if offset != self.display_offset {
            self.display_offset = offset;
            self.all_dirty = true;
        }
    }

    /// Return the view to the live bottom
    pub fn scroll_to_bottom(&mut self) {
        if self.display_offset != 0 {
            self.display_offset = 0;
            self.all_dirty = true;
        }
    }

    /// Line shown at `row` with the current display offset applied
    pub fn visible_line(&self, row: usize) -> &Line {
        if self.display_offset == 0 {
            return &self.lines[row];
        }
        let index = self.scrollback.len() - self.display_offset + row;
        match self.scrollback.get(index) {
            Some(line) => line,
            None => &self.lines[index - self.scrollback.len()],
        }
    }

    // ------------------------------------------------------------------
    // Dirty tracking
    // ------------------------------------------------------------------

    /// Mark a visible row dirty
    pub fn mark_dirty(&mut self, row: usize) {
        if let Some(line) = self.lines.get_mut(row) {
            line.mark_dirty();
        }
    }

    /// Request a full redraw
    pub fn mark_all_dirty(&mut self) {
        self.all_dirty = true;
    }

    /// Visible rows that changed since the last [`Buffer::clear_dirty`]
    pub fn dirty_rows(&self) -> Vec<usize> {
        if self.all_dirty {
            return (0..self.rows).collect();
        }
        (0..self.rows)
            .filter(|&row| self.visible_line(row).is_dirty())
            .collect()
    }

    /// First and last dirty visible row
    pub fn dirty_range(&self) -> Option<(usize, usize)> {
        let rows = self.dirty_rows();
        Some((*rows.first()?, *rows.last()?))
    }

    /// Acknowledge every visible row as drawn
    pub fn clear_dirty(&mut self) {
        self.all_dirty = false;
        for line in &mut self.lines {
            line.clear_dirty();
        }
        let start = self.scrollback.len() - self.display_offset;
        for line in self.scrollback.iter_mut().skip(start) {
            line.clear_dirty();
        }
    }

    // ------------------------------------------------------------------
    // Character insertion
    // ------------------------------------------------------------------

    fn erase_attrs(&self) -> CellAttributes {
        CellAttributes {
            bg: self.cursor.attrs.bg,
            ..Default::default()
        }
    }

    /// Write a character of `width` 1 or 2 at the cursor and advance.
    /// Handles pending wrap, insert mode and wide characters that do not
    /// fit before the right margin.
    pub fn insert_character(&mut self, content: &str, width: u8, attrs: CellAttributes, insert_mode: bool, autowrap: bool) {
        let width = width.clamp(1, 2);
        let cols = self.cols;

        if self.cursor.pending_wrap {
            if autowrap {
                self.wrap_line();
            } else {
                self.cursor.pending_wrap = false;
            }
        }

        if width == 2 && self.cursor.col + 1 >= cols {
            if cols < 2 {
                return;
            }
            if autowrap {
                let row = self.cursor.row;
                let col = self.cursor.col;
                let blank = self.erase_attrs();
                self.clear_wide_overlap(row, col, 1);
                self.lines[row].set_cell(col, Cell::blank(blank));
                self.wrap_line();
            } else {
                self.cursor.col = cols - 2;
            }
        }

        let row = self.cursor.row;
        let col = self.cursor.col;
        if insert_mode {
            let blank = self.erase_attrs();
            self.lines[row].insert_cells(col, usize::from(width), blank);
        }

        self.clear_wide_overlap(row, col, width);
        let line = &mut self.lines[row];
        line.set_cell(col, Cell::with_content(content, attrs, width));
        if width == 2 {
            line.set_cell(col + 1, Cell::placeholder(attrs));
        }

        self.last_write = Some(WritePosition {
            col,
            row,
            cols,
            rows: self.rows,
        });
        self.cursor.advance(usize::from(width), cols, autowrap);
    }

    /// Blank the other half of any wide character that a write of `width`
    /// at `col` would split
    fn clear_wide_overlap(&mut self, row: usize, col: usize, width: u8) {
        let cols = self.cols;
        let line = &mut self.lines[row];
        if col > 0 && line.cell(col).is_continuation() {
            let attrs = line.cell(col - 1).attrs;
            line.cell_mut(col - 1).clear(attrs);
        }
        let end = col + usize::from(width.max(1));
        if end < cols && line.cell(end).is_continuation() {
            let attrs = line.cell(end).attrs;
            line.cell_mut(end).clear(attrs);
        }
    }

    /// Turn the cell at (`row`, `col`) into a wide cell with a placeholder
    /// after it. Returns false when there is no room to the right.
    pub fn widen_cell(&mut self, row: usize, col: usize) -> bool {
        if col + 1 >= self.cols {
            return false;
        }
        let next = col + 1;
        if next + 1 < self.cols && self.lines[row].cell(next).is_wide() {
            let attrs = self.lines[row].cell(next + 1).attrs;
            self.lines[row].cell_mut(next + 1).clear(attrs);
        }
        let line = &mut self.lines[row];
        let attrs = line.cell(col).attrs;
        let content = line.cell(col).content().to_string();
        line.cell_mut(col).set_content(&content, 2);
        line.set_cell(next, Cell::placeholder(attrs));
        true
    }

    /// Turn a wide cell back into a single-width one, blanking its
    /// placeholder
    pub fn narrow_cell(&mut self, row: usize, col: usize) {
        let cols = self.cols;
        let line = &mut self.lines[row];
        let was_wide = line.cell(col).is_wide();
        let content = line.cell(col).content().to_string();
        line.cell_mut(col).set_content(&content, 1);
        if was_wide && col + 1 < cols && line.cell(col + 1).is_continuation() {
            let attrs = line.cell(col + 1).attrs;
            line.cell_mut(col + 1).clear(attrs);
        }
    }

    /// Soft-wrap: flag the current line and move to the next one
    fn wrap_line(&mut self) {
        let row = self.cursor.row;
        self.lines[row].wrapped = true;
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
        self.index_down();
    }

    /// Move down one row, scrolling at the bottom margin
    fn index_down(&mut self) {
        if self.cursor.row == self.scroll_bottom {
            self.scroll_up(1);
        } else if self.cursor.row + 1 < self.rows {
            self.cursor.row += 1;
        }
    }

    // ------------------------------------------------------------------
    // Control characters
    // ------------------------------------------------------------------

    /// Handle line feed (LF), vertical tab (VT), form feed (FF)
    pub fn linefeed(&mut self) {
        self.cursor.pending_wrap = false;
        self.index_down();
    }

    /// Handle carriage return (CR)
    pub fn carriage_return(&mut self) {
        self.cursor.carriage_return();
    }

    /// Handle backspace (BS)
    pub fn backspace(&mut self) {
        self.cursor.move_left(1);
    }

    /// Handle horizontal tab (HT)
    pub fn tab(&mut self) {
        let cols = self.cols;
        let mut col = self.cursor.col + 1;
        while col < cols && !self.tab_stops[col] {
            col += 1;
        }
        self.cursor.col = col.min(cols - 1);
        self.cursor.pending_wrap = false;
    }

    /// Set a tab stop at the cursor column (HTS)
    pub fn set_tab_stop(&mut self) {
        let col = self.cursor.col;
        self.tab_stops[col] = true;
    }

    /// Clear the tab stop at the cursor (mode 0) or all of them (mode 3)
    pub fn clear_tab_stop(&mut self, mode: u32) {
        match mode {
            0 => {
                let col = self.cursor.col;
                self.tab_stops[col] = false;
            }
            3 => self.tab_stops.iter_mut().for_each(|stop| *stop = false),
            _ => log::debug!("Unknown tab clear mode: {}", mode),
        }
    }

    /// Handle reverse index (RI) - move up, scroll down at the top margin
    pub fn reverse_index(&mut self) {
        if self.cursor.row == self.scroll_top {
            self.scroll_down(1);
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
        }
        self.cursor.pending_wrap = false;
    }

    // ------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------

    /// Scroll the region up by n lines. Lines leaving the top of a
    /// full-height region on the primary buffer go to scrollback.
    pub fn scroll_up(&mut self, n: usize) {
        let (top, bottom) = (self.scroll_top, self.scroll_bottom);
        let n = n.min(bottom - top + 1);
        if n == 0 {
            return;
        }
        let blank = self.erase_attrs();
        for _ in 0..n {
            let line = self.lines.remove(top);
            if top == 0 {
                self.push_scrollback(line);
            }
            self.lines.insert(bottom, Line::with_attrs(self.cols, blank));
        }
        for line in &mut self.lines[top..=bottom] {
            line.mark_dirty();
        }
        if let Some(last) = self.last_write.as_mut() {
            if (top..=bottom).contains(&last.row) {
                if last.row >= top + n {
                    last.row -= n;
                } else {
                    self.last_write = None;
                }
            }
        }
    }

    /// Scroll the region down by n lines
    pub fn scroll_down(&mut self, n: usize) {
        let (top, bottom) = (self.scroll_top, self.scroll_bottom);
        let n = n.min(bottom - top + 1);
        if n == 0 {
            return;
        }
        let blank = self.erase_attrs();
        for _ in 0..n {
            self.lines.remove(bottom);
            self.lines.insert(top, Line::with_attrs(self.cols, blank));
        }
        for line in &mut self.lines[top..=bottom] {
            line.mark_dirty();
        }
        if let Some(last) = self.last_write.as_mut() {
            if (top..=bottom).contains(&last.row) {
                if last.row + n <= bottom {
                    last.row += n;
                } else {
                    self.last_write = None;
                }
            }
        }
    }

    fn push_scrollback(&mut self, line: Line) {
        if self.scrollback_limit == 0 {
            self.evicted_lines += 1;
            return;
        }
        self.scrollback.push_back(line);
        if self.scrollback.len() > self.scrollback_limit {
            self.scrollback.pop_front();
            self.evicted_lines += 1;
        } else if self.display_offset > 0 {
            // keep the viewed history steady while new output arrives
            self.display_offset += 1;
        }
    }

    /// Set the scroll region (0-indexed, inclusive). An empty or inverted
    /// region resets to the full screen. Homes the cursor.
    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let bottom = bottom.min(self.rows - 1);
        if top < bottom {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.reset_scroll_region();
        }
        self.cursor.move_to(0, 0, self.cols, self.rows);
    }

    /// Scroll region back to the full screen
    pub fn reset_scroll_region(&mut self) {
        self.scroll_top = 0;
        self.scroll_bottom = self.rows - 1;
    }

    // ------------------------------------------------------------------
    // Cursor movement
    // ------------------------------------------------------------------

    pub fn move_cursor_to(&mut self, row: usize, col: usize) {
        let (cols, rows) = (self.cols, self.rows);
        self.cursor.move_to(col, row, cols, rows);
    }

    pub fn move_cursor_up(&mut self, n: usize) {
        let top = self.scroll_top;
        self.cursor.move_up(n, top);
    }

    pub fn move_cursor_down(&mut self, n: usize) {
        let (bottom, rows) = (self.scroll_bottom, self.rows);
        self.cursor.move_down(n, bottom, rows);
    }

    pub fn move_cursor_forward(&mut self, n: usize) {
        let cols = self.cols;
        self.cursor.move_right(n, cols);
    }

    pub fn move_cursor_backward(&mut self, n: usize) {
        self.cursor.move_left(n);
    }

    /// Save cursor (DECSC)
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(self.cursor.save());
    }

    /// Restore cursor (DECRC); homes the cursor when nothing was saved
    pub fn restore_cursor(&mut self) {
        let (cols, rows) = (self.cols, self.rows);
        match self.saved_cursor.clone() {
            Some(saved) => self.cursor.restore(&saved, cols, rows),
            None => self.cursor.reset(),
        }
    }

    // ------------------------------------------------------------------
    // Erasing and editing
    // ------------------------------------------------------------------

    /// Erase in display (ED)
    pub fn erase_in_display(&mut self, mode: u32) {
        let attrs = self.erase_attrs();
        let row = self.cursor.row;
        match mode {
            0 => {
                self.erase_in_line(0);
                for line in &mut self.lines[row + 1..] {
                    line.clear(attrs);
                }
            }
            1 => {
                self.erase_in_line(1);
                for line in &mut self.lines[..row] {
                    line.clear(attrs);
                }
            }
            2 => {
                for line in &mut self.lines {
                    line.clear(attrs);
                }
            }
            3 => {
                self.evicted_lines += self.scrollback.len();
                self.scrollback.clear();
                self.display_offset = 0;
                self.all_dirty = true;
            }
            _ => log::debug!("Unknown erase in display mode: {}", mode),
        }
    }

    /// Erase in line (EL)
    pub fn erase_in_line(&mut self, mode: u32) {
        let attrs = self.erase_attrs();
        let (row, col) = (self.cursor.row, self.cursor.col);
        let line = &mut self.lines[row];
        match mode {
            0 => line.clear_from(col, attrs),
            1 => line.clear_to(col, attrs),
            2 => line.clear(attrs),
            _ => log::debug!("Unknown erase in line mode: {}", mode),
        }
    }

    /// Erase n characters from the cursor (ECH)
    pub fn erase_chars(&mut self, n: usize) {
        let attrs = self.erase_attrs();
        let (row, col) = (self.cursor.row, self.cursor.col);
        self.lines[row].replace_cells(col, col + n.max(1), attrs);
    }

    /// Insert n blank characters at the cursor (ICH)
    pub fn insert_chars(&mut self, n: usize) {
        let attrs = self.erase_attrs();
        let (row, col) = (self.cursor.row, self.cursor.col);
        self.lines[row].insert_cells(col, n.max(1), attrs);
    }

    /// Delete n characters at the cursor (DCH)
    pub fn delete_chars(&mut self, n: usize) {
        let attrs = self.erase_attrs();
        let (row, col) = (self.cursor.row, self.cursor.col);
        self.lines[row].delete_cells(col, n.max(1), attrs);
    }

    /// Insert n blank lines at the cursor row inside the scroll region (IL)
    pub fn insert_lines(&mut self, n: usize) {
        let row = self.cursor.row;
        if row < self.scroll_top || row > self.scroll_bottom {
            return;
        }
        let saved_top = self.scroll_top;
        self.scroll_top = row;
        self.scroll_down(n.max(1));
        self.scroll_top = saved_top;
        self.cursor.carriage_return();
    }

    /// Delete n lines at the cursor row inside the scroll region (DL)
    pub fn delete_lines(&mut self, n: usize) {
        let row = self.cursor.row;
        if row < self.scroll_top || row > self.scroll_bottom {
            return;
        }
        let saved_top = self.scroll_top;
        self.scroll_top = row;
        // rows leaving a partial region never reach scrollback
        let n = n.max(1).min(self.scroll_bottom - row + 1);
        let blank = self.erase_attrs();
        for _ in 0..n {
            self.lines.remove(row);
            self.lines.insert(self.scroll_bottom, Line::with_attrs(self.cols, blank));
        }
        for line in &mut self.lines[row..=self.scroll_bottom] {
            line.mark_dirty();
        }
        self.scroll_top = saved_top;
        self.cursor.carriage_return();
        self.last_write = None;
    }

    /// Blank every line and home the cursor
    pub fn clear(&mut self) {
        for line in &mut self.lines {
            line.clear(CellAttributes::default());
            line.set_tag(None);
        }
        self.cursor.reset();
        self.reset_scroll_region();
        self.last_write = None;
    }

    // ------------------------------------------------------------------
    // Resize
    // ------------------------------------------------------------------

    /// Resize the grid. Lines whose length is unchanged stay clean.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        if cols == self.cols && rows == self.rows {
            return;
        }
        let attrs = self.erase_attrs();

        for line in self.lines.iter_mut().chain(self.scrollback.iter_mut()) {
            line.resize(cols, attrs);
        }

        if rows < self.rows {
            // keep the cursor row on screen by pushing the top into history
            let shift = (self.cursor.row + 1).saturating_sub(rows);
            for _ in 0..shift {
                let line = self.lines.remove(0);
                self.push_scrollback(line);
            }
            self.lines.truncate(rows);
            self.cursor.row -= shift;
            if shift > 0 {
                self.all_dirty = true;
            }
        } else {
            while self.lines.len() < rows {
                self.lines.push(Line::with_attrs(cols, attrs));
            }
        }

        if cols != self.cols {
            self.tab_stops = default_tab_stops(cols, self.tab_width);
        }
        self.cols = cols;
        self.rows = rows;
        self.reset_scroll_region();
        self.cursor.col = self.cursor.col.min(cols - 1);
        self.cursor.row = self.cursor.row.min(rows - 1);
        self.cursor.pending_wrap = false;
        self.display_offset = self.display_offset.min(self.scrollback.len());
    }

    // ------------------------------------------------------------------
    // Text extraction
    // ------------------------------------------------------------------

    /// Text of one visible row, trailing blanks trimmed
    pub fn row_text(&self, row: usize) -> String {
        self.lines.get(row).map(Line::text).unwrap_or_default()
    }

    /// Text of the live grid, one line per row, trailing blank rows removed
    pub fn text(&self) -> String {
        let lines: Vec<String> = self.lines.iter().map(Line::text).collect();
        lines.join("\n").trim_end().to_string()
    }
}

fn default_tab_stops(cols: usize, tab_width: usize) -> Vec<bool> {
    (0..cols).map(|col| col % tab_width == 0 && col != 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary(cols: usize, rows: usize) -> Buffer {
        Buffer::new(BufferKind::Primary, cols, rows, 100, 8)
    }

    fn write(buffer: &mut Buffer, text: &str) {
        for c in text.chars() {
            buffer.insert_character(&c.to_string(), 1, CellAttributes::default(), false, true);
        }
    }

    #[test]
    fn test_buffer_new() {
        let buffer = primary(80, 24);
        assert_eq!(buffer.cols(), 80);
        assert_eq!(buffer.rows(), 24);
        assert_eq!(buffer.scroll_region(), (0, 23));
        assert_eq!(buffer.dirty_rows().len(), 24);
    }

    #[test]
    fn test_buffer_insert_and_wrap() {
        let mut buffer = primary(5, 3);
        write(&mut buffer, "HelloWorld");
        assert_eq!(buffer.row_text(0), "Hello");
        assert_eq!(buffer.row_text(1), "World");
        assert!(buffer.line(0).wrapped);
        assert_eq!(buffer.cursor().row, 1);
        assert!(buffer.cursor().pending_wrap);
    }

    #[test]
    fn test_buffer_records_last_write() {
        let mut buffer = primary(10, 3);
        write(&mut buffer, "ab");
        assert_eq!(
            buffer.last_write(),
            Some(WritePosition {
                col: 1,
                row: 0,
                cols: 10,
                rows: 3
            })
        );
    }

    #[test]
    fn test_buffer_wide_char_places_placeholder() {
        let mut buffer = primary(10, 3);
        buffer.insert_character("世", 2, CellAttributes::default(), false, true);
        assert_eq!(buffer.line(0).cell(0).width(), 2);
        assert!(buffer.line(0).cell(1).is_continuation());
        assert_eq!(buffer.cursor().col, 2);
    }

    #[test]
    fn test_buffer_wide_char_wraps_at_margin() {
        let mut buffer = primary(4, 3);
        write(&mut buffer, "abc");
        buffer.insert_character("世", 2, CellAttributes::default(), false, true);
        assert_eq!(buffer.row_text(0), "abc");
        assert_eq!(buffer.line(1).cell(0).content(), "世");
        assert!(buffer.line(1).cell(1).is_continuation());
    }

    #[test]
    fn test_buffer_overwrite_half_of_wide_char() {
        let mut buffer = primary(10, 3);
        buffer.insert_character("世", 2, CellAttributes::default(), false, true);
        buffer.move_cursor_to(0, 1);
        write(&mut buffer, "x");
        assert!(buffer.line(0).cell(0).is_empty());
        assert_eq!(buffer.line(0).cell(0).width(), 1);
        assert_eq!(buffer.line(0).cell(1).content(), "x");
    }

    #[test]
    fn test_buffer_widen_and_narrow() {
        let mut buffer = primary(10, 3);
        write(&mut buffer, "ab");
        assert!(buffer.widen_cell(0, 0));
        assert!(buffer.line(0).cell(0).is_wide());
        assert!(buffer.line(0).cell(1).is_continuation());

        buffer.narrow_cell(0, 0);
        assert_eq!(buffer.line(0).cell(0).width(), 1);
        assert!(!buffer.line(0).cell(1).is_continuation());
        assert!(!buffer.widen_cell(0, 9));
    }

    #[test]
    fn test_buffer_scroll_into_scrollback() {
        let mut buffer = primary(10, 3);
        for i in 0..5 {
            write(&mut buffer, &format!("line{}", i));
            buffer.carriage_return();
            buffer.linefeed();
        }
        assert_eq!(buffer.scrollback_len(), 3);
        assert_eq!(buffer.scrollback_line(0).unwrap().text(), "line0");
        assert_eq!(buffer.row_text(0), "line3");
    }

    #[test]
    fn test_alternate_has_no_scrollback() {
        let mut buffer = Buffer::new(BufferKind::Alternate, 10, 2, 100, 8);
        buffer.linefeed();
        buffer.linefeed();
        buffer.linefeed();
        assert_eq!(buffer.scrollback_len(), 0);
    }

    #[test]
    fn test_buffer_absolute_rows_survive_eviction() {
        let mut buffer = Buffer::new(BufferKind::Primary, 10, 2, 1, 8);
        buffer.linefeed();
        write(&mut buffer, "mark");
        let row = buffer.absolute_row(buffer.cursor().row);
        assert_eq!(row, 1);

        buffer.linefeed();
        buffer.linefeed();
        assert_eq!(buffer.scrollback_len(), 1);
        assert_eq!(buffer.evicted_lines(), 1);
        assert_eq!(buffer.scrollback_line(0).unwrap().text(), "mark");
        assert_eq!(buffer.evicted_lines(), row);

        buffer.erase_in_display(3);
        assert_eq!(buffer.evicted_lines(), 2);
        assert_eq!(buffer.absolute_row(0), 2);
    }

    #[test]
    fn test_buffer_display_offset() {
        let mut buffer = primary(10, 2);
        for i in 0..4 {
            write(&mut buffer, &format!("{}", i));
            buffer.carriage_return();
            buffer.linefeed();
        }
        buffer.clear_dirty();
        buffer.scroll_display(1);
        assert_eq!(buffer.display_offset(), 1);
        assert_eq!(buffer.visible_line(0).text(), "2");
        assert_eq!(buffer.dirty_rows(), vec![0, 1]);

        buffer.scroll_display(100);
        assert_eq!(buffer.display_offset(), buffer.scrollback_len());
        buffer.scroll_to_bottom();
        assert_eq!(buffer.display_offset(), 0);
    }

    #[test]
    fn test_buffer_scroll_region() {
        let mut buffer = primary(10, 5);
        buffer.set_scroll_region(1, 3);
        assert_eq!(buffer.scroll_region(), (1, 3));
        buffer.set_scroll_region(3, 1);
        assert_eq!(buffer.scroll_region(), (0, 4));
    }

    #[test]
    fn test_buffer_region_scroll_skips_scrollback() {
        let mut buffer = primary(10, 5);
        buffer.set_scroll_region(1, 3);
        buffer.move_cursor_to(3, 0);
        buffer.linefeed();
        assert_eq!(buffer.scrollback_len(), 0);
    }

    #[test]
    fn test_buffer_dirty_tracking() {
        let mut buffer = primary(10, 3);
        buffer.clear_dirty();
        assert!(buffer.dirty_rows().is_empty());
        buffer.move_cursor_to(2, 0);
        write(&mut buffer, "x");
        assert_eq!(buffer.dirty_rows(), vec![2]);
        assert_eq!(buffer.dirty_range(), Some((2, 2)));
    }

    #[test]
    fn test_buffer_resize_same_size_keeps_clean() {
        let mut buffer = primary(10, 3);
        buffer.clear_dirty();
        buffer.resize(10, 3);
        assert!(buffer.dirty_rows().is_empty());
    }

    #[test]
    fn test_buffer_resize_columns_dirties_lines() {
        let mut buffer = primary(10, 3);
        buffer.clear_dirty();
        buffer.resize(12, 3);
        assert_eq!(buffer.dirty_rows(), vec![0, 1, 2]);
    }

    #[test]
    fn test_buffer_resize_rows_keeps_cursor_line() {
        let mut buffer = primary(10, 5);
        buffer.move_cursor_to(4, 0);
        write(&mut buffer, "last");
        buffer.resize(10, 2);
        assert_eq!(buffer.cursor().row, 1);
        assert_eq!(buffer.row_text(1), "last");
        assert_eq!(buffer.scrollback_len(), 3);
    }

    #[test]
    fn test_buffer_erase_in_line() {
        let mut buffer = primary(10, 2);
        write(&mut buffer, "0123456789");
        buffer.move_cursor_to(0, 4);
        buffer.erase_in_line(0);
        assert_eq!(buffer.row_text(0), "0123");
    }

    #[test]
    fn test_buffer_insert_delete_lines() {
        let mut buffer = primary(10, 3);
        write(&mut buffer, "a");
        buffer.move_cursor_to(1, 0);
        write(&mut buffer, "b");
        buffer.move_cursor_to(0, 0);
        buffer.insert_lines(1);
        assert_eq!(buffer.row_text(0), "");
        assert_eq!(buffer.row_text(1), "a");
        assert_eq!(buffer.row_text(2), "b");

        buffer.delete_lines(1);
        assert_eq!(buffer.row_text(0), "a");
        assert_eq!(buffer.row_text(1), "b");
    }

    #[test]
    fn test_buffer_tab_stops() {
        let mut buffer = primary(20, 1);
        buffer.tab();
        assert_eq!(buffer.cursor().col, 8);
        buffer.tab();
        assert_eq!(buffer.cursor().col, 16);
        buffer.tab();
        assert_eq!(buffer.cursor().col, 19);
    }

    #[test]
    fn test_buffer_save_restore_cursor() {
        let mut buffer = primary(10, 5);
        buffer.move_cursor_to(3, 4);
        buffer.save_cursor();
        buffer.move_cursor_to(0, 0);
        buffer.restore_cursor();
        assert_eq!((buffer.cursor().row, buffer.cursor().col), (3, 4));
    }
}
