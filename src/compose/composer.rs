//! Character composer
//!
//! Turns print spans into cells. Bytes are decoded as UTF-8 through the
//! put-back reader; each decoded character is either written as a new cell
//! or merged into the previously written one (combining marks, skin tone
//! modifiers, presentation selectors and zero width joiner sequences).

use super::reader::ByteReader;
use super::unicode::{
    accepts_emoji_presentation, column_width, expected_utf8_len, grapheme_count, str_width,
    wants_merge, EMOJI_PRESENTATION, TEXT_PRESENTATION, ZERO_WIDTH_JOINER,
};
use crate::core::{Buffer, CharsetState};

/// Terminal state the composer writes through
#[derive(Debug)]
pub struct PrintContext<'a> {
    pub buffer: &'a mut Buffer,
    pub charset: &'a mut CharsetState,
    pub insert_mode: bool,
    pub autowrap: bool,
}

/// UTF-8 decoding and grapheme composition for print spans
#[derive(Debug, Clone, Default)]
pub struct Composer {
    reader: ByteReader,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of an incomplete sequence waiting for the next span
    pub fn pending(&self) -> &[u8] {
        self.reader.pending()
    }

    /// Forget any incomplete sequence. Called whenever a non-print event
    /// interrupts the text stream.
    pub fn reset(&mut self) {
        self.reader.reset();
    }

    /// Write a print span at the cursor
    pub fn print(&mut self, data: &[u8], ctx: &mut PrintContext<'_>) {
        let row = ctx.buffer.cursor().row;
        ctx.buffer.mark_dirty(row);

        let mut span = self.reader.prepare(data);
        while let Some(lead) = span.get_next() {
            let len = expected_utf8_len(lead);
            if len <= 1 {
                if lead < 127 {
                    if let Some(mapped) = ctx.charset.map_byte(lead) {
                        insert(ctx, mapped, 1);
                        continue;
                    }
                }
                write_lone_byte(ctx, lead);
                continue;
            }

            let len = len as usize;
            if span.bytes_left() < len - 1 {
                span.putback(lead);
                return;
            }
            let mut bytes = [lead, 0, 0, 0];
            for slot in bytes.iter_mut().take(len).skip(1) {
                *slot = span.get_next().unwrap_or(0);
            }
            let c = match std::str::from_utf8(&bytes[..len]).ok().and_then(|s| s.chars().next()) {
                Some(c) => c,
                None => {
                    log::trace!("Invalid UTF-8 sequence {:02x?}", &bytes[..len]);
                    write_lone_byte(ctx, lead);
                    continue;
                }
            };
            compose(ctx, c);
        }
        span.done();
    }
}

/// A byte that does not start a sequence is taken as a scalar by itself
fn write_lone_byte(ctx: &mut PrintContext<'_>, byte: u8) {
    let c = char::from(byte);
    let width = column_width(c);
    if width > 0 {
        insert(ctx, c, width as u8);
    }
}

fn compose(ctx: &mut PrintContext<'_>, c: char) {
    let width = column_width(c);
    if width < 0 {
        return;
    }
    if (wants_merge(c) || last_written_ends_with_zwj(ctx.buffer)) && merge(ctx, c) {
        return;
    }
    if width == 0 {
        return;
    }
    insert(ctx, c, width as u8);
}

fn insert(ctx: &mut PrintContext<'_>, c: char, width: u8) {
    let mut utf8 = [0u8; 4];
    let attrs = ctx.buffer.cursor().attrs;
    ctx.buffer
        .insert_character(c.encode_utf8(&mut utf8), width, attrs, ctx.insert_mode, ctx.autowrap);
}

/// Position of the last written cell, if the grid has not changed size
fn merge_target(buffer: &Buffer) -> Option<(usize, usize)> {
    let last = buffer.last_write()?;
    if last.cols != buffer.cols() || last.rows != buffer.rows() {
        return None;
    }
    Some((last.row, last.col.min(buffer.cols() - 1)))
}

fn last_written_ends_with_zwj(buffer: &Buffer) -> bool {
    merge_target(buffer)
        .and_then(|(row, col)| buffer.line(row).cell(col).last_char())
        .is_some_and(|c| c == ZERO_WIDTH_JOINER)
}

/// Try to fold `c` into the last written cell. Returns false when the
/// result would not be a single grapheme cluster.
fn merge(ctx: &mut PrintContext<'_>, c: char) -> bool {
    let Some((row, col)) = merge_target(ctx.buffer) else {
        return false;
    };
    let cols = ctx.buffer.cols();
    let cell = ctx.buffer.line(row).cell(col);
    let Some(base) = cell.content().chars().next() else {
        return false;
    };
    let mut merged = cell.content().to_string();
    merged.push(c);
    if grapheme_count(&merged) != 1 {
        return false;
    }
    let old_width = cell.width();

    match c {
        EMOJI_PRESENTATION => {
            if !accepts_emoji_presentation(base) {
                return true;
            }
            if old_width == 2 {
                set_content(ctx.buffer, row, col, &merged, 2);
            } else if ctx.buffer.widen_cell(row, col) {
                set_content(ctx.buffer, row, col, &merged, 2);
                ctx.buffer.cursor_mut().advance(1, cols, ctx.autowrap);
            } else {
                set_content(ctx.buffer, row, col, &merged, old_width);
            }
        }
        TEXT_PRESENTATION => {
            if !accepts_emoji_presentation(base) {
                return true;
            }
            ctx.buffer.narrow_cell(row, col);
            set_content(ctx.buffer, row, col, &merged, 1);
            if old_width == 2 {
                ctx.buffer.cursor_mut().retreat();
            }
        }
        _ => {
            let new_width = (str_width(&merged).max(0) as u8).max(old_width);
            if new_width > old_width && ctx.buffer.widen_cell(row, col) {
                set_content(ctx.buffer, row, col, &merged, new_width);
                ctx.buffer.cursor_mut().advance(1, cols, ctx.autowrap);
            } else {
                set_content(ctx.buffer, row, col, &merged, old_width);
            }
        }
    }
    ctx.buffer.mark_dirty(row);
    true
}

fn set_content(buffer: &mut Buffer, row: usize, col: usize, content: &str, width: u8) {
    buffer.line_mut(row).cell_mut(col).set_content(content, width);
}
