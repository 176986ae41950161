//! Terminal Core Module
//!
//! Platform-independent grid state. This module contains:
//! - Cell representation with attributes
//! - Lines with dirty flags and semantic tags
//! - Cursor state and positioning
//! - Legacy character sets
//! - Primary and alternate buffers with scrollback
//! - Deterministic snapshot generation

mod buffer;
mod cell;
mod charset;
mod cursor;
mod line;
mod snapshot;

pub use buffer::{Buffer, BufferKind, WritePosition};
pub use cell::{Cell, CellAttributes, Color};
pub use charset::{Charset, CharsetState};
pub use cursor::{Cursor, SavedCursor};
pub use line::{Line, LineTag};
pub use snapshot::{CellSnapshot, CursorSnapshot, ModesSnapshot, Snapshot};
