//! Byte to cell pipeline
//!
//! - [`ByteReader`]: put-back buffering across chunk boundaries
//! - [`Composer`]: UTF-8 decoding, width and grapheme merging
//! - [`unicode`]: width and classification helpers

mod composer;
mod reader;
pub mod unicode;

pub use composer::{Composer, PrintContext};
pub use reader::{ByteReader, ReadSpan};
