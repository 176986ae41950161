//! Mochi VT Core
//!
//! The state machine at the heart of a terminal emulator. Raw bytes from a
//! host process are turned into grid mutations and mode transitions, and
//! mode queries flow back out as reply bytes.
//!
//! - `compose`: byte reader with put-back and the UTF-8 character composer
//! - `core`: cells, lines, buffers, cursor, charsets and snapshots
//! - `modes`: the mode registry (keyboard protocols, paste, mouse, DECRQM)
//! - `semantic`: OSC 133 semantic prompt tracking
//! - `sync`: the synchronized output gate
//! - `parser`: VT500-style escape sequence tokenizer
//! - `input`: key encoders for legacy, modifyOtherKeys and kitty forms
//! - `terminal`: the executor that wires everything together
//!
//! All processing is single-threaded and synchronous: a call to
//! [`Terminal::feed`] runs to completion before it returns.

pub mod compose;
pub mod config;
pub mod core;
pub mod delegates;
pub mod error;
pub mod input;
pub mod modes;
pub mod parser;
pub mod semantic;
pub mod sync;
pub mod terminal;

pub use config::TerminalOptions;
pub use delegates::{Delegates, DisplayDelegate, OutputDelegate, SemanticPromptDelegate};
pub use error::{Error, Result};
pub use terminal::{Fallbacks, Terminal};
