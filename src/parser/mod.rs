//! Terminal escape sequence parser
//!
//! A VT500-style state machine that splits a byte stream into print spans,
//! C0 controls and CSI/ESC/OSC/DCS/APC sequences, and hands them to a
//! [`Perform`] implementation. Printable bytes are passed through
//! undecoded; UTF-8 is the composer's job.
//!
//! Based on the VT500-series parser model from <https://vt100.net/emu/dec_ansi_parser>

mod action;
mod params;
mod state;

pub use action::{Action, CsiAction, DcsAction, EscAction, OscAction};
pub use params::{Params, MAX_PARAMS};
pub use state::{ParseState, Parser};

/// What went wrong while collecting a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A byte that has no meaning in the current state
    UnexpectedByte,
    /// A `? > < =` marker after parameters started
    MarkerOutOfPlace,
    /// More than [`MAX_PARAMS`] parameters
    TooManyParams,
    /// More intermediate bytes than any sequence uses
    TooManyIntermediates,
}

/// A grammar error, reported before the parser moves to `recovery`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub byte: u8,
    /// State the byte arrived in
    pub state: ParseState,
    /// State the parser will continue in unless the handler picks another
    pub recovery: ParseState,
}

/// Receiver of parser events
pub trait Perform {
    /// A run of printable bytes (0x20-0x7E and 0x80-0xFF)
    fn print(&mut self, data: &[u8]);

    /// A C0 control character
    fn execute(&mut self, byte: u8);

    fn csi_dispatch(&mut self, action: &CsiAction);

    fn esc_dispatch(&mut self, action: &EscAction);

    fn osc_dispatch(&mut self, action: &OscAction);

    fn dcs_dispatch(&mut self, _action: &DcsAction) {}

    fn apc_dispatch(&mut self, _data: &[u8]) {}

    /// Called when printable text is interrupted by anything else
    fn print_state_reset(&mut self) {}

    /// Grammar error; returns the state to continue in
    fn parse_error(&mut self, error: &ParseError) -> ParseState {
        log::warn!("Parse error: {:?}", error);
        error.recovery
    }
}

/// Collects every event as an owned [`Action`]
#[derive(Debug, Default)]
pub struct ActionCollector {
    pub actions: Vec<Action>,
}

impl Perform for ActionCollector {
    fn print(&mut self, data: &[u8]) {
        self.actions.push(Action::Print(data.to_vec()));
    }

    fn execute(&mut self, byte: u8) {
        self.actions.push(Action::Execute(byte));
    }

    fn csi_dispatch(&mut self, action: &CsiAction) {
        self.actions.push(Action::Csi(action.clone()));
    }

    fn esc_dispatch(&mut self, action: &EscAction) {
        self.actions.push(Action::Esc(action.clone()));
    }

    fn osc_dispatch(&mut self, action: &OscAction) {
        self.actions.push(Action::Osc(action.clone()));
    }

    fn dcs_dispatch(&mut self, action: &DcsAction) {
        self.actions.push(Action::Dcs(action.clone()));
    }

    fn apc_dispatch(&mut self, data: &[u8]) {
        self.actions.push(Action::Apc(data.to_vec()));
    }

    fn parse_error(&mut self, error: &ParseError) -> ParseState {
        self.actions.push(Action::Error(*error));
        error.recovery
    }
}
