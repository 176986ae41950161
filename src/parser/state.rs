//! Parser state machine

use super::action::{Action, CsiAction, DcsAction, EscAction, OscAction};
use super::params::{Params, MAX_PARAMS};
use super::{ActionCollector, ParseError, ParseErrorKind, Perform};

/// Maximum length for OSC/DCS/APC data
const MAX_STRING_LEN: usize = 65536;
/// Maximum number of intermediate bytes
const MAX_INTERMEDIATES: usize = 4;

const ESC: u8 = 0x1B;
const BEL: u8 = 0x07;
const CAN: u8 = 0x18;
const SUB: u8 = 0x1A;
const DEL: u8 = 0x7F;

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseState {
    /// Normal text processing
    #[default]
    Ground,
    /// After ESC
    Escape,
    /// ESC followed by intermediate bytes
    EscapeIntermediate,
    /// After ESC [
    CsiEntry,
    /// Collecting CSI parameters
    CsiParam,
    /// Collecting CSI intermediate bytes
    CsiIntermediate,
    /// Invalid CSI, consume until the final byte
    CsiIgnore,
    /// After ESC ]
    OscString,
    /// After ESC P, collecting the header
    DcsEntry,
    /// Collecting DCS data
    DcsPassthrough,
    /// Invalid DCS, consume until the terminator
    DcsIgnore,
    /// After ESC _
    ApcString,
    /// After ESC ^ or ESC X, discarded
    IgnoredString,
}

impl ParseState {
    fn is_string(self) -> bool {
        matches!(
            self,
            ParseState::OscString
                | ParseState::DcsPassthrough
                | ParseState::DcsIgnore
                | ParseState::ApcString
                | ParseState::IgnoredString
        )
    }
}

fn is_printable(byte: u8) -> bool {
    (0x20..DEL).contains(&byte) || byte >= 0x80
}

/// The terminal parser
#[derive(Debug, Clone, Default)]
pub struct Parser {
    state: ParseState,
    /// Raw CSI/DCS parameter bytes
    params: Vec<u8>,
    param_count: usize,
    intermediates: Vec<u8>,
    marker: Option<u8>,
    /// Final byte of a DCS header
    dcs_final: u8,
    /// OSC/DCS/APC data
    string: Vec<u8>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Reset to ground, dropping any partial sequence
    pub fn reset(&mut self) {
        self.state = ParseState::Ground;
        self.clear_sequence();
        self.string.clear();
    }

    /// Feed bytes, reporting events to `performer`. Runs of printable bytes
    /// in ground state are delivered as one span.
    pub fn advance<P: Perform>(&mut self, data: &[u8], performer: &mut P) {
        let mut i = 0;
        while i < data.len() {
            if self.state == ParseState::Ground {
                let start = i;
                while i < data.len() && is_printable(data[i]) {
                    i += 1;
                }
                if i > start {
                    performer.print(&data[start..i]);
                }
                if i == data.len() {
                    break;
                }
                performer.print_state_reset();
            }
            let byte = data[i];
            i += 1;
            self.step(byte, performer);
        }
    }

    /// Parse a chunk and collect the events
    pub fn parse(&mut self, data: &[u8]) -> Vec<Action> {
        let mut collector = ActionCollector::default();
        self.advance(data, &mut collector);
        collector.actions
    }

    fn step<P: Perform>(&mut self, byte: u8, performer: &mut P) {
        if self.state.is_string() {
            self.string_byte(byte, performer);
            return;
        }

        match byte {
            ESC => {
                self.enter(ParseState::Escape);
                return;
            }
            CAN | SUB => {
                self.state = ParseState::Ground;
                return;
            }
            0x00..=0x1F => {
                performer.execute(byte);
                return;
            }
            DEL => return,
            _ => {}
        }

        match self.state {
            ParseState::Ground => {}
            ParseState::Escape => self.escape(byte, performer),
            ParseState::EscapeIntermediate => self.escape_intermediate(byte, performer),
            ParseState::CsiEntry | ParseState::CsiParam | ParseState::CsiIntermediate => {
                self.csi(byte, performer)
            }
            ParseState::CsiIgnore => {
                if (0x40..=0x7E).contains(&byte) {
                    self.state = ParseState::Ground;
                }
            }
            ParseState::DcsEntry => self.dcs_entry(byte, performer),
            ParseState::OscString
            | ParseState::DcsPassthrough
            | ParseState::DcsIgnore
            | ParseState::ApcString
            | ParseState::IgnoredString => {}
        }
    }

    fn enter(&mut self, state: ParseState) {
        self.state = state;
        self.clear_sequence();
        if state.is_string() {
            self.string.clear();
        }
    }

    fn clear_sequence(&mut self) {
        self.params.clear();
        self.param_count = 0;
        self.intermediates.clear();
        self.marker = None;
        self.dcs_final = 0;
    }

    fn error<P: Perform>(&mut self, kind: ParseErrorKind, byte: u8, recovery: ParseState, performer: &mut P) {
        let error = ParseError {
            kind,
            byte,
            state: self.state,
            recovery,
        };
        self.state = performer.parse_error(&error);
    }

    fn escape<P: Perform>(&mut self, byte: u8, performer: &mut P) {
        match byte {
            b'[' => self.enter(ParseState::CsiEntry),
            b']' => self.enter(ParseState::OscString),
            b'P' => self.enter(ParseState::DcsEntry),
            b'_' => self.enter(ParseState::ApcString),
            b'^' | b'X' => self.enter(ParseState::IgnoredString),
            // ST outside a string
            b'\\' => self.state = ParseState::Ground,
            0x20..=0x2F => {
                self.intermediates.push(byte);
                self.state = ParseState::EscapeIntermediate;
            }
            0x30..=0x7E => {
                self.state = ParseState::Ground;
                performer.esc_dispatch(&EscAction {
                    intermediates: Vec::new(),
                    final_byte: byte,
                });
            }
            _ => self.error(ParseErrorKind::UnexpectedByte, byte, ParseState::Ground, performer),
        }
    }

    fn escape_intermediate<P: Perform>(&mut self, byte: u8, performer: &mut P) {
        match byte {
            0x20..=0x2F => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                } else {
                    self.error(ParseErrorKind::TooManyIntermediates, byte, ParseState::Ground, performer);
                }
            }
            0x30..=0x7E => {
                self.state = ParseState::Ground;
                let action = EscAction {
                    intermediates: std::mem::take(&mut self.intermediates),
                    final_byte: byte,
                };
                performer.esc_dispatch(&action);
            }
            _ => self.error(ParseErrorKind::UnexpectedByte, byte, ParseState::Ground, performer),
        }
    }

    /// Collect a header byte shared by CSI and DCS. Returns the final byte
    /// once the header is complete.
    fn header<P: Perform>(&mut self, byte: u8, ignore: ParseState, performer: &mut P) -> Option<u8> {
        let collecting_params = self.intermediates.is_empty();
        match byte {
            b'?' | b'>' | b'<' | b'=' => {
                if self.params.is_empty() && self.marker.is_none() && collecting_params {
                    self.marker = Some(byte);
                } else {
                    self.error(ParseErrorKind::MarkerOutOfPlace, byte, ignore, performer);
                }
            }
            b'0'..=b'9' | b';' | b':' if collecting_params => {
                if byte == b';' {
                    self.param_count += 1;
                }
                if self.param_count >= MAX_PARAMS {
                    self.error(ParseErrorKind::TooManyParams, byte, ignore, performer);
                } else {
                    self.params.push(byte);
                }
            }
            0x20..=0x2F => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                } else {
                    self.error(ParseErrorKind::TooManyIntermediates, byte, ignore, performer);
                }
            }
            0x40..=0x7E => return Some(byte),
            _ => self.error(ParseErrorKind::UnexpectedByte, byte, ignore, performer),
        }
        None
    }

    fn csi<P: Perform>(&mut self, byte: u8, performer: &mut P) {
        let Some(final_byte) = self.header(byte, ParseState::CsiIgnore, performer) else {
            if !matches!(self.state, ParseState::CsiIgnore | ParseState::Ground) {
                self.state = if self.intermediates.is_empty() {
                    ParseState::CsiParam
                } else {
                    ParseState::CsiIntermediate
                };
            }
            return;
        };
        self.state = ParseState::Ground;
        let action = CsiAction {
            params: Params::parse(&self.params),
            intermediates: std::mem::take(&mut self.intermediates),
            marker: self.marker,
            final_byte,
        };
        performer.csi_dispatch(&action);
    }

    fn dcs_entry<P: Perform>(&mut self, byte: u8, performer: &mut P) {
        if let Some(final_byte) = self.header(byte, ParseState::DcsIgnore, performer) {
            self.dcs_final = final_byte;
            self.string.clear();
            self.state = ParseState::DcsPassthrough;
        }
    }

    fn string_byte<P: Perform>(&mut self, byte: u8, performer: &mut P) {
        match byte {
            ESC => {
                // ESC ends the string; a following `\` completes ST
                self.finish_string(performer);
                self.enter(ParseState::Escape);
            }
            BEL if self.state == ParseState::OscString => {
                self.finish_string(performer);
                self.state = ParseState::Ground;
            }
            CAN | SUB => {
                self.string.clear();
                self.state = ParseState::Ground;
            }
            _ => {
                let keep = matches!(
                    self.state,
                    ParseState::OscString | ParseState::DcsPassthrough | ParseState::ApcString
                );
                if keep && self.string.len() < MAX_STRING_LEN {
                    self.string.push(byte);
                }
            }
        }
    }

    fn finish_string<P: Perform>(&mut self, performer: &mut P) {
        let data = std::mem::take(&mut self.string);
        match self.state {
            ParseState::OscString => performer.osc_dispatch(&OscAction::from_bytes(&data)),
            ParseState::DcsPassthrough => {
                let action = DcsAction {
                    params: Params::parse(&self.params),
                    intermediates: std::mem::take(&mut self.intermediates),
                    marker: self.marker,
                    final_byte: self.dcs_final,
                    data,
                };
                performer.dcs_dispatch(&action);
            }
            ParseState::ApcString => performer.apc_dispatch(&data),
            _ => {}
        }
    }
}
