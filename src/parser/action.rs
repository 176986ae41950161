//! Events produced by the parser
//!
//! The parser does not interpret sequences; it hands the terminal the
//! collected pieces of each one.

use super::params::Params;
use super::ParseError;

/// CSI sequence: `ESC [ marker? params intermediates final`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsiAction {
    pub params: Params,
    /// Intermediate bytes (0x20-0x2F)
    pub intermediates: Vec<u8>,
    /// Leading `?`, `>`, `<` or `=`
    pub marker: Option<u8>,
    /// Final byte (0x40-0x7E)
    pub final_byte: u8,
}

impl CsiAction {
    /// Parameter at index with a default for missing or 0
    pub fn param(&self, index: usize, default: u32) -> u32 {
        self.params.get_or(index, default)
    }

    /// Plain sequence with this final byte
    pub fn is(&self, final_byte: u8) -> bool {
        self.final_byte == final_byte && self.intermediates.is_empty() && self.marker.is_none()
    }

    /// Sequence with this marker, no intermediates and this final byte
    pub fn is_marked(&self, marker: u8, final_byte: u8) -> bool {
        self.final_byte == final_byte && self.intermediates.is_empty() && self.marker == Some(marker)
    }
}

/// ESC sequence other than a string or CSI introducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscAction {
    pub intermediates: Vec<u8>,
    pub final_byte: u8,
}

/// OSC string: `ESC ] command ; payload ST`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscAction {
    /// Leading number, None if the string did not start with one
    pub command: Option<u32>,
    /// Bytes after the first `;`
    pub payload: Vec<u8>,
}

impl OscAction {
    pub(super) fn from_bytes(data: &[u8]) -> Self {
        let (head, payload) = match data.iter().position(|&b| b == b';') {
            Some(pos) => (&data[..pos], data[pos + 1..].to_vec()),
            None => (data, Vec::new()),
        };
        let command = std::str::from_utf8(head).ok().and_then(|s| s.parse().ok());
        Self { command, payload }
    }
}

/// DCS string: header collected like a CSI, then the data bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcsAction {
    pub params: Params,
    pub intermediates: Vec<u8>,
    pub marker: Option<u8>,
    pub final_byte: u8,
    pub data: Vec<u8>,
}

/// Owned form of every parser event, for collecting a parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Printable bytes, not yet decoded
    Print(Vec<u8>),
    /// C0 control
    Execute(u8),
    Csi(CsiAction),
    Esc(EscAction),
    Osc(OscAction),
    Dcs(DcsAction),
    Apc(Vec<u8>),
    Error(ParseError),
}
