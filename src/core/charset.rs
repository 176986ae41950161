//! Legacy single-byte character sets
//!
//! G0-G3 designations (`ESC ( X` and friends) select remap tables that the
//! character composer consults for bytes below 0x7F. Every mapped entry
//! occupies exactly one cell.

use serde::{Deserialize, Serialize};

/// Character set designations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Charset {
    /// US ASCII, no remapping
    #[default]
    Ascii,
    /// DEC Special Graphics (line drawing)
    DecSpecialGraphics,
    /// UK national set, only `#` differs
    Uk,
}

impl Charset {
    /// Parse the final byte of a designation sequence
    pub fn from_designation(final_byte: u8) -> Charset {
        match final_byte {
            b'0' | b'2' => Charset::DecSpecialGraphics,
            b'A' => Charset::Uk,
            _ => Charset::Ascii,
        }
    }

    /// Look up a byte in this set's remap table
    pub fn map(self, byte: u8) -> Option<char> {
        match self {
            Charset::Ascii => None,
            Charset::DecSpecialGraphics => dec_special_graphics(byte),
            Charset::Uk => (byte == b'#').then_some('£'),
        }
    }
}

fn dec_special_graphics(byte: u8) -> Option<char> {
    let c = match byte {
        b'`' => '◆',
        b'a' => '▒',
        b'b' => '␉',
        b'c' => '␌',
        b'd' => '␍',
        b'e' => '␊',
        b'f' => '°',
        b'g' => '±',
        b'h' => '␤',
        b'i' => '␋',
        b'j' => '┘',
        b'k' => '┐',
        b'l' => '┌',
        b'm' => '└',
        b'n' => '┼',
        b'o' => '⎺',
        b'p' => '⎻',
        b'q' => '─',
        b'r' => '⎼',
        b's' => '⎽',
        b't' => '├',
        b'u' => '┤',
        b'v' => '┴',
        b'w' => '┬',
        b'x' => '│',
        b'y' => '≤',
        b'z' => '≥',
        b'{' => 'π',
        b'|' => '≠',
        b'}' => '£',
        b'~' => '·',
        _ => return None,
    };
    Some(c)
}

/// Character set state for G0-G3 slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharsetState {
    slots: [Charset; 4],
    /// Slot invoked into GL (0 = G0, 1 = G1)
    active: u8,
    /// Slot used for the next character only (SS2/SS3)
    single_shift: Option<u8>,
}

impl CharsetState {
    /// Create new charset state with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to default state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The charset that applies to the next character
    pub fn current(&self) -> Charset {
        let slot = self.single_shift.unwrap_or(self.active);
        self.slots[usize::from(slot & 3)]
    }

    /// Designate a charset into slot 0-3
    pub fn designate(&mut self, slot: u8, charset: Charset) {
        if let Some(entry) = self.slots.get_mut(usize::from(slot)) {
            *entry = charset;
        }
    }

    /// Shift In (SI) - select G0 into GL
    pub fn shift_in(&mut self) {
        self.active = 0;
        self.single_shift = None;
    }

    /// Shift Out (SO) - select G1 into GL
    pub fn shift_out(&mut self) {
        self.active = 1;
        self.single_shift = None;
    }

    /// Use G2 or G3 for the next character only
    pub fn single_shift(&mut self, slot: u8) {
        self.single_shift = Some(slot);
    }

    /// Remap a byte through the charset in effect, consuming any single
    /// shift. Bytes at or above 0x7F never remap.
    pub fn map_byte(&mut self, byte: u8) -> Option<char> {
        if byte >= 0x7F {
            return None;
        }
        let charset = self.current();
        self.single_shift = None;
        charset.map(byte)
    }
}
