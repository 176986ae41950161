//! Input Encoding Module
//!
//! Encodes key presses into the byte sequences a hosted application
//! expects. Which form is produced depends on the negotiated keyboard
//! protocol:
//!
//! - Legacy: C0 controls, `ESC` prefixes for Alt, `CSI`/`SS3` for
//!   cursor and function keys
//! - modifyOtherKeys (xterm `CSI > 4 ; n m`): modified keys that legacy
//!   encoding cannot distinguish are sent as `CSI code ; mask u`
//! - Kitty keyboard protocol: disambiguated keys as `CSI code ; mask u`
//!
//! Modifier masks are always `1 + (shift 1 | alt 2 | ctrl 4 | meta 8)`.

use bitflags::bitflags;

use crate::modes::{KittyKeyboardFlags, Modes};

bitflags! {
    /// Keyboard modifiers, with the bit values used on the wire
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const ALT = 2;
        const CTRL = 4;
        const META = 8;
    }
}

impl Modifiers {
    /// The modifier parameter for CSI sequences (1 + bitmask)
    pub fn csi_param(self) -> u32 {
        1 + u32::from(self.bits())
    }
}

/// `CSI code u`, or `CSI code ; mask u` when modifiers are held
pub fn csi_u(code: u32, modifiers: Modifiers) -> Vec<u8> {
    if modifiers.is_empty() {
        format!("\x1b[{}u", code).into_bytes()
    } else {
        format!("\x1b[{};{}u", code, modifiers.csi_param()).into_bytes()
    }
}

/// `CSI n ~`, or `CSI n ; mask ~` when modifiers are held
pub fn csi_functional(number: u32, modifiers: Modifiers) -> Vec<u8> {
    if modifiers.is_empty() {
        format!("\x1b[{}~", number).into_bytes()
    } else {
        format!("\x1b[{};{}~", number, modifiers.csi_param()).into_bytes()
    }
}

/// `CSI L`, or `CSI 1 ; mask L` when modifiers are held
pub fn csi_arrow(suffix: u8, modifiers: Modifiers) -> Vec<u8> {
    if modifiers.is_empty() {
        vec![0x1b, b'[', suffix]
    } else {
        format!("\x1b[1;{}{}", modifiers.csi_param(), suffix as char).into_bytes()
    }
}

/// Keys that can be encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A key producing text
    Char(char),

    // Cursor keys
    Up,
    Down,
    Left,
    Right,

    // Navigation
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,

    /// Function key F1-F12
    F(u8),

    // Editing
    Backspace,
    Tab,
    Enter,
    Escape,
}

/// The keyboard-related modes an encoder needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardState {
    pub application_cursor: bool,
    pub kitty_flags: KittyKeyboardFlags,
    pub modify_other_keys: u8,
}

impl KeyboardState {
    pub fn from_modes(modes: &Modes) -> Self {
        Self {
            application_cursor: modes.application_cursor.get(),
            kitty_flags: modes.kitty_keyboard.current(),
            modify_other_keys: modes.modify_other_keys.level(),
        }
    }

    fn kitty(&self) -> bool {
        self.kitty_flags.intersects(
            KittyKeyboardFlags::DISAMBIGUATE_ESCAPE_CODES | KittyKeyboardFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES,
        )
    }

    fn report_all(&self) -> bool {
        self.kitty_flags.contains(KittyKeyboardFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES)
    }
}

/// Encode a key press for the given keyboard state
pub fn encode_key(key: Key, modifiers: Modifiers, state: &KeyboardState) -> Vec<u8> {
    match key {
        Key::Char(c) => encode_char(c, modifiers, state),

        // Cursor keys
        Key::Up => encode_cursor_key(b'A', modifiers, state.application_cursor),
        Key::Down => encode_cursor_key(b'B', modifiers, state.application_cursor),
        Key::Right => encode_cursor_key(b'C', modifiers, state.application_cursor),
        Key::Left => encode_cursor_key(b'D', modifiers, state.application_cursor),
        Key::Home => encode_cursor_key(b'H', modifiers, state.application_cursor),
        Key::End => encode_cursor_key(b'F', modifiers, state.application_cursor),

        // Navigation keys
        Key::Insert => csi_functional(2, modifiers),
        Key::Delete => csi_functional(3, modifiers),
        Key::PageUp => csi_functional(5, modifiers),
        Key::PageDown => csi_functional(6, modifiers),

        Key::F(n) => encode_function_key(n, modifiers),

        Key::Backspace => encode_editing_key(0x7f, modifiers, state),
        Key::Tab => encode_editing_key(0x09, modifiers, state),
        Key::Enter => encode_editing_key(0x0d, modifiers, state),
        Key::Escape => encode_editing_key(0x1b, modifiers, state),
    }
}

/// Encode a cursor key (arrows, Home, End)
fn encode_cursor_key(code: u8, modifiers: Modifiers, application_mode: bool) -> Vec<u8> {
    if modifiers.is_empty() && application_mode {
        vec![0x1b, b'O', code]
    } else {
        csi_arrow(code, modifiers)
    }
}

/// Encode F1-F12. F1-F4 use SS3 unless modified.
fn encode_function_key(number: u8, modifiers: Modifiers) -> Vec<u8> {
    let code = match number {
        1 => b'P',
        2 => b'Q',
        3 => b'R',
        4 => b'S',
        5 => return csi_functional(15, modifiers),
        6..=10 => return csi_functional(u32::from(number) + 11, modifiers),
        11 | 12 => return csi_functional(u32::from(number) + 12, modifiers),
        _ => {
            log::debug!("No encoding for F{}", number);
            return Vec::new();
        }
    };

    if modifiers.is_empty() {
        vec![0x1b, b'O', code]
    } else {
        csi_arrow(code, modifiers)
    }
}

/// Backspace, Tab, Enter and Escape
fn encode_editing_key(code: u8, modifiers: Modifiers, state: &KeyboardState) -> Vec<u8> {
    let plain_escape = code == 0x1b && modifiers.is_empty();
    if state.report_all() || (state.kitty() && (!modifiers.is_empty() || plain_escape)) {
        return csi_u(u32::from(code), modifiers);
    }
    if state.modify_other_keys >= 2 && !modifiers.is_empty() {
        return csi_u(u32::from(code), modifiers);
    }

    match code {
        0x09 if modifiers.contains(Modifiers::SHIFT) => b"\x1b[Z".to_vec(),
        0x7f if modifiers.contains(Modifiers::CTRL) => vec![0x08],
        _ if modifiers.intersects(Modifiers::ALT | Modifiers::META) => vec![0x1b, code],
        _ => vec![code],
    }
}

/// Legacy control byte for Ctrl+c, if one exists
fn legacy_control(c: char) -> Option<u8> {
    match c {
        'a'..='z' | 'A'..='Z' => Some(c.to_ascii_uppercase() as u8 - b'@'),
        '@' | ' ' | '2' => Some(0x00),
        '[' | '3' => Some(0x1b),
        '\\' | '4' => Some(0x1c),
        ']' | '5' => Some(0x1d),
        '^' | '6' => Some(0x1e),
        '_' | '/' | '7' => Some(0x1f),
        '?' | '8' => Some(0x7f),
        _ => None,
    }
}

/// Encode a text-producing key
fn encode_char(c: char, modifiers: Modifiers, state: &KeyboardState) -> Vec<u8> {
    let shift_only = (modifiers - Modifiers::SHIFT).is_empty();

    if state.report_all() || (state.kitty() && !shift_only) {
        // Kitty reports the unshifted key
        let code = c.to_lowercase().next().unwrap_or(c);
        return csi_u(u32::from(code), modifiers);
    }

    let ambiguous = match state.modify_other_keys {
        0 => false,
        1 => {
            modifiers.contains(Modifiers::CTRL)
                && (legacy_control(c).is_none() || modifiers.contains(Modifiers::SHIFT))
        }
        _ => !shift_only,
    };
    if ambiguous {
        return csi_u(u32::from(c), modifiers);
    }

    let mut bytes = Vec::with_capacity(5);
    if modifiers.intersects(Modifiers::ALT | Modifiers::META) {
        bytes.push(0x1b);
    }
    match legacy_control(c) {
        Some(control) if modifiers.contains(Modifiers::CTRL) => bytes.push(control),
        _ => {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
    bytes
}

/// Encode pasted text, wrapping it in `CSI 200 ~` / `CSI 201 ~` when
/// bracketed paste is on. Any end marker inside the text is removed so a
/// paste cannot terminate itself early.
pub fn encode_paste(text: &str, bracketed: bool) -> Vec<u8> {
    if !bracketed {
        return text.replace("\r\n", "\r").replace('\n', "\r").into_bytes();
    }
    let body = text.replace("\x1b[201~", "");
    let mut bytes = Vec::with_capacity(body.len() + 12);
    bytes.extend_from_slice(b"\x1b[200~");
    bytes.extend_from_slice(body.as_bytes());
    bytes.extend_from_slice(b"\x1b[201~");
    bytes
}

/// Encode focus in/out events (DEC 1004)
pub fn encode_focus(focused: bool) -> Vec<u8> {
    if focused {
        b"\x1b[I".to_vec()
    } else {
        b"\x1b[O".to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy() -> KeyboardState {
        KeyboardState::default()
    }

    fn kitty(flags: KittyKeyboardFlags) -> KeyboardState {
        KeyboardState {
            kitty_flags: flags,
            ..Default::default()
        }
    }

    fn other_keys(level: u8) -> KeyboardState {
        KeyboardState {
            modify_other_keys: level,
            ..Default::default()
        }
    }

    #[test]
    fn test_modifier_param() {
        assert_eq!(Modifiers::empty().csi_param(), 1);
        assert_eq!(Modifiers::SHIFT.csi_param(), 2);
        assert_eq!(Modifiers::ALT.csi_param(), 3);
        assert_eq!(Modifiers::CTRL.csi_param(), 5);
        assert_eq!((Modifiers::SHIFT | Modifiers::CTRL).csi_param(), 6);
        assert_eq!(Modifiers::all().csi_param(), 16);
    }

    #[test]
    fn test_csi_u() {
        assert_eq!(csi_u(97, Modifiers::empty()), b"\x1b[97u");
        assert_eq!(csi_u(97, Modifiers::SHIFT), b"\x1b[97;2u");
        assert_eq!(csi_u(97, Modifiers::CTRL), b"\x1b[97;5u");
        assert_eq!(csi_u(13, Modifiers::empty()), b"\x1b[13u");
    }

    #[test]
    fn test_csi_functional() {
        assert_eq!(csi_functional(15, Modifiers::empty()), b"\x1b[15~");
        assert_eq!(csi_functional(15, Modifiers::SHIFT), b"\x1b[15;2~");
        assert_eq!(csi_functional(3, Modifiers::CTRL), b"\x1b[3;5~");
    }

    #[test]
    fn test_csi_arrow() {
        assert_eq!(csi_arrow(b'A', Modifiers::empty()), b"\x1b[A");
        assert_eq!(csi_arrow(b'A', Modifiers::CTRL), b"\x1b[1;5A");
        assert_eq!(csi_arrow(b'B', Modifiers::SHIFT), b"\x1b[1;2B");
    }

    #[test]
    fn test_cursor_keys() {
        let mut state = legacy();
        assert_eq!(encode_key(Key::Up, Modifiers::empty(), &state), b"\x1b[A");
        state.application_cursor = true;
        assert_eq!(encode_key(Key::Up, Modifiers::empty(), &state), b"\x1bOA");
        assert_eq!(encode_key(Key::Up, Modifiers::SHIFT, &state), b"\x1b[1;2A");
    }

    #[test]
    fn test_function_keys() {
        let state = legacy();
        assert_eq!(encode_key(Key::F(1), Modifiers::empty(), &state), b"\x1bOP");
        assert_eq!(encode_key(Key::F(1), Modifiers::CTRL, &state), b"\x1b[1;5P");
        assert_eq!(encode_key(Key::F(5), Modifiers::empty(), &state), b"\x1b[15~");
        assert_eq!(encode_key(Key::F(6), Modifiers::empty(), &state), b"\x1b[17~");
        assert_eq!(encode_key(Key::F(10), Modifiers::empty(), &state), b"\x1b[21~");
        assert_eq!(encode_key(Key::F(12), Modifiers::empty(), &state), b"\x1b[24~");
        assert!(encode_key(Key::F(13), Modifiers::empty(), &state).is_empty());
    }

    #[test]
    fn test_legacy_chars() {
        let state = legacy();
        assert_eq!(encode_key(Key::Char('a'), Modifiers::empty(), &state), b"a");
        assert_eq!(encode_key(Key::Char('c'), Modifiers::CTRL, &state), vec![0x03]);
        assert_eq!(encode_key(Key::Char('x'), Modifiers::ALT, &state), b"\x1bx");
        assert_eq!(encode_key(Key::Char('é'), Modifiers::empty(), &state), "é".as_bytes());
    }

    #[test]
    fn test_legacy_editing_keys() {
        let state = legacy();
        assert_eq!(encode_key(Key::Backspace, Modifiers::empty(), &state), b"\x7f");
        assert_eq!(encode_key(Key::Backspace, Modifiers::CTRL, &state), b"\x08");
        assert_eq!(encode_key(Key::Tab, Modifiers::SHIFT, &state), b"\x1b[Z");
        assert_eq!(encode_key(Key::Enter, Modifiers::ALT, &state), b"\x1b\r");
        assert_eq!(encode_key(Key::Escape, Modifiers::empty(), &state), b"\x1b");
    }

    #[test]
    fn test_kitty_disambiguate() {
        let state = kitty(KittyKeyboardFlags::DISAMBIGUATE_ESCAPE_CODES);
        assert_eq!(encode_key(Key::Escape, Modifiers::empty(), &state), b"\x1b[27u");
        assert_eq!(encode_key(Key::Char('c'), Modifiers::CTRL, &state), b"\x1b[99;5u");
        assert_eq!(encode_key(Key::Char('A'), Modifiers::SHIFT | Modifiers::CTRL, &state), b"\x1b[97;6u");
        assert_eq!(encode_key(Key::Char('a'), Modifiers::empty(), &state), b"a");
        assert_eq!(encode_key(Key::Enter, Modifiers::empty(), &state), b"\r");
        assert_eq!(encode_key(Key::Enter, Modifiers::SHIFT, &state), b"\x1b[13;2u");
    }

    #[test]
    fn test_kitty_report_all_keys() {
        let state = kitty(KittyKeyboardFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES);
        assert_eq!(encode_key(Key::Char('a'), Modifiers::empty(), &state), b"\x1b[97u");
        assert_eq!(encode_key(Key::Enter, Modifiers::empty(), &state), b"\x1b[13u");
    }

    #[test]
    fn test_modify_other_keys_level_one() {
        let state = other_keys(1);
        // Ctrl+letter already has an unambiguous legacy form
        assert_eq!(encode_key(Key::Char('c'), Modifiers::CTRL, &state), vec![0x03]);
        assert_eq!(encode_key(Key::Char('1'), Modifiers::CTRL, &state), b"\x1b[49;5u");
        assert_eq!(encode_key(Key::Char('C'), Modifiers::CTRL | Modifiers::SHIFT, &state), b"\x1b[67;6u");
        assert_eq!(encode_key(Key::Char('x'), Modifiers::ALT, &state), b"\x1bx");
    }

    #[test]
    fn test_modify_other_keys_level_two() {
        let state = other_keys(2);
        assert_eq!(encode_key(Key::Char('c'), Modifiers::CTRL, &state), b"\x1b[99;5u");
        assert_eq!(encode_key(Key::Char('x'), Modifiers::ALT, &state), b"\x1b[120;3u");
        assert_eq!(encode_key(Key::Char('X'), Modifiers::SHIFT, &state), b"X");
        assert_eq!(encode_key(Key::Enter, Modifiers::CTRL, &state), b"\x1b[13;5u");
    }

    #[test]
    fn test_state_from_modes() {
        let mut modes = Modes::default();
        modes.kitty_keyboard.push(KittyKeyboardFlags::DISAMBIGUATE_ESCAPE_CODES);
        modes.modify_other_keys.set_level(2);
        modes.application_cursor.set(true);
        let state = KeyboardState::from_modes(&modes);
        assert_eq!(state.kitty_flags, KittyKeyboardFlags::DISAMBIGUATE_ESCAPE_CODES);
        assert_eq!(state.modify_other_keys, 2);
        assert!(state.application_cursor);
    }

    #[test]
    fn test_bracketed_paste() {
        assert_eq!(encode_paste("hi\n", false), b"hi\r");
        assert_eq!(encode_paste("hi", true), b"\x1b[200~hi\x1b[201~");
        assert_eq!(encode_paste("a\x1b[201~b", true), b"\x1b[200~ab\x1b[201~");
    }

    #[test]
    fn test_focus_events() {
        assert_eq!(encode_focus(true), b"\x1b[I");
        assert_eq!(encode_focus(false), b"\x1b[O");
    }
}
