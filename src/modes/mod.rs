//! Terminal mode registry
//!
//! Every negotiated protocol extension is a separate family implementing
//! [`ModeFamily`]. The registry answers DECRQM queries and resets all
//! families together on soft reset (DECSTR) and on host cleanup.
//!
//! The alternate screen and synchronized output are switched by the
//! terminal itself since they swap buffers; the terminal answers their
//! queries before consulting the registry.

mod keyboard;

use serde::{Deserialize, Serialize};

pub use keyboard::{KittyKeyboard, KittyKeyboardFlags, KittySetMode, ModifyOtherKeys, MAX_MODIFY_OTHER_KEYS};

/// DECRPM status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeStatus {
    NotRecognized = 0,
    Set = 1,
    Reset = 2,
    PermanentlySet = 3,
    PermanentlyReset = 4,
}

impl ModeStatus {
    pub fn from_bool(value: bool) -> Self {
        if value {
            ModeStatus::Set
        } else {
            ModeStatus::Reset
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// One independent piece of negotiated state
pub trait ModeFamily {
    /// DECRPM status for this family
    fn status(&self) -> ModeStatus;

    /// Restore defaults on DECSTR
    fn soft_reset(&mut self);

    /// Restore defaults when the hosted process exits
    fn cleanup_for_exit(&mut self);
}

/// An on/off mode with a default value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagMode {
    value: bool,
    default: bool,
}

impl FlagMode {
    pub const fn new(default: bool) -> Self {
        Self {
            value: default,
            default,
        }
    }

    pub fn get(&self) -> bool {
        self.value
    }

    pub fn set(&mut self, value: bool) {
        self.value = value;
    }
}

impl ModeFamily for FlagMode {
    fn status(&self) -> ModeStatus {
        ModeStatus::from_bool(self.value)
    }

    fn soft_reset(&mut self) {
        self.value = self.default;
    }

    fn cleanup_for_exit(&mut self) {
        self.value = self.default;
    }
}

/// Which mouse events are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MouseTracking {
    #[default]
    Off,
    /// Mode 9, press only
    X10,
    /// Mode 1000, press and release
    Normal,
    /// Mode 1002, also motion with a button held
    ButtonEvent,
    /// Mode 1003, all motion
    AnyEvent,
}

impl MouseTracking {
    fn from_mode(mode: u32) -> Option<Self> {
        match mode {
            9 => Some(MouseTracking::X10),
            1000 => Some(MouseTracking::Normal),
            1002 => Some(MouseTracking::ButtonEvent),
            1003 => Some(MouseTracking::AnyEvent),
            _ => None,
        }
    }
}

/// Mouse tracking family; one of modes 9/1000/1002/1003 at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseMode {
    tracking: MouseTracking,
}

impl MouseMode {
    pub fn tracking(&self) -> MouseTracking {
        self.tracking
    }

    fn set(&mut self, mode: u32, value: bool) {
        let Some(tracking) = MouseTracking::from_mode(mode) else {
            return;
        };
        if value {
            self.tracking = tracking;
        } else if self.tracking == tracking {
            self.tracking = MouseTracking::Off;
        }
    }

    fn status_of(&self, mode: u32) -> ModeStatus {
        ModeStatus::from_bool(MouseTracking::from_mode(mode) == Some(self.tracking))
    }
}

impl ModeFamily for MouseMode {
    fn status(&self) -> ModeStatus {
        ModeStatus::from_bool(self.tracking != MouseTracking::Off)
    }

    fn soft_reset(&mut self) {
        self.tracking = MouseTracking::Off;
    }

    fn cleanup_for_exit(&mut self) {
        self.tracking = MouseTracking::Off;
    }
}

/// The terminal's mode families
#[derive(Debug, Clone)]
pub struct Modes {
    pub kitty_keyboard: KittyKeyboard,
    pub modify_other_keys: ModifyOtherKeys,
    /// DEC 2004
    pub bracketed_paste: FlagMode,
    /// DEC 25 (DECTCEM)
    pub cursor_visible: FlagMode,
    /// DEC 1 (DECCKM)
    pub application_cursor: FlagMode,
    /// DECKPAM / DECKPNM
    pub application_keypad: FlagMode,
    /// DEC 7 (DECAWM)
    pub autowrap: FlagMode,
    /// DEC 1004
    pub focus_reporting: FlagMode,
    /// DEC 1006
    pub mouse_sgr: FlagMode,
    pub mouse: MouseMode,
    /// ANSI 4 (IRM)
    pub insert_mode: FlagMode,
    /// ANSI 20 (LNM)
    pub linefeed_mode: FlagMode,
}

impl Modes {
    pub fn new(kitty_stack_depth: usize) -> Self {
        Self {
            kitty_keyboard: KittyKeyboard::new(kitty_stack_depth),
            modify_other_keys: ModifyOtherKeys::default(),
            bracketed_paste: FlagMode::new(false),
            cursor_visible: FlagMode::new(true),
            application_cursor: FlagMode::new(false),
            application_keypad: FlagMode::new(false),
            autowrap: FlagMode::new(true),
            focus_reporting: FlagMode::new(false),
            mouse_sgr: FlagMode::new(false),
            mouse: MouseMode::default(),
            insert_mode: FlagMode::new(false),
            linefeed_mode: FlagMode::new(false),
        }
    }

    fn families_mut(&mut self) -> [&mut dyn ModeFamily; 12] {
        [
            &mut self.kitty_keyboard,
            &mut self.modify_other_keys,
            &mut self.bracketed_paste,
            &mut self.cursor_visible,
            &mut self.application_cursor,
            &mut self.application_keypad,
            &mut self.autowrap,
            &mut self.focus_reporting,
            &mut self.mouse_sgr,
            &mut self.mouse,
            &mut self.insert_mode,
            &mut self.linefeed_mode,
        ]
    }

    /// Soft reset every family
    pub fn soft_reset(&mut self) {
        for family in self.families_mut() {
            family.soft_reset();
        }
    }

    /// Reset every family after the hosted process exited
    pub fn cleanup_for_exit(&mut self) {
        for family in self.families_mut() {
            family.cleanup_for_exit();
        }
    }

    /// Set a DEC private mode. Returns false if the mode is not handled here.
    pub fn set_private_mode(&mut self, mode: u32, value: bool) -> bool {
        match mode {
            1 => self.application_cursor.set(value),
            7 => self.autowrap.set(value),
            25 => self.cursor_visible.set(value),
            9 | 1000 | 1002 | 1003 => self.mouse.set(mode, value),
            1004 => self.focus_reporting.set(value),
            1006 => self.mouse_sgr.set(value),
            2004 => self.bracketed_paste.set(value),
            _ => return false,
        }
        true
    }

    /// Set an ANSI mode. Returns false if the mode is not handled here.
    pub fn set_ansi_mode(&mut self, mode: u32, value: bool) -> bool {
        match mode {
            4 => self.insert_mode.set(value),
            20 => self.linefeed_mode.set(value),
            _ => return false,
        }
        true
    }

    /// DECRPM status of a DEC private mode
    pub fn private_status(&self, mode: u32) -> ModeStatus {
        match mode {
            1 => self.application_cursor.status(),
            7 => self.autowrap.status(),
            25 => self.cursor_visible.status(),
            9 | 1000 | 1002 | 1003 => self.mouse.status_of(mode),
            1004 => self.focus_reporting.status(),
            1006 => self.mouse_sgr.status(),
            2004 => self.bracketed_paste.status(),
            2048 => self.modify_other_keys.status(),
            _ => ModeStatus::NotRecognized,
        }
    }

    /// DECRPM status of an ANSI mode
    pub fn ansi_status(&self, mode: u32) -> ModeStatus {
        match mode {
            4 => self.insert_mode.status(),
            20 => self.linefeed_mode.status(),
            _ => ModeStatus::NotRecognized,
        }
    }
}

impl Default for Modes {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_KITTY_STACK_DEPTH)
    }
}

/// DECRPM reply for a private mode: `ESC [ ? mode ; status $ y`
pub fn private_mode_report(mode: u32, status: ModeStatus) -> String {
    format!("\x1b[?{};{}$y", mode, status.code())
}

/// DECRPM reply for an ANSI mode: `ESC [ mode ; status $ y`
pub fn ansi_mode_report(mode: u32, status: ModeStatus) -> String {
    format!("\x1b[{};{}$y", mode, status.code())
}
