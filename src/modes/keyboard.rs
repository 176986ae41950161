//! Keyboard reporting modes
//!
//! Two independent negotiations: the kitty keyboard protocol, a bounded
//! stack of flag sets (`CSI > f u` push, `CSI < n u` pop, `CSI = f ; m u`
//! set, `CSI ? u` query), and xterm's modifyOtherKeys level
//! (`CSI > 4 ; v m`).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::{ModeFamily, ModeStatus};
use crate::config::DEFAULT_KITTY_STACK_DEPTH;

bitflags! {
    /// Kitty progressive enhancement flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
    pub struct KittyKeyboardFlags: u8 {
        const DISAMBIGUATE_ESCAPE_CODES = 1 << 0;
        const REPORT_EVENT_TYPES = 1 << 1;
        const REPORT_ALTERNATE_KEYS = 1 << 2;
        const REPORT_ALL_KEYS_AS_ESCAPE_CODES = 1 << 3;
        const REPORT_ASSOCIATED_TEXT = 1 << 4;
    }
}

/// How `CSI = flags ; mode u` combines with the current flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KittySetMode {
    Replace,
    Union,
    Difference,
}

impl KittySetMode {
    pub fn from_param(param: u32) -> Option<Self> {
        match param {
            0 | 1 => Some(KittySetMode::Replace),
            2 => Some(KittySetMode::Union),
            3 => Some(KittySetMode::Difference),
            _ => None,
        }
    }
}

/// Kitty keyboard flag stack. Pushing onto a full stack evicts the oldest
/// entry; popping more entries than exist leaves the stack empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KittyKeyboard {
    stack: Vec<KittyKeyboardFlags>,
    max_depth: usize,
}

impl KittyKeyboard {
    pub fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Flags in effect: the top of the stack, or none
    pub fn current(&self) -> KittyKeyboardFlags {
        self.stack.last().copied().unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self, flags: KittyKeyboardFlags) {
        if self.stack.len() == self.max_depth {
            self.stack.remove(0);
        }
        self.stack.push(flags);
        log::trace!("kitty keyboard push {:?}, depth {}", flags, self.stack.len());
    }

    /// Pop `count` entries, saturating at an empty stack
    pub fn pop(&mut self, count: usize) {
        let keep = self.stack.len().saturating_sub(count);
        self.stack.truncate(keep);
        log::trace!("kitty keyboard pop {}, depth {}", count, self.stack.len());
    }

    /// Modify the top entry, creating one if the stack is empty
    pub fn set(&mut self, flags: KittyKeyboardFlags, mode: KittySetMode) {
        let current = self.current();
        let next = match mode {
            KittySetMode::Replace => flags,
            KittySetMode::Union => current | flags,
            KittySetMode::Difference => current - flags,
        };
        match self.stack.last_mut() {
            Some(top) => *top = next,
            None => self.stack.push(next),
        }
    }

    /// Reply to `CSI ? u`
    pub fn query_response(&self) -> String {
        format!("\x1b[?{}u", self.current().bits())
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

impl Default for KittyKeyboard {
    fn default() -> Self {
        Self::new(DEFAULT_KITTY_STACK_DEPTH)
    }
}

impl ModeFamily for KittyKeyboard {
    fn status(&self) -> ModeStatus {
        ModeStatus::from_bool(!self.current().is_empty())
    }

    fn soft_reset(&mut self) {
        self.clear();
    }

    fn cleanup_for_exit(&mut self) {
        self.clear();
    }
}

/// Highest modifyOtherKeys level
pub const MAX_MODIFY_OTHER_KEYS: u8 = 2;

/// xterm modifyOtherKeys level, 0 to 2
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifyOtherKeys {
    level: u8,
}

impl ModifyOtherKeys {
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Set the level, saturating at the maximum
    pub fn set_level(&mut self, value: u32) {
        self.level = value.min(u32::from(MAX_MODIFY_OTHER_KEYS)) as u8;
        log::trace!("modifyOtherKeys level {}", self.level);
    }

    /// Apply `CSI > resource ; value m`. Only resource 4 is tracked; a
    /// missing value resets it.
    pub fn apply(&mut self, params: &[u32]) {
        match params.first().copied().unwrap_or(0) {
            4 => match params.get(1) {
                Some(&value) => self.set_level(value),
                None => self.reset(),
            },
            resource => log::debug!("Ignoring XTMODKEYS resource {}", resource),
        }
    }

    /// Apply `CSI > resource n`, which disables the resource
    pub fn disable(&mut self, params: &[u32]) {
        if params.first().copied().unwrap_or(0) == 4 {
            self.reset();
        } else {
            log::debug!("Ignoring XTMODKEYS disable {:?}", params);
        }
    }

    pub fn reset(&mut self) {
        self.level = 0;
    }
}

impl ModeFamily for ModifyOtherKeys {
    fn status(&self) -> ModeStatus {
        ModeStatus::from_bool(self.level > 0)
    }

    fn soft_reset(&mut self) {
        self.reset();
    }

    fn cleanup_for_exit(&mut self) {
        self.reset();
    }
}
