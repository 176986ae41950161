//! Synchronized output (DEC 2026)
//!
//! While active, consumers see a copy of the buffer taken when the mode was
//! enabled. Parsing keeps mutating the live buffer; ending the mode reveals
//! it in one step.

use crate::core::Buffer;

#[derive(Debug, Clone, Default)]
pub struct SynchronizedOutput {
    frozen: Option<Buffer>,
}

impl SynchronizedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.frozen.is_some()
    }

    /// Freeze a copy of `live`. Returns false if already active, in which
    /// case the original copy is kept.
    pub fn begin(&mut self, live: &Buffer) -> bool {
        if self.frozen.is_some() {
            return false;
        }
        self.frozen = Some(live.clone());
        true
    }

    /// Drop the frozen copy. Returns false if the mode was not active.
    pub fn end(&mut self) -> bool {
        self.frozen.take().is_some()
    }

    /// The copy consumers should draw while active
    pub fn frozen(&self) -> Option<&Buffer> {
        self.frozen.as_ref()
    }

    pub fn frozen_mut(&mut self) -> Option<&mut Buffer> {
        self.frozen.as_mut()
    }
}
