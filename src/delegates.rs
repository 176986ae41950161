//! Host callbacks
//!
//! The terminal talks to its host through narrow observer traits. Each
//! slot is optional and held as a [`Weak`] reference: the terminal never
//! keeps an observer alive, and a dropped observer silently stops
//! receiving events.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::BufferKind;
use crate::semantic::SemanticPromptState;

/// Receives protocol replies destined for the hosted process
pub trait OutputDelegate {
    fn send(&self, data: &[u8]);
}

/// Display-affecting events
pub trait DisplayDelegate {
    /// The active buffer switched between primary and alternate
    fn buffer_activated(&self, _kind: BufferKind) {}

    /// Synchronized output began (true) or ended (false)
    fn synchronized_output_changed(&self, _active: bool) {}

    fn show_cursor(&self) {}

    fn hide_cursor(&self) {}

    fn bell(&self) {}

    fn mouse_mode_changed(&self) {}

    fn size_changed(&self, _cols: usize, _rows: usize) {}
}

/// Shell integration events
pub trait SemanticPromptDelegate {
    fn semantic_prompt_changed(&self, _state: SemanticPromptState) {}

    /// Output end was received, with the exit code when the shell gave one
    fn command_completed(&self, _exit_code: Option<i32>) {}
}

/// Optional, non-owning observer slots
#[derive(Default, Clone)]
pub struct Delegates {
    output: Option<Weak<dyn OutputDelegate>>,
    display: Option<Weak<dyn DisplayDelegate>>,
    semantic: Option<Weak<dyn SemanticPromptDelegate>>,
}

impl Delegates {
    pub fn new() -> Self {
        Self::default()
    }

    /// One observer filling every slot
    pub fn unified<T>(delegate: &Rc<T>) -> Self
    where
        T: OutputDelegate + DisplayDelegate + SemanticPromptDelegate + 'static,
    {
        let mut delegates = Self::new();
        delegates.set_output(delegate);
        delegates.set_display(delegate);
        delegates.set_semantic(delegate);
        delegates
    }

    pub fn set_output<T: OutputDelegate + 'static>(&mut self, delegate: &Rc<T>) {
        let weak: Weak<T> = Rc::downgrade(delegate);
        let weak: Weak<dyn OutputDelegate> = weak;
        self.output = Some(weak);
    }

    pub fn set_display<T: DisplayDelegate + 'static>(&mut self, delegate: &Rc<T>) {
        let weak: Weak<T> = Rc::downgrade(delegate);
        let weak: Weak<dyn DisplayDelegate> = weak;
        self.display = Some(weak);
    }

    pub fn set_semantic<T: SemanticPromptDelegate + 'static>(&mut self, delegate: &Rc<T>) {
        let weak: Weak<T> = Rc::downgrade(delegate);
        let weak: Weak<dyn SemanticPromptDelegate> = weak;
        self.semantic = Some(weak);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Live output observer, if any
    pub fn output(&self) -> Option<Rc<dyn OutputDelegate>> {
        self.output.as_ref()?.upgrade()
    }

    pub fn display(&self) -> Option<Rc<dyn DisplayDelegate>> {
        self.display.as_ref()?.upgrade()
    }

    pub fn semantic(&self) -> Option<Rc<dyn SemanticPromptDelegate>> {
        self.semantic.as_ref()?.upgrade()
    }
}

impl fmt::Debug for Delegates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegates")
            .field("output", &self.output().is_some())
            .field("display", &self.display().is_some())
            .field("semantic", &self.semantic().is_some())
            .finish()
    }
}
