//! Terminal Executor
//!
//! Ties together the parser, the composer, both buffers and the mode
//! registry. Parsed events are applied to the active buffer; queries are
//! answered through the output delegate.

use std::fmt;
use std::mem;

use crate::compose::{Composer, PrintContext};
use crate::config::TerminalOptions;
use crate::core::{
    Buffer, BufferKind, Charset, CharsetState, Color, LineTag, ModesSnapshot, Snapshot,
};
use crate::delegates::Delegates;
use crate::error::Result;
use crate::input::{self, Key, KeyboardState, Modifiers};
use crate::modes::{
    ansi_mode_report, private_mode_report, KittyKeyboardFlags, KittySetMode, ModeStatus, Modes,
    MouseTracking,
};
use crate::parser::{
    CsiAction, DcsAction, EscAction, OscAction, Params, ParseError, ParseState, Parser, Perform,
};
use crate::semantic::{PromptMark, SemanticCommand, SemanticPromptState, SemanticPrompts};
use crate::sync::SynchronizedOutput;

/// OSC command number for shell integration marks
const OSC_SEMANTIC_PROMPT: u32 = 133;

/// Handlers for events the terminal does not act on. Each defaults to
/// logging the event and ignoring it.
pub struct Fallbacks {
    pub csi: Box<dyn FnMut(&CsiAction)>,
    pub esc: Box<dyn FnMut(&EscAction)>,
    pub osc: Box<dyn FnMut(&OscAction)>,
    pub dcs: Box<dyn FnMut(&DcsAction)>,
    pub apc: Box<dyn FnMut(&[u8])>,
    pub execute: Box<dyn FnMut(u8)>,
    /// Returns the state the parser continues in
    pub error: Box<dyn FnMut(&ParseError) -> ParseState>,
}

impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            csi: Box::new(|csi: &CsiAction| {
                log::debug!(
                    "Unhandled CSI: marker={:?} params={:?} intermediates={:?} final={}",
                    csi.marker.map(char::from),
                    csi.params.values(),
                    csi.intermediates,
                    csi.final_byte as char
                )
            }),
            esc: Box::new(|esc: &EscAction| {
                log::debug!(
                    "Unhandled ESC: intermediates={:?} final={}",
                    esc.intermediates,
                    esc.final_byte as char
                )
            }),
            osc: Box::new(|osc: &OscAction| {
                log::debug!("Unhandled OSC {:?}: {} payload bytes", osc.command, osc.payload.len())
            }),
            dcs: Box::new(|dcs: &DcsAction| {
                log::debug!("Unhandled DCS final={}: {} data bytes", dcs.final_byte as char, dcs.data.len())
            }),
            apc: Box::new(|data: &[u8]| log::debug!("Ignoring APC: {} bytes", data.len())),
            execute: Box::new(|byte: u8| log::debug!("Ignoring control 0x{:02x}", byte)),
            error: Box::new(|error: &ParseError| {
                log::warn!("Parse error: {:?}", error);
                error.recovery
            }),
        }
    }
}

impl fmt::Debug for Fallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fallbacks").finish_non_exhaustive()
    }
}

/// Terminal state machine: bytes in, grid mutations and replies out
#[derive(Debug)]
pub struct Terminal {
    options: TerminalOptions,
    parser: Parser,
    composer: Composer,
    primary: Buffer,
    alternate: Buffer,
    active: BufferKind,
    charset: CharsetState,
    modes: Modes,
    sync: SynchronizedOutput,
    semantic: SemanticPrompts,
    delegates: Delegates,
    fallbacks: Fallbacks,
    /// Replies produced while no output delegate was registered
    pending_responses: Vec<u8>,
}

impl Terminal {
    /// Create a terminal with default options. Sizes below 1 are raised to 1.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self::build(TerminalOptions::with_size(cols.max(1), rows.max(1)))
    }

    /// Create a terminal from validated options
    pub fn with_options(options: TerminalOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(options))
    }

    fn build(options: TerminalOptions) -> Self {
        let (cols, rows) = (options.cols, options.rows);
        Self {
            parser: Parser::new(),
            composer: Composer::new(),
            primary: Buffer::new(BufferKind::Primary, cols, rows, options.scrollback_lines, options.tab_width),
            alternate: Buffer::new(BufferKind::Alternate, cols, rows, 0, options.tab_width),
            active: BufferKind::Primary,
            charset: CharsetState::new(),
            modes: Modes::new(options.kitty_stack_depth),
            sync: SynchronizedOutput::new(),
            semantic: SemanticPrompts::new(),
            delegates: Delegates::new(),
            fallbacks: Fallbacks::default(),
            pending_responses: Vec::new(),
            options,
        }
    }

    /// Process bytes from the hosted process
    pub fn feed(&mut self, data: &[u8]) {
        let mut parser = mem::take(&mut self.parser);
        parser.advance(data, self);
        self.parser = parser;
    }

    pub fn options(&self) -> &TerminalOptions {
        &self.options
    }

    pub fn cols(&self) -> usize {
        self.buffer().cols()
    }

    pub fn rows(&self) -> usize {
        self.buffer().rows()
    }

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    /// The live active buffer
    pub fn buffer(&self) -> &Buffer {
        match self.active {
            BufferKind::Primary => &self.primary,
            BufferKind::Alternate => &self.alternate,
        }
    }

    fn buffer_mut(&mut self) -> &mut Buffer {
        match self.active {
            BufferKind::Primary => &mut self.primary,
            BufferKind::Alternate => &mut self.alternate,
        }
    }

    /// The buffer consumers should draw: the frozen copy while
    /// synchronized output is active, else the live buffer
    pub fn display_buffer(&self) -> &Buffer {
        self.sync.frozen().unwrap_or_else(|| self.buffer())
    }

    pub fn is_alternate_active(&self) -> bool {
        self.active == BufferKind::Alternate
    }

    pub fn active_buffer_kind(&self) -> BufferKind {
        self.active
    }

    fn enter_alternate(&mut self, clear: bool) {
        if self.active == BufferKind::Alternate {
            return;
        }
        if clear {
            self.alternate.clear();
        }
        self.alternate.cursor_mut().attrs = self.primary.cursor().attrs;
        self.activate(BufferKind::Alternate);
    }

    fn leave_alternate(&mut self) {
        if self.active == BufferKind::Primary {
            return;
        }
        self.activate(BufferKind::Primary);
    }

    fn activate(&mut self, kind: BufferKind) {
        self.active = kind;
        self.composer.reset();
        self.buffer_mut().mark_all_dirty();
        log::trace!("active buffer {:?}", kind);
        if let Some(display) = self.delegates.display() {
            display.buffer_activated(kind);
        }
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    pub fn kitty_keyboard_flags(&self) -> KittyKeyboardFlags {
        self.modes.kitty_keyboard.current()
    }

    pub fn modify_other_keys_level(&self) -> u8 {
        self.modes.modify_other_keys.level()
    }

    /// Either keyboard enhancement protocol is negotiated
    pub fn is_enhanced_key_reporting_active(&self) -> bool {
        !self.kitty_keyboard_flags().is_empty() || self.modify_other_keys_level() > 0
    }

    pub fn bracketed_paste(&self) -> bool {
        self.modes.bracketed_paste.get()
    }

    pub fn cursor_visible(&self) -> bool {
        self.modes.cursor_visible.get()
    }

    pub fn is_synchronized_output_active(&self) -> bool {
        self.sync.is_active()
    }

    fn begin_synchronized_output(&mut self) {
        let started = match self.active {
            BufferKind::Primary => self.sync.begin(&self.primary),
            BufferKind::Alternate => self.sync.begin(&self.alternate),
        };
        if started {
            log::trace!("synchronized output begin");
            if let Some(display) = self.delegates.display() {
                display.synchronized_output_changed(true);
            }
        }
    }

    fn end_synchronized_output(&mut self) {
        if self.sync.end() {
            log::trace!("synchronized output end");
            self.buffer_mut().mark_all_dirty();
            if let Some(display) = self.delegates.display() {
                display.synchronized_output_changed(false);
            }
        }
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        if self.modes.cursor_visible.get() == visible {
            return;
        }
        self.modes.cursor_visible.set(visible);
        self.notify_cursor_visibility();
    }

    fn notify_cursor_visibility(&self) {
        if let Some(display) = self.delegates.display() {
            if self.modes.cursor_visible.get() {
                display.show_cursor();
            } else {
                display.hide_cursor();
            }
        }
    }

    /// Soft reset (DECSTR). Every mode family returns to its default,
    /// synchronized output ends and the prompt state becomes unknown.
    /// Grid content is left alone.
    pub fn soft_reset(&mut self) {
        let reporter = ModeReporter::capture(self);
        self.modes.soft_reset();
        self.end_synchronized_output();
        self.semantic.reset_state();
        self.charset.reset();
        let buffer = self.buffer_mut();
        buffer.cursor_mut().attrs.reset();
        buffer.cursor_mut().pending_wrap = false;
        buffer.reset_scroll_region();
        reporter.notify(self);
        log::debug!("Soft reset performed");
    }

    /// Restore defaults after the hosted process exits: a soft reset that
    /// also leaves the alternate buffer
    pub fn cleanup_for_exit(&mut self) {
        let reporter = ModeReporter::capture(self);
        self.modes.cleanup_for_exit();
        self.end_synchronized_output();
        self.leave_alternate();
        self.semantic.reset_state();
        reporter.notify(self);
        log::debug!("Cleanup for exit performed");
    }

    /// Full reset (RIS): fresh buffers, default modes, no prompt history.
    /// Also drops any partial escape sequence left by an earlier feed.
    pub fn reset_to_initial_state(&mut self) {
        self.parser.reset();
        self.full_reset();
    }

    /// RIS as received in the byte stream; the parser is already in ground
    fn full_reset(&mut self) {
        let reporter = ModeReporter::capture(self);
        self.end_synchronized_output();
        self.leave_alternate();
        let (cols, rows) = (self.primary.cols(), self.primary.rows());
        self.primary = Buffer::new(
            BufferKind::Primary,
            cols,
            rows,
            self.options.scrollback_lines,
            self.options.tab_width,
        );
        self.alternate = Buffer::new(BufferKind::Alternate, cols, rows, 0, self.options.tab_width);
        self.primary.mark_all_dirty();
        self.modes = Modes::new(self.options.kitty_stack_depth);
        self.semantic.clear();
        self.charset.reset();
        self.composer.reset();
        reporter.notify(self);
        log::debug!("Full reset performed");
    }

    // ------------------------------------------------------------------
    // Semantic prompts
    // ------------------------------------------------------------------

    pub fn semantic_state(&self) -> SemanticPromptState {
        self.semantic.state()
    }

    pub fn prompt_marks(&self) -> &[PromptMark] {
        self.semantic.marks()
    }

    /// Semantic tag of a visible row of the active buffer
    pub fn semantic_type_for_line(&self, row: usize) -> Option<LineTag> {
        self.buffer().lines().get(row).and_then(|line| line.tag())
    }

    /// Nearest prompt start strictly above absolute `row`
    pub fn previous_prompt_line(&self, row: usize) -> Option<usize> {
        self.semantic.previous_prompt_line(row)
    }

    /// Nearest prompt start strictly below absolute `row`
    pub fn next_prompt_line(&self, row: usize) -> Option<usize> {
        self.semantic.next_prompt_line(row)
    }

    fn semantic_prompt(&mut self, payload: &[u8]) {
        if self.active == BufferKind::Alternate {
            log::debug!("Ignoring OSC 133 on the alternate buffer");
            return;
        }
        let Some(command) = SemanticCommand::parse(payload) else {
            log::debug!("Unknown OSC 133 command: {:?}", String::from_utf8_lossy(payload));
            return;
        };

        let row = self.primary.cursor().row;
        self.primary.line_mut(row).set_tag(Some(command.mark_type().line_tag()));
        self.primary.mark_dirty(row);
        let absolute = self.primary.absolute_row(row);
        let exit_code = self.semantic.apply(command, absolute).exit_code;

        if let Some(semantic) = self.delegates.semantic() {
            semantic.semantic_prompt_changed(self.semantic.state());
            if let SemanticCommand::OutputEnd { .. } = command {
                semantic.command_completed(exit_code);
            }
        }
    }

    // ------------------------------------------------------------------
    // Host interface
    // ------------------------------------------------------------------

    pub fn delegates(&self) -> &Delegates {
        &self.delegates
    }

    pub fn delegates_mut(&mut self) -> &mut Delegates {
        &mut self.delegates
    }

    pub fn set_delegates(&mut self, delegates: Delegates) {
        self.delegates = delegates;
    }

    pub fn fallbacks_mut(&mut self) -> &mut Fallbacks {
        &mut self.fallbacks
    }

    /// Drain replies queued while no output delegate was registered
    pub fn take_pending_responses(&mut self) -> Vec<u8> {
        mem::take(&mut self.pending_responses)
    }

    fn send(&mut self, data: &[u8]) {
        match self.delegates.output() {
            Some(output) => output.send(data),
            None => self.pending_responses.extend_from_slice(data),
        }
    }

    /// Resize both buffers
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let (cols, rows) = (cols.max(1), rows.max(1));
        if cols == self.primary.cols() && rows == self.primary.rows() {
            return;
        }
        self.primary.resize(cols, rows);
        self.alternate.resize(cols, rows);
        self.options.cols = cols;
        self.options.rows = rows;
        if let Some(display) = self.delegates.display() {
            display.size_changed(cols, rows);
        }
    }

    /// Rows of the displayed buffer that need redrawing
    pub fn dirty_rows(&self) -> Vec<usize> {
        self.display_buffer().dirty_rows()
    }

    pub fn dirty_range(&self) -> Option<(usize, usize)> {
        self.display_buffer().dirty_range()
    }

    pub fn clear_dirty(&mut self) {
        self.buffer_mut().clear_dirty();
        if let Some(frozen) = self.sync.frozen_mut() {
            frozen.clear_dirty();
        }
    }

    /// Scroll the view of the active buffer; positive moves into history
    pub fn scroll_display(&mut self, delta: isize) {
        self.buffer_mut().scroll_display(delta);
    }

    /// Snapshot of what a renderer would draw
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::from_buffer(self.display_buffer(), self.modes.cursor_visible.get());
        snapshot.modes = ModesSnapshot {
            application_cursor: self.modes.application_cursor.get(),
            bracketed_paste: self.modes.bracketed_paste.get(),
            synchronized_output: self.sync.is_active(),
            kitty_flags: self.kitty_keyboard_flags().bits(),
            modify_other_keys: self.modify_other_keys_level(),
            semantic_state: format!("{:?}", self.semantic.state()),
            prompt_marks: self.semantic.marks().len(),
        };
        snapshot
    }

    /// Encode a key press for the negotiated keyboard protocol
    pub fn encode_key(&self, key: Key, modifiers: Modifiers) -> Vec<u8> {
        input::encode_key(key, modifiers, &KeyboardState::from_modes(&self.modes))
    }

    /// Encode pasted text, bracketed when the application asked for it
    pub fn encode_paste(&self, text: &str) -> Vec<u8> {
        input::encode_paste(text, self.modes.bracketed_paste.get())
    }

    // ------------------------------------------------------------------
    // Control functions
    // ------------------------------------------------------------------

    fn linefeed(&mut self) {
        let newline = self.modes.linefeed_mode.get();
        let buffer = self.buffer_mut();
        buffer.linefeed();
        if newline {
            buffer.carriage_return();
        }
    }

    /// Execute a CSI sequence without marker or intermediates
    fn execute_csi(&mut self, csi: &CsiAction) {
        let n = csi.param(0, 1) as usize;
        match csi.final_byte {
            // Cursor movement
            b'A' => self.buffer_mut().move_cursor_up(n),
            b'B' | b'e' => self.buffer_mut().move_cursor_down(n),
            b'C' | b'a' => self.buffer_mut().move_cursor_forward(n),
            b'D' => self.buffer_mut().move_cursor_backward(n),
            b'E' => {
                // CNL - Cursor Next Line
                let buffer = self.buffer_mut();
                buffer.move_cursor_down(n);
                buffer.carriage_return();
            }
            b'F' => {
                // CPL - Cursor Previous Line
                let buffer = self.buffer_mut();
                buffer.move_cursor_up(n);
                buffer.carriage_return();
            }
            b'G' | b'`' => {
                // CHA - Cursor Character Absolute, HPA
                let buffer = self.buffer_mut();
                let row = buffer.cursor().row;
                buffer.move_cursor_to(row, n - 1);
            }
            b'H' | b'f' => {
                // CUP - Cursor Position, HVP
                let row = csi.param(0, 1) as usize - 1;
                let col = csi.param(1, 1) as usize - 1;
                self.buffer_mut().move_cursor_to(row, col);
            }
            b'd' => {
                // VPA - Vertical Position Absolute
                let buffer = self.buffer_mut();
                let col = buffer.cursor().col;
                buffer.move_cursor_to(n - 1, col);
            }

            // Erase operations
            b'J' => self.buffer_mut().erase_in_display(csi.params.raw(0).unwrap_or(0)),
            b'K' => self.buffer_mut().erase_in_line(csi.params.raw(0).unwrap_or(0)),
            b'X' => self.buffer_mut().erase_chars(n),

            // Insert/Delete
            b'@' => self.buffer_mut().insert_chars(n),
            b'P' => self.buffer_mut().delete_chars(n),
            b'L' => self.buffer_mut().insert_lines(n),
            b'M' => self.buffer_mut().delete_lines(n),

            // Scroll
            b'S' => self.buffer_mut().scroll_up(n),
            b'T' => self.buffer_mut().scroll_down(n),
            b'r' => {
                // DECSTBM - Set Top and Bottom Margins
                let rows = self.buffer().rows() as u32;
                let top = csi.param(0, 1) as usize - 1;
                let bottom = csi.param(1, rows) as usize - 1;
                self.buffer_mut().set_scroll_region(top, bottom);
            }

            b'm' => self.select_graphic_rendition(&csi.params),

            // TBC - Tab Clear
            b'g' => self.buffer_mut().clear_tab_stop(csi.params.raw(0).unwrap_or(0)),

            b's' if csi.params.is_empty() => self.buffer_mut().save_cursor(),
            b'u' if csi.params.is_empty() => self.buffer_mut().restore_cursor(),

            b'h' | b'l' => {
                let enable = csi.final_byte == b'h';
                for mode in csi.params.iter() {
                    if !self.modes.set_ansi_mode(mode, enable) {
                        log::debug!("Unknown ANSI mode: {} = {}", mode, enable);
                    }
                }
            }

            b'n' => self.device_status_report(csi.params.raw(0).unwrap_or(0)),

            _ => (self.fallbacks.csi)(csi),
        }
    }

    fn device_status_report(&mut self, kind: u32) {
        match kind {
            5 => self.send(b"\x1b[0n"),
            6 => {
                let cursor = self.buffer().cursor();
                let reply = format!("\x1b[{};{}R", cursor.row + 1, cursor.col + 1);
                self.send(reply.as_bytes());
            }
            _ => log::debug!("Unknown DSR request: {}", kind),
        }
    }

    /// Set or reset a DEC private mode
    fn set_private_mode(&mut self, mode: u32, enable: bool) {
        match mode {
            25 => self.set_cursor_visible(enable),
            47 => {
                if enable {
                    self.enter_alternate(false);
                } else {
                    self.leave_alternate();
                }
            }
            1047 => {
                if enable {
                    self.enter_alternate(false);
                } else if self.active == BufferKind::Alternate {
                    self.alternate.clear();
                    self.leave_alternate();
                }
            }
            1048 => {
                if enable {
                    self.buffer_mut().save_cursor();
                } else {
                    self.buffer_mut().restore_cursor();
                }
            }
            1049 => {
                if enable {
                    if self.active == BufferKind::Primary {
                        self.primary.save_cursor();
                        self.enter_alternate(true);
                    }
                } else if self.active == BufferKind::Alternate {
                    self.leave_alternate();
                    self.primary.restore_cursor();
                }
            }
            2026 => {
                if enable {
                    self.begin_synchronized_output();
                } else {
                    self.end_synchronized_output();
                }
            }
            _ => {
                let mouse = self.modes.mouse.tracking();
                if !self.modes.set_private_mode(mode, enable) {
                    log::debug!("Unknown DEC mode: {} = {}", mode, enable);
                    return;
                }
                log::trace!("DEC mode {} = {}", mode, enable);
                if mouse != self.modes.mouse.tracking() {
                    if let Some(display) = self.delegates.display() {
                        display.mouse_mode_changed();
                    }
                }
            }
        }
    }

    fn private_mode_status(&self, mode: u32) -> ModeStatus {
        match mode {
            47 | 1047 | 1049 => ModeStatus::from_bool(self.is_alternate_active()),
            2026 => ModeStatus::from_bool(self.sync.is_active()),
            _ => self.modes.private_status(mode),
        }
    }

    /// DECRQM, private (`CSI ? mode $ p`) or ANSI (`CSI mode $ p`)
    fn request_mode(&mut self, csi: &CsiAction) {
        let mode = csi.params.raw(0).unwrap_or(0);
        let reply = if csi.marker == Some(b'?') {
            private_mode_report(mode, self.private_mode_status(mode))
        } else {
            ansi_mode_report(mode, self.modes.ansi_status(mode))
        };
        self.send(reply.as_bytes());
    }

    /// Execute a CSI sequence carrying a marker or intermediates
    fn execute_csi_extended(&mut self, csi: &CsiAction) {
        match (csi.marker, csi.intermediates.as_slice(), csi.final_byte) {
            (Some(b'?'), [], b'h' | b'l') => {
                let enable = csi.final_byte == b'h';
                for mode in csi.params.iter() {
                    self.set_private_mode(mode, enable);
                }
            }
            (Some(b'?') | None, [b'$'], b'p') => self.request_mode(csi),
            (None, [b'!'], b'p') => self.soft_reset(),

            // Kitty keyboard protocol
            (Some(b'?'), [], b'u') => {
                let reply = self.modes.kitty_keyboard.query_response();
                self.send(reply.as_bytes());
            }
            (Some(b'>'), [], b'u') => {
                let flags = kitty_flags(csi.params.raw(0).unwrap_or(0));
                self.modes.kitty_keyboard.push(flags);
            }
            (Some(b'<'), [], b'u') => {
                self.modes.kitty_keyboard.pop(csi.param(0, 1) as usize);
            }
            (Some(b'='), [], b'u') => {
                let flags = kitty_flags(csi.params.raw(0).unwrap_or(0));
                match KittySetMode::from_param(csi.param(1, 1)) {
                    Some(mode) => self.modes.kitty_keyboard.set(flags, mode),
                    None => log::debug!("Unknown kitty keyboard set mode: {}", csi.param(1, 1)),
                }
            }

            // XTMODKEYS
            (Some(b'>'), [], b'm') => self.modes.modify_other_keys.apply(csi.params.values()),
            (Some(b'>'), [], b'n') => self.modes.modify_other_keys.disable(csi.params.values()),

            _ => (self.fallbacks.csi)(csi),
        }
    }

    /// Execute SGR (Select Graphic Rendition)
    fn select_graphic_rendition(&mut self, params: &Params) {
        let attrs = &mut self.buffer_mut().cursor_mut().attrs;
        if params.is_empty() {
            attrs.reset();
            return;
        }

        let values = params.values();
        let mut i = 0;
        while i < values.len() {
            match values[i] {
                0 => attrs.reset(),
                1 => attrs.bold = true,
                2 => attrs.faint = true,
                3 => attrs.italic = true,
                4 => attrs.underline = true,
                5 | 6 => attrs.blink = true,
                7 => attrs.inverse = true,
                8 => attrs.hidden = true,
                9 => attrs.strikethrough = true,
                22 => {
                    attrs.bold = false;
                    attrs.faint = false;
                }
                23 => attrs.italic = false,
                24 => attrs.underline = false,
                25 => attrs.blink = false,
                27 => attrs.inverse = false,
                28 => attrs.hidden = false,
                29 => attrs.strikethrough = false,
                v @ 30..=37 => attrs.fg = Color::Indexed((v - 30) as u8),
                39 => attrs.fg = Color::Default,
                v @ 40..=47 => attrs.bg = Color::Indexed((v - 40) as u8),
                49 => attrs.bg = Color::Default,
                v @ 90..=97 => attrs.fg = Color::Indexed((v - 90 + 8) as u8),
                v @ 100..=107 => attrs.bg = Color::Indexed((v - 100 + 8) as u8),
                v @ (38 | 48) => {
                    let subparams = params.subparams(i);
                    let color = if subparams.is_empty() {
                        let (color, used) = extended_color(&values[i + 1..]);
                        i += used;
                        color
                    } else {
                        colon_color(subparams)
                    };
                    match (v, color) {
                        (38, Some(color)) => attrs.fg = color,
                        (48, Some(color)) => attrs.bg = color,
                        _ => log::debug!("Malformed SGR color: {:?}", values),
                    }
                }
                other => log::debug!("Unknown SGR attribute: {}", other),
            }
            i += 1;
        }
    }

    /// Execute a C0 control character
    fn execute_c0(&mut self, byte: u8) {
        match byte {
            0x07 => {
                // BEL - Bell
                if let Some(display) = self.delegates.display() {
                    display.bell();
                }
            }
            0x08 => self.buffer_mut().backspace(),
            0x09 => self.buffer_mut().tab(),
            // LF, VT, FF
            0x0A..=0x0C => self.linefeed(),
            0x0D => self.buffer_mut().carriage_return(),
            0x0E => self.charset.shift_out(),
            0x0F => self.charset.shift_in(),
            _ => (self.fallbacks.execute)(byte),
        }
    }

    /// Execute an ESC sequence
    fn execute_esc(&mut self, esc: &EscAction) {
        match (esc.intermediates.as_slice(), esc.final_byte) {
            ([], b'7') => self.buffer_mut().save_cursor(),
            ([], b'8') => self.buffer_mut().restore_cursor(),
            // IND - Index
            ([], b'D') => self.buffer_mut().linefeed(),
            ([], b'E') => {
                // NEL - Next Line
                let buffer = self.buffer_mut();
                buffer.linefeed();
                buffer.carriage_return();
            }
            ([], b'H') => self.buffer_mut().set_tab_stop(),
            ([], b'M') => self.buffer_mut().reverse_index(),
            ([], b'c') => self.full_reset(),
            ([], b'=') => self.modes.application_keypad.set(true),
            ([], b'>') => self.modes.application_keypad.set(false),
            ([], b'N') => self.charset.single_shift(2),
            ([], b'O') => self.charset.single_shift(3),
            ([slot @ (b'(' | b')' | b'*' | b'+')], designation) => {
                let slot = slot - b'(';
                self.charset.designate(slot, Charset::from_designation(designation));
            }
            _ => (self.fallbacks.esc)(esc),
        }
    }
}

/// Kitty flags from a parameter, dropping unknown bits
fn kitty_flags(value: u32) -> KittyKeyboardFlags {
    KittyKeyboardFlags::from_bits_truncate((value & 0xFF) as u8)
}

fn color_component(value: u32) -> u8 {
    value.min(255) as u8
}

/// `5;n` or `2;r;g;b` following a 38/48. Returns the color and how many
/// parameters it used.
fn extended_color(args: &[u32]) -> (Option<Color>, usize) {
    match args {
        [5, index, ..] => (Some(Color::Indexed(color_component(*index))), 2),
        [2, r, g, b, ..] => (
            Some(Color::Rgb(color_component(*r), color_component(*g), color_component(*b))),
            4,
        ),
        [5] | [2, ..] => (None, args.len()),
        _ => (None, 0),
    }
}

/// `38:5:n`, `38:2:r:g:b` or `38:2:cs:r:g:b`
fn colon_color(subparams: &[u32]) -> Option<Color> {
    match subparams {
        [5, index, ..] => Some(Color::Indexed(color_component(*index))),
        [2, _, r, g, b, ..] | [2, r, g, b] => Some(Color::Rgb(
            color_component(*r),
            color_component(*g),
            color_component(*b),
        )),
        _ => None,
    }
}

/// Mode state observed before a reset, so delegates hear only about
/// what actually changed
struct ModeReporter {
    cursor_visible: bool,
    mouse: MouseTracking,
    semantic: SemanticPromptState,
}

impl ModeReporter {
    fn capture(terminal: &Terminal) -> Self {
        Self {
            cursor_visible: terminal.modes.cursor_visible.get(),
            mouse: terminal.modes.mouse.tracking(),
            semantic: terminal.semantic.state(),
        }
    }

    fn notify(self, terminal: &Terminal) {
        if self.cursor_visible != terminal.modes.cursor_visible.get() {
            terminal.notify_cursor_visibility();
        }
        if let Some(display) = terminal.delegates.display() {
            if self.mouse != terminal.modes.mouse.tracking() {
                display.mouse_mode_changed();
            }
        }
        if let Some(semantic) = terminal.delegates.semantic() {
            if self.semantic != terminal.semantic.state() {
                semantic.semantic_prompt_changed(terminal.semantic.state());
            }
        }
    }
}

impl Perform for Terminal {
    fn print(&mut self, data: &[u8]) {
        let buffer = match self.active {
            BufferKind::Primary => &mut self.primary,
            BufferKind::Alternate => &mut self.alternate,
        };
        let mut ctx = PrintContext {
            buffer,
            charset: &mut self.charset,
            insert_mode: self.modes.insert_mode.get(),
            autowrap: self.modes.autowrap.get(),
        };
        self.composer.print(data, &mut ctx);
    }

    fn execute(&mut self, byte: u8) {
        self.execute_c0(byte);
    }

    fn csi_dispatch(&mut self, action: &CsiAction) {
        if action.marker.is_none() && action.intermediates.is_empty() {
            self.execute_csi(action);
        } else {
            self.execute_csi_extended(action);
        }
    }

    fn esc_dispatch(&mut self, action: &EscAction) {
        self.execute_esc(action);
    }

    fn osc_dispatch(&mut self, action: &OscAction) {
        match action.command {
            Some(OSC_SEMANTIC_PROMPT) => self.semantic_prompt(&action.payload),
            _ => (self.fallbacks.osc)(action),
        }
    }

    fn dcs_dispatch(&mut self, action: &DcsAction) {
        (self.fallbacks.dcs)(action);
    }

    fn apc_dispatch(&mut self, data: &[u8]) {
        (self.fallbacks.apc)(data);
    }

    fn print_state_reset(&mut self) {
        self.composer.reset();
    }

    fn parse_error(&mut self, error: &ParseError) -> ParseState {
        (self.fallbacks.error)(error)
    }
}
