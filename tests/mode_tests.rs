//! Mode registry behavior: queries, keyboard protocols, resets and
//! synchronized output, driven through escape sequences.

use std::cell::RefCell;
use std::rc::Rc;

use mochi_vt::core::BufferKind;
use mochi_vt::input::{Key, Modifiers};
use mochi_vt::{Delegates, DisplayDelegate, OutputDelegate, SemanticPromptDelegate, Terminal};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct Host {
    replies: RefCell<Vec<Vec<u8>>>,
    sync_events: RefCell<Vec<bool>>,
    buffers: RefCell<Vec<BufferKind>>,
}

impl OutputDelegate for Host {
    fn send(&self, data: &[u8]) {
        self.replies.borrow_mut().push(data.to_vec());
    }
}

impl DisplayDelegate for Host {
    fn buffer_activated(&self, kind: BufferKind) {
        self.buffers.borrow_mut().push(kind);
    }

    fn synchronized_output_changed(&self, active: bool) {
        self.sync_events.borrow_mut().push(active);
    }
}

impl SemanticPromptDelegate for Host {}

fn hosted(cols: usize, rows: usize) -> (Terminal, Rc<Host>) {
    init_logging();
    let host = Rc::new(Host::default());
    let mut term = Terminal::new(cols, rows);
    term.set_delegates(Delegates::unified(&host));
    (term, host)
}

fn last_reply(host: &Host) -> String {
    let replies = host.replies.borrow();
    let last = replies.last().expect("no reply sent");
    String::from_utf8(last.clone()).unwrap()
}

// ============================================================================
// DECRQM
// ============================================================================

#[test]
fn test_decrqm_modify_other_keys() {
    let (mut term, host) = hosted(5, 1);
    term.feed(b"\x1b[?2048$p");
    assert_eq!(last_reply(&host), "\x1b[?2048;2$y");
    term.feed(b"\x1b[>4;2m\x1b[?2048$p");
    assert_eq!(last_reply(&host), "\x1b[?2048;1$y");
    term.feed(b"\x1b[>4;1m\x1b[?2048$p");
    assert_eq!(last_reply(&host), "\x1b[?2048;1$y");
}

#[test]
fn test_decrqm_bracketed_paste_across_cleanup() {
    let (mut term, host) = hosted(5, 1);
    term.feed(b"\x1b[?2004$p");
    assert_eq!(last_reply(&host), "\x1b[?2004;2$y");
    term.feed(b"\x1b[?2004h\x1b[?2004$p");
    assert_eq!(last_reply(&host), "\x1b[?2004;1$y");
    term.cleanup_for_exit();
    term.feed(b"\x1b[?2004$p");
    assert_eq!(last_reply(&host), "\x1b[?2004;2$y");
}

#[test]
fn test_decrqm_synchronized_output() {
    let (mut term, host) = hosted(5, 1);
    term.feed(b"\x1b[?2026$p");
    assert_eq!(last_reply(&host), "\x1b[?2026;2$y");
    term.feed(b"\x1b[?2026h\x1b[?2026$p");
    assert_eq!(last_reply(&host), "\x1b[?2026;1$y");
}

#[test]
fn test_decrqm_supplementary_modes() {
    let (mut term, host) = hosted(5, 1);
    for (query, expected) in [
        (&b"\x1b[?1$p"[..], "\x1b[?1;2$y"),
        (b"\x1b[?7$p", "\x1b[?7;1$y"),
        (b"\x1b[?25$p", "\x1b[?25;1$y"),
        (b"\x1b[?1000$p", "\x1b[?1000;2$y"),
        (b"\x1b[?1004$p", "\x1b[?1004;2$y"),
        (b"\x1b[?1006$p", "\x1b[?1006;2$y"),
        (b"\x1b[?47$p", "\x1b[?47;2$y"),
        (b"\x1b[?12345$p", "\x1b[?12345;0$y"),
        (b"\x1b[4$p", "\x1b[4;2$y"),
        (b"\x1b[20$p", "\x1b[20;2$y"),
    ] {
        term.feed(query);
        assert_eq!(last_reply(&host), expected);
    }
}

#[test]
fn test_replies_keep_emission_order() {
    let (mut term, host) = hosted(5, 1);
    term.feed(b"\x1b[?2004$p\x1b[?u\x1b[5n");
    let replies: Vec<Vec<u8>> = host.replies.borrow().clone();
    assert_eq!(
        replies,
        vec![b"\x1b[?2004;2$y".to_vec(), b"\x1b[?0u".to_vec(), b"\x1b[0n".to_vec()]
    );
}

// ============================================================================
// Kitty keyboard protocol
// ============================================================================

#[test]
fn test_kitty_flags_default_zero() {
    let (mut term, host) = hosted(5, 1);
    assert!(term.kitty_keyboard_flags().is_empty());
    term.feed(b"\x1b[?u");
    assert_eq!(last_reply(&host), "\x1b[?0u");
}

#[test]
fn test_kitty_push_pop() {
    let (mut term, host) = hosted(5, 1);
    term.feed(b"\x1b[>1u\x1b[>3u");
    term.feed(b"\x1b[?u");
    assert_eq!(last_reply(&host), "\x1b[?3u");
    term.feed(b"\x1b[<u\x1b[?u");
    assert_eq!(last_reply(&host), "\x1b[?1u");
    term.feed(b"\x1b[>1u\x1b[<2u\x1b[?u");
    assert_eq!(last_reply(&host), "\x1b[?0u");
}

#[test]
fn test_kitty_stack_depth_is_bounded() {
    let (mut term, _host) = hosted(5, 1);
    for flags in 1..=10 {
        term.feed(format!("\x1b[>{}u", flags).as_bytes());
    }
    assert_eq!(term.modes().kitty_keyboard.depth(), 8);
    term.feed(b"\x1b[<7u");
    assert_eq!(term.kitty_keyboard_flags().bits(), 3);
}

#[test]
fn test_kitty_over_pop_empties_stack() {
    let (mut term, _host) = hosted(5, 1);
    term.feed(b"\x1b[>1u\x1b[<99u");
    assert_eq!(term.modes().kitty_keyboard.depth(), 0);
}

#[test]
fn test_kitty_set_modes() {
    let (mut term, _host) = hosted(5, 1);
    term.feed(b"\x1b[=5u");
    assert_eq!(term.kitty_keyboard_flags().bits(), 5);
    term.feed(b"\x1b[=2;2u");
    assert_eq!(term.kitty_keyboard_flags().bits(), 7);
    term.feed(b"\x1b[=1;3u");
    assert_eq!(term.kitty_keyboard_flags().bits(), 6);
    term.feed(b"\x1b[=1;9u");
    assert_eq!(term.kitty_keyboard_flags().bits(), 6);
}

// ============================================================================
// modifyOtherKeys
// ============================================================================

#[test]
fn test_modify_other_keys_levels() {
    let (mut term, _host) = hosted(5, 1);
    assert_eq!(term.modify_other_keys_level(), 0);
    for (seq, level) in [
        (&b"\x1b[>4;1m"[..], 1),
        (b"\x1b[>4;2m", 2),
        (b"\x1b[>4;1m", 1),
        (b"\x1b[>4;0m", 0),
        (b"\x1b[>4;99m", 2),
        (b"\x1b[>4m", 0),
    ] {
        term.feed(seq);
        assert_eq!(term.modify_other_keys_level(), level);
    }
}

#[test]
fn test_modify_other_keys_ignores_other_resources() {
    let (mut term, _host) = hosted(5, 1);
    term.feed(b"\x1b[>1;2m\x1b[>0;1m");
    assert_eq!(term.modify_other_keys_level(), 0);
}

#[test]
fn test_modify_other_keys_cleared_by_resets() {
    let (mut term, _host) = hosted(5, 1);
    term.feed(b"\x1b[>4;2m\x1b[!p");
    assert_eq!(term.modify_other_keys_level(), 0);
    term.feed(b"\x1b[>4;2m");
    term.cleanup_for_exit();
    assert_eq!(term.modify_other_keys_level(), 0);
    term.feed(b"\x1b[>4;2m\x1bc");
    assert_eq!(term.modify_other_keys_level(), 0);
}

// ============================================================================
// Key encoding
// ============================================================================

#[test]
fn test_key_encoding_follows_negotiated_protocol() {
    let (mut term, _host) = hosted(5, 1);
    assert_eq!(term.encode_key(Key::Char('1'), Modifiers::CTRL), b"1");
    assert_eq!(term.encode_key(Key::Escape, Modifiers::empty()), b"\x1b");

    term.feed(b"\x1b[>4;1m");
    assert_eq!(term.encode_key(Key::Char('1'), Modifiers::CTRL), b"\x1b[49;5u");

    term.feed(b"\x1b[>4;0m\x1b[>1u");
    assert_eq!(term.encode_key(Key::Escape, Modifiers::empty()), b"\x1b[27u");
    assert_eq!(term.encode_key(Key::Up, Modifiers::CTRL), b"\x1b[1;5A");
    assert_eq!(term.encode_key(Key::Delete, Modifiers::CTRL), b"\x1b[3;5~");
}

#[test]
fn test_application_cursor_keys() {
    let (mut term, _host) = hosted(5, 1);
    term.feed(b"\x1b[?1h");
    assert_eq!(term.encode_key(Key::Left, Modifiers::empty()), b"\x1bOD");
    term.feed(b"\x1b[?1l");
    assert_eq!(term.encode_key(Key::Left, Modifiers::empty()), b"\x1b[D");
}

#[test]
fn test_paste_encoding() {
    let (mut term, _host) = hosted(5, 1);
    assert_eq!(term.encode_paste("ls"), b"ls");
    term.feed(b"\x1b[?2004h");
    assert_eq!(term.encode_paste("ls"), b"\x1b[200~ls\x1b[201~");
}

// ============================================================================
// Synchronized output
// ============================================================================

#[test]
fn test_synchronized_output_freezes_snapshot() {
    let (mut term, host) = hosted(10, 2);
    term.feed(b"old");
    term.feed(b"\x1b[?2026h");
    term.feed(b"\r\x1b[2Knew");

    let frozen = term.snapshot();
    assert_eq!(frozen.to_text(), "old\n");
    assert!(frozen.modes.synchronized_output);

    term.feed(b"\x1b[?2026l");
    assert_eq!(term.snapshot().to_text(), "new\n");
    assert_eq!(host.sync_events.borrow().as_slice(), &[true, false]);
}

#[test]
fn test_synchronized_output_nested_begin_keeps_first_copy() {
    let (mut term, host) = hosted(10, 2);
    term.feed(b"a\x1b[?2026hb\x1b[?2026hc");
    assert_eq!(term.snapshot().to_text(), "a\n");
    assert_eq!(host.sync_events.borrow().as_slice(), &[true]);
}

#[test]
fn test_synchronized_output_ends_on_soft_reset() {
    let (mut term, host) = hosted(10, 2);
    term.feed(b"\x1b[?2026hx");
    term.soft_reset();
    assert!(!term.is_synchronized_output_active());
    assert_eq!(term.snapshot().to_text(), "x\n");
    assert_eq!(host.sync_events.borrow().as_slice(), &[true, false]);
}

#[test]
fn test_synchronized_output_ends_on_cleanup_for_exit() {
    let (mut term, host) = hosted(10, 2);
    term.feed(b"old\x1b[?2026h\r\x1b[2Knew");
    assert_eq!(term.snapshot().to_text(), "old\n");

    term.cleanup_for_exit();
    assert!(!term.is_synchronized_output_active());
    assert_eq!(term.snapshot().to_text(), "new\n");
    assert!(!term.snapshot().modes.synchronized_output);
    assert_eq!(host.sync_events.borrow().as_slice(), &[true, false]);

    term.feed(b"\x1b[?2026$p");
    assert_eq!(last_reply(&host), "\x1b[?2026;2$y");
}

// ============================================================================
// Buffers
// ============================================================================

#[test]
fn test_alternate_buffer_switch_preserves_primary() {
    let (mut term, host) = hosted(10, 3);
    term.feed(b"shell$ ");
    term.feed(b"\x1b[?1049hvim");
    assert!(term.is_alternate_active());
    assert_eq!(term.snapshot().to_text(), "vim\n");

    term.cleanup_for_exit();
    assert!(!term.is_alternate_active());
    assert_eq!(term.snapshot().to_text(), "shell$\n");
    assert_eq!(
        host.buffers.borrow().as_slice(),
        &[BufferKind::Alternate, BufferKind::Primary]
    );
}

#[test]
fn test_dirty_rows_after_output() {
    let (mut term, _host) = hosted(10, 4);
    term.clear_dirty();
    term.feed(b"\x1b[3;1Hx");
    assert_eq!(term.dirty_rows(), vec![2]);
    assert_eq!(term.dirty_range(), Some((2, 2)));
    term.clear_dirty();
    assert!(term.dirty_rows().is_empty());
}
