//! Character composition through the full terminal
//!
//! Bytes go in through `Terminal::feed`; assertions look at the resulting
//! cells, widths and cursor position.

use mochi_vt::core::Buffer;
use mochi_vt::Terminal;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cell(buffer: &Buffer, row: usize, col: usize) -> (String, u8) {
    let cell = buffer.line(row).cell(col);
    (cell.content().to_string(), cell.width())
}

fn feed(cols: usize, rows: usize, input: &str) -> Terminal {
    init_logging();
    let mut term = Terminal::new(cols, rows);
    term.feed(input.as_bytes());
    term
}

// ============================================================================
// Widths
// ============================================================================

#[test]
fn test_digits_are_single_width() {
    let term = feed(20, 2, "0123456789");
    for col in 0..10 {
        assert_eq!(cell(term.buffer(), 0, col).1, 1);
    }
    assert_eq!(term.buffer().cursor().col, 10);
}

#[test]
fn test_cjk_occupies_two_cells() {
    let term = feed(10, 2, "日本");
    assert_eq!(cell(term.buffer(), 0, 0), ("日".to_string(), 2));
    assert_eq!(cell(term.buffer(), 0, 1), (String::new(), 0));
    assert_eq!(cell(term.buffer(), 0, 2), ("本".to_string(), 2));
    assert_eq!(term.buffer().cursor().col, 4);
}

#[test]
fn test_wide_char_wraps_instead_of_splitting() {
    let term = feed(3, 2, "ab日");
    assert_eq!(term.buffer().row_text(0), "ab");
    assert_eq!(cell(term.buffer(), 1, 0), ("日".to_string(), 2));
}

// ============================================================================
// Merging
// ============================================================================

#[test]
fn test_emoji_with_skin_tone_is_one_cell() {
    let term = feed(10, 2, "\u{1F44D}\u{1F3FB}x");
    assert_eq!(cell(term.buffer(), 0, 0), ("\u{1F44D}\u{1F3FB}".to_string(), 2));
    assert_eq!(cell(term.buffer(), 0, 1).1, 0);
    assert_eq!(cell(term.buffer(), 0, 2), ("x".to_string(), 1));
    assert_eq!(term.buffer().cursor().col, 3);
}

#[test]
fn test_family_zwj_sequence_is_one_cell() {
    let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}\u{200D}\u{1F466}";
    let term = feed(10, 2, family);
    assert_eq!(cell(term.buffer(), 0, 0), (family.to_string(), 2));
    assert_eq!(term.buffer().cursor().col, 2);
}

#[test]
fn test_zwj_sequence_split_across_feeds() {
    init_logging();
    let mut term = Terminal::new(10, 2);
    let bytes = "\u{1F469}\u{200D}\u{1F4BB}".as_bytes();
    for chunk in bytes.chunks(3) {
        term.feed(chunk);
    }
    assert_eq!(cell(term.buffer(), 0, 0), ("\u{1F469}\u{200D}\u{1F4BB}".to_string(), 2));
    assert_eq!(term.buffer().cursor().col, 2);
}

#[test]
fn test_combining_acute_merges_into_base() {
    let term = feed(10, 2, "Cafe\u{301}!");
    assert_eq!(term.buffer().row_text(0), "Cafe\u{301}!");
    assert_eq!(cell(term.buffer(), 0, 3), ("e\u{301}".to_string(), 1));
    assert_eq!(term.buffer().cursor().col, 5);
}

#[test]
fn test_heart_with_vs16_widens() {
    let term = feed(10, 2, "\u{2764}\u{FE0F}a");
    assert_eq!(cell(term.buffer(), 0, 0), ("\u{2764}\u{FE0F}".to_string(), 2));
    assert_eq!(cell(term.buffer(), 0, 2), ("a".to_string(), 1));
}

#[test]
fn test_combining_mark_after_sgr_still_merges() {
    // an escape sequence ends the print run but not the merge target
    let term = feed(10, 2, "e\x1b[1m\u{301}");
    assert_eq!(cell(term.buffer(), 0, 0), ("e\u{301}".to_string(), 1));
}

// ============================================================================
// Line edits around wide characters
// ============================================================================

fn row_cells(term: &Terminal, row: usize) -> Vec<(String, u8)> {
    (0..term.cols()).map(|col| cell(term.buffer(), row, col)).collect()
}

fn blank() -> (String, u8) {
    (String::new(), 1)
}

#[test]
fn test_insert_chars_blanks_wide_char_pushed_to_margin() {
    let mut term = feed(4, 2, "ab世");
    term.feed(b"\r\x1b[@");
    assert_eq!(
        row_cells(&term, 0),
        vec![blank(), ("a".to_string(), 1), ("b".to_string(), 1), blank()]
    );
}

#[test]
fn test_delete_chars_blanks_orphaned_placeholder() {
    let mut term = feed(4, 2, "世x");
    term.feed(b"\r\x1b[P");
    assert_eq!(
        row_cells(&term, 0),
        vec![blank(), ("x".to_string(), 1), blank(), blank()]
    );
}

#[test]
fn test_erase_from_placeholder_blanks_wide_char() {
    let mut term = feed(4, 2, "世x");
    term.feed(b"\x1b[2G\x1b[K");
    assert_eq!(row_cells(&term, 0), vec![blank(), blank(), blank(), blank()]);
}

#[test]
fn test_erase_chars_over_wide_char_blanks_placeholder() {
    let mut term = feed(5, 2, "a世b");
    term.feed(b"\x1b[2G\x1b[X");
    assert_eq!(
        row_cells(&term, 0),
        vec![("a".to_string(), 1), blank(), blank(), ("b".to_string(), 1), blank()]
    );
}

#[test]
fn test_delete_chars_keeps_whole_wide_char() {
    let mut term = feed(5, 2, "x世y");
    term.feed(b"\r\x1b[P");
    assert_eq!(
        row_cells(&term, 0),
        vec![("世".to_string(), 2), (String::new(), 0), ("y".to_string(), 1), blank(), blank()]
    );
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn test_invalid_utf8_never_panics() {
    let mut term = feed(10, 2, "");
    term.feed(&[0xC3, 0x28, 0xE2, 0x82, 0x28, 0xFF, b'z']);
    assert!(term.buffer().row_text(0).ends_with('z'));
}

#[test]
fn test_truncated_sequence_at_end_is_kept_for_next_feed() {
    init_logging();
    let mut term = Terminal::new(10, 2);
    let bytes = "é".as_bytes();
    term.feed(&bytes[..1]);
    assert_eq!(term.buffer().cursor().col, 0);
    term.feed(&bytes[1..]);
    assert_eq!(cell(term.buffer(), 0, 0), ("é".to_string(), 1));
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn test_snapshot_text_and_json() {
    let term = feed(10, 3, "hi \u{1F600}\r\nthere");
    let snapshot = term.snapshot();
    assert_eq!(snapshot.to_text(), "hi \u{1F600}\nthere\n");

    let json = snapshot.to_json().unwrap();
    let restored = mochi_vt::core::Snapshot::from_json(&json).unwrap();
    assert_eq!(restored, snapshot);
}
