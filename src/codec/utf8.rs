//! Codepoint navigation over NUL-terminated UTF-8 byte buffers.
//!
//! Every function treats the first NUL byte, or the end of the slice if
//! there is none, as the terminator. Offsets are byte offsets. Malformed or
//! truncated sequences are clamped at the terminator; no function indexes
//! past it.

#[inline]
fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Byte offset of the terminator.
pub fn terminator(s: &[u8]) -> usize {
    s.iter().position(|&b| b == 0).unwrap_or(s.len())
}

/// Number of codepoints before the terminator. Counts lead bytes only.
pub fn count_codepoints(s: &[u8]) -> usize {
    s[..terminator(s)].iter().filter(|&&b| !is_continuation(b)).count()
}

/// Offset of the codepoint at index `n`. Saturates at the terminator when
/// `n` is past the end.
pub fn byte_offset_of_codepoint(s: &[u8], n: usize) -> usize {
    let end = terminator(s);
    let mut cursor = 0;
    for _ in 0..n {
        if cursor >= end {
            break;
        }
        cursor = next_char_offset(s, cursor);
    }
    cursor
}

/// Start of the codepoint before `byte_offset`. Returns 0 at the start.
pub fn prev_char_offset(s: &[u8], byte_offset: usize) -> usize {
    let mut cursor = byte_offset.min(terminator(s));
    if cursor == 0 {
        return 0;
    }
    cursor -= 1;
    while cursor > 0 && is_continuation(s[cursor]) {
        cursor -= 1;
    }
    cursor
}

/// Start of the codepoint after the one at `byte_offset`, clamped to the
/// terminator.
pub fn next_char_offset(s: &[u8], byte_offset: usize) -> usize {
    let end = terminator(s);
    if byte_offset >= end {
        return end;
    }
    let mut cursor = byte_offset + 1;
    while cursor < end && is_continuation(s[cursor]) {
        cursor += 1;
    }
    cursor
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Iterator over the codepoints of a NUL-terminated buffer.
///
/// Segments are delimited with [`next_char_offset`], so the iterator yields
/// exactly [`count_codepoints`] items. Each segment decodes from its lead
/// sequence alone; stray continuation bytes after it are dropped. A lead
/// sequence that is not valid UTF-8 decodes as U+FFFD. Continuation bytes
/// before the first lead byte are skipped.
pub struct Codepoints<'a> {
    bytes:  &'a [u8],
    cursor: usize,
    end:    usize,
}

impl<'a> Codepoints<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        let end = terminator(bytes);
        let cursor = bytes[..end]
            .iter()
            .position(|&b| !is_continuation(b))
            .unwrap_or(end);
        Self { bytes, cursor, end }
    }
}

impl Iterator for Codepoints<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        if self.cursor >= self.end {
            return None;
        }
        let start = self.cursor;
        self.cursor = next_char_offset(self.bytes, start);
        let segment = &self.bytes[start..self.cursor];
        let c = segment
            .get(..sequence_len(segment[0]))
            .and_then(|lead| std::str::from_utf8(lead).ok())
            .and_then(|lead| lead.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        Some(c)
    }
}

/// Encoded length announced by a lead byte; 0 for bytes that cannot lead.
fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

pub fn codepoints(s: &[u8]) -> Codepoints<'_> {
    Codepoints::new(s)
}

// ── Case mapping ─────────────────────────────────────────────────────────────

// One codepoint in, one codepoint out. Mappings that expand (e.g. 'ß' to
// "SS") leave the codepoint unchanged.
fn simple_map<I: Iterator<Item = char>>(c: char, mut mapped: I) -> char {
    match (mapped.next(), mapped.next()) {
        (Some(m), None) => m,
        _ => c,
    }
}

pub fn to_lower(input: &str) -> String {
    input.chars().map(|c| simple_map(c, c.to_lowercase())).collect()
}

pub fn to_upper(input: &str) -> String {
    input.chars().map(|c| simple_map(c, c.to_uppercase())).collect()
}
