//! IBM code page 850, the single-byte alphabet the engine's fonts are drawn in.

/// Unicode scalar for each byte 0x80..=0xFF. Bytes below 0x80 are ASCII.
pub const HIGH_HALF: [u16; 128] = [
    // 0x80
    0x00C7, 0x00FC, 0x00E9, 0x00E2, 0x00E4, 0x00E0, 0x00E5, 0x00E7,
    0x00EA, 0x00EB, 0x00E8, 0x00EF, 0x00EE, 0x00EC, 0x00C4, 0x00C5,
    // 0x90
    0x00C9, 0x00E6, 0x00C6, 0x00F4, 0x00F6, 0x00F2, 0x00FB, 0x00F9,
    0x00FF, 0x00D6, 0x00DC, 0x00F8, 0x00A3, 0x00D8, 0x00D7, 0x0192,
    // 0xA0
    0x00E1, 0x00ED, 0x00F3, 0x00FA, 0x00F1, 0x00D1, 0x00AA, 0x00BA,
    0x00BF, 0x00AE, 0x00AC, 0x00BD, 0x00BC, 0x00A1, 0x00AB, 0x00BB,
    // 0xB0
    0x2591, 0x2592, 0x2593, 0x2502, 0x2524, 0x00C1, 0x00C2, 0x00C0,
    0x00A9, 0x2563, 0x2551, 0x2557, 0x255D, 0x00A2, 0x00A5, 0x2510,
    // 0xC0
    0x2514, 0x2534, 0x252C, 0x251C, 0x2500, 0x253C, 0x00E3, 0x00C3,
    0x255A, 0x2554, 0x2569, 0x2566, 0x2560, 0x2550, 0x256C, 0x00A4,
    // 0xD0
    0x00F0, 0x00D0, 0x00CA, 0x00CB, 0x00C8, 0x0131, 0x00CD, 0x00CE,
    0x00CF, 0x2518, 0x250C, 0x2588, 0x2584, 0x00A6, 0x00CC, 0x2580,
    // 0xE0
    0x00D3, 0x00DF, 0x00D4, 0x00D2, 0x00F5, 0x00D5, 0x00B5, 0x00FE,
    0x00DE, 0x00DA, 0x00DB, 0x00D9, 0x00FD, 0x00DD, 0x00AF, 0x00B4,
    // 0xF0
    0x00AD, 0x00B1, 0x2017, 0x00BE, 0x00B6, 0x00A7, 0x00F7, 0x00B8,
    0x00B0, 0x00A8, 0x00B7, 0x00B9, 0x00B3, 0x00B2, 0x25A0, 0x00A0,
];

/// Byte for `c`, if code page 850 has one.
pub fn encode_char(c: char) -> Option<u8> {
    let cp = c as u32;
    if cp < 0x80 {
        return Some(cp as u8);
    }
    HIGH_HALF
        .iter()
        .position(|&u| u as u32 == cp)
        .map(|i| 0x80 + i as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_identity() {
        assert_eq!(encode_char('A'), Some(b'A'));
        assert_eq!(encode_char('~'), Some(b'~'));
        assert_eq!(encode_char('\n'), Some(b'\n'));
    }

    #[test]
    fn known_high_bytes() {
        assert_eq!(encode_char('Ç'), Some(0x80));
        assert_eq!(encode_char('é'), Some(0x82));
        assert_eq!(encode_char('É'), Some(0x90));
        assert_eq!(encode_char('ß'), Some(0xE1));
        assert_eq!(encode_char('\u{00A0}'), Some(0xFF));
        assert_eq!(encode_char('█'), Some(0xDB));
    }

    #[test]
    fn unmapped_chars() {
        assert_eq!(encode_char('€'), None);
        assert_eq!(encode_char('ж'), None);
        assert_eq!(encode_char('日'), None);
    }

    #[test]
    fn table_has_no_duplicates() {
        let mut seen = HIGH_HALF.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 128);
    }
}
