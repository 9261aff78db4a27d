//! Text encoding boundary between modern UTF-8 text and the engine's
//! single-byte code page.
//!
//! Down-conversion is lossy and total: every codepoint becomes exactly one
//! byte, and codepoints the target code page cannot represent become `?`.
//! Only the UTF-8 to legacy direction exists.

pub mod cp850;
pub mod utf8;

pub use utf8::{
    byte_offset_of_codepoint, count_codepoints, next_char_offset, prev_char_offset, to_lower,
    to_upper,
};

/// Substitute for codepoints with no legacy representation.
pub const REPLACEMENT_BYTE: u8 = b'?';

// ── Code pages ───────────────────────────────────────────────────────────────

pub trait CodePage: Send + Sync {
    fn name(&self) -> &'static str;
    fn encode_char(&self, c: char) -> Option<u8>;
}

pub struct Cp850;
impl CodePage for Cp850 {
    fn name(&self) -> &'static str { "cp850" }
    fn encode_char(&self, c: char) -> Option<u8> { cp850::encode_char(c) }
}

// ── Down-conversion ──────────────────────────────────────────────────────────

/// Convert UTF-8 input to code page 850 bytes.
///
/// Input is read up to its first NUL. The output has one byte per input
/// codepoint.
pub fn decode_to_legacy(input: impl AsRef<[u8]>) -> Vec<u8> {
    decode_to_legacy_with(&Cp850, input)
}

pub fn decode_to_legacy_with(page: &dyn CodePage, input: impl AsRef<[u8]>) -> Vec<u8> {
    utf8::codepoints(input.as_ref())
        .map(|c| page.encode_char(c).unwrap_or(REPLACEMENT_BYTE))
        .collect()
}

// ── Transliteration ──────────────────────────────────────────────────────────

/// Latin spelling of a Cyrillic letter, if it has one.
fn cyrillic_latin(c: char) -> Option<&'static str> {
    let s = match c {
        'а' => "a",  'б' => "b",  'в' => "v",    'г' => "g",  'д' => "d",
        'е' => "e",  'ё' => "yo", 'ж' => "zh",   'з' => "z",  'и' => "i",
        'й' => "y",  'к' => "k",  'л' => "l",    'м' => "m",  'н' => "n",
        'о' => "o",  'п' => "p",  'р' => "r",    'с' => "s",  'т' => "t",
        'у' => "u",  'ф' => "f",  'х' => "kh",   'ц' => "ts", 'ч' => "ch",
        'ш' => "sh", 'щ' => "shch", 'ъ' => "",   'ы' => "y",  'ь' => "",
        'э' => "e",  'ю' => "yu", 'я' => "ya",
        'А' => "A",  'Б' => "B",  'В' => "V",    'Г' => "G",  'Д' => "D",
        'Е' => "E",  'Ё' => "Yo", 'Ж' => "Zh",   'З' => "Z",  'И' => "I",
        'Й' => "Y",  'К' => "K",  'Л' => "L",    'М' => "M",  'Н' => "N",
        'О' => "O",  'П' => "P",  'Р' => "R",    'С' => "S",  'Т' => "T",
        'У' => "U",  'Ф' => "F",  'Х' => "Kh",   'Ц' => "Ts", 'Ч' => "Ch",
        'Ш' => "Sh", 'Щ' => "Shch", 'Ъ' => "",   'Ы' => "Y",  'Ь' => "",
        'Э' => "E",  'Ю' => "Yu", 'Я' => "Ya",
        _ => return None,
    };
    Some(s)
}

/// Rewrite Russian text in Latin letters so it survives down-conversion.
/// Characters outside the Cyrillic alphabet pass through unchanged.
pub fn transliterate_cyrillic(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match cyrillic_latin(c) {
            Some(latin) => out.push_str(latin),
            None => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downconverts_latin1_text() {
        assert_eq!(decode_to_legacy("café"), vec![b'c', b'a', b'f', 0x82]);
        assert_eq!(decode_to_legacy("Ça"), vec![0x80, b'a']);
    }

    #[test]
    fn unrepresentable_becomes_question_mark() {
        assert_eq!(decode_to_legacy("5€"), b"5?".to_vec());
        assert_eq!(decode_to_legacy("日本"), b"??".to_vec());
    }

    #[test]
    fn output_length_matches_codepoints() {
        let s = "Ünïcödé → ok";
        assert_eq!(decode_to_legacy(s).len(), count_codepoints(s.as_bytes()));
    }

    #[test]
    fn stops_at_nul() {
        assert_eq!(decode_to_legacy(b"ab\0cd"), b"ab".to_vec());
    }

    #[test]
    fn stray_continuation_byte_is_dropped() {
        assert_eq!(decode_to_legacy(b"a\x80b"), b"ab".to_vec());
    }

    #[test]
    fn transliteration_before_downconversion() {
        assert_eq!(transliterate_cyrillic("Щука и ёж"), "Shchuka i yozh");
        assert_eq!(transliterate_cyrillic("объём"), "obyom");
        assert_eq!(decode_to_legacy(transliterate_cyrillic("Привет, café")), {
            let mut v = b"Privet, caf".to_vec();
            v.push(0x82);
            v
        });
    }

    #[test]
    fn code_page_trait_object() {
        let page: &dyn CodePage = &Cp850;
        assert_eq!(page.name(), "cp850");
        assert_eq!(decode_to_legacy_with(page, "ü"), vec![0x81]);
    }
}
