use maxres::classify::classify_tag;
use maxres::codec::cp850::encode_char;
use maxres::codec::{
    byte_offset_of_codepoint, count_codepoints, decode_to_legacy, next_char_offset,
    prev_char_offset, REPLACEMENT_BYTE,
};
use proptest::prelude::*;

/// Valid UTF-8 without NUL, so the terminator is the end of the string.
fn text() -> impl Strategy<Value = String> {
    "[^\\x00]{0,40}"
}

proptest! {
    #[test]
    fn offset_of_last_codepoint_is_terminator(s in text()) {
        let b = s.as_bytes();
        prop_assert_eq!(count_codepoints(b), s.chars().count());
        prop_assert_eq!(byte_offset_of_codepoint(b, count_codepoints(b)), b.len());
    }

    #[test]
    fn prev_after_next_does_not_overshoot(s in text(), pick in any::<prop::sample::Index>()) {
        let b = s.as_bytes();
        let boundaries: Vec<usize> = s.char_indices().map(|(i, _)| i).chain([b.len()]).collect();
        let k = boundaries[pick.index(boundaries.len())];
        let next = next_char_offset(b, k);
        prop_assert!(next <= b.len());
        prop_assert!(prev_char_offset(b, next) <= k);
        if k < b.len() {
            prop_assert_eq!(prev_char_offset(b, next), k);
        }
    }

    #[test]
    fn navigator_never_passes_end_on_arbitrary_bytes(b in prop::collection::vec(any::<u8>(), 0..64), k in 0usize..80) {
        let end = b.iter().position(|&x| x == 0).unwrap_or(b.len());
        prop_assert!(next_char_offset(&b, k) <= end);
        prop_assert!(prev_char_offset(&b, k) <= end);
        prop_assert!(byte_offset_of_codepoint(&b, k) <= end);
    }

    #[test]
    fn downconversion_is_total(s in text()) {
        let out = decode_to_legacy(&s);
        prop_assert_eq!(out.len(), s.chars().count());
        for (byte, c) in out.iter().zip(s.chars()) {
            match encode_char(c) {
                Some(mapped) => prop_assert_eq!(*byte, mapped),
                None => prop_assert_eq!(*byte, REPLACEMENT_BYTE),
            }
        }
    }

    #[test]
    fn classification_is_pure(tags in prop::collection::vec("[A-Z_0-9]{1,8}", 1..20)) {
        let first: Vec<_> = tags.iter().map(|t| classify_tag(t)).collect();
        let second: Vec<_> = tags.iter().rev().map(|t| classify_tag(t)).collect();
        prop_assert!(first.iter().eq(second.iter().rev()));
    }
}
