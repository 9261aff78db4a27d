//! Advisory content-type classification of entry tags.
//!
//! Classification is an ordered table of `(Rule, ContentType)` pairs; the
//! first rule that matches wins. Tag namespaces overlap, so table order is
//! part of the contract: `A_PIC` is `Audio/Anim`, not `Picture`.
//!
//! The label is used for reports and routing only. Extraction never
//! depends on it.

use serde::{Serialize, Serializer};
use std::fmt;

/// Tags whose payload is legacy-encoded text.
pub const TEXT_TAGS: &[&str] = &["ATTRIBS", "HELP_ENG", "TIPS", "CLANATRB"];

// ── ContentType ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
    Font,
    Script,
    Image,
    Voice,
    SoundEffect,
    FlicAnim,
    Icon,
    Picture,
    AudioAnim,
    FlicMovie,
    Music,
    TextData,
    MapData,
    Unknown,
}

impl ContentType {
    pub fn label(self) -> &'static str {
        match self {
            ContentType::Font        => "Font",
            ContentType::Script      => "Script",
            ContentType::Image       => "Image",
            ContentType::Voice       => "Voice",
            ContentType::SoundEffect => "Sound (Sfx)",
            ContentType::FlicAnim    => "Flic (Anim)",
            ContentType::Icon        => "Icon",
            ContentType::Picture     => "Picture",
            ContentType::AudioAnim   => "Audio/Anim",
            ContentType::FlicMovie   => "Flic (Movie)",
            ContentType::Music       => "Music",
            ContentType::TextData    => "Text/Data",
            ContentType::MapData     => "Map Data",
            ContentType::Unknown     => "Unknown",
        }
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Rule table ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Prefix(&'static str),
    Contains(&'static str),
    OneOf(&'static [&'static str]),
}

impl Rule {
    pub fn matches(&self, tag: &str) -> bool {
        match self {
            Rule::Prefix(p)   => tag.starts_with(p),
            Rule::Contains(s) => tag.contains(s),
            Rule::OneOf(set)  => set.contains(&tag),
        }
    }
}

pub const RULES: &[(Rule, ContentType)] = &[
    (Rule::Prefix("FONT_"),   ContentType::Font),
    (Rule::Prefix("SC_"),     ContentType::Script),
    (Rule::Prefix("ILOGO"),   ContentType::Image),
    (Rule::Prefix("V_"),      ContentType::Voice),
    (Rule::Prefix("S_"),      ContentType::SoundEffect),
    (Rule::Prefix("F_"),      ContentType::FlicAnim),
    (Rule::Prefix("I_"),      ContentType::Icon),
    (Rule::Prefix("P_"),      ContentType::Picture),
    (Rule::Prefix("A_"),      ContentType::AudioAnim),
    (Rule::Contains("FLC"),   ContentType::FlicMovie),
    (Rule::Contains("PIC"),   ContentType::Picture),
    (Rule::Contains("MSC"),   ContentType::Music),
    (Rule::OneOf(&["HELP_ENG", "HELP_FRE", "TIPS", "CLANATRB", "ATTRIBS"]), ContentType::TextData),
    (Rule::Prefix("SNOW"),    ContentType::MapData),
    (Rule::Prefix("CRATER"),  ContentType::MapData),
    (Rule::Prefix("GREEN"),   ContentType::MapData),
    (Rule::Prefix("DESERT"),  ContentType::MapData),
];

/// Classify a cleaned tag name against [`RULES`].
pub fn classify_tag(tag: &str) -> ContentType {
    classify_with(RULES, tag)
}

/// Classify against an arbitrary rule table.
pub fn classify_with(rules: &[(Rule, ContentType)], tag: &str) -> ContentType {
    rules
        .iter()
        .find(|(rule, _)| rule.matches(tag))
        .map(|&(_, label)| label)
        .unwrap_or(ContentType::Unknown)
}

/// True for the exact tags whose payload is legacy text.
pub fn is_text_tag(tag: &str) -> bool {
    TEXT_TAGS.contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_rules() {
        assert_eq!(classify_tag("FONT_01"), ContentType::Font);
        assert_eq!(classify_tag("SC_MAIN"), ContentType::Script);
        assert_eq!(classify_tag("ILOGO"), ContentType::Image);
        assert_eq!(classify_tag("V_START"), ContentType::Voice);
        assert_eq!(classify_tag("S_FIRE"), ContentType::SoundEffect);
        assert_eq!(classify_tag("F_TANK"), ContentType::FlicAnim);
        assert_eq!(classify_tag("I_MINE"), ContentType::Icon);
        assert_eq!(classify_tag("P_TRANSP"), ContentType::Picture);
        assert_eq!(classify_tag("A_SCOUT"), ContentType::AudioAnim);
    }

    #[test]
    fn substring_and_exact_rules() {
        assert_eq!(classify_tag("INTROFLC"), ContentType::FlicMovie);
        assert_eq!(classify_tag("MAINPIC"), ContentType::Picture);
        assert_eq!(classify_tag("MAIN_MSC"), ContentType::Music);
        assert_eq!(classify_tag("HELP_ENG"), ContentType::TextData);
        assert_eq!(classify_tag("HELP_FRE"), ContentType::TextData);
        assert_eq!(classify_tag("ATTRIBS"), ContentType::TextData);
        assert_eq!(classify_tag("SNOW_1"), ContentType::MapData);
        assert_eq!(classify_tag("DESERT3"), ContentType::MapData);
        assert_eq!(classify_tag("XYZZY"), ContentType::Unknown);
        assert_eq!(classify_tag(""), ContentType::Unknown);
    }

    #[test]
    fn earlier_rule_wins() {
        assert_eq!(classify_tag("A_PIC"), ContentType::AudioAnim);
        assert_eq!(classify_tag("A_MSC"), ContentType::AudioAnim);
        assert_eq!(classify_tag("PICFLC"), ContentType::FlicMovie);
        assert_eq!(classify_tag("SNOWPIC"), ContentType::Picture);
        // Exact text tags are matched whole, not as prefixes.
        assert_eq!(classify_tag("TIPS2"), ContentType::Unknown);
    }

    #[test]
    fn reordered_table_changes_outcome() {
        let rules = [
            (Rule::Contains("PIC"), ContentType::Picture),
            (Rule::Prefix("A_"),    ContentType::AudioAnim),
        ];
        assert_eq!(classify_with(&rules, "A_PIC"), ContentType::Picture);
    }

    #[test]
    fn classification_is_repeatable() {
        let tags = ["FONT_01", "A_PIC", "HELP_ENG", "XYZZY", "GREEN4"];
        let first: Vec<_> = tags.iter().map(|t| classify_tag(t)).collect();
        let again: Vec<_> = tags.iter().rev().map(|t| classify_tag(t)).rev().collect();
        assert_eq!(first, again);
    }

    #[test]
    fn labels() {
        assert_eq!(ContentType::Font.to_string(), "Font");
        assert_eq!(ContentType::TextData.label(), "Text/Data");
        assert_eq!(serde_json::to_string(&ContentType::AudioAnim).unwrap(), "\"Audio/Anim\"");
    }

    #[test]
    fn text_tag_set_is_exact() {
        assert!(is_text_tag("TIPS"));
        assert!(is_text_tag("CLANATRB"));
        assert!(!is_text_tag("HELP_FRE"));
        assert!(!is_text_tag("TIPS_2"));
    }
}
