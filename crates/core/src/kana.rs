//! Japanese reading (フリガナ) helpers: phonetic row classification and
//! Japanese collation of readings.

use std::{cmp::Ordering, fmt};

use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;

/// One of the eleven fixed rows (行) customers are grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowLabel {
    A,
    Ka,
    Sa,
    Ta,
    Na,
    Ha,
    Ma,
    Ya,
    Ra,
    Wa,
    Other,
}

impl RowLabel {
    /// Display order of the rows.
    pub const ALL: [RowLabel; 11] = [
        Self::A,
        Self::Ka,
        Self::Sa,
        Self::Ta,
        Self::Na,
        Self::Ha,
        Self::Ma,
        Self::Ya,
        Self::Ra,
        Self::Wa,
        Self::Other,
    ];

    /// Returns the heading shown for the row.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "あ行",
            Self::Ka => "か行",
            Self::Sa => "さ行",
            Self::Ta => "た行",
            Self::Na => "な行",
            Self::Ha => "は行",
            Self::Ma => "ま行",
            Self::Ya => "や行",
            Self::Ra => "ら行",
            Self::Wa => "わ行",
            Self::Other => "他",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Classifies a reading by its first character.
    ///
    /// Only katakana is recognised, voiced and semi-voiced forms included.
    /// Empty readings, hiragana and anything else fall into
    /// [`RowLabel::Other`].
    pub fn classify(kana: &str) -> Self {
        let Some(first) = kana.chars().next() else {
            return Self::Other;
        };

        match first as u32 {
            0x30A2..=0x30AA => Self::A,
            0x30AB..=0x30B4 => Self::Ka,
            0x30B5..=0x30BE => Self::Sa,
            0x30BF..=0x30C9 => Self::Ta,
            0x30CA..=0x30CE => Self::Na,
            0x30CF..=0x30DD => Self::Ha,
            0x30DE..=0x30E2 => Self::Ma,
            0x30E4..=0x30E8 => Self::Ya,
            0x30E9..=0x30ED => Self::Ra,
            0x30EF..=0x30F3 => Self::Wa,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for RowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orders readings with the ICU Japanese (`ja`) collation rules.
///
/// Hiragana and katakana are equal at the primary level, the long-vowel mark
/// ー weighs as the vowel before it, voicing marks are secondary and
/// small/large kana and script differences are tertiary.
pub struct KanaCollator {
    collator: Option<Collator>,
}

impl KanaCollator {
    pub fn new() -> Self {
        // Compiled data always carries `ja`; code point order is only a fallback.
        let collator = Collator::try_new(&locale!("ja").into(), CollatorOptions::new()).ok();
        Self { collator }
    }

    pub fn compare(&self, left: &str, right: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(left, right),
            None => left.cmp(right),
        }
    }
}

impl Default for KanaCollator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_plain_rows() {
        let cases = [
            ("アオキ", RowLabel::A),
            ("カノン", RowLabel::Ka),
            ("サトウ", RowLabel::Sa),
            ("タナカ", RowLabel::Ta),
            ("ナカムラ", RowLabel::Na),
            ("ハヤシ", RowLabel::Ha),
            ("マツモト", RowLabel::Ma),
            ("ヤマダ", RowLabel::Ya),
            ("リュウ", RowLabel::Ra),
            ("ワタナベ", RowLabel::Wa),
        ];
        for (kana, expected) in cases {
            assert_eq!(RowLabel::classify(kana), expected, "{kana}");
        }
    }

    #[test]
    fn voiced_forms_share_their_row() {
        assert_eq!(RowLabel::classify("ガリレオ"), RowLabel::Ka);
        assert_eq!(RowLabel::classify("ゴトウ"), RowLabel::Ka);
        assert_eq!(RowLabel::classify("ザイツ"), RowLabel::Sa);
        assert_eq!(RowLabel::classify("ドイ"), RowLabel::Ta);
        assert_eq!(RowLabel::classify("バンドウ"), RowLabel::Ha);
        assert_eq!(RowLabel::classify("ポール"), RowLabel::Ha);
    }

    #[test]
    fn hiragana_readings_fall_into_other() {
        assert_eq!(RowLabel::classify("やまだ"), RowLabel::Other);
        assert_eq!(RowLabel::classify("がりれお"), RowLabel::Other);
        assert_eq!(RowLabel::classify("をがわ"), RowLabel::Other);
    }

    #[test]
    fn everything_else_is_other() {
        for kana in ["", "山田", "Smith", "ヴィヴィアン", "ー", "ァ", " ヤマダ"] {
            assert_eq!(RowLabel::classify(kana), RowLabel::Other, "{kana:?}");
        }
    }

    #[test]
    fn labels_render_in_display_order() {
        let labels: Vec<&str> = RowLabel::ALL.iter().map(|label| label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["あ行", "か行", "さ行", "た行", "な行", "は行", "ま行", "や行", "ら行", "わ行", "他"]
        );
        assert!(RowLabel::ALL.windows(2).all(|pair| pair[0] < pair[1]));
    }

    fn compare_kana(left: &str, right: &str) -> Ordering {
        KanaCollator::new().compare(left, right)
    }

    fn sorted(readings: &[&'static str]) -> Vec<&'static str> {
        let collator = KanaCollator::new();
        let mut readings = readings.to_vec();
        readings.sort_by(|left, right| collator.compare(left, right));
        readings
    }

    #[test]
    fn voicing_is_secondary_to_the_following_characters() {
        assert_eq!(compare_kana("カノン", "ガリレオ"), Ordering::Less);
        assert_eq!(compare_kana("ガノン", "カリレオ"), Ordering::Less);
        assert_eq!(compare_kana("カト", "ガト"), Ordering::Less);
        assert_eq!(compare_kana("ハト", "バト"), Ordering::Less);
        assert_eq!(compare_kana("バト", "パト"), Ordering::Less);
    }

    #[test]
    fn script_differences_do_not_affect_primary_order() {
        assert_eq!(compare_kana("あべ", "アキ"), Ordering::Greater);
        assert_eq!(compare_kana("ヤマダ", "ヤマダ"), Ordering::Equal);
    }

    #[test]
    fn katakana_precedes_hiragana_on_a_tie() {
        assert_eq!(compare_kana("ヤマダ", "やまだ"), Ordering::Less);
        assert_eq!(sorted(&["やまだ", "ヤマダ"]), vec!["ヤマダ", "やまだ"]);
    }

    #[test]
    fn long_vowel_mark_weighs_as_the_preceding_vowel() {
        assert_eq!(sorted(&["ユカ", "ユウキ", "ユーキ"]), vec!["ユーキ", "ユウキ", "ユカ"]);
        assert_eq!(sorted(&["ジョン", "ジョーンズ"]), vec!["ジョーンズ", "ジョン"]);
        assert_eq!(compare_kana("サトー", "サトシ"), Ordering::Less);
    }

    #[test]
    fn small_kana_sorts_next_to_its_large_form() {
        assert_eq!(compare_kana("キャ", "キユ"), Ordering::Less);
        assert_eq!(compare_kana("ハット", "ハツネ"), Ordering::Less);
    }

    #[test]
    fn empty_reading_sorts_first() {
        assert_eq!(compare_kana("", "ア"), Ordering::Less);
        assert_eq!(compare_kana("", ""), Ordering::Equal);
    }
}
