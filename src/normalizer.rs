// 🧹 Name Normalizer - Noise removal + compound owner splitting
//
// Problem solved:
// - "SMITH JOHN*", "SMITH\u{a0}\u{a0}JOHN" → "SMITH JOHN"
// - "JOHN SMITH & JANE SMITH" → ["JOHN SMITH", "JANE SMITH"]
// - "NONE", "N/A" → nothing at all (filtered, not an error)

use std::borrow::Cow;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::vocabulary::Vocabulary;

lazy_static! {
    /// ", AND" and standalone AND (never the "AND" inside ANDERSON)
    static ref AND_DELIMITER: Regex =
        Regex::new(r"(?i)(?:\s*,\s*|\s+|^)AND(?:\s+|$)").expect("AND delimiter regex");

    /// Husband/wife markers that would otherwise be split on '/' or '&'
    static ref MARITAL_MARKER: Regex =
        Regex::new(r"(?i)\b(?:H\s*[/&]\s*W|W\s*[/&]\s*H)\b").expect("marital marker regex");

    /// "ET AL", "ET UX", "ET VIR" written as two words
    static ref ET_QUALIFIER: Regex =
        Regex::new(r"(?i)\bET\.?\s+(?:ALS?|UX|VIR)\b\.?").expect("et-qualifier regex");
}

/// Internal split marker; never present in normalized input
const SPLIT_MARK: char = '\u{1f}';

// ============================================================================
// NAME NORMALIZER
// ============================================================================

#[derive(Debug, Clone)]
pub struct NameNormalizer {
    vocabulary: Arc<Vocabulary>,
}

impl NameNormalizer {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        NameNormalizer { vocabulary }
    }

    /// Strip asterisks and non-breaking spaces, collapse whitespace, trim.
    pub fn normalize(&self, raw: &str) -> String {
        normalize(raw)
    }

    /// Split a compound owner string into individual name candidates.
    ///
    /// Delimiters: `/`, `&`, `, AND`, standalone `AND` (case-insensitive).
    /// A `/` between two digits is part of an ownership fraction and is kept.
    /// Empty pieces and sentinels are dropped; empty input yields an empty list.
    pub fn split(&self, raw: &str) -> Vec<String> {
        let cleaned = normalize(raw);
        if cleaned.is_empty() || self.vocabulary.is_sentinel(&cleaned) {
            return Vec::new();
        }

        let cleaned = MARITAL_MARKER.replace_all(&cleaned, " ");
        let marked = AND_DELIMITER.replace_all(&cleaned, SPLIT_MARK.to_string().as_str());
        let marked = mark_symbol_delimiters(&marked);

        marked
            .split(SPLIT_MARK)
            .map(|piece| normalize(piece.trim_matches(|c: char| c == ',' || c.is_whitespace())))
            .filter(|piece| !piece.is_empty())
            .filter(|piece| !self.vocabulary.is_sentinel(piece))
            .collect()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(Vocabulary::standard()))
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Normalize a raw name string
///
/// - Asterisks and non-breaking spaces become plain spaces
/// - Collapse whitespace runs to one space and trim
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == '*' || c == '\u{a0}' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove two-word tenancy qualifiers ("ET AL", "ET UX") and H/W markers.
pub fn strip_qualifier_phrases(raw: &str) -> Cow<'_, str> {
    let without_markers = MARITAL_MARKER.replace_all(raw, " ");
    if !ET_QUALIFIER.is_match(&without_markers) {
        return without_markers;
    }
    Cow::Owned(ET_QUALIFIER.replace_all(&without_markers, " ").into_owned())
}

/// Replace `&` and non-fraction `/` with the split marker.
fn mark_symbol_delimiters(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '&' => out.push(SPLIT_MARK),
            '/' if is_fraction_slash(&chars, i) => out.push(c),
            '/' => out.push(SPLIT_MARK),
            _ => out.push(c),
        }
    }

    out
}

/// True when the nearest non-space characters on both sides are digits.
fn is_fraction_slash(chars: &[char], slash: usize) -> bool {
    let before = chars[..slash].iter().rev().find(|c| !c.is_whitespace());
    let after = chars[slash + 1..].iter().find(|c| !c.is_whitespace());

    matches!((before, after), (Some(b), Some(a)) if b.is_ascii_digit() && a.is_ascii_digit())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_noise() {
        assert_eq!(normalize("  SMITH   JOHN* "), "SMITH JOHN");
        assert_eq!(normalize("SMITH\u{a0}\u{a0}JOHN"), "SMITH JOHN");
        assert_eq!(normalize("***"), "");
    }

    #[test]
    fn test_split_on_ampersand() {
        let normalizer = NameNormalizer::default();
        assert_eq!(
            normalizer.split("John Smith & Jane Smith"),
            vec!["John Smith", "Jane Smith"]
        );
    }

    #[test]
    fn test_split_on_and_forms() {
        let normalizer = NameNormalizer::default();

        assert_eq!(
            normalizer.split("SMITH, JOHN, AND DOE, JANE"),
            vec!["SMITH, JOHN", "DOE, JANE"]
        );
        assert_eq!(
            normalizer.split("John Smith and Jane Doe"),
            vec!["John Smith", "Jane Doe"]
        );
        // ANDERSON and ANDREW are names, not delimiters
        assert_eq!(
            normalizer.split("ANDREW ANDERSON"),
            vec!["ANDREW ANDERSON"]
        );
    }

    #[test]
    fn test_split_on_slash_keeps_fractions() {
        let normalizer = NameNormalizer::default();

        assert_eq!(
            normalizer.split("SMITH JOHN/DOE JANE"),
            vec!["SMITH JOHN", "DOE JANE"]
        );
        assert_eq!(
            normalizer.split("SMITH JOHN 1/2 INT/DOE JANE 1 / 2 INT"),
            vec!["SMITH JOHN 1/2 INT", "DOE JANE 1 / 2 INT"]
        );
    }

    #[test]
    fn test_split_drops_marital_markers() {
        let normalizer = NameNormalizer::default();
        assert_eq!(
            normalizer.split("SMITH JOHN & JANE H/W"),
            vec!["SMITH JOHN", "JANE"]
        );
    }

    #[test]
    fn test_split_filters_sentinels_and_empties() {
        let normalizer = NameNormalizer::default();

        assert!(normalizer.split("").is_empty());
        assert!(normalizer.split("   ").is_empty());
        assert!(normalizer.split("NONE").is_empty());
        assert!(normalizer.split("n/a").is_empty());
        assert_eq!(normalizer.split("JOHN SMITH & UNKNOWN"), vec!["JOHN SMITH"]);
        assert_eq!(normalizer.split("& JOHN SMITH /"), vec!["JOHN SMITH"]);
    }

    #[test]
    fn test_split_output_never_contains_delimiters() {
        let normalizer = NameNormalizer::default();
        let pieces = normalizer.split("A B & C D / E F and G H, AND I J");

        assert_eq!(pieces.len(), 5);
        for piece in pieces {
            assert!(!piece.contains('&'));
            assert!(!piece.contains('/'));
            assert!(!piece.to_uppercase().split_whitespace().any(|t| t == "AND"));
        }
    }

    #[test]
    fn test_strip_qualifier_phrases() {
        assert_eq!(strip_qualifier_phrases("SMITH JOHN ET AL").trim(), "SMITH JOHN");
        assert_eq!(strip_qualifier_phrases("SMITH JOHN ET UX").trim(), "SMITH JOHN");
        assert_eq!(strip_qualifier_phrases("AL SMITH"), "AL SMITH");
    }
}
