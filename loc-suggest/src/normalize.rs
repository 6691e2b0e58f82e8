//! Query normalisation applied before both retrieval and scoring.
//!
//! Folds diacritics, lowercases and collapses whitespace. Punctuation is
//! left alone: the suggest service indexes headings such as
//! `United States--History` with their punctuation, and the scorer
//! discards it on its own.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalise free text for lookup.
///
/// Performs:
/// - Unicode NFKD decomposition, dropping combining marks
/// - NFC recomposition of what remains
/// - Lowercase conversion
/// - Whitespace collapsing and trimming
///
/// # Examples
///
/// ```
/// use loc_suggest::normalize::normalize;
///
/// assert_eq!(normalize("  Dvořák,   Antonín "), "dvorak, antonin");
/// assert_eq!(normalize("United States--History"), "united states--history");
/// ```
pub fn normalize(text: &str) -> String {
    let folded = fold(text).to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compatibility-decompose `text`, drop combining marks and recompose.
///
/// Shared by [`normalize`] and the scorer so that queries and remote
/// labels are compared in the same form.
pub fn fold(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_collapses_whitespace() {
        assert_eq!(normalize("  Mark \t Twain\n"), "mark twain");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(normalize("Brontë, Charlotte"), "bronte, charlotte");
        assert_eq!(normalize("Gabriel García Márquez"), "gabriel garcia marquez");
    }

    #[test]
    fn compatibility_forms_are_folded() {
        // Ligature and full-width forms decompose under NFKD.
        assert_eq!(normalize("ﬁlm noir"), "film noir");
        assert_eq!(normalize("ＡＢＣ"), "abc");
    }

    #[test]
    fn keeps_punctuation() {
        assert_eq!(normalize("Twain, Mark, 1835-1910"), "twain, mark, 1835-1910");
    }

    #[test]
    fn empty_and_blank_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn idempotent() {
        let once = normalize("  Ångström,  Anders Jonas ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn fold_keeps_case_and_punctuation() {
        assert_eq!(fold("Gödel, Kurt, 1906-1978"), "Godel, Kurt, 1906-1978");
        assert_eq!(fold("ﬁlm"), "film");
    }

    #[test]
    fn non_latin_scripts_survive() {
        assert_eq!(normalize("Толстой, Лев"), "толстой, лев");
    }
}
