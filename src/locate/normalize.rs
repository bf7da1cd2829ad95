use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use unidecode::unidecode;

/// Folds a name for cross-dataset comparison: decomposes, drops combining
/// marks, trims and lower-cases. Total over any input.
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// First two letters of `name`, transliterated to ASCII and upper-cased.
/// Empty when the name carries no letters at all.
pub fn abbreviate(name: &str) -> String {
    unidecode(name)
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect::<String>()
        .to_uppercase()
}
