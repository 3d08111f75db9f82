use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD: Regex =
        Regex::new(r"[\p{L}\p{N}]+(?:['’_][\p{L}\p{N}]+)*").expect("valid regex");
}

/// One word occurrence in a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercased term
    pub term: String,
    /// Zero-based word position
    pub position: u32,
    /// Byte offset of the first character in the source text
    pub start: usize,
    /// Byte offset one past the last character in the source text
    pub end: usize,
}

/// Splits text into lowercase word tokens, dropping punctuation.
///
/// Offsets refer to the original text so matches can be highlighted in place.
pub fn tokenize(text: &str) -> Vec<Token> {
    WORD.find_iter(text)
        .enumerate()
        .map(|(pos, m)| Token {
            term: m.as_str().to_lowercase(),
            position: pos as u32,
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Lowercased terms of `text`, in order, without offsets
pub fn terms(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}
