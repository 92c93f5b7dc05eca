//! Word normalization
//!
//! A word's canonical form is trimmed and title-cased: "meat loaf",
//! "MEAT LOAF", and " Meat  Loaf " all normalize to "Meat Loaf". Every
//! writer must produce this exact form; deterministic slate ids are a hash
//! over normalized members, so normalization has to be byte-for-byte stable
//! across the whole engine.

use crate::error::{Error, Result};

/// Maximum accepted word length, in characters, after trimming
pub const MAX_WORD_LENGTH: usize = 50;

/// Title-case each whitespace-separated token
///
/// First character uppercased, rest lowercased, tokens joined by a single
/// space. Collapses runs of internal whitespace.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => {
                    let mut out: String = first.to_uppercase().collect();
                    out.extend(chars.flat_map(|c| c.to_lowercase()));
                    out
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a raw word into its canonical dictionary form
///
/// Trims, rejects empty and over-long input, and title-cases the rest.
pub fn normalize_word(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("word is empty".to_string()));
    }
    if trimmed.chars().count() > MAX_WORD_LENGTH {
        return Err(Error::InvalidInput(format!(
            "word exceeds {} characters",
            MAX_WORD_LENGTH
        )));
    }
    Ok(title_case(trimmed))
}
