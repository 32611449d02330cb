//! Path tokenization
//!
//! Two independent policies live here:
//! - search tokens: lower-cased runs of `[a-z0-9+#]`, so `C++` and `C#` stay whole
//! - rarity words: raw segments split on `/` and `_`, case preserved

use std::collections::BTreeSet;

/// Returns true if the character belongs to a search token
const fn is_token_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '+' || c == '#'
}

/// Split text into search tokens.
///
/// The text is lower-cased and split on every run of characters outside
/// `[a-z0-9+#]`. Empty tokens are dropped and order is preserved, duplicates
/// included.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !is_token_char(c))
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Expand a token into all of its non-empty forward prefixes, shortest first.
///
/// `"rust"` yields `r`, `ru`, `rus`, `rust`.
pub fn forward_prefixes(token: &str) -> impl Iterator<Item = &str> {
    // tokens are ASCII so every byte offset is a char boundary
    (1..=token.len()).map(move |end| &token[..end])
}

/// Search tokens of a path with their forward prefixes, deduplicated.
///
/// This is the token set the index stores for one catalog entry.
#[must_use]
pub fn index_terms(path: &str) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    for token in tokenize(path) {
        for prefix in forward_prefixes(&token) {
            if !terms.contains(prefix) {
                terms.insert(prefix.to_owned());
            }
        }
    }
    terms
}

/// Split a path into rarity words on `/` and `_`, dropping empty segments.
#[must_use]
pub fn rarity_words(path: &str) -> BTreeSet<&str> {
    path.split(['/', '_']).filter(|word| !word.is_empty()).collect()
}
