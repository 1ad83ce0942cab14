// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text normalization for extracted PDF text
//!
//! Collapses whitespace runs to a single space, drops everything outside
//! printable 7-bit ASCII and trims the result. Whitespace is collapsed
//! around dropped characters, so normalizing twice gives the same text.

/// Returns true for characters kept inside a word
fn is_printable_ascii(c: char) -> bool {
    matches!(c, '\x21'..='\x7e')
}

/// Normalize raw page or chunk text
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.chars().filter(|c| is_printable_ascii(*c)).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a chunk still has content after normalization
///
/// This is the only content-quality filter applied before indexing.
pub fn is_indexable(text: &str) -> bool {
    text.split_whitespace()
        .any(|word| word.chars().any(is_printable_ascii))
}
