// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use askdoc::rag::chunker::{ChunkerConfig, TextChunker};
use askdoc::rag::normalizer::normalize_text;

use crate::common::text_of_len;

#[test]
fn test_1200_chars_gives_three_windows() {
    let chunker = TextChunker::default();
    let text = text_of_len(1200);
    let chunks = chunker.split_sections(&[text.as_str()]);

    let spans: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end())).collect();
    assert_eq!(spans, vec![(0, 500), (450, 950), (900, 1200)]);
    assert_eq!(chunks[1].content, &text[450..950]);
}

#[test]
fn test_every_window_starts_stride_after_previous() {
    let chunker = TextChunker::default();
    let text = text_of_len(5_321);
    let chunks = chunker.split_text(&text);

    assert_eq!(chunks.len(), chunker.expected_chunk_count(5_321));
    for pair in chunks.windows(2) {
        assert_eq!(pair[1].start - pair[0].start, 450);
        assert_eq!(pair[1].index, pair[0].index + 1);
    }
    assert_eq!(chunks.last().unwrap().end(), 5_321);
}

#[test]
fn test_chunking_is_deterministic() {
    let chunker = TextChunker::default();
    let pages = ["Page one text.", "   ", "Page\ttwo\n\ntext."];
    assert_eq!(chunker.split_sections(&pages), chunker.split_sections(&pages));
}

#[test]
fn test_pages_joined_with_single_space() {
    let chunker = TextChunker::default();
    let chunks = chunker.split_sections(&["alpha\n", "", "  beta  "]);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "alpha beta");
}

#[test]
fn test_custom_window() {
    let chunker = TextChunker::new(ChunkerConfig {
        chunk_size: 10,
        chunk_overlap: 2,
    })
    .unwrap();
    let chunks = chunker.split_text(&text_of_len(26));
    let starts: Vec<usize> = chunks.iter().map(|c| c.start).collect();
    assert_eq!(starts, vec![0, 8, 16]);
}

#[test]
fn test_invalid_config_rejected() {
    let err = TextChunker::new(ChunkerConfig {
        chunk_size: 50,
        chunk_overlap: 50,
    })
    .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONFIG");
}

#[test]
fn test_normalizer_idempotent_on_messy_text() {
    let raw = "Résumé:\u{00a0}\u{00a0}skills\t\n•  Rust  \u{200b}\u{0007}tokio ";
    let once = normalize_text(raw);
    assert_eq!(normalize_text(&once), once);
    assert!(!once.contains("  "));
    assert!(once.is_ascii());
}
