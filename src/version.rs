// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for askdoc

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-streamed-answers-2026-10-17";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Major version number
pub const VERSION_MAJOR: u32 = 0;

/// Minor version number
pub const VERSION_MINOR: u32 = 1;

/// Patch version number
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2026-10-17";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "pdf-ingestion",
    "overlapping-chunks",
    "onnx-embeddings",
    "exact-l2-retrieval",
    "session-index-cache",
    "streamed-completions",
    "groq-openai-compatible",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("askdoc {} ({})", VERSION_NUMBER, BUILD_DATE)
}
