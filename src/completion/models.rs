// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Supported completion models and sampling parameters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Sampling temperature for every request
pub const TEMPERATURE: f32 = 0.7;

/// Maximum tokens generated per answer
pub const MAX_TOKENS: u32 = 512;

/// Nucleus sampling cutoff
pub const TOP_P: f32 = 0.9;

/// Chat models offered by the Groq endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompletionModel {
    #[default]
    #[serde(rename = "meta-llama/llama-4-scout-17b-16e-instruct")]
    Llama4Scout,
    #[serde(rename = "llama-3.3-70b-versatile")]
    Llama33Versatile,
    #[serde(rename = "deepseek-r1-distill-llama-70b")]
    DeepseekR1DistillLlama70b,
}

impl CompletionModel {
    /// Every selectable model, default first
    pub const ALL: [CompletionModel; 3] = [
        CompletionModel::Llama4Scout,
        CompletionModel::Llama33Versatile,
        CompletionModel::DeepseekR1DistillLlama70b,
    ];

    /// Model identifier as sent to the API
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionModel::Llama4Scout => "meta-llama/llama-4-scout-17b-16e-instruct",
            CompletionModel::Llama33Versatile => "llama-3.3-70b-versatile",
            CompletionModel::DeepseekR1DistillLlama70b => "deepseek-r1-distill-llama-70b",
        }
    }
}

impl fmt::Display for CompletionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        CompletionModel::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownModel(name.to_string()))
    }
}
