// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding model file resolution
//!
//! Local paths win when both the ONNX model and the tokenizer are
//! configured. Otherwise the files are fetched from the Hugging Face hub
//! once and served from its local cache afterwards.

use anyhow::{Context, Result};
use hf_hub::api::tokio::Api;
use std::path::PathBuf;
use tracing::info;

use super::OnnxEmbeddingModel;
use crate::config::EmbeddingSettings;

/// ONNX export path inside a sentence-transformers hub repository
pub const HUB_MODEL_FILE: &str = "onnx/model.onnx";

/// Tokenizer path inside a sentence-transformers hub repository
pub const HUB_TOKENIZER_FILE: &str = "tokenizer.json";

/// Paths to the files needed to load an embedding model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

/// Return configured local files if both are present
pub fn local_model_files(settings: &EmbeddingSettings) -> Option<ModelFiles> {
    match (&settings.model_path, &settings.tokenizer_path) {
        (Some(model_path), Some(tokenizer_path)) => Some(ModelFiles {
            model_path: model_path.clone(),
            tokenizer_path: tokenizer_path.clone(),
        }),
        _ => None,
    }
}

/// Resolve model files, downloading from the hub when no local files are configured
pub async fn resolve_model_files(settings: &EmbeddingSettings) -> Result<ModelFiles> {
    if let Some(files) = local_model_files(settings) {
        info!("Using local embedding model files: {}", files.model_path.display());
        return Ok(files);
    }

    info!("Fetching embedding model {} from the Hugging Face hub", settings.repo);
    let api = Api::new().context("Failed to initialize Hugging Face hub client")?;
    let repo = api.model(settings.repo.clone());

    let model_path = repo
        .get(HUB_MODEL_FILE)
        .await
        .with_context(|| format!("Failed to download {} from {}", HUB_MODEL_FILE, settings.repo))?;
    let tokenizer_path = repo
        .get(HUB_TOKENIZER_FILE)
        .await
        .with_context(|| {
            format!("Failed to download {} from {}", HUB_TOKENIZER_FILE, settings.repo)
        })?;

    Ok(ModelFiles {
        model_path,
        tokenizer_path,
    })
}

/// Resolve the model files and load the ONNX embedding model
pub async fn load_embedding_model(settings: &EmbeddingSettings) -> Result<OnnxEmbeddingModel> {
    let files = resolve_model_files(settings).await?;
    let model_name = settings
        .repo
        .rsplit('/')
        .next()
        .unwrap_or(settings.repo.as_str())
        .to_string();
    OnnxEmbeddingModel::new(model_name, files.model_path, files.tokenizer_path).await
}
