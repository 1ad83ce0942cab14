// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! This module provides a wrapper around ONNX Runtime for running
//! the all-MiniLM-L6-v2 sentence transformer model.
//!
//! Features:
//! - ONNX model loading from disk
//! - GPU acceleration via CUDA (with automatic CPU fallback)
//! - BERT tokenization with truncation
//! - Single and batch embedding generation
//! - Mean pooling over token embeddings weighted by the attention mask
//! - L2 normalization of the pooled vector (unit length, as sentence-transformers emits)

use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, ArrayView2, Axis};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

use super::{Embedder, EmbeddingError};

/// Maximum sequence length fed to the model
const MAX_SEQUENCE_LENGTH: usize = 256;

/// ONNX-based sentence embedding model
///
/// The session is shared behind `Arc<Mutex<_>>`; clones are cheap and all
/// of them run inference on the same loaded weights.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    /// Hidden size reported by the model at load time (384 for all-MiniLM-L6-v2)
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

/// Tensors for one tokenized batch, padded to a common length
struct EncodedBatch {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

impl OnnxEmbeddingModel {
    /// Creates a new ONNX embedding model from disk paths
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file or tokenizer file is missing or invalid
    /// - ONNX Runtime initialization fails
    /// - The model does not output `[batch, seq_len, hidden]` token embeddings
    pub async fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        // Try CUDA first, fall back to CPU if unavailable
        info!("Initializing ONNX embedding model {}", model_name);
        let cuda_result = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path);

        let mut session = match cuda_result {
            Ok(s) => {
                info!("CUDA execution provider initialized");
                s
            }
            Err(e) => {
                warn!("CUDA execution provider failed: {}", e);
                warn!("Falling back to CPU execution provider");
                Session::builder()
                    .context("Failed to create session builder")?
                    .with_execution_providers([CPUExecutionProvider::default().build()])
                    .context("Failed to set CPU execution provider")?
                    .with_optimization_level(GraphOptimizationLevel::Level3)
                    .context("Failed to set optimization level")?
                    .with_intra_threads(4)
                    .context("Failed to set intra threads")?
                    .commit_from_file(model_path)
                    .with_context(|| {
                        format!("Failed to load ONNX model from {}", model_path.display())
                    })?
            }
        };

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        // Probe the output shape once; outputs must be dropped before the session moves
        let dimension = {
            let batch = encode_batch(&tokenizer, &["validation test".to_string()])
                .map_err(|e| anyhow::anyhow!("Tokenizer validation failed: {}", e))?;
            let outputs = session.run(ort::inputs![
                "input_ids" => Value::from_array(batch.input_ids)?,
                "attention_mask" => Value::from_array(batch.attention_mask)?,
                "token_type_ids" => Value::from_array(batch.token_type_ids)?
            ])?;
            let output_tensor = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?;
            let output_shape = output_tensor.shape();

            if output_shape.len() != 3 || output_shape[2] == 0 {
                anyhow::bail!(
                    "Model outputs unexpected dimensions: {:?} (expected [batch, seq_len, hidden])",
                    output_shape
                );
            }
            output_shape[2]
        };

        info!(
            "ONNX embedding model {} loaded ({} dimensions)",
            model_name, dimension
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension,
        })
    }

    /// Generates embeddings for multiple texts in one inference call
    ///
    /// Texts are padded to the longest sequence in the batch; padding is
    /// excluded from mean pooling through the attention mask.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch = encode_batch(&self.tokenizer, texts)?;
        let attention_mask = batch.attention_mask.clone();

        let to_inference_err = |e: ort::Error| EmbeddingError::Inference(e.to_string());

        let mut session_guard = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::Inference("ONNX session lock poisoned".to_string()))?;
        let outputs = session_guard
            .run(ort::inputs![
                "input_ids" => Value::from_array(batch.input_ids).map_err(to_inference_err)?,
                "attention_mask" => Value::from_array(batch.attention_mask).map_err(to_inference_err)?,
                "token_type_ids" => Value::from_array(batch.token_type_ids).map_err(to_inference_err)?
            ])
            .map_err(to_inference_err)?;

        // Use index [0] instead of name since different exports name the output differently
        let output_array = outputs[0]
            .try_extract_array::<f32>()
            .map_err(to_inference_err)?;

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch_idx in 0..texts.len() {
            let token_embeddings = output_array
                .index_axis(Axis(0), batch_idx)
                .into_dimensionality::<ndarray::Ix2>()
                .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
            let mask = attention_mask.row(batch_idx);
            let pooled = mean_pool(token_embeddings, mask.as_slice().unwrap_or(&[]));
            let pooled = normalize_vector(pooled);

            if pooled.len() != self.dimension {
                return Err(EmbeddingError::Dimension {
                    expected: self.dimension,
                    actual: pooled.len(),
                });
            }
            embeddings.push(pooled);
        }

        debug!("Encoded {} texts with {}", texts.len(), self.model_name);
        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for OnnxEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::Inference("Model returned no embedding".to_string()))
    }

    /// Runs inference on the blocking pool
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.encode_batch(&texts))
            .await
            .map_err(|e| EmbeddingError::Inference(format!("Embedding task failed: {}", e)))?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> String {
        self.model_name.clone()
    }
}

/// Tokenize texts and pad them to the longest sequence
fn encode_batch(tokenizer: &Tokenizer, texts: &[String]) -> Result<EncodedBatch, EmbeddingError> {
    let encodings = texts
        .iter()
        .map(|text| {
            tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| EmbeddingError::Tokenization(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let max_len = encodings
        .iter()
        .map(|enc| enc.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut input_ids = Vec::with_capacity(texts.len() * max_len);
    let mut attention_mask = Vec::with_capacity(texts.len() * max_len);

    for encoding in &encodings {
        let ids = encoding.get_ids();
        let padding_needed = max_len - ids.len();

        input_ids.extend(ids.iter().map(|&id| id as i64));
        input_ids.extend(std::iter::repeat(0i64).take(padding_needed));
        attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        attention_mask.extend(std::iter::repeat(0i64).take(padding_needed));
    }

    let shape = (texts.len(), max_len);
    let to_err = |e: ndarray::ShapeError| EmbeddingError::Tokenization(e.to_string());

    Ok(EncodedBatch {
        input_ids: Array2::from_shape_vec(shape, input_ids).map_err(to_err)?,
        attention_mask: Array2::from_shape_vec(shape, attention_mask).map_err(to_err)?,
        // All zeros: single-segment input
        token_type_ids: Array2::zeros(shape),
    })
}

/// Average token embeddings, ignoring padding positions
fn mean_pool(token_embeddings: ArrayView2<f32>, mask: &[i64]) -> Vec<f32> {
    let hidden_dim = token_embeddings.shape()[1];
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for (row, &mask_value) in token_embeddings.outer_iter().zip(mask.iter()) {
        let weight = mask_value as f32;
        sum_mask += weight;
        for (acc, value) in pooled.iter_mut().zip(row.iter()) {
            *acc += value * weight;
        }
    }

    for val in &mut pooled {
        *val /= sum_mask.max(1e-9);
    }
    pooled
}

/// Scale to unit L2 norm; zero and non-finite magnitudes are left as is
fn normalize_vector(mut vector: Vec<f32>) -> Vec<f32> {
    let magnitude = vector.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return vector;
    }
    for value in &mut vector {
        *value /= magnitude;
    }
    vector
}
