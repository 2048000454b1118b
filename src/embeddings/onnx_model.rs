// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs the all-MiniLM-L6-v2 sentence transformer through ONNX Runtime on
//! the CPU and exposes it as an [`Embedder`].
//!
//! Features:
//! - ONNX model loading from disk
//! - BERT tokenization
//! - Single and batch embedding generation
//! - Attention-masked mean pooling over token embeddings
//! - 384-dimensional output vectors

use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, ArrayView2, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::info;

use super::Embedder;
use crate::errors::KbError;

/// ONNX-based embedding model (all-MiniLM-L6-v2)
///
/// # Model Details
/// - Input: Text strings
/// - Output: token embeddings `[batch, seq_len, hidden]`, mean pooled here
/// - Provider: CPU (ONNX Runtime)
///
/// # Thread Safety
/// Fields are wrapped in Arc for cheap cloning; the session sits behind a
/// Mutex because `Session::run` needs exclusive access.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    /// Output dimension, measured on the model at load time
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

/// Token ids and attention masks for a padded batch
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
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - Model output is not `[batch, seq_len, expected_dimension]`
    ///
    /// # Example
    /// ```ignore
    /// let model = OnnxEmbeddingModel::new(
    ///     "all-MiniLM-L6-v2",
    ///     "./models/all-MiniLM-L6-v2-onnx/model.onnx",
    ///     "./models/all-MiniLM-L6-v2-onnx/tokenizer.json",
    ///     384,
    /// )?;
    /// ```
    pub fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
        expected_dimension: usize,
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

        info!("Initializing ONNX embedding model {}", model_name);
        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let mut model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: expected_dimension,
        };

        // Measure the output width with a tiny inference
        let sample = model.run(&["validation test".to_string()])?;
        let actual = sample.first().map(Vec::len).unwrap_or(0);
        if actual != expected_dimension {
            anyhow::bail!(
                "Model outputs {}-dimensional embeddings (expected {})",
                actual,
                expected_dimension
            );
        }
        model.dimension = actual;

        info!("ONNX embedding model loaded ({}D)", model.dimension);
        Ok(model)
    }

    fn encode(&self, texts: &[String]) -> Result<EncodedBatch> {
        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = Array2::<i64>::zeros((texts.len(), max_len));
        let mut attention_mask = Array2::<i64>::zeros((texts.len(), max_len));
        for (row, encoding) in encodings.iter().enumerate() {
            for (col, (&id, &mask)) in encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .enumerate()
            {
                input_ids[[row, col]] = id as i64;
                attention_mask[[row, col]] = mask as i64;
            }
        }

        Ok(EncodedBatch {
            input_ids,
            attention_mask,
            token_type_ids: Array2::<i64>::zeros((texts.len(), max_len)),
        })
    }

    /// Tokenize, run the session and mean-pool every row of the batch
    fn run(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch = self.encode(texts)?;
        let attention_mask = batch.attention_mask.clone();

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(batch.input_ids)?,
            "attention_mask" => Value::from_array(batch.attention_mask)?,
            "token_type_ids" => Value::from_array(batch.token_type_ids)?
        ])?;

        // Use index [0] instead of name since exports differ in output names
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        if output.ndim() != 3 {
            anyhow::bail!(
                "Model outputs unexpected shape {:?} (expected [batch, seq_len, hidden])",
                output.shape()
            );
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch_idx in 0..texts.len() {
            let tokens = output
                .index_axis(Axis(0), batch_idx)
                .into_dimensionality::<ndarray::Ix2>()
                .context("Unexpected token embedding rank")?;
            let mask = attention_mask.row(batch_idx);
            embeddings.push(mean_pool(tokens, mask.as_slice().unwrap_or(&[])));
        }

        Ok(embeddings)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Attention-masked mean over the sequence axis
fn mean_pool(tokens: ArrayView2<'_, f32>, mask: &[i64]) -> Vec<f32> {
    let hidden = tokens.ncols();
    let mut pooled = vec![0.0f32; hidden];
    let mut sum_mask = 0.0f32;

    for (i, token) in tokens.axis_iter(Axis(0)).enumerate() {
        let weight = mask.get(i).copied().unwrap_or(0) as f32;
        sum_mask += weight;
        for (acc, value) in pooled.iter_mut().zip(token.iter()) {
            *acc += value * weight;
        }
    }

    for value in &mut pooled {
        *value /= sum_mask.max(1e-9);
    }
    pooled
}

#[async_trait]
impl Embedder for OnnxEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> crate::errors::Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| KbError::Embedding("model returned no embedding".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> crate::errors::Result<Vec<Vec<f32>>> {
        let model = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.run(&texts))
            .await
            .map_err(|e| KbError::Embedding(format!("embedding task failed: {}", e)))?
            .map_err(|e| KbError::Embedding(format!("{:#}", e)))
    }
}
