// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding boundary
//!
//! The knowledge base never picks a model itself; it talks to an
//! [`Embedder`]. Two implementations ship with the crate:
//! - [`HashEmbedder`]: deterministic feature hashing, no model files needed
//! - `OnnxEmbeddingModel` (feature `onnx`): all-MiniLM-L6-v2 via ONNX Runtime

#[cfg(feature = "onnx")]
pub mod onnx_model;

#[cfg(feature = "onnx")]
pub use onnx_model::OnnxEmbeddingModel;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::config::{EmbeddingBackend, EmbeddingSettings};
use crate::errors::{KbError, Result};

/// Maps text to a fixed-dimension vector
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts).await
    }
}

pub const HASH_EMBEDDER_NAME: &str = "feature-hash";

/// Deterministic bag-of-words embedder
///
/// Every lowercase alphanumeric token is hashed with SHA-256 into one bucket
/// with a +1/-1 sign. Texts sharing words get positive cosine similarity, and
/// identical texts always map to identical vectors across runs and platforms.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    normalize: bool,
}

impl HashEmbedder {
    pub fn new(dimension: usize, normalize: bool) -> Result<Self> {
        if dimension == 0 {
            return Err(KbError::Config(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            normalize,
        })
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        if self.normalize {
            let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in &mut embedding {
                    *value /= norm;
                }
            }
        }

        embedding
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        HASH_EMBEDDER_NAME
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate(text))
    }
}

/// Construct the embedder selected by `settings`
pub fn from_settings(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    match settings.backend {
        EmbeddingBackend::Hash => Ok(Box::new(HashEmbedder::new(settings.dimension, true)?)),
        #[cfg(feature = "onnx")]
        EmbeddingBackend::Onnx => {
            let model = OnnxEmbeddingModel::new(
                settings.model_name.clone(),
                &settings.model_path,
                &settings.tokenizer_path,
                settings.dimension,
            )
            .map_err(|e| KbError::Embedding(format!("{:#}", e)))?;
            Ok(Box::new(model))
        }
        #[cfg(not(feature = "onnx"))]
        EmbeddingBackend::Onnx => Err(KbError::Config(
            "The onnx embedder needs a build with `--features onnx`".to_string(),
        )),
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}
