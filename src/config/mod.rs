// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the course knowledge base
//!
//! Values come from a TOML file (`KbConfig::from_file`) or from `KB_*`
//! environment variables (`KbConfig::from_env`); anything not set falls back
//! to the defaults below.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::chunker::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::errors::{KbError, Result};

pub const DEFAULT_DATABASE_PATH: &str = "knowledge_base.db";
pub const DEFAULT_DATA_PATH: &str = "final_courses_data.json";
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_MODEL_PATH: &str = "./models/all-MiniLM-L6-v2-onnx/model.onnx";
pub const DEFAULT_TOKENIZER_PATH: &str = "./models/all-MiniLM-L6-v2-onnx/tokenizer.json";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Which embedder turns text into vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Deterministic feature hashing, no model files
    Hash,
    /// all-MiniLM-L6-v2 through ONNX Runtime (feature `onnx`)
    Onnx,
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        if cfg!(feature = "onnx") {
            EmbeddingBackend::Onnx
        } else {
            EmbeddingBackend::Hash
        }
    }
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hash" => Ok(EmbeddingBackend::Hash),
            "onnx" => Ok(EmbeddingBackend::Onnx),
            other => Err(format!("Unknown embedding backend '{}' (expected hash or onnx)", other)),
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingBackend::Hash => write!(f, "hash"),
            EmbeddingBackend::Onnx => write!(f, "onnx"),
        }
    }
}

/// Embedding model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    /// Model identifier reported by the embedder
    pub model_name: String,
    /// ONNX model file (onnx backend only)
    pub model_path: PathBuf,
    /// tokenizer.json (onnx backend only)
    pub tokenizer_path: PathBuf,
    /// Output vector dimension
    pub dimension: usize,
    /// Texts per embedding call during a build
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            tokenizer_path: PathBuf::from(DEFAULT_TOKENIZER_PATH),
            dimension: DEFAULT_EMBEDDING_DIMENSION,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Knowledge base configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KbConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Course catalog JSON
    pub data_path: PathBuf,
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
    /// Results returned per query
    pub top_k: usize,
    pub embedding: EmbeddingSettings,
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl KbConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unparseable values are ignored
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_vars(lookup);
        config
    }

    /// Overlay `KB_*` variables onto this configuration
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());

        if let Some(path) = lookup("KB_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("KB_DATA_PATH") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(size) = parsed("KB_CHUNK_SIZE") {
            self.chunk_size = size;
        }
        if let Some(overlap) = parsed("KB_CHUNK_OVERLAP") {
            self.chunk_overlap = overlap;
        }
        if let Some(k) = parsed("KB_TOP_K") {
            self.top_k = k;
        }
        if let Some(backend) = lookup("KB_EMBEDDER").and_then(|v| v.parse().ok()) {
            self.embedding.backend = backend;
        }
        if let Some(name) = lookup("KB_EMBEDDING_MODEL") {
            self.embedding.model_name = name;
        }
        if let Some(path) = lookup("KB_EMBEDDING_MODEL_PATH") {
            self.embedding.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("KB_EMBEDDING_TOKENIZER_PATH") {
            self.embedding.tokenizer_path = PathBuf::from(path);
        }
        if let Some(dimension) = parsed("KB_EMBEDDING_DIMENSION") {
            self.embedding.dimension = dimension;
        }
        if let Some(batch_size) = parsed("KB_EMBEDDING_BATCH_SIZE") {
            self.embedding.batch_size = batch_size;
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| KbError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.chunk_size == 0 {
            return Err("Chunk size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        if self.top_k == 0 {
            return Err("top_k must be greater than 0".to_string());
        }
        if self.embedding.dimension == 0 {
            return Err("Embedding dimension must be greater than 0".to_string());
        }
        if self.embedding.batch_size == 0 {
            return Err("Embedding batch size must be greater than 0".to_string());
        }
        Ok(())
    }
}
