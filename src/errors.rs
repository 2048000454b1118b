// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the course knowledge base
//!
//! One error enum covers the whole pipeline:
//! - Persistence errors (chunk/vector shape mismatch on rebuild)
//! - Corrupt store errors (unparseable or inconsistent rows on load)
//! - Query errors (blank query text, wrong query dimensions)
//! - Embedding, configuration and storage backend failures

use thiserror::Error;

/// Coarse classification of a [`KbError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Persistence,
    CorruptStore,
    InvalidQuery,
    Embedding,
    Configuration,
    Storage,
}

/// Errors raised while chunking, persisting, loading or querying
#[derive(Error, Debug)]
pub enum KbError {
    /// Splitter parameters violate `0 < overlap < chunk_size`
    #[error("Invalid split configuration: chunk_size={chunk_size}, overlap={overlap} (need chunk_size > 0 and overlap < chunk_size)")]
    InvalidSplitConfig { chunk_size: usize, overlap: usize },

    /// Chunk and vector sequences differ in length
    #[error("Length mismatch: {chunks} chunks but {vectors} vectors")]
    LengthMismatch { chunks: usize, vectors: usize },

    /// A vector handed to persist has a different dimension than the first one
    #[error("Dimension mismatch at entry {index}: expected {expected}D, got {actual}D")]
    VectorDimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// A vector handed to persist contains NaN or Infinity
    #[error("Vector at entry {index} contains NaN or Infinity")]
    NonFiniteVector { index: usize },

    /// A stored row could not be parsed
    #[error("Corrupt row {id}: {reason}")]
    CorruptRow { id: i64, reason: String },

    /// Stored rows disagree on vector dimension
    #[error("Inconsistent dimension in row {id}: expected {expected}D, got {actual}D")]
    InconsistentDimension {
        id: i64,
        expected: usize,
        actual: usize,
    },

    /// Query text rejected before reaching the embedder
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Query vector dimension differs from the store
    #[error("Invalid query dimensions: expected {expected}, got {actual}")]
    QueryDimensionMismatch { expected: usize, actual: usize },

    /// Embedding provider failure
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KbError>;

impl KbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KbError::LengthMismatch { .. }
            | KbError::VectorDimensionMismatch { .. }
            | KbError::NonFiniteVector { .. } => ErrorKind::Persistence,
            KbError::CorruptRow { .. } | KbError::InconsistentDimension { .. } => {
                ErrorKind::CorruptStore
            }
            KbError::InvalidQuery(_) | KbError::QueryDimensionMismatch { .. } => {
                ErrorKind::InvalidQuery
            }
            KbError::Embedding(_) => ErrorKind::Embedding,
            KbError::InvalidSplitConfig { .. } | KbError::Config(_) => ErrorKind::Configuration,
            KbError::Database(_) | KbError::Serialization(_) | KbError::Io(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            KbError::InvalidSplitConfig { .. } => "INVALID_SPLIT_CONFIG",
            KbError::LengthMismatch { .. } => "LENGTH_MISMATCH",
            KbError::VectorDimensionMismatch { .. } => "VECTOR_DIMENSION_MISMATCH",
            KbError::NonFiniteVector { .. } => "NON_FINITE_VECTOR",
            KbError::CorruptRow { .. } => "CORRUPT_ROW",
            KbError::InconsistentDimension { .. } => "INCONSISTENT_DIMENSION",
            KbError::InvalidQuery(_) => "INVALID_QUERY",
            KbError::QueryDimensionMismatch { .. } => "QUERY_DIMENSION_MISMATCH",
            KbError::Embedding(_) => "EMBEDDING_FAILED",
            KbError::Config(_) => "CONFIG_ERROR",
            KbError::Database(_) => "DATABASE_ERROR",
            KbError::Serialization(_) => "SERIALIZATION_ERROR",
            KbError::Io(_) => "IO_ERROR",
        }
    }

    /// Get user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            KbError::LengthMismatch { chunks, vectors } => {
                format!(
                    "Cannot rebuild the knowledge base: {} chunks were given {} embeddings",
                    chunks, vectors
                )
            }
            KbError::CorruptRow { id, .. } | KbError::InconsistentDimension { id, .. } => {
                format!(
                    "Knowledge base is corrupt (row {}); rebuild it with `course-kb build`",
                    id
                )
            }
            KbError::InvalidQuery(_) => "Please enter a non-empty question".to_string(),
            KbError::QueryDimensionMismatch { expected, actual } => {
                format!(
                    "Query embedding has {} dimensions but the knowledge base uses {}; \
                     was it built with a different model?",
                    actual, expected
                )
            }
            _ => self.to_string(),
        }
    }

    pub fn is_persistence_error(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }

    pub fn is_corrupt_store(&self) -> bool {
        self.kind() == ErrorKind::CorruptStore
    }

    pub fn is_invalid_query(&self) -> bool {
        self.kind() == ErrorKind::InvalidQuery
    }
}
