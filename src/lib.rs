// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Course catalog knowledge base
//!
//! Course records are cut into typed, overlapping text chunks, embedded,
//! stored in SQLite and ranked against questions by cosine similarity.

pub mod catalog;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod knowledge_base;
pub mod pipeline;
pub mod ranker;
pub mod store;
pub mod version;

pub use catalog::{Cohort, CohortDetails, Course, CourseCatalog};
pub use chunker::{split_text, Chunk, ChunkBuilder, ChunkMetadata, ChunkType, TextSplitter};
pub use config::{EmbeddingBackend, EmbeddingSettings, KbConfig};
pub use embeddings::{Embedder, HashEmbedder};
pub use errors::{ErrorKind, KbError, Result};
pub use knowledge_base::KnowledgeBase;
pub use pipeline::{build_index, IndexReport};
pub use ranker::{Ranker, SearchHit, NO_RESULTS_MESSAGE};
pub use store::{LoadedStore, SqliteVectorStore, StoreStats};
