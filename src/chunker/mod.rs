// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Chunker: course records -> (text, metadata) chunks

pub mod builder;
pub mod splitter;
pub mod types;

pub use builder::ChunkBuilder;
pub use splitter::{split_text, Splits, TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use types::{Chunk, ChunkMetadata, ChunkType};
