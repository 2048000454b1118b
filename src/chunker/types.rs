// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category tag attached to every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Overview,
    Curriculum,
    Review,
    Faq,
    SuccessStory,
    Instructors,
    Mentors,
    Tools,
}

impl ChunkType {
    /// Every category, in the order blocks are emitted per cohort
    pub const ALL: [ChunkType; 8] = [
        ChunkType::Overview,
        ChunkType::Curriculum,
        ChunkType::Review,
        ChunkType::Faq,
        ChunkType::SuccessStory,
        ChunkType::Instructors,
        ChunkType::Mentors,
        ChunkType::Tools,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Overview => "overview",
            ChunkType::Curriculum => "curriculum",
            ChunkType::Review => "review",
            ChunkType::Faq => "faq",
            ChunkType::SuccessStory => "success_story",
            ChunkType::Instructors => "instructors",
            ChunkType::Mentors => "mentors",
            ChunkType::Tools => "tools",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Provenance attached to a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Originating course URL
    pub source: String,
    /// Course name
    pub course: String,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
}

/// Minimal unit of retrievable text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    pub fn chunk_type(&self) -> ChunkType {
        self.metadata.chunk_type
    }
}
