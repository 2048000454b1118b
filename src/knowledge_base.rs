// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Query context: an embedder plus the ranker built from the store
//!
//! Built once per process and passed to whoever answers queries. Text is
//! embedded with the same [`Embedder`] that built the store, then ranked.

use tracing::debug;

use crate::embeddings::Embedder;
use crate::errors::{KbError, Result};
use crate::ranker::{format_context, Ranker, SearchHit};
use crate::store::SqliteVectorStore;

#[derive(Debug)]
pub struct KnowledgeBase<E: Embedder> {
    embedder: E,
    ranker: Ranker,
}

impl<E: Embedder> KnowledgeBase<E> {
    /// Load every stored chunk and prepare it for ranking
    ///
    /// # Errors
    /// * Corrupt-store errors from [`SqliteVectorStore::load`]
    /// * `Config` if the store was built with a different vector dimension
    pub fn open(store: &SqliteVectorStore, embedder: E) -> Result<Self> {
        let loaded = store.load()?;
        if !loaded.is_empty() && loaded.dimension() != embedder.dimension() {
            return Err(KbError::Config(format!(
                "Store holds {}D vectors but embedder {} produces {}D",
                loaded.dimension(),
                embedder.model_name(),
                embedder.dimension()
            )));
        }
        let (chunks, matrix) = loaded.into_parts();
        Ok(Self::from_parts(embedder, Ranker::new(chunks, matrix)?))
    }

    pub fn from_parts(embedder: E, ranker: Ranker) -> Self {
        Self { embedder, ranker }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    pub fn len(&self) -> usize {
        self.ranker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranker.is_empty()
    }

    /// Top-`k` chunks for a natural-language question
    ///
    /// # Errors
    /// * `InvalidQuery` for empty or whitespace-only text (embedder not called)
    /// * `Embedding` if the embedder fails
    pub async fn search(&self, text: &str, k: usize) -> Result<Vec<SearchHit<'_>>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KbError::InvalidQuery(
                "query text is empty or whitespace".to_string(),
            ));
        }
        if self.ranker.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(text).await?;
        let hits = self.ranker.search(&query, k)?;
        debug!(
            "Query {:?} matched {} of {} chunks",
            text,
            hits.len(),
            self.ranker.len()
        );
        Ok(hits)
    }

    /// Formatted report of the top-`k` chunks for a question
    pub async fn retrieve_context(&self, text: &str, k: usize) -> Result<String> {
        Ok(format_context(&self.search(text, k).await?))
    }
}
