// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Exact cosine-similarity ranking over the loaded store
//!
//! Rows are L2-normalized once at construction, so a query costs one
//! normalization plus one matrix-vector product. Division uses
//! `magnitude + EPSILON` so all-zero vectors score 0 instead of NaN.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::cmp::Ordering;

use crate::chunker::Chunk;
use crate::errors::{KbError, Result};

/// Guard added to every magnitude before dividing
pub const EPSILON: f32 = 1e-10;

pub const NO_RESULTS_MESSAGE: &str = "No relevant information found within the knowledge base.";

/// A ranked chunk
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    /// Row index in insertion order
    pub index: usize,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
    pub chunk: &'a Chunk,
}

/// Read-only ranking state built once from the loaded store
#[derive(Debug, Clone)]
pub struct Ranker {
    chunks: Vec<Chunk>,
    normalized: Array2<f32>,
}

impl Ranker {
    /// Build a ranker from chunks and their row-aligned vectors
    ///
    /// # Errors
    /// * `LengthMismatch` if the matrix row count differs from the chunk count
    pub fn new(chunks: Vec<Chunk>, matrix: Array2<f32>) -> Result<Self> {
        if matrix.nrows() != chunks.len() {
            return Err(KbError::LengthMismatch {
                chunks: chunks.len(),
                vectors: matrix.nrows(),
            });
        }

        let mut normalized = matrix;
        for mut row in normalized.axis_iter_mut(Axis(0)) {
            let magnitude = magnitude(row.view());
            row.mapv_inplace(|v| v / (magnitude + EPSILON));
        }

        Ok(Self { chunks, normalized })
    }

    pub fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            normalized: Array2::zeros((0, 0)),
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Vector dimension of the stored rows (0 when empty)
    pub fn dimension(&self) -> usize {
        self.normalized.ncols()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Top-`k` chunks by cosine similarity to `query`
    ///
    /// Returns at most `min(k, len)` hits in descending score order; equal
    /// scores keep insertion order. An empty store or `k == 0` yields no hits.
    ///
    /// # Errors
    /// * `QueryDimensionMismatch` if `query` does not match the stored dimension
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension() {
            return Err(KbError::QueryDimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        let query = normalize(ArrayView1::from(query));
        let scores = self.normalized.dot(&query);

        let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        let k = k.min(ranked.len());
        if k < ranked.len() {
            ranked.select_nth_unstable_by(k - 1, rank_order);
            ranked.truncate(k);
        }
        ranked.sort_by(rank_order);

        Ok(ranked
            .into_iter()
            .map(|(index, score)| SearchHit {
                index,
                score,
                chunk: &self.chunks[index],
            })
            .collect())
    }

    /// Human-readable report of the top-`k` hits
    pub fn retrieve_context(&self, query: &[f32], k: usize) -> Result<String> {
        Ok(format_context(&self.search(query, k)?))
    }
}

/// Descending score, then ascending row index
fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

fn magnitude(v: ArrayView1<'_, f32>) -> f32 {
    v.dot(&v).sqrt()
}

/// Divide by `magnitude + EPSILON`
pub fn normalize(v: ArrayView1<'_, f32>) -> Array1<f32> {
    let magnitude = magnitude(v);
    v.mapv(|x| x / (magnitude + EPSILON))
}

/// Render hits the way the CLI and downstream prompts consume them
pub fn format_context(hits: &[SearchHit<'_>]) -> String {
    if hits.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let rule = "=".repeat(40);
    let thin_rule = "-".repeat(20);
    let mut out = format!("Top {} Retrieval Results:\n{}\n", hits.len(), rule);
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&format!(
            "Result {} (Score: {:.4})\nSource: {} - {}\n{}\n{}\n{}\n",
            i + 1,
            hit.score,
            hit.chunk.metadata.chunk_type,
            hit.chunk.metadata.course,
            thin_rule,
            hit.chunk.text,
            rule
        ));
    }
    out
}
