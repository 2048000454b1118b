// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Index build: catalog -> chunks -> embeddings -> store

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

use crate::catalog::CourseCatalog;
use crate::chunker::{Chunk, ChunkBuilder, ChunkType};
use crate::embeddings::Embedder;
use crate::errors::{KbError, Result};
use crate::store::SqliteVectorStore;

/// Summary of a completed build
#[derive(Debug, Clone, PartialEq)]
pub struct IndexReport {
    pub courses: usize,
    pub chunks: usize,
    /// Vector dimension written to the store (0 when nothing was written)
    pub dimension: usize,
    pub per_type: BTreeMap<ChunkType, usize>,
}

/// Chunk every course, embed the chunks in batches of `batch_size` and
/// replace the store contents with the result
///
/// # Errors
/// * `Config` if `batch_size` is zero
/// * `Embedding` if the embedder fails or returns the wrong number of vectors
/// * Persistence and storage errors from [`SqliteVectorStore::persist`]
pub async fn build_index<E: Embedder + ?Sized>(
    catalog: &CourseCatalog,
    builder: &ChunkBuilder,
    embedder: &E,
    store: &mut SqliteVectorStore,
    batch_size: usize,
    progress: bool,
) -> Result<IndexReport> {
    if batch_size == 0 {
        return Err(KbError::Config(
            "Embedding batch size must be greater than 0".to_string(),
        ));
    }

    let started = Instant::now();
    let chunks = builder.build_catalog(catalog);
    info!(
        "Created {} chunks from {} courses ({} cohorts)",
        chunks.len(),
        catalog.courses.len(),
        catalog.cohort_count()
    );
    if chunks.is_empty() {
        warn!("Catalog produced no chunks; the store will be emptied");
    }

    let vectors = embed_chunks(&chunks, embedder, batch_size, progress).await?;
    store.persist(&chunks, &vectors)?;

    let report = IndexReport {
        courses: catalog.courses.len(),
        chunks: chunks.len(),
        dimension: vectors.first().map(Vec::len).unwrap_or(0),
        per_type: count_types(&chunks),
    };
    info!(
        "Indexed {} chunks with {} in {:.2}s",
        report.chunks,
        embedder.model_name(),
        started.elapsed().as_secs_f64()
    );
    Ok(report)
}

/// Embed `chunks` in order, `batch_size` texts per call
pub async fn embed_chunks<E: Embedder + ?Sized>(
    chunks: &[Chunk],
    embedder: &E,
    batch_size: usize,
    progress: bool,
) -> Result<Vec<Vec<f32>>> {
    let bar = if progress {
        progress_bar(chunks.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            bar.abandon();
            return Err(KbError::Embedding(format!(
                "{} returned {} embeddings for {} texts",
                embedder.model_name(),
                embeddings.len(),
                texts.len()
            )));
        }
        vectors.extend(embeddings);
        bar.inc(batch.len() as u64);
    }
    bar.finish_and_clear();

    Ok(vectors)
}

pub fn count_types(chunks: &[Chunk]) -> BTreeMap<ChunkType, usize> {
    let mut per_type = BTreeMap::new();
    for chunk in chunks {
        *per_type.entry(chunk.chunk_type()).or_insert(0) += 1;
    }
    per_type
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} chunks ({eta})")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message("Embedding");
    bar
}
