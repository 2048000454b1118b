// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::catalog::CourseCatalog;
use crate::chunker::{ChunkBuilder, TextSplitter};
use crate::config::KbConfig;
use crate::embeddings::{self, Embedder};
use crate::knowledge_base::KnowledgeBase;
use crate::pipeline::{build_index, count_types};
use crate::store::{write_chunks_json, write_sql_dump, SqliteVectorStore};

/// Arguments for the chunk command
#[derive(Args, Debug)]
pub struct ChunkArgs {
    /// Course catalog JSON (defaults to the configured data path)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Write the chunks as a JSON array to this file
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Course catalog JSON (defaults to the configured data path)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Also write the chunks as a JSON array to this file
    #[arg(long)]
    pub chunks_out: Option<PathBuf>,

    /// Also write a SQL dump of the rebuilt table to this file
    #[arg(long)]
    pub sql_out: Option<PathBuf>,

    /// Hide the embedding progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the query command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Question to answer
    pub text: String,

    /// Number of results (defaults to the configured top_k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

/// Arguments for the repl command
#[derive(Args, Debug)]
pub struct ReplArgs {
    /// Number of results per question (defaults to the configured top_k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// SQL dump written by `build --sql-out`
    pub dump: PathBuf,
}

fn chunk_builder(config: &KbConfig) -> Result<ChunkBuilder> {
    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
    Ok(ChunkBuilder::new(splitter))
}

fn load_catalog(path: &Path) -> Result<CourseCatalog> {
    let catalog = CourseCatalog::from_file(path)
        .with_context(|| format!("Failed to read course catalog {}", path.display()))?;
    info!(
        "Loaded {} courses ({} cohorts) from {}",
        catalog.courses.len(),
        catalog.cohort_count(),
        path.display()
    );
    Ok(catalog)
}

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Chunk the catalog and print a per-type summary
pub fn chunk(config: &KbConfig, args: ChunkArgs) -> Result<()> {
    let data_path = args.data.unwrap_or_else(|| config.data_path.clone());
    let catalog = load_catalog(&data_path)?;
    let chunks = chunk_builder(config)?.build_catalog(&catalog);

    println!("\n📋 Chunking Summary:");
    println!("  Courses:  {}", catalog.courses.len());
    println!("  Cohorts:  {}", catalog.cohort_count());
    println!("  Chunks:   {}", chunks.len());
    for (chunk_type, count) in count_types(&chunks) {
        println!("    {:<14} {}", chunk_type, count);
    }

    if let Some(first) = chunks.first() {
        println!("\n📄 Sample chunk ({}):", first.metadata.chunk_type);
        println!("{}", first.text);
    }

    if let Some(out) = args.out {
        write_chunks_json(&chunks, create_file(&out)?)?;
        println!("\n✅ Wrote {} chunks to {}", chunks.len(), out.display());
    }
    Ok(())
}

/// Rebuild the store from the catalog
pub async fn build(config: &KbConfig, args: BuildArgs) -> Result<()> {
    let data_path = args.data.unwrap_or_else(|| config.data_path.clone());
    let catalog = load_catalog(&data_path)?;
    let builder = chunk_builder(config)?;
    let embedder = embeddings::from_settings(&config.embedding)?;

    let mut store = SqliteVectorStore::open(&config.database_path)?;
    let report = build_index(
        &catalog,
        &builder,
        &embedder,
        &mut store,
        config.embedding.batch_size,
        !args.no_progress,
    )
    .await?;

    println!("\n✅ Knowledge base rebuilt:");
    println!("  Database:   {}", config.database_path.display());
    println!("  Embedder:   {}", embedder.model_name());
    println!("  Courses:    {}", report.courses);
    println!("  Chunks:     {}", report.chunks);
    println!("  Dimension:  {}", report.dimension);
    for (chunk_type, count) in &report.per_type {
        println!("    {:<14} {}", chunk_type, count);
    }

    if let Some(out) = args.chunks_out {
        let loaded = store.load()?;
        write_chunks_json(&loaded.chunks, create_file(&out)?)?;
        println!("  Chunks JSON: {}", out.display());
    }
    if let Some(out) = args.sql_out {
        write_sql_dump(&store.rows()?, create_file(&out)?)?;
        println!("  SQL dump:    {}", out.display());
    }
    Ok(())
}

fn open_knowledge_base(config: &KbConfig) -> Result<KnowledgeBase<Box<dyn Embedder>>> {
    let store = SqliteVectorStore::open(&config.database_path)?;
    let embedder = embeddings::from_settings(&config.embedding)?;
    let kb = KnowledgeBase::open(&store, embedder)?;
    if kb.is_empty() {
        warn!(
            "Knowledge base at {} is empty; run `course-kb build` first",
            config.database_path.display()
        );
    }
    Ok(kb)
}

/// Print the retrieval report for one question
pub async fn query(config: &KbConfig, args: QueryArgs) -> Result<()> {
    let kb = open_knowledge_base(config)?;
    let k = args.top_k.unwrap_or(config.top_k);
    println!("{}", kb.retrieve_context(&args.text, k).await?);
    Ok(())
}

/// Interactive loop over stdin
pub async fn repl(config: &KbConfig, args: ReplArgs) -> Result<()> {
    let kb = open_knowledge_base(config)?;
    let k = args.top_k.unwrap_or(config.top_k);
    println!(
        "🎓 Course knowledge base ready ({} chunks). Type 'exit' or 'quit' to leave.",
        kb.len()
    );
    run_repl(&kb, k, BufReader::new(tokio::io::stdin()), std::io::stdout()).await
}

/// Answer one question per input line until EOF, `exit` or `quit`
///
/// Blank lines are skipped. Query errors are reported and the loop goes on.
pub async fn run_repl<E, R, W>(kb: &KnowledgeBase<E>, k: usize, reader: R, mut out: W) -> Result<()>
where
    E: Embedder,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();
    loop {
        write!(out, "\nQuestion> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        match kb.retrieve_context(question, k).await {
            Ok(report) => writeln!(out, "{}", report)?,
            Err(e) => writeln!(out, "❌ {}", e.user_message())?,
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Replace the store contents with the rows of a SQL dump
pub fn import(config: &KbConfig, args: ImportArgs) -> Result<()> {
    if !args.dump.exists() {
        anyhow::bail!("SQL dump not found: {}", args.dump.display());
    }
    let mut store = SqliteVectorStore::open(&config.database_path)?;
    let count = store
        .import_sql_dump(&args.dump)
        .with_context(|| format!("Failed to import {}", args.dump.display()))?;

    println!("\n✅ Database initialized with {} records:", count);
    println!("  Database:   {}", config.database_path.display());
    println!("  SQL dump:   {}", args.dump.display());
    Ok(())
}

/// Print row count, dimension and per-type counts
pub fn stats(config: &KbConfig) -> Result<()> {
    let store = SqliteVectorStore::open(&config.database_path)?;
    let stats = store.stats()?;

    println!("\n📊 Knowledge Base Statistics:");
    println!("  Database:   {}", config.database_path.display());
    println!("  Rows:       {}", stats.rows);
    match stats.dimension {
        Some(dimension) => println!("  Dimension:  {}", dimension),
        None => println!("  Dimension:  n/a (empty store)"),
    }
    for (chunk_type, count) in &stats.per_type {
        println!("    {:<14} {}", chunk_type, count);
    }
    Ok(())
}
