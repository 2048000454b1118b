// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{EmbeddingBackend, KbConfig};

/// Course catalog knowledge base CLI
#[derive(Parser, Debug)]
#[command(name = "course-kb")]
#[command(version)]
#[command(about = "Build and query the course catalog knowledge base", long_about = None)]
pub struct Cli {
    /// TOML configuration file (defaults to KB_* environment variables)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Embedding backend (hash or onnx)
    #[arg(long, global = true)]
    pub embedder: Option<EmbeddingBackend>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk the catalog without embedding it
    Chunk(commands::ChunkArgs),

    /// Chunk, embed and persist the catalog
    Build(commands::BuildArgs),

    /// Answer one question from the knowledge base
    Query(commands::QueryArgs),

    /// Interactive question loop
    Repl(commands::ReplArgs),

    /// Rebuild the store from a SQL dump
    Import(commands::ImportArgs),

    /// Show store statistics
    Stats,
}

impl Cli {
    /// Resolve configuration: file or environment, then command-line overrides
    pub fn load_config(&self) -> Result<KbConfig> {
        let mut config = match &self.config {
            Some(path) => KbConfig::from_file(path)?,
            None => KbConfig::from_env(),
        };
        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }
        if let Some(backend) = self.embedder {
            config.embedding.backend = backend;
        }
        config
            .validate()
            .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
        Ok(config)
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    match cli.command {
        Commands::Chunk(args) => commands::chunk(&config, args),
        Commands::Build(args) => commands::build(&config, args).await,
        Commands::Query(args) => commands::query(&config, args).await,
        Commands::Repl(args) => commands::repl(&config, args).await,
        Commands::Import(args) => commands::import(&config, args),
        Commands::Stats => commands::stats(&config),
    }
}
