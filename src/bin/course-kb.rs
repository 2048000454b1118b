// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use course_kb::cli::{execute, Cli};
use course_kb::errors::KbError;
use course_kb::version;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    // Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();
    tracing::debug!("{}", version::get_version_string());

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute the command
    match execute(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            match e.downcast_ref::<KbError>() {
                Some(kb_error) => eprintln!("❌ Error: {}", kb_error.user_message()),
                None => eprintln!("❌ Error: {:#}", e),
            }
            std::process::exit(1);
        }
    }
}
