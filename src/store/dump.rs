// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Portable artifacts written next to the store: a `chunks.json` listing and
//! a plain SQL dump that recreates the `course_embeddings` table.

use std::io::Write;

use super::sqlite::{StoredRow, TABLE_NAME};
use crate::chunker::Chunk;
use crate::errors::Result;

pub const SQL_DUMP_HEADER: &str = "-- Auto-generated SQL dump for course embeddings";

/// Write `chunks` as a pretty-printed JSON array of `{text, metadata}`
pub fn write_chunks_json<W: Write>(chunks: &[Chunk], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, chunks)?;
    writeln!(writer)?;
    Ok(())
}

/// Write a SQL script that recreates the store from `rows`
pub fn write_sql_dump<W: Write>(rows: &[StoredRow], mut writer: W) -> Result<()> {
    writeln!(writer, "{}", SQL_DUMP_HEADER)?;
    writeln!(
        writer,
        "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (\n    \
         id INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
         content TEXT,\n    \
         metadata JSON,\n    \
         embedding_vector JSON -- Stored as JSON array\n);\n"
    )?;
    writeln!(writer, "BEGIN TRANSACTION;")?;
    for row in rows {
        writeln!(
            writer,
            "INSERT INTO {TABLE_NAME} (content, metadata, embedding_vector) VALUES ('{}', '{}', '{}');",
            sql_escape(&row.content),
            sql_escape(&row.metadata),
            sql_escape(&row.embedding_vector),
        )?;
    }
    writeln!(writer, "COMMIT;")?;
    writer.flush()?;
    Ok(())
}

fn sql_escape(value: &str) -> String {
    value.replace('\'', "''")
}
