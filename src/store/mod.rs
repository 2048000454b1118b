// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Durable (chunk, vector) storage

pub mod dump;
pub mod sqlite;

pub use dump::{write_chunks_json, write_sql_dump, SQL_DUMP_HEADER};
pub use sqlite::{LoadedStore, SqliteVectorStore, StoreStats, StoredRow, TABLE_NAME};
