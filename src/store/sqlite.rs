// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! SQLite-backed vector store
//!
//! One table, one row per chunk:
//!
//! ```sql
//! CREATE TABLE course_embeddings (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     content TEXT,
//!     metadata JSON,
//!     embedding_vector JSON
//! );
//! ```
//!
//! `persist` and `import_sql_dump` are full rebuilds inside a single
//! transaction, so a failed rebuild leaves the previous contents untouched.

use ndarray::Array2;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::chunker::{Chunk, ChunkMetadata, ChunkType};
use crate::errors::{KbError, Result};

pub const TABLE_NAME: &str = "course_embeddings";

/// Raw row as stored on disk
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: i64,
    pub content: String,
    pub metadata: String,
    pub embedding_vector: String,
}

/// Everything read back by [`SqliteVectorStore::load`]
#[derive(Debug, Clone)]
pub struct LoadedStore {
    /// Row ids, ascending
    pub ids: Vec<i64>,
    pub chunks: Vec<Chunk>,
    /// Row `i` is the vector of `chunks[i]`; `0 x 0` when empty
    pub matrix: Array2<f32>,
}

impl LoadedStore {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn into_parts(self) -> (Vec<Chunk>, Array2<f32>) {
        (self.chunks, self.matrix)
    }
}

#[derive(Debug, Clone)]
pub struct StoreStats {
    pub rows: usize,
    pub dimension: Option<usize>,
    pub per_type: BTreeMap<ChunkType, usize>,
}

pub struct SqliteVectorStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteVectorStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteVectorStore {
    /// Open (or create) the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Private in-memory store, gone when dropped
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT,
                metadata JSON,
                embedding_vector JSON
            );"
        ))?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replace the store contents with `chunks` and their `vectors`
    ///
    /// # Errors
    /// * `LengthMismatch` if the sequences differ in length
    /// * `VectorDimensionMismatch` if a vector's length differs from the first
    /// * `NonFiniteVector` if a vector holds NaN or Infinity
    ///
    /// Nothing is written when validation fails.
    pub fn persist(&mut self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<usize> {
        validate_entries(chunks, vectors)?;

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DELETE FROM {TABLE_NAME}"), [])?;
        tx.execute("DELETE FROM sqlite_sequence WHERE name = ?1", params![TABLE_NAME])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {TABLE_NAME} (content, metadata, embedding_vector) VALUES (?1, ?2, ?3)"
            ))?;
            for (chunk, vector) in chunks.iter().zip(vectors) {
                stmt.execute(params![
                    chunk.text,
                    serde_json::to_string(&chunk.metadata)?,
                    serde_json::to_string(vector)?,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "Persisted {} entries ({}D) to {}",
            chunks.len(),
            vectors.first().map(Vec::len).unwrap_or(0),
            self.describe()
        );
        Ok(chunks.len())
    }

    /// Replace the store contents with the rows of a SQL dump file
    ///
    /// Accepts dumps written by [`write_sql_dump`](super::write_sql_dump) or
    /// any script that creates and fills the `course_embeddings` table.
    pub fn import_sql_dump<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let script = std::fs::read_to_string(path)?;
        info!("Importing SQL dump {}", path.display());
        self.import_sql(&script)
    }

    /// Replay `script` into a scratch database, validate its rows, then copy
    /// them over the current contents in one transaction
    ///
    /// # Errors
    /// * `Database` if the script fails to execute
    /// * `CorruptRow` / `InconsistentDimension` if a replayed row is malformed
    ///
    /// The current contents are untouched on error.
    pub fn import_sql(&mut self, script: &str) -> Result<usize> {
        let staging = Connection::open_in_memory()?;
        staging.execute_batch(script)?;
        let rows = read_rows(&staging)?;
        decode_rows(&rows)?;

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DELETE FROM {TABLE_NAME}"), [])?;
        tx.execute("DELETE FROM sqlite_sequence WHERE name = ?1", params![TABLE_NAME])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {TABLE_NAME} (content, metadata, embedding_vector) VALUES (?1, ?2, ?3)"
            ))?;
            for row in &rows {
                stmt.execute(params![row.content, row.metadata, row.embedding_vector])?;
            }
        }
        tx.commit()?;

        info!("Imported {} rows into {}", rows.len(), self.describe());
        Ok(rows.len())
    }

    /// Raw rows in ascending id order
    pub fn rows(&self) -> Result<Vec<StoredRow>> {
        read_rows(&self.conn)
    }

    /// Read every entry back as chunks plus a vector matrix
    ///
    /// # Errors
    /// * `CorruptRow` if content is blank, metadata or vector JSON cannot be
    ///   parsed, or a vector component is not finite
    /// * `InconsistentDimension` if rows disagree on vector length
    pub fn load(&self) -> Result<LoadedStore> {
        let loaded = decode_rows(&self.rows()?)?;
        info!(
            "Loaded {} chunks ({}D) from {}",
            loaded.len(),
            loaded.dimension(),
            self.describe()
        );
        Ok(loaded)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {TABLE_NAME}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Vector dimension of the first stored row, `None` when empty
    pub fn dimension(&self) -> Result<Option<usize>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, embedding_vector FROM {TABLE_NAME} ORDER BY id ASC LIMIT 1"
        ))?;
        let mut rows = stmt.query([])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let id: i64 = row.get(0)?;
        let raw: Option<String> = row.get(1)?;
        let vector: Vec<f32> = serde_json::from_str(raw.as_deref().unwrap_or_default())
            .map_err(|e| KbError::CorruptRow {
                id,
                reason: format!("unparseable embedding vector: {}", e),
            })?;
        Ok(Some(vector.len()))
    }

    /// Row count, vector dimension and per-type counts of the stored chunks
    pub fn stats(&self) -> Result<StoreStats> {
        let loaded = self.load()?;
        let mut per_type = BTreeMap::new();
        for chunk in &loaded.chunks {
            *per_type.entry(chunk.chunk_type()).or_insert(0) += 1;
        }
        Ok(StoreStats {
            rows: loaded.len(),
            dimension: (!loaded.is_empty()).then(|| loaded.dimension()),
            per_type,
        })
    }

    /// Direct connection access, used by tests to plant malformed rows
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}

fn read_rows(conn: &Connection) -> Result<Vec<StoredRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, content, metadata, embedding_vector FROM {TABLE_NAME} ORDER BY id ASC"
    ))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredRow {
                id: row.get(0)?,
                content: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                metadata: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                embedding_vector: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn decode_rows(rows: &[StoredRow]) -> Result<LoadedStore> {
    if rows.is_empty() {
        debug!("No rows to decode");
        return Ok(LoadedStore {
            ids: Vec::new(),
            chunks: Vec::new(),
            matrix: Array2::zeros((0, 0)),
        });
    }

    let mut ids = Vec::with_capacity(rows.len());
    let mut chunks = Vec::with_capacity(rows.len());
    let mut flat: Vec<f32> = Vec::new();
    let mut dimension: Option<usize> = None;

    for row in rows {
        let corrupt = |reason: String| KbError::CorruptRow { id: row.id, reason };

        if row.content.trim().is_empty() {
            return Err(corrupt("empty content".to_string()));
        }
        let metadata: ChunkMetadata = serde_json::from_str(&row.metadata)
            .map_err(|e| corrupt(format!("unparseable metadata: {}", e)))?;
        let vector: Vec<f32> = serde_json::from_str(&row.embedding_vector)
            .map_err(|e| corrupt(format!("unparseable embedding vector: {}", e)))?;
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(corrupt("non-finite embedding component".to_string()));
        }

        match dimension {
            None => {
                dimension = Some(vector.len());
                flat.reserve(vector.len() * rows.len());
            }
            Some(expected) if expected != vector.len() => {
                return Err(KbError::InconsistentDimension {
                    id: row.id,
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
        }

        ids.push(row.id);
        chunks.push(Chunk::new(row.content.clone(), metadata));
        flat.extend(vector);
    }

    let dimension = dimension.unwrap_or(0);
    let matrix = Array2::from_shape_vec((chunks.len(), dimension), flat).map_err(|e| {
        KbError::CorruptRow {
            id: ids.last().copied().unwrap_or_default(),
            reason: format!("vector matrix shape: {}", e),
        }
    })?;

    Ok(LoadedStore {
        ids,
        chunks,
        matrix,
    })
}

fn validate_entries(chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
    if chunks.len() != vectors.len() {
        return Err(KbError::LengthMismatch {
            chunks: chunks.len(),
            vectors: vectors.len(),
        });
    }

    let Some(expected) = vectors.first().map(Vec::len) else {
        return Ok(());
    };
    for (index, vector) in vectors.iter().enumerate() {
        if vector.len() != expected {
            return Err(KbError::VectorDimensionMismatch {
                index,
                expected,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(KbError::NonFiniteVector { index });
        }
    }
    Ok(())
}
