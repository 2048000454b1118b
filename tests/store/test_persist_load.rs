// SqliteVectorStore persist / load behaviour on disk

use course_kb::chunker::{Chunk, ChunkMetadata, ChunkType};
use course_kb::errors::KbError;
use course_kb::store::{SqliteVectorStore, TABLE_NAME};
use rusqlite::params;
use tempfile::TempDir;

fn chunk(text: &str, chunk_type: ChunkType) -> Chunk {
    Chunk::new(
        text,
        ChunkMetadata {
            source: "https://example.com/ds".to_string(),
            course: "Data Science".to_string(),
            chunk_type,
        },
    )
}

fn sample() -> (Vec<Chunk>, Vec<Vec<f32>>) {
    (
        vec![
            chunk("Course: Data Science\nDuration: 6 months", ChunkType::Overview),
            chunk("Course: Data Science FAQ\nQ: It's online?\nA: Yes", ChunkType::Faq),
            chunk("Course: Data Science - Tools You Learn\nPython, SQL", ChunkType::Tools),
        ],
        vec![
            vec![0.1, -0.25, 0.333_333_34],
            vec![1.0e-7, 2.5, -3.75],
            vec![0.0, 0.0, 0.0],
        ],
    )
}

fn open(dir: &TempDir) -> SqliteVectorStore {
    SqliteVectorStore::open(dir.path().join("knowledge_base.db")).unwrap()
}

#[test]
fn test_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let (chunks, vectors) = sample();
    {
        let mut store = open(&dir);
        assert_eq!(store.persist(&chunks, &vectors).unwrap(), 3);
    }

    let store = open(&dir);
    let loaded = store.load().unwrap();
    assert_eq!(loaded.chunks, chunks);
    assert_eq!(loaded.ids, vec![1, 2, 3]);
    assert_eq!(loaded.matrix.shape(), &[3, 3]);
    for (row, vector) in loaded.matrix.rows().into_iter().zip(&vectors) {
        for (a, b) in row.iter().zip(vector) {
            assert!((a - b).abs() <= f32::EPSILON * b.abs().max(1.0));
        }
    }
}

#[test]
fn test_rebuild_replaces_and_restarts_ids() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    let (chunks, vectors) = sample();

    store.persist(&chunks, &vectors).unwrap();
    store.persist(&chunks[..2], &vectors[..2]).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(loaded.ids, vec![1, 2]);
    assert_eq!(loaded.chunks, chunks[..2].to_vec());
}

#[test]
fn test_failed_persist_keeps_previous_rows() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    let (chunks, vectors) = sample();
    store.persist(&chunks, &vectors).unwrap();

    let err = store.persist(&chunks, &vectors[..2]).unwrap_err();
    assert!(err.is_persistence_error());

    let err = store
        .persist(&chunks[..2], &[vec![1.0, 0.0, 0.0], vec![1.0, 0.0]])
        .unwrap_err();
    assert!(matches!(err, KbError::VectorDimensionMismatch { index: 1, .. }));

    let err = store
        .persist(&chunks[..1], &[vec![f32::INFINITY, 0.0, 0.0]])
        .unwrap_err();
    assert!(matches!(err, KbError::NonFiniteVector { index: 0 }));

    assert_eq!(store.load().unwrap().chunks, chunks);
}

#[test]
fn test_zero_chunks_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    let (chunks, vectors) = sample();
    store.persist(&chunks, &vectors).unwrap();

    assert_eq!(store.persist(&[], &[]).unwrap(), 0);
    let loaded = store.load().unwrap();
    assert!(loaded.is_empty());
    assert_eq!(loaded.matrix.shape(), &[0, 0]);

    let stats = store.stats().unwrap();
    assert_eq!(stats.rows, 0);
    assert_eq!(stats.dimension, None);
}

#[test]
fn test_fresh_database_loads_empty() {
    let dir = TempDir::new().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("nested/dir/kb.db")).unwrap();
    assert!(store.load().unwrap().is_empty());
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_corrupt_metadata_is_reported() {
    let store = SqliteVectorStore::in_memory().unwrap();
    store
        .connection()
        .execute(
            &format!(
                "INSERT INTO {TABLE_NAME} (content, metadata, embedding_vector) VALUES (?1, ?2, ?3)"
            ),
            params!["text", "{not json", "[1.0, 2.0]"],
        )
        .unwrap();

    let err = store.load().unwrap_err();
    assert!(err.is_corrupt_store());
    assert!(matches!(err, KbError::CorruptRow { id: 1, .. }));
}

#[test]
fn test_corrupt_vector_is_reported() {
    let store = SqliteVectorStore::in_memory().unwrap();
    store
        .connection()
        .execute(
            &format!(
                "INSERT INTO {TABLE_NAME} (content, metadata, embedding_vector) VALUES (?1, ?2, ?3)"
            ),
            params![
                "text",
                r#"{"source":"s","course":"c","type":"faq"}"#,
                "[1.0, \"two\"]"
            ],
        )
        .unwrap();

    assert!(matches!(
        store.load().unwrap_err(),
        KbError::CorruptRow { id: 1, .. }
    ));
}

fn insert_raw(store: &SqliteVectorStore, content: Option<&str>, vector: &str) {
    store
        .connection()
        .execute(
            &format!(
                "INSERT INTO {TABLE_NAME} (content, metadata, embedding_vector) VALUES (?1, ?2, ?3)"
            ),
            params![content, r#"{"source":"s","course":"c","type":"faq"}"#, vector],
        )
        .unwrap();
}

#[test]
fn test_out_of_range_vector_component_is_reported() {
    let store = SqliteVectorStore::in_memory().unwrap();
    insert_raw(&store, Some("large"), "[1e39, 0.0]");
    insert_raw(&store, Some("unit"), "[1.0, 0.0]");

    let err = store.load().unwrap_err();
    assert!(err.is_corrupt_store());
    match err {
        KbError::CorruptRow { id, reason } => {
            assert_eq!(id, 1);
            assert!(reason.contains("non-finite"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_null_or_blank_content_is_reported() {
    let store = SqliteVectorStore::in_memory().unwrap();
    insert_raw(&store, None, "[1.0]");
    assert!(matches!(
        store.load().unwrap_err(),
        KbError::CorruptRow { id: 1, .. }
    ));

    let store = SqliteVectorStore::in_memory().unwrap();
    insert_raw(&store, Some("valid"), "[1.0]");
    insert_raw(&store, Some("  \n "), "[1.0]");
    assert!(matches!(
        store.load().unwrap_err(),
        KbError::CorruptRow { id: 2, .. }
    ));
    // Raw rows stay readable for dumps
    assert_eq!(store.rows().unwrap().len(), 2);
}

#[test]
fn test_inconsistent_dimensions_are_reported() {
    let mut store = SqliteVectorStore::in_memory().unwrap();
    let (chunks, vectors) = sample();
    store.persist(&chunks[..1], &vectors[..1]).unwrap();
    store
        .connection()
        .execute(
            &format!(
                "INSERT INTO {TABLE_NAME} (content, metadata, embedding_vector) VALUES (?1, ?2, ?3)"
            ),
            params![
                "short",
                r#"{"source":"s","course":"c","type":"review"}"#,
                "[1.0]"
            ],
        )
        .unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(
        err,
        KbError::InconsistentDimension {
            id: 2,
            expected: 3,
            actual: 1
        }
    ));
}

#[test]
fn test_stats_count_types() {
    let mut store = SqliteVectorStore::in_memory().unwrap();
    let (chunks, vectors) = sample();
    store.persist(&chunks, &vectors).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.rows, 3);
    assert_eq!(stats.dimension, Some(3));
    assert_eq!(stats.per_type.get(&ChunkType::Faq), Some(&1));
    assert_eq!(stats.per_type.get(&ChunkType::Review), None);
}
