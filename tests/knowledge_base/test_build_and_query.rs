// Catalog -> store -> knowledge base, end to end with the hash embedder

use course_kb::catalog::CourseCatalog;
use course_kb::chunker::{ChunkBuilder, ChunkType};
use course_kb::embeddings::{Embedder, HashEmbedder};
use course_kb::knowledge_base::KnowledgeBase;
use course_kb::pipeline::build_index;
use course_kb::store::SqliteVectorStore;
use tempfile::TempDir;

const CATALOG: &str = r#"{
  "courses": [
    {
      "course_name": "Product Management",
      "course_url": "https://example.com/pm",
      "cohorts": [{
        "cohort_label": "Cohort 3",
        "cohort_details": {
          "live_class_duration": "16 weeks",
          "frequently_asked_questions": [
            {"question": "Do I need coding experience?", "answer": "No coding is required."}
          ],
          "tools_you_learn": ["Jira", "Amplitude"]
        }
      }]
    },
    {
      "course_name": "UI UX Design",
      "course_url": "https://example.com/uiux",
      "cohorts": [{
        "cohort_label": "Cohort 5",
        "cohort_details": {
          "live_class_duration": "20 weeks",
          "tools_you_learn": ["Figma", "Miro", "Framer"],
          "mentors": [{"name": "Ira", "expertise": "Interaction design", "experience": "9 years"}]
        }
      }]
    }
  ]
}"#;

async fn build(dir: &TempDir) -> (SqliteVectorStore, HashEmbedder) {
    let catalog = CourseCatalog::from_json(CATALOG).unwrap();
    let embedder = HashEmbedder::new(256, true).unwrap();
    let mut store = SqliteVectorStore::open(dir.path().join("kb.db")).unwrap();

    let report = build_index(
        &catalog,
        &ChunkBuilder::default(),
        &embedder,
        &mut store,
        2,
        false,
    )
    .await
    .unwrap();
    assert_eq!(report.courses, 2);
    assert_eq!(report.chunks, 6);
    assert_eq!(report.dimension, 256);
    assert_eq!(report.per_type.get(&ChunkType::Tools), Some(&2));

    (store, embedder)
}

#[tokio::test]
async fn test_query_finds_matching_course() {
    let dir = TempDir::new().unwrap();
    let (store, embedder) = build(&dir).await;
    let kb = KnowledgeBase::open(&store, embedder).unwrap();
    assert_eq!(kb.len(), 6);

    let hits = kb.search("Figma Miro Framer tools", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.metadata.course, "UI UX Design");
    assert_eq!(hits[0].chunk.chunk_type(), ChunkType::Tools);
}

#[tokio::test]
async fn test_stored_vectors_match_fresh_embeddings() {
    let dir = TempDir::new().unwrap();
    let (store, embedder) = build(&dir).await;
    let loaded = store.load().unwrap();

    for (chunk, row) in loaded.chunks.iter().zip(loaded.matrix.rows()) {
        let fresh = embedder.embed(&chunk.text).await.unwrap();
        for (a, b) in row.iter().zip(&fresh) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}

#[tokio::test]
async fn test_retrieve_context_report() {
    let dir = TempDir::new().unwrap();
    let (store, embedder) = build(&dir).await;
    let kb = KnowledgeBase::open(&store, embedder).unwrap();

    let report = kb
        .retrieve_context("Do I need coding experience for product management?", 3)
        .await
        .unwrap();
    assert!(report.starts_with("Top 3 Retrieval Results:\n"));
    assert!(report.contains("Source: faq - Product Management"));
    assert_eq!(report.matches("Result ").count(), 3);
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (first_store, _) = build(&dir).await;
    let first = first_store.load().unwrap();
    drop(first_store);

    let (second_store, _) = build(&dir).await;
    let second = second_store.load().unwrap();

    assert_eq!(first.ids, second.ids);
    assert_eq!(first.chunks, second.chunks);
    assert_eq!(first.matrix, second.matrix);
}

#[tokio::test]
async fn test_reopened_knowledge_base_answers_the_same() {
    let dir = TempDir::new().unwrap();
    let (store, embedder) = build(&dir).await;
    let before = KnowledgeBase::open(&store, embedder.clone())
        .unwrap()
        .retrieve_context("16 weeks duration", 2)
        .await
        .unwrap();
    drop(store);

    let reopened = SqliteVectorStore::open(dir.path().join("kb.db")).unwrap();
    let after = KnowledgeBase::open(&reopened, embedder)
        .unwrap()
        .retrieve_context("16 weeks duration", 2)
        .await
        .unwrap();
    assert_eq!(before, after);
}
