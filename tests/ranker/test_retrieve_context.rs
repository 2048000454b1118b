// Ranker::retrieve_context report layout

use course_kb::chunker::{Chunk, ChunkMetadata, ChunkType};
use course_kb::ranker::{Ranker, NO_RESULTS_MESSAGE};
use ndarray::array;

fn ranker() -> Ranker {
    let chunks = vec![
        Chunk::new(
            "Course: Product Management FAQ\nQ: Is it online?\nA: Yes",
            ChunkMetadata {
                source: "https://example.com/pm".to_string(),
                course: "Product Management".to_string(),
                chunk_type: ChunkType::Faq,
            },
        ),
        Chunk::new(
            "Course: Data Analytics\nDuration: 24 weeks",
            ChunkMetadata {
                source: "https://example.com/da".to_string(),
                course: "Data Analytics".to_string(),
                chunk_type: ChunkType::Overview,
            },
        ),
    ];
    Ranker::new(chunks, array![[0.6, 0.8], [1.0, 0.0]]).unwrap()
}

#[test]
fn test_report_lists_hits_in_rank_order() {
    let report = ranker().retrieve_context(&[1.0, 0.0], 2).unwrap();
    let rule = "=".repeat(40);
    let thin = "-".repeat(20);

    let expected = [
        "Top 2 Retrieval Results:".to_string(),
        rule.clone(),
        "Result 1 (Score: 1.0000)".to_string(),
        "Source: overview - Data Analytics".to_string(),
        thin.clone(),
        "Course: Data Analytics".to_string(),
        "Duration: 24 weeks".to_string(),
        rule.clone(),
        "Result 2 (Score: 0.6000)".to_string(),
        "Source: faq - Product Management".to_string(),
        thin,
        "Course: Product Management FAQ".to_string(),
        "Q: Is it online?".to_string(),
        "A: Yes".to_string(),
        rule,
    ]
    .join("\n")
        + "\n";
    assert_eq!(report, expected);
}

#[test]
fn test_report_header_counts_returned_hits() {
    let report = ranker().retrieve_context(&[0.0, 1.0], 10).unwrap();
    assert!(report.starts_with("Top 2 Retrieval Results:\n"));
    assert!(report.contains("Result 1 (Score: 0.8000)"));
    assert!(report.contains("Result 2 (Score: 0.0000)"));
}

#[test]
fn test_no_hits_renders_placeholder() {
    assert_eq!(
        Ranker::empty().retrieve_context(&[1.0], 3).unwrap(),
        "No relevant information found within the knowledge base."
    );
    assert_eq!(
        ranker().retrieve_context(&[1.0, 0.0], 0).unwrap(),
        NO_RESULTS_MESSAGE
    );
}
