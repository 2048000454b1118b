// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Turns course records into typed chunks.
//!
//! Each cohort yields one or more text blocks per [`ChunkType`]. The mapping
//! from category to block construction lives in [`ChunkType::blocks`]; the
//! builder only walks courses, cohorts and categories in order and feeds
//! every block through the splitter.

use crate::catalog::{scalar_text, CohortDetails, Course, CourseCatalog};

use super::splitter::TextSplitter;
use super::types::{Chunk, ChunkMetadata, ChunkType};

impl ChunkType {
    /// Text blocks of this category for one cohort.
    ///
    /// Per-item categories (reviews, FAQs, success stories) return one block
    /// per item, grouped categories return at most one block. An empty
    /// sub-collection returns no blocks.
    pub fn blocks(
        &self,
        course_name: &str,
        cohort_label: &str,
        details: &CohortDetails,
    ) -> Vec<String> {
        match self {
            ChunkType::Overview => vec![overview_block(course_name, cohort_label, details)],
            ChunkType::Curriculum => {
                if details.weekwise_course_details.is_empty() {
                    return Vec::new();
                }
                let mut lines = vec![format!("Course: {} - Curriculum", course_name)];
                lines.extend(details.weekwise_course_details.iter().map(|week| {
                    format!(
                        "Week {}: Topics: {}. Outcomes: {}.",
                        scalar_text(week.week.as_ref()),
                        week.topics.join(", "),
                        week.learning_outcomes.join(", ")
                    )
                }));
                vec![lines.join("\n")]
            }
            ChunkType::Review => details
                .reviews
                .iter()
                .map(|review| {
                    [
                        format!("Course: {} Review", course_name),
                        format!("Reviewer: {}", review.reviewer_name),
                        format!("Rating: {}", scalar_text(review.rating.as_ref())),
                        format!("Review: {}", review.review_text),
                    ]
                    .join("\n")
                })
                .collect(),
            ChunkType::Faq => details
                .frequently_asked_questions
                .iter()
                .map(|faq| {
                    [
                        format!("Course: {} FAQ", course_name),
                        format!("Q: {}", faq.question),
                        format!("A: {}", faq.answer),
                    ]
                    .join("\n")
                })
                .collect(),
            ChunkType::SuccessStory => details
                .success_stories
                .iter()
                .map(|story| {
                    [
                        format!("Course: {} Success Story", course_name),
                        format!("Name: {}", story.name),
                        format!("Background: {}", story.background),
                        format!("Outcome: {}", story.outcome),
                    ]
                    .join("\n")
                })
                .collect(),
            ChunkType::Instructors => grouped_block(
                format!("Course: {} - Instructors", course_name),
                details.instructors.iter().map(|i| {
                    format!("{} - {}, {}", i.name, i.designation, i.experience)
                }),
            ),
            ChunkType::Mentors => grouped_block(
                format!("Course: {} - Mentors", course_name),
                details
                    .mentors
                    .iter()
                    .map(|m| format!("{} - {}, {}", m.name, m.expertise, m.experience)),
            ),
            ChunkType::Tools => {
                if details.tools_you_learn.is_empty() {
                    return Vec::new();
                }
                vec![format!(
                    "Course: {} - Tools You Learn\n{}",
                    course_name,
                    details.tools_you_learn.join(", ")
                )]
            }
        }
    }
}

fn overview_block(course_name: &str, cohort_label: &str, details: &CohortDetails) -> String {
    let mut lines = vec![format!("Course: {}", course_name)];
    if !cohort_label.is_empty() {
        lines.push(format!("Cohort: {}", cohort_label));
    }

    let logistics = [
        ("Duration", &details.live_class_duration),
        ("Timeline", &details.fellowship_timeline),
        ("Mentorship", &details.mentorship),
        ("Placement Support", &details.placement_support),
    ];
    for (label, value) in logistics {
        if let Some(value) = value {
            lines.push(format!("{}: {}", label, scalar_text(Some(value))));
        }
    }
    if let Some(cost) = &details.cost {
        lines.push(format!(
            "Cost: {} {}",
            scalar_text(cost.amount.as_ref()),
            scalar_text(cost.currency.as_ref())
        ));
    }

    lines.join("\n")
}

fn grouped_block(header: String, items: impl ExactSizeIterator<Item = String>) -> Vec<String> {
    if items.len() == 0 {
        return Vec::new();
    }
    let mut lines = vec![header];
    lines.extend(items);
    vec![lines.join("\n")]
}

/// Builds chunks from catalog records with a fixed splitter
#[derive(Debug, Clone, Default)]
pub struct ChunkBuilder {
    splitter: TextSplitter,
}

impl ChunkBuilder {
    pub fn new(splitter: TextSplitter) -> Self {
        Self { splitter }
    }

    pub fn splitter(&self) -> &TextSplitter {
        &self.splitter
    }

    /// Chunks for one course, in cohort, category and split order
    pub fn build_chunks(&self, course: &Course) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for cohort in &course.cohorts {
            for chunk_type in ChunkType::ALL {
                let metadata = ChunkMetadata {
                    source: course.course_url.clone(),
                    course: course.course_name.clone(),
                    chunk_type,
                };
                for block in chunk_type.blocks(
                    &course.course_name,
                    &cohort.cohort_label,
                    &cohort.cohort_details,
                ) {
                    chunks.extend(
                        self.splitter
                            .split(&block)
                            .map(|piece| Chunk::new(piece, metadata.clone())),
                    );
                }
            }
        }
        chunks
    }

    /// Chunks for every course in the catalog
    pub fn build_catalog(&self, catalog: &CourseCatalog) -> Vec<Chunk> {
        catalog
            .courses
            .iter()
            .flat_map(|course| self.build_chunks(course))
            .collect()
    }
}
