// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Course catalog records consumed by the chunker.
//!
//! Mirrors the scraped catalog JSON (`{"courses": [...]}`). Every field is
//! optional on the wire; scalar fields may arrive as strings or numbers.
//! Text fields accept any JSON scalar and render it, and `null` counts as
//! missing, so one odd value never rejects the whole catalog.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::errors::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseCatalog {
    #[serde(default, deserialize_with = "or_default")]
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(default = "unknown_course", deserialize_with = "course_name_text")]
    pub course_name: String,
    #[serde(default, deserialize_with = "text")]
    pub course_url: String,
    #[serde(default, deserialize_with = "or_default")]
    pub cohorts: Vec<Cohort>,
}

fn unknown_course() -> String {
    "Unknown Course".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cohort {
    #[serde(default, deserialize_with = "text")]
    pub cohort_label: String,
    #[serde(default, deserialize_with = "or_default")]
    pub cohort_details: CohortDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CohortDetails {
    pub live_class_duration: Option<Value>,
    pub fellowship_timeline: Option<Value>,
    pub mentorship: Option<Value>,
    pub placement_support: Option<Value>,
    pub cost: Option<Cost>,
    #[serde(default, deserialize_with = "or_default")]
    pub weekwise_course_details: Vec<CurriculumWeek>,
    #[serde(default, deserialize_with = "or_default")]
    pub reviews: Vec<Review>,
    #[serde(default, deserialize_with = "or_default")]
    pub frequently_asked_questions: Vec<Faq>,
    #[serde(default, deserialize_with = "or_default")]
    pub success_stories: Vec<SuccessStory>,
    #[serde(default, deserialize_with = "or_default")]
    pub instructors: Vec<Instructor>,
    #[serde(default, deserialize_with = "or_default")]
    pub mentors: Vec<Mentor>,
    #[serde(default, deserialize_with = "text_list")]
    pub tools_you_learn: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cost {
    pub amount: Option<Value>,
    pub currency: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurriculumWeek {
    pub week: Option<Value>,
    #[serde(default, deserialize_with = "text_list")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub learning_outcomes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(default = "anonymous", deserialize_with = "reviewer_text")]
    pub reviewer_name: String,
    pub rating: Option<Value>,
    #[serde(default, deserialize_with = "text")]
    pub review_text: String,
}

fn anonymous() -> String {
    "Anonymous".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Faq {
    #[serde(default, deserialize_with = "text")]
    pub question: String,
    #[serde(default, deserialize_with = "text")]
    pub answer: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuccessStory {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub background: String,
    #[serde(default, deserialize_with = "text")]
    pub outcome: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instructor {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub designation: String,
    #[serde(default, deserialize_with = "text")]
    pub experience: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mentor {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub expertise: String,
    #[serde(default, deserialize_with = "text")]
    pub experience: String,
}

impl CourseCatalog {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn cohort_count(&self) -> usize {
        self.courses.iter().map(|c| c.cohorts.len()).sum()
    }
}

/// Renders an optional JSON scalar as plain text.
///
/// Strings lose their quotes, numbers and booleans keep their JSON text,
/// `null` and missing values become empty.
pub fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(scalar_text(value.as_ref()))
}

fn text_or<'de, D: Deserializer<'de>>(
    deserializer: D,
    fallback: fn() -> String,
) -> std::result::Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => fallback(),
        Some(other) => scalar_text(Some(&other)),
    })
}

fn course_name_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    text_or(deserializer, unknown_course)
}

fn reviewer_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    text_or(deserializer, anonymous)
}

/// A list of scalars; `null` is empty and a lone scalar is a one-item list
fn text_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| scalar_text(Some(item)))
            .collect(),
        Some(other) => vec![scalar_text(Some(&other))],
    })
}

fn or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
