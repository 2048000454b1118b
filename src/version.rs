// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the course knowledge base

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-course-retrieval-2026-10-18";

/// Build date
pub const BUILD_DATE: &str = "2026-10-18";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "boundary-aware-chunking",
    "sqlite-vector-store",
    "cosine-top-k",
    "feature-hash-embeddings",
    #[cfg(feature = "onnx")]
    "onnx-embeddings",
    "sql-dump-export",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Course KB {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
