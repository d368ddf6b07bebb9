//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the knowledge document index.

use serde_json::{json, Value};

/// Configuration for the document index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The alias name for the index (used for all document operations).
    pub alias: String,
    /// The version number for the index (e.g., 0 for "documents_v0").
    pub version: u32,
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `alias` - The index alias name
    /// * `version` - The version number
    pub fn new(alias: impl Into<String>, version: u32) -> Self {
        Self {
            alias: alias.into(),
            version,
        }
    }

    /// The concrete index name the alias points to.
    pub fn versioned_index_name(&self) -> String {
        get_versioned_index_name(Some(self.version))
    }
}

/// The base name of the document index (without version).
pub const INDEX_NAME: &str = "documents";

/// Get the versioned index name.
///
/// # Arguments
///
/// * `version` - The version number (defaults to 0 if None)
///
/// # Returns
///
/// The versioned index name (e.g., "documents_v0")
pub fn get_versioned_index_name(version: Option<u32>) -> String {
    let v = version.unwrap_or(0);
    format!("{}_v{}", INDEX_NAME, v)
}

/// Get the index settings and mappings for the document index.
///
/// - `title` is full-text searchable, with a `raw` keyword sub-field for sorting
/// - `url` and `document_id` are keywords for exact lookups
/// - `metadata` is stored but not indexed, since its shape belongs to the producer
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "document_id": {
                    "type": "keyword"
                },
                "title": {
                    "type": "text",
                    "fields": {
                        "raw": {
                            "type": "keyword"
                        }
                    }
                },
                "url": {
                    "type": "keyword"
                },
                "metadata": {
                    "type": "object",
                    "enabled": false
                },
                "indexed_at": {
                    "type": "date"
                }
            }
        }
    })
}
