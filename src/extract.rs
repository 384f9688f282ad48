// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Field extraction from raw conversation records.
//!
//! Each record is projected onto an [`ExtractedRecord`] holding only the
//! fields switched on in the [`Config`]. A field that is switched on but
//! missing from the record is filled with a placeholder (`"Unknown"`,
//! `"Untitled"` for the title, or no parts) so extraction never fails on
//! sparse records.
//!
//! Fields are looked up on the record itself first and then under a nested
//! `message` object, which covers both flat records and node-style records
//! such as `{"message": {"author": {"role": "user"}, ...}}`.
//!
//! # Example
//!
//! ```
//! use convo2md::config::Config;
//! use convo2md::extract::extract;
//! use serde_json::json;
//!
//! let document = json!([{ "title": "Hello", "author": { "role": "user" } }]);
//! let records = extract(&document, &Config::default()).unwrap();
//!
//! assert_eq!(records[0].title.as_deref(), Some("Hello"));
//! assert_eq!(records[0].author_role, Some(json!("user")));
//! assert_eq!(records[0].create_time, Some(json!("Unknown")));
//! ```

use crate::config::Config;
use serde_json::Value;
use snafu::prelude::*;
use tracing::{debug, error, info, warn};

/// Placeholder for a configured field the record does not carry.
pub const UNKNOWN: &str = "Unknown";

/// Placeholder for a missing or non-string title.
pub const UNTITLED: &str = "Untitled";

/// Error type for extraction failures.
#[derive(Debug, Snafu)]
pub enum ExtractError {
    /// The decoded document is not an array of records.
    #[snafu(display("JSON data is not a list (found {found})"))]
    NotASequence {
        /// The JSON type that was found instead.
        found: &'static str,
    },

    /// A record is not a JSON object.
    #[snafu(display("record is not an object (found {found})"))]
    NotAnObject {
        /// The JSON type that was found instead.
        found: &'static str,
    },
}

/// The configured projection of one conversation record.
///
/// `None` means the field was not requested; a requested but absent field
/// holds its placeholder instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRecord {
    /// Conversation title.
    pub title: Option<String>,
    /// Creation time, usually Unix seconds.
    pub create_time: Option<Value>,
    /// Last update time, usually Unix seconds.
    pub update_time: Option<Value>,
    /// `author.role`, e.g. `"user"` or `"assistant"`.
    pub author_role: Option<Value>,
    /// `author.name`.
    pub author_name: Option<Value>,
    /// `content.type`, e.g. `"text"`.
    pub content_type: Option<Value>,
    /// `content.parts`.
    pub parts: Option<Vec<Value>>,
    /// Message status.
    pub status: Option<Value>,
    /// Whether the message ended the turn.
    pub end_turn: Option<Value>,
    /// Message weight.
    pub weight: Option<Value>,
    /// Requested metadata fields as `(name, value)` pairs, in config order.
    pub metadata: Vec<(&'static str, Value)>,
}

/// Returns a short name for the JSON type of `value`.
pub(crate) const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Navigates a JSON path, treating `null` like a missing key.
fn get<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    (!current.is_null()).then_some(current)
}

/// Looks a path up on the record, then under its `message` object.
fn lookup<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    get(record, path).or_else(|| record.get("message").and_then(|m| get(m, path)))
}

/// Looks a metadata key up on the record, then under `message.metadata`.
fn lookup_metadata<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    get(record, &[key]).or_else(|| get(record, &["message", "metadata", key]))
}

fn field(record: &Value, path: &[&str]) -> Value {
    lookup(record, path)
        .cloned()
        .unwrap_or_else(|| Value::String(UNKNOWN.to_owned()))
}

fn parts(record: &Value) -> Vec<Value> {
    match lookup(record, &["content", "parts"]) {
        Some(Value::Array(parts)) => parts.clone(),
        Some(other) => vec![other.clone()],
        None => Vec::new(),
    }
}

/// Extracts the configured fields from a single record.
///
/// # Errors
///
/// Returns [`ExtractError::NotAnObject`] if `record` is not a JSON object.
pub fn extract_record(record: &Value, config: &Config) -> Result<ExtractedRecord, ExtractError> {
    ensure!(
        record.is_object(),
        NotAnObjectSnafu {
            found: kind(record)
        }
    );

    let message = &config.message;
    let title = config.include_title.then(|| {
        record
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(UNTITLED)
            .to_owned()
    });

    let metadata = config
        .metadata
        .fields()
        .into_iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| {
            let value = lookup_metadata(record, name)
                .cloned()
                .unwrap_or_else(|| Value::String(UNKNOWN.to_owned()));
            (name, value)
        })
        .collect();

    Ok(ExtractedRecord {
        title,
        create_time: config
            .include_create_time
            .then(|| field(record, &["create_time"])),
        update_time: config
            .include_update_time
            .then(|| field(record, &["update_time"])),
        author_role: message
            .include_author_role
            .then(|| field(record, &["author", "role"])),
        author_name: message
            .include_author_name
            .then(|| field(record, &["author", "name"])),
        content_type: message
            .include_content_type
            .then(|| field(record, &["content", "type"])),
        parts: message.include_parts.then(|| parts(record)),
        status: message.include_status.then(|| field(record, &["status"])),
        end_turn: message
            .include_end_turn
            .then(|| field(record, &["end_turn"])),
        weight: message.include_weight.then(|| field(record, &["weight"])),
        metadata,
    })
}

/// Extracts every record of a decoded export.
///
/// Records that are not objects are logged and skipped; the rest of the
/// batch is still extracted, in input order.
///
/// # Errors
///
/// Returns [`ExtractError::NotASequence`] if `document` is not an array.
pub fn try_extract(document: &Value, config: &Config) -> Result<Vec<ExtractedRecord>, ExtractError> {
    let records = document.as_array().context(NotASequenceSnafu {
        found: kind(document),
    })?;

    let mut extracted = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match extract_record(record, config) {
            Ok(record) => extracted.push(record),
            Err(err) => warn!(index, "{err}; skipping record"),
        }
    }

    debug!(
        extracted = extracted.len(),
        skipped = records.len() - extracted.len(),
        "extraction finished"
    );
    Ok(extracted)
}

/// Extracts every record of a decoded export, logging failure.
///
/// Returns `None` if `document` is not an array of records.
#[must_use]
pub fn extract(document: &Value, config: &Config) -> Option<Vec<ExtractedRecord>> {
    info!("extracting conversations");
    match try_extract(document, config) {
        Ok(records) => Some(records),
        Err(err) => {
            error!("{err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MessageConfig, MetadataConfig};
    use serde_json::json;

    fn everything() -> Config {
        Config {
            include_update_time: true,
            message: MessageConfig {
                include_author_role: true,
                include_author_name: true,
                include_content_type: true,
                include_parts: true,
                include_status: true,
                include_end_turn: true,
                include_weight: true,
            },
            metadata: MetadataConfig {
                include_is_user_system_message: true,
                include_user_context_message_data: true,
                include_finish_details: true,
                include_timestamp: true,
                include_message_type: true,
                include_model_slug: true,
                include_parent_id: true,
            },
            ..Config::default()
        }
    }

    fn full_record() -> Value {
        json!({
            "title": "Borrow checker",
            "create_time": 1_700_000_000.5,
            "update_time": 1_700_000_100.0,
            "author": { "role": "user", "name": "sam" },
            "content": { "type": "text", "parts": ["hello", "world"] },
            "status": "finished_successfully",
            "end_turn": true,
            "weight": 1.0,
            "model_slug": "gpt-4",
            "parent_id": "abc"
        })
    }

    #[test]
    fn copies_configured_fields() {
        let record = extract_record(&full_record(), &everything()).unwrap();

        assert_eq!(record.title.as_deref(), Some("Borrow checker"));
        assert_eq!(record.create_time, Some(json!(1_700_000_000.5)));
        assert_eq!(record.author_role, Some(json!("user")));
        assert_eq!(record.author_name, Some(json!("sam")));
        assert_eq!(record.content_type, Some(json!("text")));
        assert_eq!(record.parts, Some(vec![json!("hello"), json!("world")]));
        assert_eq!(record.status, Some(json!("finished_successfully")));
        assert_eq!(record.end_turn, Some(json!(true)));
        assert_eq!(record.weight, Some(json!(1.0)));
    }

    #[test]
    fn leaves_unconfigured_fields_out() {
        let record = extract_record(&full_record(), &Config::default()).unwrap();

        assert!(record.update_time.is_none());
        assert!(record.author_name.is_none());
        assert!(record.status.is_none());
        assert!(record.weight.is_none());
        assert!(record.metadata.is_empty());
    }

    #[test]
    fn fills_missing_fields_with_placeholders() {
        let record = extract_record(&json!({}), &everything()).unwrap();

        assert_eq!(record.title.as_deref(), Some(UNTITLED));
        assert_eq!(record.create_time, Some(json!(UNKNOWN)));
        assert_eq!(record.update_time, Some(json!(UNKNOWN)));
        assert_eq!(record.author_role, Some(json!(UNKNOWN)));
        assert_eq!(record.author_name, Some(json!(UNKNOWN)));
        assert_eq!(record.content_type, Some(json!(UNKNOWN)));
        assert_eq!(record.parts, Some(vec![]));
        assert_eq!(record.status, Some(json!(UNKNOWN)));
        assert_eq!(record.end_turn, Some(json!(UNKNOWN)));
        assert_eq!(record.weight, Some(json!(UNKNOWN)));
        assert_eq!(record.metadata.len(), 7);
        assert!(record.metadata.iter().all(|(_, v)| v == UNKNOWN));
    }

    #[test]
    fn treats_null_and_non_string_titles_as_untitled() {
        let config = Config::default();
        for title in [json!(null), json!(42), json!(["a"])] {
            let record = extract_record(&json!({ "title": title }), &config).unwrap();
            assert_eq!(record.title.as_deref(), Some(UNTITLED));
        }
    }

    #[test]
    fn treats_null_field_as_missing() {
        let record = extract_record(&json!({ "end_turn": null }), &everything()).unwrap();
        assert_eq!(record.end_turn, Some(json!(UNKNOWN)));
    }

    #[test]
    fn reads_node_style_records() {
        let node = json!({
            "id": "n1",
            "message": {
                "author": { "role": "assistant" },
                "content": { "content_type": "text", "parts": ["hi"] },
                "metadata": { "model_slug": "gpt-4o", "parent_id": "n0" }
            }
        });
        let record = extract_record(&node, &everything()).unwrap();

        assert_eq!(record.author_role, Some(json!("assistant")));
        assert_eq!(record.parts, Some(vec![json!("hi")]));
        assert!(record.metadata.contains(&("model_slug", json!("gpt-4o"))));
        assert!(record.metadata.contains(&("parent_id", json!("n0"))));
    }

    #[test]
    fn wraps_scalar_parts() {
        let record = extract_record(
            &json!({ "content": { "parts": "just text" } }),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(record.parts, Some(vec![json!("just text")]));
    }

    #[test]
    fn keeps_metadata_in_config_order() {
        let record = extract_record(&full_record(), &everything()).unwrap();
        let names: Vec<_> = record.metadata.iter().map(|(name, _)| *name).collect();

        assert_eq!(
            names,
            vec![
                "is_user_system_message",
                "user_context_message_data",
                "finish_details",
                "timestamp",
                "message_type",
                "model_slug",
                "parent_id",
            ]
        );
    }

    #[test]
    fn rejects_non_object_record() {
        assert!(matches!(
            extract_record(&json!("nope"), &Config::default()),
            Err(ExtractError::NotAnObject { found: "string" })
        ));
    }

    #[test]
    fn returns_none_for_non_array_document() {
        assert!(extract(&json!({ "title": "x" }), &Config::default()).is_none());
        assert!(matches!(
            try_extract(&json!(3), &Config::default()),
            Err(ExtractError::NotASequence { found: "number" })
        ));
    }

    #[test]
    fn skips_bad_records_and_keeps_the_rest() {
        let document = json!([{ "title": "a" }, 7, { "title": "b" }]);
        let records = extract(&document, &Config::default()).unwrap();
        let titles: Vec<_> = records.iter().filter_map(|r| r.title.as_deref()).collect();

        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn preserves_input_order() {
        let document = Value::Array((0..20).map(|i| json!({ "title": format!("t{i}") })).collect());
        let records = extract(&document, &Config::default()).unwrap();

        assert_eq!(records.len(), 20);
        assert_eq!(records[0].title.as_deref(), Some("t0"));
        assert_eq!(records[19].title.as_deref(), Some("t19"));
    }
}
