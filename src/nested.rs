// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Markdown rendering that walks raw conversation objects.
//!
//! Unlike [`crate::renderer`], this layout does not go through the
//! extractor. Every leaf of the record is written as a `path: value` line,
//! where the path joins the lower-cased keys of the enclosing objects and
//! the leaf key with dashes (`message-author-role`). Top-level leaves are
//! written back to back; deeper ones get a blank line in front.
//!
//! Lines that contain one of the [`TRIGGERS`] are written differently:
//! a list value (such as `message-content-parts`) has each element written
//! on its own line, and any other value is uppercased and emphasized
//! between blank lines. Matching is a plain, case-sensitive substring test
//! on the whole `path: value` line.
//!
//! # Example
//!
//! ```
//! use convo2md::nested::render_object;
//! use serde_json::json;
//!
//! let record = json!({
//!     "title": "Weekend plans",
//!     "message": { "author": { "role": "assistant" } }
//! });
//! let markdown = render_object(record.as_object().unwrap());
//!
//! assert!(markdown.starts_with("# Weekend plans\n"));
//! assert!(markdown.contains("\n\n**ASSISTANT**\n"));
//! ```

use crate::extract::{UNTITLED, kind};
use crate::renderer::{SEPARATOR, display_value};
use serde_json::{Map, Value};
use std::fmt::Write;
use tracing::{error, info, warn};

/// Line fragments that switch a leaf from a plain line to emphasized output.
pub const TRIGGERS: [&str; 3] = [
    "message-content-parts:",
    "message-author-role: assistant",
    "message-author-role: user",
];

/// A rendered record together with what is needed to name its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedDocument {
    /// Position of the record in the input array.
    pub index: usize,
    /// The record's `title`, if it is a string.
    pub title: Option<String>,
    /// The rendered Markdown.
    pub body: String,
}

fn write_leaf(out: &mut String, path: &str, depth: usize, value: &Value) {
    let line = format!("{path}: {}", display_value(value));

    if TRIGGERS.iter().any(|trigger| line.contains(trigger)) {
        if let Value::Array(items) = value {
            for item in items {
                write!(out, "\n{}", display_value(item)).unwrap();
            }
        } else {
            write!(out, "\n\n**{}**\n", display_value(value).to_uppercase()).unwrap();
        }
        return;
    }

    let lead = if depth == 1 { "" } else { "\n" };
    writeln!(out, "{lead}{line}").unwrap();
}

fn walk(out: &mut String, prefix: &str, depth: usize, object: &Map<String, Value>) {
    for (key, value) in object {
        if let Value::Object(child) = value {
            let segment = key.to_lowercase();
            let child_prefix = if prefix.is_empty() {
                segment
            } else {
                format!("{prefix}-{segment}")
            };
            walk(out, &child_prefix, depth + 1, child);
        } else {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}-{key}")
            };
            write_leaf(out, &path, depth, value);
        }
    }
}

/// Renders one raw conversation object.
///
/// The document starts with an H1 heading taken from the `title` field
/// (`Untitled` when missing) and ends with a separator line.
#[must_use]
pub fn render_object(record: &Map<String, Value>) -> String {
    let title = record
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(UNTITLED);

    let mut out = String::new();
    writeln!(out, "# {title}\n").unwrap();
    walk(&mut out, "", 1, record);
    write!(out, "\n\n{SEPARATOR}\n").unwrap();
    out
}

/// Renders every object in a decoded export.
///
/// Entries that are not objects are logged and skipped. Returns `None`
/// (and logs) if `document` is not an array or holds no objects at all.
#[must_use]
pub fn render_objects(document: &Value) -> Option<Vec<NestedDocument>> {
    let Some(records) = document.as_array() else {
        error!("JSON data is not a list (found {})", kind(document));
        return None;
    };

    info!(count = records.len(), "rendering raw conversation objects");
    let documents: Vec<_> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let Some(object) = record.as_object() else {
                warn!(index, "record is not an object (found {}); skipping record", kind(record));
                return None;
            };
            Some(NestedDocument {
                index,
                title: object.get("title").and_then(Value::as_str).map(str::to_owned),
                body: render_object(object),
            })
        })
        .collect();

    if documents.is_empty() {
        error!("no conversations to render");
        return None;
    }
    Some(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        render_object(value.as_object().unwrap())
    }

    #[test]
    fn writes_title_heading_first() {
        let output = render(&json!({ "title": "Rust questions", "id": "c1" }));
        assert!(output.starts_with("# Rust questions\n\n"));
    }

    #[test]
    fn falls_back_to_untitled_heading() {
        let output = render(&json!({ "id": "c1" }));
        assert!(output.starts_with("# Untitled\n"));
    }

    #[test]
    fn writes_top_level_leaves_without_blank_lines() {
        let output = render(&json!({ "title": "T", "id": "c1", "weight": 1 }));
        assert!(output.contains("title: T\nid: c1\nweight: 1\n"));
    }

    #[test]
    fn joins_nested_keys_with_dashes() {
        let output = render(&json!({
            "title": "T",
            "message": { "status": "done", "metadata": { "model_slug": "gpt-4" } }
        }));

        assert!(output.contains("\nmessage-status: done\n"));
        assert!(output.contains("\nmessage-metadata-model_slug: gpt-4\n"));
    }

    #[test]
    fn lowercases_object_keys_but_not_leaf_keys() {
        let output = render(&json!({ "Mapping": { "Node": { "Status": "ok" } } }));
        assert!(output.contains("mapping-node-Status: ok"));
    }

    #[test]
    fn emphasizes_assistant_role() {
        let output = render(&json!({
            "title": "T",
            "message": { "author": { "role": "assistant" } }
        }));

        assert!(output.contains("\n\n**ASSISTANT**\n"));
        assert!(!output.contains("message-author-role: assistant"));
    }

    #[test]
    fn emphasizes_user_role() {
        let output = render(&json!({ "message": { "author": { "role": "user" } } }));
        assert!(output.contains("\n\n**USER**\n"));
    }

    #[test]
    fn trigger_match_is_case_sensitive() {
        let output = render(&json!({ "message": { "author": { "Role": "user" } } }));

        assert!(output.contains("message-author-Role: user"));
        assert!(!output.contains("**USER**"));

        let output = render(&json!({ "message": { "author": { "role": "Assistant" } } }));
        assert!(output.contains("message-author-role: Assistant"));
    }

    #[test]
    fn other_roles_stay_plain() {
        let output = render(&json!({ "message": { "author": { "role": "system" } } }));
        assert!(output.contains("\nmessage-author-role: system\n"));
    }

    #[test]
    fn writes_content_parts_one_per_line() {
        let output = render(&json!({
            "message": { "content": { "content_type": "text", "parts": ["hello", "world"] } }
        }));

        assert!(output.contains("\nhello\nworld"));
        assert!(!output.contains("message-content-parts"));
        assert!(output.contains("\nmessage-content-content_type: text\n"));
    }

    #[test]
    fn emphasizes_scalar_content_parts() {
        let output = render(&json!({ "message": { "content": { "parts": "only" } } }));
        assert!(output.contains("\n\n**ONLY**\n"));
    }

    #[test]
    fn triggers_on_deeper_paths_containing_the_fragment() {
        let output = render(&json!({
            "mapping": { "n1": { "message": { "author": { "role": "user" } } } }
        }));
        assert!(output.contains("**USER**"));
    }

    #[test]
    fn ends_with_separator() {
        let output = render(&json!({ "title": "T" }));
        assert!(output.ends_with("\n---\n"));
    }

    #[test]
    fn render_objects_skips_non_objects() {
        let documents = render_objects(&json!([{ "title": "a" }, 5, { "id": "x" }])).unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].index, 0);
        assert_eq!(documents[0].title.as_deref(), Some("a"));
        assert_eq!(documents[1].index, 2);
        assert_eq!(documents[1].title, None);
    }

    #[test]
    fn render_objects_rejects_empty_and_non_array_input() {
        assert!(render_objects(&json!([])).is_none());
        assert!(render_objects(&json!({ "title": "x" })).is_none());
    }
}
