// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Markdown rendering for extracted conversation records.
//!
//! This module turns each [`ExtractedRecord`] into its own Markdown
//! document. Only fields present in the record are rendered, and each group
//! of lines can additionally be switched off through [`RenderOptions`].
//!
//! # Output Format
//!
//! For every record, in order:
//! - An H1 heading with the title
//! - `**Timestamp**` and `**Updated**` lines
//! - An `**Author**` line (role, with the name in parentheses)
//! - Detail lines (content type, status, end of turn, weight, metadata)
//! - One paragraph per content part
//! - A closing `---` separator
//!
//! # Example
//!
//! ```
//! use convo2md::extract::ExtractedRecord;
//! use convo2md::renderer::{render_record, RenderOptions};
//! use serde_json::json;
//!
//! let record = ExtractedRecord {
//!     title: Some("Greetings".into()),
//!     author_role: Some(json!("user")),
//!     parts: Some(vec![json!("Hello!")]),
//!     ..Default::default()
//! };
//!
//! let markdown = render_record(&record, &RenderOptions::default());
//!
//! assert!(markdown.starts_with("# Greetings\n"));
//! assert!(markdown.contains("**Author**: user"));
//! assert!(markdown.contains("Hello!"));
//! assert!(markdown.ends_with("---\n"));
//! ```

use crate::config::Config;
use crate::extract::ExtractedRecord;
use chrono::DateTime;
use serde_json::Value;
use std::fmt::Write;
use tracing::{error, info};

/// Line that closes every rendered document.
pub const SEPARATOR: &str = "---";

/// Configuration options for Markdown rendering.
///
/// Controls which groups of lines are included in the rendered output.
/// A group is only rendered if the record also carries the field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderOptions {
    /// Whether to render the title as an H1 heading.
    pub include_title: bool,

    /// Whether to render the creation and update times.
    ///
    /// Numeric Unix timestamps are shown as `YYYY-MM-DD HH:MM UTC`.
    pub include_timestamp: bool,

    /// Whether to render the author role and name.
    pub include_author: bool,

    /// Whether to render the content parts.
    pub include_content: bool,

    /// Whether to render status, weight, content type and metadata lines.
    pub include_details: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_title: true,
            include_timestamp: true,
            include_author: true,
            include_content: true,
            include_details: true,
        }
    }
}

impl RenderOptions {
    /// Takes the rendering switches from the resolved settings.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            include_title: config.include_title,
            include_timestamp: config.include_timestamp,
            include_author: config.include_author,
            include_content: config.include_content,
            include_details: config.include_details,
        }
    }
}

/// Formats a JSON value for display: strings verbatim, everything else as JSON.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Formats Unix seconds as a UTC date and time, or the raw value otherwise.
fn format_timestamp(value: &Value) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let datetime = value
        .as_f64()
        .and_then(|secs| DateTime::from_timestamp_millis((secs * 1000.0) as i64));

    datetime.map_or_else(
        || display_value(value),
        |dt| dt.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

/// Turns a field name like `model_slug` into a label like `Model slug`.
fn label(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn render_author(out: &mut String, record: &ExtractedRecord) {
    let author = match (&record.author_role, &record.author_name) {
        (Some(role), Some(name)) => format!("{} ({})", display_value(role), display_value(name)),
        (Some(value), None) | (None, Some(value)) => display_value(value),
        (None, None) => return,
    };
    writeln!(out, "**Author**: {author}\n").unwrap();
}

fn render_details(out: &mut String, record: &ExtractedRecord) {
    let fixed = [
        ("content_type", &record.content_type),
        ("status", &record.status),
        ("end_turn", &record.end_turn),
        ("weight", &record.weight),
    ];

    let mut any_rendered = false;
    let lines = fixed
        .into_iter()
        .filter_map(|(name, value)| Some((name, value.as_ref()?)))
        .chain(record.metadata.iter().map(|(name, value)| (*name, value)));
    for (name, value) in lines {
        writeln!(out, "**{}**: {}", label(name), display_value(value)).unwrap();
        any_rendered = true;
    }
    if any_rendered {
        out.push('\n');
    }
}

/// Renders one extracted record as a Markdown document.
///
/// The document always ends with a [`SEPARATOR`] line.
#[must_use]
pub fn render_record(record: &ExtractedRecord, opts: &RenderOptions) -> String {
    let mut out = String::new();

    if opts.include_title
        && let Some(title) = &record.title
    {
        writeln!(out, "# {title}\n").unwrap();
    }

    if opts.include_timestamp {
        if let Some(created) = &record.create_time {
            writeln!(out, "**Timestamp**: {}\n", format_timestamp(created)).unwrap();
        }
        if let Some(updated) = &record.update_time {
            writeln!(out, "**Updated**: {}\n", format_timestamp(updated)).unwrap();
        }
    }

    if opts.include_author {
        render_author(&mut out, record);
    }

    if opts.include_details {
        render_details(&mut out, record);
    }

    if opts.include_content
        && let Some(parts) = &record.parts
    {
        for part in parts {
            writeln!(out, "{}\n", display_value(part)).unwrap();
        }
    }

    writeln!(out, "{SEPARATOR}").unwrap();
    out
}

/// Renders every extracted record, one document per record, in order.
///
/// Returns `None` (and logs) when there is nothing to render.
#[must_use]
pub fn render_records(records: &[ExtractedRecord], opts: &RenderOptions) -> Option<Vec<String>> {
    if records.is_empty() {
        error!("no conversations to render");
        return None;
    }

    info!(count = records.len(), "rendering conversations");
    Some(
        records
            .iter()
            .map(|record| render_record(record, opts))
            .collect(),
    )
}
