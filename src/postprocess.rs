// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Normalisation of rendered Markdown.
//!
//! Three passes run in order:
//!
//! 1. [`collapse_blank_lines`]: runs of three or more newlines become two.
//! 2. [`tag_code_fences`]: opening fences without a language get `text`.
//! 3. [`punctuate_headings`]: ATX headings not ending in `.`, `?`, `!` or
//!    `:` get a trailing period.
//!
//! Each pass is idempotent and none of them changes the fence structure,
//! so [`postprocess`] applied to its own output returns it unchanged.
//!
//! ```
//! use convo2md::postprocess::postprocess;
//!
//! let once = postprocess("# Title\n\n\n\n```\nlet x = 1;\n```\n");
//! assert_eq!(once, "# Title.\n\n```text\nlet x = 1;\n```\n");
//! assert_eq!(postprocess(&once), once);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Language given to fences that do not name one.
pub const DEFAULT_FENCE_LANGUAGE: &str = "text";

static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("blank run regex"));

/// Characters that count as terminal punctuation for a heading.
const TERMINAL_PUNCTUATION: [char; 4] = ['.', '?', '!', ':'];

/// Collapses every run of three or more newlines to exactly two.
#[must_use]
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN_RE.replace_all(text, "\n\n").into_owned()
}

/// Lines indented by more than this are not fences or headings.
const MAX_INDENT: usize = 3;

/// An opening or closing code fence line.
struct Fence<'a> {
    /// Number of backticks in the fence.
    len: usize,
    /// Trimmed text after the backticks.
    info: &'a str,
}

/// Strips up to [`MAX_INDENT`] leading spaces, or returns `None` if the
/// line is indented further.
fn strip_indent(line: &str) -> Option<&str> {
    let body = line.trim_start_matches(' ');
    (line.len() - body.len() <= MAX_INDENT).then_some(body)
}

/// Parses a fence line: three or more backticks and an info string that
/// contains no backticks.
fn fence(line: &str) -> Option<Fence<'_>> {
    let body = strip_indent(line)?;
    let rest = body.trim_start_matches('`');
    let len = body.len() - rest.len();
    let info = rest.trim();
    (len >= 3 && !info.contains('`')).then_some(Fence { len, info })
}

/// Applies `f` to every line outside fenced code blocks.
///
/// Fence lines themselves are passed to `on_fence` with a flag telling
/// whether they open a block. Line endings are preserved.
fn map_lines(
    text: &str,
    mut on_fence: impl FnMut(&str, bool) -> String,
    mut on_line: impl FnMut(&str) -> String,
) -> String {
    // Backtick count of the fence that opened the current block
    let mut open: Option<usize> = None;
    text.split('\n')
        .map(|line| match (fence(line), open) {
            (Some(opening), None) => {
                open = Some(opening.len);
                on_fence(line, true)
            }
            // Only a bare fence at least as long as the opening one closes it
            (Some(closing), Some(len)) if closing.info.is_empty() && closing.len >= len => {
                open = None;
                on_fence(line, false)
            }
            (_, Some(_)) => line.to_owned(),
            (None, None) => on_line(line),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Adds the `text` language to opening fences that have none.
///
/// Closing fences and fences that already name a language are untouched.
#[must_use]
pub fn tag_code_fences(text: &str) -> String {
    map_lines(
        text,
        |line, opening| {
            if opening && fence(line).is_some_and(|f| f.info.is_empty()) {
                format!("{}{DEFAULT_FENCE_LANGUAGE}", line.trim_end())
            } else {
                line.to_owned()
            }
        },
        str::to_owned,
    )
}

/// Returns `true` for ATX heading lines with some text (`# Title`).
fn is_heading(line: &str) -> bool {
    let Some(line) = strip_indent(line) else {
        return false;
    };
    let hashes = line.len() - line.trim_start_matches('#').len();
    if !(1..=6).contains(&hashes) {
        return false;
    }
    let rest = &line[hashes..];
    rest.starts_with([' ', '\t']) && !rest.trim().is_empty()
}

/// Appends a period to headings that lack terminal punctuation.
///
/// Lines inside fenced code blocks are never treated as headings.
#[must_use]
pub fn punctuate_headings(text: &str) -> String {
    map_lines(text, |line, _| line.to_owned(), |line| {
        let trimmed = line.trim_end();
        if is_heading(line) && !trimmed.ends_with(TERMINAL_PUNCTUATION) {
            format!("{trimmed}.")
        } else {
            line.to_owned()
        }
    })
}

/// Runs all normalisation passes in order.
#[must_use]
pub fn postprocess(text: &str) -> String {
    let collapsed = collapse_blank_lines(text);
    let tagged = tag_code_fences(&collapsed);
    punctuate_headings(&tagged)
}
