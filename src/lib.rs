// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert exported conversation logs to Markdown.
//!
//! This crate turns a JSON export (an array of conversation records) into
//! Markdown documents, with a TOML settings file deciding which fields are
//! included.
//!
//! # Overview
//!
//! A conversion runs these stages:
//!
//! 1. Resolve the settings, merging a user file over the defaults
//! 2. Load the JSON export
//! 3. Render each conversation, either from the configured fields or by
//!    walking the raw record
//! 4. Normalise the Markdown (blank lines, code fences, headings)
//! 5. Write one combined file or one file per conversation
//!
//! Each stage logs its failures through [`tracing`] and yields nothing
//! instead of failing the run.
//!
//! # Example
//!
//! ```no_run
//! use convo2md::pipeline::{self, Options};
//!
//! let summary = pipeline::run(&Options::new("conversations.json", "conversations.md"));
//! if let Some(summary) = summary {
//!     println!("rendered {} conversations", summary.documents);
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: settings and their TOML file
//! - [`source`]: loading the JSON export
//! - [`extract`]: projecting records onto the configured fields
//! - [`renderer`]: Markdown for extracted records
//! - [`nested`]: Markdown for raw records, walked recursively
//! - [`postprocess`]: Markdown normalisation
//! - [`writer`]: writing documents to disk
//! - [`pipeline`]: the stages wired together

#![deny(missing_docs)]

pub mod config;
pub mod extract;
pub mod nested;
pub mod pipeline;
pub mod postprocess;
pub mod renderer;
pub mod source;
pub mod writer;
