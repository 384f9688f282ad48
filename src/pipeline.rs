// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! The end-to-end conversion: settings, load, render, normalise, save.
//!
//! Every stage logs its own failures and hands back `None`, and the
//! pipeline stops at the first stage that produced nothing. [`run`]
//! therefore never fails; a `None` result means no output was written.

use crate::config::{self, Config};
use crate::writer::{self, Document, StemRegistry};
use crate::{extract, nested, postprocess, renderer, source};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// Which renderer turns records into Markdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Extract the configured fields and render them (`conversation_<n>.md`).
    #[default]
    Flat,
    /// Walk the raw objects and render every leaf (`<title-slug>.md` files
    /// in a directory named after the input file).
    Nested,
}

/// Everything one conversion run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// The JSON export to convert.
    pub input: PathBuf,
    /// Optional TOML settings file.
    pub config: Option<PathBuf>,
    /// Output file (single-file mode) or directory.
    pub output: PathBuf,
    /// Which renderer to use.
    pub mode: RenderMode,
    /// Overrides `single_file_output` from the settings when set.
    pub single_file: Option<bool>,
    /// Log what would be written without touching the disk.
    pub dry_run: bool,
}

impl Options {
    /// Creates options with the flat renderer and no overrides.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            config: None,
            output: output.into(),
            mode: RenderMode::default(),
            single_file: None,
            dry_run: false,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Number of conversations rendered.
    pub documents: usize,
    /// Files written (or, in a dry run, the files that would be written).
    pub files: Vec<PathBuf>,
    /// `false` for a dry run.
    pub written: bool,
}

fn render_flat(document: &Value, config: &Config) -> Option<Vec<Document>> {
    let records = extract::extract(document, config)?;
    let opts = renderer::RenderOptions::from_config(config);
    let bodies = renderer::render_records(&records, &opts)?;

    Some(
        bodies
            .iter()
            .enumerate()
            .map(|(index, body)| Document::numbered(index, postprocess::postprocess(body)))
            .collect(),
    )
}

fn render_nested(document: &Value) -> Option<Vec<Document>> {
    let rendered = nested::render_objects(document)?;
    let mut stems = StemRegistry::new();

    Some(
        rendered
            .into_iter()
            .map(|doc| Document {
                stem: stems.stem_for(doc.index, doc.title.as_deref()),
                body: postprocess::postprocess(&doc.body),
            })
            .collect(),
    )
}

/// Returns where output goes for the given mode.
///
/// Split nested output lands in a subdirectory named after the input file.
fn output_target(opts: &Options, single_file: bool) -> PathBuf {
    match (opts.mode, opts.input.file_stem()) {
        (RenderMode::Nested, Some(stem)) if !single_file => opts.output.join(stem),
        _ => opts.output.clone(),
    }
}

/// Runs a full conversion.
///
/// Returns `None` when any stage failed or had nothing to work with; the
/// failure has already been logged.
#[must_use]
pub fn run(opts: &Options) -> Option<Summary> {
    let config = config::resolve(opts.config.as_deref());
    let single_file = opts.single_file.unwrap_or(config.single_file_output);

    let document = source::load(&opts.input)?;
    let documents = match opts.mode {
        RenderMode::Flat => render_flat(&document, &config)?,
        RenderMode::Nested => render_nested(&document)?,
    };

    let target = output_target(opts, single_file);
    if opts.dry_run {
        return Some(dry_run(&documents, &target, single_file));
    }

    let files = writer::save(&documents, &target, single_file)?;
    Some(Summary {
        documents: documents.len(),
        files,
        written: true,
    })
}

fn dry_run(documents: &[Document], target: &Path, single_file: bool) -> Summary {
    let files = writer::planned_paths(documents, target, single_file);
    for path in &files {
        info!(path = %path.display(), "would write");
    }
    Summary {
        documents: documents.len(),
        files,
        written: false,
    }
}
