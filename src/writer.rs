// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Persisting rendered documents.
//!
//! Documents are written either into one combined file, joined by a
//! `\n---\n` delimiter, or into a directory with one `<stem>.md` file per
//! document. Existing files are always overwritten.

use snafu::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Delimiter placed between documents in single-file output.
pub const DOCUMENT_DELIMITER: &str = "\n---\n";

/// Slugs longer than this are cut (slug output is ASCII, so bytes are chars).
const MAX_SLUG_LEN: usize = 60;

/// Error type for output failures.
#[derive(Debug, Snafu)]
pub enum WriteError {
    /// There was nothing to write.
    #[snafu(display("no Markdown documents to write"))]
    NoDocuments,

    /// A directory could not be created.
    #[snafu(display("failed to create directory {}: {source}", path.display()))]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A file could not be written.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// A rendered document and the file stem it is saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name without the `.md` extension.
    pub stem: String,
    /// The Markdown text.
    pub body: String,
}

impl Document {
    /// Creates a document named `conversation_<n>` from a 0-based position.
    #[must_use]
    pub fn numbered(index: usize, body: String) -> Self {
        Self {
            stem: format!("conversation_{}", index + 1),
            body,
        }
    }
}

/// Hands out unique file stems derived from conversation titles.
///
/// Titles are slugified; a missing or unsluggable title falls back to the
/// record's position. Repeated stems get `-001`, `-002`, ... suffixes, and
/// no stem is ever handed out twice.
#[derive(Debug, Default)]
pub struct StemRegistry {
    counts: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl StemRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stem for the record at `index` with the given title.
    pub fn stem_for(&mut self, index: usize, title: Option<&str>) -> String {
        let base = title
            .map(|title| {
                let raw = slug::slugify(title);
                raw[..raw.len().min(MAX_SLUG_LEN)]
                    .trim_end_matches('-')
                    .to_owned()
            })
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| index.to_string());

        // A suffixed stem may already belong to another title, so keep counting
        let suffix = self.counts.entry(base.clone()).or_insert(0);
        let mut stem = base.clone();
        while self.issued.contains(&stem) {
            *suffix += 1;
            stem = format!("{base}-{suffix:03}");
        }
        self.issued.insert(stem.clone());
        stem
    }
}

/// Returns the files [`write_documents`] would produce, in order.
#[must_use]
pub fn planned_paths(documents: &[Document], target: &Path, single_file: bool) -> Vec<PathBuf> {
    if single_file {
        return vec![target.to_path_buf()];
    }
    documents
        .iter()
        .map(|doc| target.join(format!("{}.md", doc.stem)))
        .collect()
}

/// Writes documents to `target` and returns the files written.
///
/// With `single_file`, `target` is a file and its parent directories are
/// created as needed. Otherwise `target` is created as a directory holding
/// one file per document.
///
/// # Errors
///
/// Returns an error if `documents` is empty or a directory or file cannot
/// be created.
pub fn write_documents(
    documents: &[Document],
    target: &Path,
    single_file: bool,
) -> Result<Vec<PathBuf>, WriteError> {
    ensure!(!documents.is_empty(), NoDocumentsSnafu);

    if single_file {
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context(CreateDirSnafu { path: parent })?;
        }
        let combined = documents
            .iter()
            .map(|doc| doc.body.as_str())
            .collect::<Vec<_>>()
            .join(DOCUMENT_DELIMITER);
        std::fs::write(target, combined).context(WriteFileSnafu { path: target })?;
        debug!(path = %target.display(), documents = documents.len(), "wrote combined file");
        return Ok(vec![target.to_path_buf()]);
    }

    std::fs::create_dir_all(target).context(CreateDirSnafu { path: target })?;
    let paths = planned_paths(documents, target, false);
    for (doc, path) in documents.iter().zip(&paths) {
        std::fs::write(path, &doc.body).context(WriteFileSnafu { path })?;
        debug!(path = %path.display(), "wrote conversation");
    }
    Ok(paths)
}

/// Writes documents, logging the outcome.
///
/// Returns the files written, or `None` if writing failed.
#[must_use]
pub fn save(documents: &[Document], target: &Path, single_file: bool) -> Option<Vec<PathBuf>> {
    info!(
        path = %target.display(),
        single_file,
        "saving Markdown output"
    );
    match write_documents(documents, target, single_file) {
        Ok(paths) => {
            info!(files = paths.len(), "saved Markdown output");
            Some(paths)
        }
        Err(err) => {
            error!("{err}");
            None
        }
    }
}
