// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Loading of exported conversation logs.
//!
//! An export is a JSON document that is expected to hold an array of
//! conversation records. Records are kept as untyped [`serde_json::Value`]s
//! because exports vary between versions and only a few fields are read.

use serde_json::Value;
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Error type for source loading failures.
#[derive(Debug, Snafu)]
pub enum SourceError {
    /// The input file does not exist.
    #[snafu(display("file {} not found", path.display()))]
    NotFound {
        /// Path of the input file.
        path: PathBuf,
    },

    /// The input file exists but could not be read.
    #[snafu(display("failed to read {}: {source}", path.display()))]
    Read {
        /// Path of the input file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The input file is not valid JSON.
    #[snafu(display("failed to decode JSON from {}: {source}", path.display()))]
    Decode {
        /// Path of the input file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Reads and decodes a JSON export.
///
/// # Errors
///
/// Returns [`SourceError::NotFound`] for a missing file,
/// [`SourceError::Decode`] for malformed JSON and [`SourceError::Read`] for
/// any other I/O failure.
pub fn read(path: &Path) -> Result<Value, SourceError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return NotFoundSnafu { path }.fail();
        }
        Err(source) => return Err(source).context(ReadSnafu { path }),
    };

    serde_json::from_str(&content).context(DecodeSnafu { path })
}

/// Loads a JSON export, logging any failure.
///
/// Returns `None` when the file is missing, unreadable or malformed. Callers
/// treat `None` as "no data" and stop before extraction.
#[must_use]
pub fn load(path: &Path) -> Option<Value> {
    info!(path = %path.display(), "loading JSON export");
    match read(path) {
        Ok(value) => Some(value),
        Err(err) => {
            error!("{err}");
            None
        }
    }
}
