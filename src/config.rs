// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Conversion settings and their TOML configuration file.
//!
//! The settings form a small tree of boolean toggles: a handful of
//! top-level switches plus the `message` and `metadata` namespaces that
//! decide which fields the extractor copies out of each conversation.
//!
//! A user file is merged over the defaults *shallowly*: a top-level key in
//! the file replaces the default value wholesale. Supplying a `[message]`
//! table therefore replaces the whole default `message` table, and any flag
//! left out of it reads as `false`.
//!
//! # Example
//!
//! ```
//! use convo2md::config::{self, Config};
//!
//! let defaults = config::default_table().unwrap();
//! let user: toml::Table = toml::from_str("[message]\ninclude_status = true").unwrap();
//! let merged: Config = toml::Value::Table(config::merge(defaults, user))
//!     .try_into()
//!     .unwrap();
//!
//! assert!(merged.message.include_status);
//! assert!(!merged.message.include_author_role);
//! assert!(merged.include_title);
//! ```

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Error type for configuration loading failures.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[snafu(display("failed to read config {}: {source}", path.display()))]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML.
    #[snafu(display("failed to parse config {}: {source}", path.display()))]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// The merged settings have the wrong shape (e.g. a flag that is not a boolean).
    #[snafu(display("invalid settings in {}: {source}", path.display()))]
    Invalid {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// The built-in defaults could not be turned into a TOML table.
    #[snafu(display("failed to build default settings: {source}"))]
    Defaults {
        /// The underlying TOML error.
        source: toml::ser::Error,
    },

    /// The built-in defaults serialised to something other than a table.
    #[snafu(display("default settings did not serialise to a table"))]
    DefaultsShape,
}

/// The resolved conversion settings.
///
/// Created once per run and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    /// Write every conversation into one file instead of one file each.
    pub single_file_output: bool,

    /// Copy the conversation title, and render it as an H1 heading.
    pub include_title: bool,

    /// Copy the `create_time` field.
    pub include_create_time: bool,

    /// Copy the `update_time` field.
    pub include_update_time: bool,

    /// Render the timestamp lines of the flat layout.
    #[serde(default = "enabled")]
    pub include_timestamp: bool,

    /// Render the author line of the flat layout.
    #[serde(default = "enabled")]
    pub include_author: bool,

    /// Render the content parts of the flat layout.
    #[serde(default = "enabled")]
    pub include_content: bool,

    /// Render status, weight, content type and metadata lines of the flat layout.
    #[serde(default = "enabled")]
    pub include_details: bool,

    /// Which per-message fields to extract.
    pub message: MessageConfig,

    /// Which message metadata fields to extract.
    pub metadata: MetadataConfig,

    /// Keys the converter does not know about. Kept, never consulted.
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// Toggles under the `[message]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct MessageConfig {
    /// Copy `author.role`.
    #[serde(default)]
    pub include_author_role: bool,
    /// Copy `author.name`.
    #[serde(default)]
    pub include_author_name: bool,
    /// Copy `content.type`.
    #[serde(default)]
    pub include_content_type: bool,
    /// Copy `content.parts`.
    #[serde(default)]
    pub include_parts: bool,
    /// Copy `status`.
    #[serde(default)]
    pub include_status: bool,
    /// Copy `end_turn`.
    #[serde(default)]
    pub include_end_turn: bool,
    /// Copy `weight`.
    #[serde(default)]
    pub include_weight: bool,
}

/// Toggles under the `[metadata]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct MetadataConfig {
    /// Copy `is_user_system_message`.
    #[serde(default)]
    pub include_is_user_system_message: bool,
    /// Copy `user_context_message_data`.
    #[serde(default)]
    pub include_user_context_message_data: bool,
    /// Copy `finish_details`.
    #[serde(default)]
    pub include_finish_details: bool,
    /// Copy `timestamp`.
    #[serde(default)]
    pub include_timestamp: bool,
    /// Copy `message_type`.
    #[serde(default)]
    pub include_message_type: bool,
    /// Copy `model_slug`.
    #[serde(default)]
    pub include_model_slug: bool,
    /// Copy `parent_id`.
    #[serde(default)]
    pub include_parent_id: bool,
}

const fn enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            single_file_output: true,
            include_title: true,
            include_create_time: true,
            include_update_time: false,
            include_timestamp: true,
            include_author: true,
            include_content: true,
            include_details: true,
            message: MessageConfig::default(),
            metadata: MetadataConfig::default(),
            extra: toml::Table::new(),
        }
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            include_author_role: true,
            include_author_name: false,
            include_content_type: true,
            include_parts: true,
            include_status: false,
            include_end_turn: false,
            include_weight: false,
        }
    }
}

impl MetadataConfig {
    /// Returns `(field name, enabled)` pairs in output order.
    #[must_use]
    pub const fn fields(&self) -> [(&'static str, bool); 7] {
        [
            (
                "is_user_system_message",
                self.include_is_user_system_message,
            ),
            (
                "user_context_message_data",
                self.include_user_context_message_data,
            ),
            ("finish_details", self.include_finish_details),
            ("timestamp", self.include_timestamp),
            ("message_type", self.include_message_type),
            ("model_slug", self.include_model_slug),
            ("parent_id", self.include_parent_id),
        ]
    }
}

/// Returns the default settings as a TOML table.
///
/// # Errors
///
/// Returns an error if the defaults cannot be serialised, which would
/// indicate a bug in the [`Config`] definition.
pub fn default_table() -> Result<toml::Table, ConfigError> {
    match toml::Value::try_from(Config::default()).context(DefaultsSnafu)? {
        toml::Value::Table(table) => Ok(table),
        _ => DefaultsShapeSnafu.fail(),
    }
}

/// Shallow-merges `user` over `defaults`.
///
/// Every top-level key of `user` replaces the default value outright;
/// nested tables are not merged field by field.
#[must_use]
pub fn merge(mut defaults: toml::Table, user: toml::Table) -> toml::Table {
    for (key, value) in user {
        defaults.insert(key, value);
    }
    defaults
}

/// Loads a configuration file and merges it over the defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or the
/// merged settings have the wrong types.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).context(ReadSnafu { path })?;
    let user: toml::Table = toml::from_str(&content).context(ParseSnafu { path })?;
    debug!(keys = user.len(), "parsed user config");

    let merged = merge(default_table()?, user);
    toml::Value::Table(merged)
        .try_into()
        .context(InvalidSnafu { path })
}

/// Resolves the settings for a run.
///
/// Without a path the defaults are used. A path that cannot be loaded is
/// logged and also yields the defaults; this function never fails.
#[must_use]
pub fn resolve(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        info!("no config file given, using defaults");
        return Config::default();
    };

    info!(path = %path.display(), "loading configuration");
    match load(path) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}; falling back to default settings");
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn default_table_round_trips_to_defaults() {
        let table = default_table().unwrap();
        let config: Config = toml::Value::Table(table).try_into().unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn render_switches_default_on_when_absent() {
        let config: Config = toml::from_str(
            "single_file_output = false\n\
             include_title = true\n\
             include_create_time = true\n\
             include_update_time = false\n\
             [message]\n\
             [metadata]\n",
        )
        .unwrap();

        assert!(config.include_timestamp);
        assert!(config.include_author);
        assert!(config.include_content);
        assert!(config.include_details);
        assert!(!config.message.include_parts);
    }

    #[test]
    fn default_table_has_both_namespaces() {
        let table = default_table().unwrap();

        assert!(table.get("message").is_some_and(toml::Value::is_table));
        assert!(table.get("metadata").is_some_and(toml::Value::is_table));
        assert_eq!(
            table.get("single_file_output"),
            Some(&toml::Value::Boolean(true))
        );
    }

    #[test]
    fn resolves_defaults_without_path() {
        assert_eq!(resolve(None), Config::default());
    }

    #[test]
    fn overrides_top_level_flag() {
        let file = write_config("single_file_output = false\ninclude_update_time = true\n");
        let config = resolve(Some(file.path()));

        assert!(!config.single_file_output);
        assert!(config.include_update_time);
        // Untouched keys keep their defaults
        assert!(config.include_title);
        assert_eq!(config.message, MessageConfig::default());
    }

    #[test]
    fn replaces_namespace_table_wholesale() {
        let file = write_config("[message]\ninclude_weight = true\n");
        let config = resolve(Some(file.path()));

        assert!(config.message.include_weight);
        assert!(!config.message.include_author_role);
        assert!(!config.message.include_parts);
        assert_eq!(config.metadata, MetadataConfig::default());
    }

    #[test]
    fn keeps_unknown_keys() {
        let file = write_config("theme = \"dark\"\n");
        let config = resolve(Some(file.path()));

        assert_eq!(
            config.extra.get("theme"),
            Some(&toml::Value::String("dark".into()))
        );
        assert!(config.single_file_output);
    }

    #[test]
    fn falls_back_on_missing_file() {
        let config = resolve(Some(Path::new("/definitely/not/here/config.toml")));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn falls_back_on_malformed_toml() {
        let file = write_config("single_file_output = = true");
        assert_eq!(resolve(Some(file.path())), Config::default());
    }

    #[test]
    fn falls_back_on_wrong_type() {
        let file = write_config("include_title = \"yes\"\n");
        assert!(matches!(load(file.path()), Err(ConfigError::Invalid { .. })));
        assert_eq!(resolve(Some(file.path())), Config::default());
    }

    #[test]
    fn reports_parse_errors_distinctly() {
        let file = write_config("[message");
        assert!(matches!(load(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn metadata_fields_follow_flags() {
        let metadata = MetadataConfig {
            include_model_slug: true,
            ..Default::default()
        };
        let enabled: Vec<_> = metadata
            .fields()
            .into_iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect();

        assert_eq!(enabled, vec!["model_slug"]);
    }
}
