// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the run configuration.
///
/// All of these are fatal at startup: the control plane never binds when the
/// configuration cannot be resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("configuration file '{0}' does not exist")]
	FileNotFound(PathBuf),

	#[error("failed to read configuration file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse JSON configuration {path}: {source}")]
	JsonParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("failed to parse TOML configuration {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	#[error("configuration validation failed: {0}")]
	Validation(String),
}
