// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, the `env.conf` document and
//! environment variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::RunConfigLayer;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<RunConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<RunConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(RunConfigLayer::default())
	}
}

/// The operator-edited configuration document.
///
/// Unlike the other sources this one is mandatory: a missing document is an
/// error, not an empty layer.
pub struct DocumentSource {
	path: PathBuf,
}

impl DocumentSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	fn is_toml(&self) -> bool {
		self
			.path
			.extension()
			.is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
	}
}

impl ConfigSource for DocumentSource {
	fn name(&self) -> &'static str {
		"document"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<RunConfigLayer, ConfigError> {
		if !self.path.exists() {
			return Err(ConfigError::FileNotFound(self.path.clone()));
		}

		debug!(path = %self.path.display(), "loading configuration document");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer = if self.is_toml() {
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?
		} else {
			serde_json::from_str(&content).map_err(|e| ConfigError::JsonParse {
				path: self.path.clone(),
				source: e,
			})?
		};

		trace!("parsed configuration layer from document");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: AUXLOAD_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<RunConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from_lookup(|name| std::env::var(name).ok())
	}
}

pub(crate) fn load_from_lookup<F>(lookup: F) -> Result<RunConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let var = |name: &str| lookup(name).filter(|s| !s.is_empty());

	Ok(RunConfigLayer {
		stop_file_name: var("AUXLOAD_STOP_FILE_NAME"),
		on_fail_email: var("AUXLOAD_ON_FAIL_EMAIL"),
		cut_off_time: parse_num("AUXLOAD_CUTOFF_TIME", var("AUXLOAD_CUTOFF_TIME"))?,
		schema_probe_program: var("AUXLOAD_SCHEMA_PROBE_PROGRAM"),
		probe_timeout_secs: parse_num(
			"AUXLOAD_PROBE_TIMEOUT_SECS",
			var("AUXLOAD_PROBE_TIMEOUT_SECS"),
		)?,
		notify_program: var("AUXLOAD_NOTIFY_PROGRAM"),
		load_steps: parse_num("AUXLOAD_LOAD_STEPS", var("AUXLOAD_LOAD_STEPS"))?,
		load_step_millis: parse_num("AUXLOAD_LOAD_STEP_MILLIS", var("AUXLOAD_LOAD_STEP_MILLIS"))?,
	})
}

fn parse_num<T: std::str::FromStr>(name: &str, value: Option<String>) -> Result<Option<T>, ConfigError> {
	match value {
		Some(v) => v.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid numeric value '{v}'"),
		}),
		None => Ok(None),
	}
}
