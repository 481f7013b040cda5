// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Run configuration for the auxiliary database load job.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, `env.conf`, environment)
//! - A fully resolved, immutable [`RunConfiguration`] for one run
//! - Consistent environment variable naming (`AUXLOAD_*`)
//!
//! # Usage
//!
//! ```ignore
//! use auxload_server_config::load_config;
//!
//! let config = load_config("/opt/auxload/env.conf", "daily_load")?;
//! println!("stop file: {}", config.stop_file_name);
//! ```

pub mod cutoff;
pub mod error;
pub mod layer;
pub mod sources;

pub use cutoff::CutoffTime;
pub use error::ConfigError;
pub use layer::RunConfigLayer;
pub use sources::{ConfigSource, DefaultsSource, DocumentSource, EnvSource, Precedence};

use std::fmt;
use std::path::{Component, Path};
use std::time::Duration;

use tracing::{debug, info};

/// Default name of the configuration document inside the scope directory.
pub const CONFIG_FILE_NAME: &str = "env.conf";

const DEFAULT_STOP_FILE_NAME: &str = "stop.txt";
const DEFAULT_SCHEMA_PROBE_PROGRAM: &str = "get_current_schema.sh";
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_NOTIFY_PROGRAM: &str = "mail";
const DEFAULT_LOAD_STEPS: u32 = 10;
const DEFAULT_LOAD_STEP_MILLIS: u64 = 1000;

/// Shape of the placeholder load phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStubConfig {
	pub steps: u32,
	pub step: Duration,
}

/// Fully resolved configuration for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
	pub stop_file_name: String,
	/// Failure notification target; `None` means failures are only logged.
	pub on_fail_notify_target: Option<String>,
	/// `None` means the run is unbounded.
	pub cutoff_time: Option<CutoffTime>,
	/// Identifier of the control file being loaded, supplied by the invoker.
	pub control_file_id: String,
	pub schema_probe_program: String,
	pub probe_timeout: Duration,
	pub notify_program: String,
	pub load: LoadStubConfig,
}

impl RunConfiguration {
	/// Name of the running-lock marker for this control file.
	pub fn lock_file_name(&self) -> String {
		format!("{}.running", self.control_file_id)
	}
}

impl fmt::Display for RunConfiguration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"StopFileName={}, OnFailEmail={:?}, CutOffTime={}, ControlFile={:?}",
			self.stop_file_name,
			self.on_fail_notify_target.as_deref().unwrap_or(""),
			self
				.cutoff_time
				.map(|c| c.to_string())
				.unwrap_or_else(|| "none".to_string()),
			self.control_file_id,
		)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`AUXLOAD_*`)
/// 2. Configuration document (`env.conf`)
/// 3. Built-in defaults
pub fn load_config(
	document: impl AsRef<Path>,
	control_file_id: &str,
) -> Result<RunConfiguration, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(DocumentSource::new(document.as_ref())),
		Box::new(EnvSource),
	];
	load_config_from_sources(sources, control_file_id)
}

/// Load configuration from an explicit set of sources.
pub fn load_config_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
	control_file_id: &str,
) -> Result<RunConfiguration, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = RunConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged, control_file_id)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: RunConfigLayer, control_file_id: &str) -> Result<RunConfiguration, ConfigError> {
	let cutoff_time = layer.cut_off_time.map(CutoffTime::from_hhmm).transpose()?;

	let config = RunConfiguration {
		stop_file_name: layer
			.stop_file_name
			.unwrap_or_else(|| DEFAULT_STOP_FILE_NAME.to_string()),
		on_fail_notify_target: layer
			.on_fail_email
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty()),
		cutoff_time,
		control_file_id: control_file_id.trim().to_string(),
		schema_probe_program: layer
			.schema_probe_program
			.unwrap_or_else(|| DEFAULT_SCHEMA_PROBE_PROGRAM.to_string()),
		probe_timeout: Duration::from_secs(
			layer.probe_timeout_secs.unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS),
		),
		notify_program: layer
			.notify_program
			.unwrap_or_else(|| DEFAULT_NOTIFY_PROGRAM.to_string()),
		load: LoadStubConfig {
			steps: layer.load_steps.unwrap_or(DEFAULT_LOAD_STEPS),
			step: Duration::from_millis(layer.load_step_millis.unwrap_or(DEFAULT_LOAD_STEP_MILLIS)),
		},
	};

	validate_config(&config)?;

	info!(
		stop_file = %config.stop_file_name,
		notify_configured = config.on_fail_notify_target.is_some(),
		cutoff = ?config.cutoff_time.map(|c| c.to_string()),
		control_file = %config.control_file_id,
		"Run configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &RunConfiguration) -> Result<(), ConfigError> {
	if !is_plain_file_name(&config.stop_file_name) {
		return Err(ConfigError::Validation(format!(
			"stopFileName '{}' must be a plain file name inside the scope directory",
			config.stop_file_name
		)));
	}

	if !is_plain_file_name(&config.control_file_id) {
		return Err(ConfigError::Validation(format!(
			"control file '{}' must be a non-empty plain name",
			config.control_file_id
		)));
	}

	if config.probe_timeout.is_zero() {
		return Err(ConfigError::Validation(
			"probeTimeoutSecs must be greater than zero".to_string(),
		));
	}

	Ok(())
}

fn is_plain_file_name(name: &str) -> bool {
	let mut components = Path::new(name).components();
	matches!(
		(components.next(), components.next()),
		(Some(Component::Normal(_)), None)
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	struct FixedSource(RunConfigLayer, Precedence);

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.1
		}

		fn load(&self) -> Result<RunConfigLayer, ConfigError> {
			Ok(self.0.clone())
		}
	}

	#[test]
	fn test_defaults() {
		let config = finalize(RunConfigLayer::default(), "daily").unwrap();
		assert_eq!(config.stop_file_name, "stop.txt");
		assert_eq!(config.on_fail_notify_target, None);
		assert_eq!(config.cutoff_time, None);
		assert_eq!(config.schema_probe_program, "get_current_schema.sh");
		assert_eq!(config.probe_timeout, Duration::from_secs(60));
		assert_eq!(config.load.steps, 10);
		assert_eq!(config.load.step, Duration::from_millis(1000));
		assert_eq!(config.lock_file_name(), "daily.running");
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let sources: Vec<Box<dyn ConfigSource>> = vec![
			Box::new(FixedSource(
				RunConfigLayer {
					stop_file_name: Some("from-env".to_string()),
					..Default::default()
				},
				Precedence::Environment,
			)),
			Box::new(FixedSource(
				RunConfigLayer {
					stop_file_name: Some("from-file".to_string()),
					on_fail_email: Some("dba@example.com".to_string()),
					..Default::default()
				},
				Precedence::ConfigFile,
			)),
		];

		let config = load_config_from_sources(sources, "daily").unwrap();
		assert_eq!(config.stop_file_name, "from-env");
		assert_eq!(config.on_fail_notify_target.as_deref(), Some("dba@example.com"));
	}

	#[test]
	fn test_blank_email_means_no_target() {
		let layer = RunConfigLayer {
			on_fail_email: Some("   ".to_string()),
			..Default::default()
		};
		let config = finalize(layer, "daily").unwrap();
		assert_eq!(config.on_fail_notify_target, None);
	}

	#[test]
	fn test_invalid_cutoff_rejected() {
		let layer = RunConfigLayer {
			cut_off_time: Some(2515),
			..Default::default()
		};
		assert!(matches!(
			finalize(layer, "daily"),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_control_file_must_be_plain_name() {
		assert!(finalize(RunConfigLayer::default(), "").is_err());
		assert!(finalize(RunConfigLayer::default(), "../daily").is_err());
		assert!(finalize(RunConfigLayer::default(), "a/b").is_err());
	}

	#[test]
	fn test_stop_file_must_be_plain_name() {
		let layer = RunConfigLayer {
			stop_file_name: Some("/tmp/stop.txt".to_string()),
			..Default::default()
		};
		assert!(matches!(
			finalize(layer, "daily"),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_display_summary() {
		let layer = RunConfigLayer {
			on_fail_email: Some("dba@example.com".to_string()),
			cut_off_time: Some(630),
			..Default::default()
		};
		let config = finalize(layer, "daily").unwrap();
		assert_eq!(
			config.to_string(),
			"StopFileName=stop.txt, OnFailEmail=\"dba@example.com\", CutOffTime=06:30, ControlFile=\"daily\""
		);
	}
}
