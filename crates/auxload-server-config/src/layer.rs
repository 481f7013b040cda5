// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer produced by each source.

use serde::{Deserialize, Serialize};

/// Run configuration layer (partial, for merging).
///
/// Field names follow the `env.conf` document keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunConfigLayer {
	#[serde(default)]
	pub stop_file_name: Option<String>,
	#[serde(default)]
	pub on_fail_email: Option<String>,
	#[serde(default, alias = "cutofftime")]
	pub cut_off_time: Option<u32>,
	#[serde(default)]
	pub schema_probe_program: Option<String>,
	#[serde(default)]
	pub probe_timeout_secs: Option<u64>,
	#[serde(default)]
	pub notify_program: Option<String>,
	#[serde(default)]
	pub load_steps: Option<u32>,
	#[serde(default)]
	pub load_step_millis: Option<u64>,
}

impl RunConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.stop_file_name.is_some() {
			self.stop_file_name = other.stop_file_name;
		}
		if other.on_fail_email.is_some() {
			self.on_fail_email = other.on_fail_email;
		}
		if other.cut_off_time.is_some() {
			self.cut_off_time = other.cut_off_time;
		}
		if other.schema_probe_program.is_some() {
			self.schema_probe_program = other.schema_probe_program;
		}
		if other.probe_timeout_secs.is_some() {
			self.probe_timeout_secs = other.probe_timeout_secs;
		}
		if other.notify_program.is_some() {
			self.notify_program = other.notify_program;
		}
		if other.load_steps.is_some() {
			self.load_steps = other.load_steps;
		}
		if other.load_step_millis.is_some() {
			self.load_step_millis = other.load_step_millis;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_overwrites_only_present_fields() {
		let mut base = RunConfigLayer {
			stop_file_name: Some("stop.txt".to_string()),
			on_fail_email: Some("old@example.com".to_string()),
			cut_off_time: Some(600),
			..Default::default()
		};
		let overlay = RunConfigLayer {
			on_fail_email: Some("ops@example.com".to_string()),
			load_steps: Some(3),
			..Default::default()
		};
		base.merge(overlay);
		assert_eq!(base.stop_file_name.as_deref(), Some("stop.txt"));
		assert_eq!(base.on_fail_email.as_deref(), Some("ops@example.com"));
		assert_eq!(base.cut_off_time, Some(600));
		assert_eq!(base.load_steps, Some(3));
	}

	#[test]
	fn test_deserialize_document_keys() {
		let json = r#"{"stopFileName":"halt.txt","onFailEmail":"dba@example.com","cutOffTime":530}"#;
		let layer: RunConfigLayer = serde_json::from_str(json).unwrap();
		assert_eq!(layer.stop_file_name.as_deref(), Some("halt.txt"));
		assert_eq!(layer.on_fail_email.as_deref(), Some("dba@example.com"));
		assert_eq!(layer.cut_off_time, Some(530));
	}

	#[test]
	fn test_deserialize_lowercase_cutoff_alias() {
		let layer: RunConfigLayer = serde_json::from_str(r#"{"cutofftime":700}"#).unwrap();
		assert_eq!(layer.cut_off_time, Some(700));
	}

	#[test]
	fn test_deserialize_layer_empty() {
		let layer: RunConfigLayer = toml::from_str("").unwrap();
		assert_eq!(layer, RunConfigLayer::default());
	}
}
