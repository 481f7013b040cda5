// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProbeError;

/// One of the two alternating target schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Schema {
	A,
	B,
}

impl Schema {
	/// The schema that is not `self`; loading always goes to the offline one.
	pub fn opposite(self) -> Self {
		match self {
			Schema::A => Schema::B,
			Schema::B => Schema::A,
		}
	}

	pub fn letter(self) -> char {
		match self {
			Schema::A => 'A',
			Schema::B => 'B',
		}
	}

	/// Parse the prober's output: the last non-whitespace character names the
	/// active schema, case-insensitively. Anything else is a probe failure.
	pub fn from_probe_output(output: &str) -> Result<Self, ProbeError> {
		match output.trim().chars().last() {
			Some('A') | Some('a') => Ok(Schema::A),
			Some('B') | Some('b') => Ok(Schema::B),
			_ => Err(ProbeError::Garbled(output.trim().to_string())),
		}
	}
}

impl fmt::Display for Schema {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.letter())
	}
}

/// Result of probing the live schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSelection {
	pub probe_output: String,
	pub active: Schema,
	pub target: Schema,
}

/// Where the coordinator is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
	Idle,
	Preflight,
	ProbingSchema,
	Loading,
	Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
	Completed,
	AbortedStopFile,
	AbortedAlreadyRunning,
	AbortedProbeFailure,
	AbortedByOperator,
	LoadFailed,
	CutoffExceeded,
}

impl RunStatus {
	pub fn is_aborted(self) -> bool {
		!matches!(self, RunStatus::Completed)
	}

	/// A previous run left its lock behind; nothing will clear it automatically.
	pub fn requires_manual_intervention(self) -> bool {
		matches!(self, RunStatus::AbortedAlreadyRunning)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			RunStatus::Completed => "completed",
			RunStatus::AbortedStopFile => "aborted_stop_file",
			RunStatus::AbortedAlreadyRunning => "aborted_already_running",
			RunStatus::AbortedProbeFailure => "aborted_probe_failure",
			RunStatus::AbortedByOperator => "aborted_by_operator",
			RunStatus::LoadFailed => "load_failed",
			RunStatus::CutoffExceeded => "cutoff_exceeded",
		}
	}
}

impl fmt::Display for RunStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The single result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
	pub run_id: String,
	pub status: RunStatus,
	pub target_schema: Option<Schema>,
	pub detail: Option<String>,
	pub started_at: DateTime<Utc>,
	pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
	pub fn duration_ms(&self) -> i64 {
		(self.finished_at - self.started_at).num_milliseconds()
	}
}
