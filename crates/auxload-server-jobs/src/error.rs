// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the job coordinator.
//!
//! None of these escape [`crate::JobCoordinator::run`]; each one is folded
//! into a [`crate::RunOutcome`].

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The schema prober could not tell us which schema is live.
#[derive(Debug, Error)]
pub enum ProbeError {
	#[error("schema probe {program} could not be started: {source}")]
	Unreachable {
		program: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("schema probe exited with {status}: {stderr}")]
	NonZeroExit { status: String, stderr: String },

	#[error("schema probe did not answer within {0:?}")]
	TimedOut(Duration),

	#[error("schema probe output {0:?} does not name schema A or B")]
	Garbled(String),
}

/// The load phase did not complete.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("load cancelled")]
	Cancelled,

	#[error("load failed: {0}")]
	Failed(String),
}

/// The failure notification could not be delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
	#[error("notifier {program} could not be started: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("notifier exited with {status}: {stderr}")]
	Failed { status: String, stderr: String },

	#[error("notifier io error: {0}")]
	Io(#[from] std::io::Error),

	#[error("notifier did not finish within {0:?}")]
	TimedOut(Duration),
}

/// The running-lock marker could not be taken.
#[derive(Debug, Error)]
pub enum LockError {
	#[error("running-lock {0} already exists")]
	AlreadyHeld(PathBuf),

	#[error("failed to create running-lock {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}
