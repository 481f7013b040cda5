// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::types::{Phase, RunOutcome, RunStatus, Schema};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct LoadProgress {
	pub completed_steps: u32,
	pub total_steps: u32,
}

/// Best-effort view of the run, served by `/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
	pub run_id: Option<String>,
	pub control_file: String,
	pub phase: Phase,
	pub active_schema: Option<Schema>,
	pub target_schema: Option<Schema>,
	pub started_at: Option<DateTime<Utc>>,
	pub deadline: Option<DateTime<Utc>>,
	pub progress: Option<LoadProgress>,
	pub outcome: Option<RunStatus>,
	pub detail: Option<String>,
	pub finished_at: Option<DateTime<Utc>>,
}

impl RunSnapshot {
	fn idle(control_file: &str) -> Self {
		Self {
			run_id: None,
			control_file: control_file.to_string(),
			phase: Phase::Idle,
			active_schema: None,
			target_schema: None,
			started_at: None,
			deadline: None,
			progress: None,
			outcome: None,
			detail: None,
			finished_at: None,
		}
	}
}

/// Single-writer status channel. The coordinator publishes, HTTP handlers
/// read the latest value without waiting on the run.
#[derive(Clone)]
pub struct StatusBoard {
	tx: Arc<watch::Sender<RunSnapshot>>,
}

impl StatusBoard {
	pub fn new(control_file: &str) -> Self {
		let (tx, _) = watch::channel(RunSnapshot::idle(control_file));
		Self { tx: Arc::new(tx) }
	}

	pub fn snapshot(&self) -> RunSnapshot {
		self.tx.borrow().clone()
	}

	pub fn report_progress(&self, completed_steps: u32, total_steps: u32) {
		self.update(|s| {
			s.progress = Some(LoadProgress {
				completed_steps,
				total_steps,
			})
		});
	}

	pub(crate) fn update(&self, f: impl FnOnce(&mut RunSnapshot)) {
		self.tx.send_modify(f);
	}

	pub(crate) fn enter_phase(&self, phase: Phase) {
		self.update(|s| s.phase = phase);
	}

	pub(crate) fn record_outcome(&self, outcome: &RunOutcome) {
		self.update(|s| {
			s.phase = Phase::Finished;
			s.outcome = Some(outcome.status);
			s.target_schema = outcome.target_schema;
			s.detail = outcome.detail.clone();
			s.finished_at = Some(outcome.finished_at);
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_new_board_is_idle() {
		let board = StatusBoard::new("daily");
		let snapshot = board.snapshot();
		assert_eq!(snapshot.phase, Phase::Idle);
		assert_eq!(snapshot.control_file, "daily");
		assert!(snapshot.outcome.is_none());
	}

	#[test]
	fn test_progress_visible_to_readers() {
		let board = StatusBoard::new("daily");
		let reader = board.clone();
		board.enter_phase(Phase::Loading);
		board.report_progress(3, 10);

		let snapshot = reader.snapshot();
		assert_eq!(snapshot.phase, Phase::Loading);
		assert_eq!(
			snapshot.progress,
			Some(LoadProgress {
				completed_steps: 3,
				total_steps: 10
			})
		);
	}

	#[test]
	fn test_snapshot_serializes() {
		let board = StatusBoard::new("daily");
		board.enter_phase(Phase::ProbingSchema);
		let json = serde_json::to_value(board.snapshot()).unwrap();
		assert_eq!(json["phase"], "probing_schema");
		assert_eq!(json["control_file"], "daily");
		assert!(json["outcome"].is_null());
	}
}
