// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Operator control handlers. Both are safe to call any number of times.

use axum::extract::State;

use auxload_server_jobs::{Phase, ShutdownReason};

use crate::api::AppState;

/// GET /stop - Abort a run that has not started loading and shut down.
///
/// A load already in progress is not interrupted.
pub async fn stop(State(state): State<AppState>) -> String {
	let phase = state.status.snapshot().phase;
	let first = state.stop.cancel();
	state.shutdown.shutdown(ShutdownReason::StopRequested);

	tracing::info!(?phase, first, "stop requested via control plane");

	match phase {
		Phase::Finished => "Job already finished".to_string(),
		Phase::Loading => "Stop requested; load in progress will finish".to_string(),
		_ if first => "Stop requested".to_string(),
		_ => "Stop already requested".to_string(),
	}
}

/// GET /shutdown - Shut the control plane down regardless of job state.
pub async fn shutdown(State(state): State<AppState>) -> &'static str {
	state.shutdown.shutdown(ShutdownReason::ShutdownRequested);
	"Bye!"
}
