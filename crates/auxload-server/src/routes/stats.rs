// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Run status snapshot handler.

use axum::{extract::State, Json};
use serde::Serialize;

use auxload_server_jobs::{RunSnapshot, ShutdownReason};

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
	#[serde(flatten)]
	pub run: RunSnapshot,
	pub stop_requested: bool,
	pub shutting_down: bool,
	pub shutdown_reason: Option<ShutdownReason>,
}

/// GET /stats - Latest published run snapshot.
///
/// Never waits on the coordinator: whatever was last published is returned,
/// which may lag the run by one step.
pub async fn run_stats(State(state): State<AppState>) -> Json<StatsResponse> {
	Json(StatsResponse {
		run: state.status.snapshot(),
		stop_requested: state.stop.is_cancelled(),
		shutting_down: state.shutdown.is_shutting_down(),
		shutdown_reason: state.shutdown.reason(),
	})
}
