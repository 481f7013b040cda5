// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application state and router for the control plane.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use auxload_server_jobs::{CancellationToken, StatusBoard};

use crate::routes;
use crate::shutdown::ControlServerHandle;

/// State shared by every handler.
///
/// Handlers only read `status` and only ever signal through `stop` and
/// `shutdown`; the run itself belongs to the coordinator.
#[derive(Clone)]
pub struct AppState {
	pub status: StatusBoard,
	pub stop: CancellationToken,
	pub shutdown: ControlServerHandle,
}

impl AppState {
	pub fn new(control_file: &str) -> Self {
		Self {
			status: StatusBoard::new(control_file),
			stop: CancellationToken::new(),
			shutdown: ControlServerHandle::new(),
		}
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/", get(routes::health::liveness))
		.route("/stats", get(routes::stats::run_stats))
		.route("/stop", get(routes::control::stop))
		.route("/shutdown", get(routes::control::shutdown))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
