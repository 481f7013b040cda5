// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Control-plane server lifecycle.
//!
//! The server and the coordinator run concurrently. The server stops on the
//! first shutdown request; the process then waits for the coordinator so a
//! load in progress is never abandoned.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use auxload_server_config::RunConfiguration;
use auxload_server_jobs::{JobCoordinator, RunOutcome, ScopeDirectory};

use crate::api::{create_router, AppState};
use crate::error::{Result, ServerError};
use crate::shutdown::ControlServerHandle;

pub const DEFAULT_LISTEN_ADDR: &str = ":8000";

/// Accepts `host:port` or a bare `:port`, which listens on all interfaces.
pub fn normalize_listen_addr(host: &str) -> Result<String> {
	let host = host.trim();
	let Some((name, port)) = host.rsplit_once(':') else {
		return Err(ServerError::ListenAddress {
			addr: host.to_string(),
			message: "expected host:port or :port".to_string(),
		});
	};

	if port.parse::<u16>().is_err() {
		return Err(ServerError::ListenAddress {
			addr: host.to_string(),
			message: format!("invalid port {port:?}"),
		});
	}

	if name.is_empty() {
		Ok(format!("0.0.0.0:{port}"))
	} else {
		Ok(host.to_string())
	}
}

/// Serve `router` until `handle` is shut down, then drain in-flight requests.
pub async fn serve(listener: TcpListener, router: Router, handle: ControlServerHandle) -> Result<()> {
	axum::serve(listener, router)
		.with_graceful_shutdown(async move { handle.wait().await })
		.await?;
	Ok(())
}

/// A bound control plane that has not started serving yet.
pub struct ControlPlane {
	listener: TcpListener,
	state: AppState,
}

impl ControlPlane {
	pub async fn bind(addr: &str, state: AppState) -> Result<Self> {
		let addr = normalize_listen_addr(addr)?;
		let listener = TcpListener::bind(&addr).await?;
		tracing::info!(addr = %addr, "control plane listening");
		Ok(Self { listener, state })
	}

	pub fn local_addr(&self) -> Result<SocketAddr> {
		Ok(self.listener.local_addr()?)
	}

	pub fn state(&self) -> &AppState {
		&self.state
	}

	/// Coordinator wired to this control plane's stop token, status board and
	/// shutdown handle.
	pub fn coordinator(&self, config: RunConfiguration, scope: ScopeDirectory) -> JobCoordinator {
		JobCoordinator::new(
			config,
			scope,
			Arc::new(self.state.shutdown.clone()),
			self.state.stop.clone(),
			self.state.status.clone(),
		)
	}

	/// Run `coordinator` in the background, serve until shutdown, then wait
	/// for the run to finish.
	pub async fn run_with(self, coordinator: JobCoordinator) -> Result<RunOutcome> {
		let job = tokio::spawn(coordinator.run());

		let handle = self.state.shutdown.clone();
		let served = serve(self.listener, create_router(self.state), handle.clone()).await;
		tracing::info!(reason = ?handle.reason(), "control plane stopped, waiting for job");

		let outcome = job.await.map_err(|e| ServerError::Job(e.to_string()))?;
		served?;
		Ok(outcome)
	}
}
