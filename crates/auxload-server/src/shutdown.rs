// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Idempotent shutdown handle for the control-plane server.

use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc;

use auxload_server_jobs::{CancellationToken, ShutdownReason, ShutdownTrigger};

/// Shared by the HTTP handlers, the signal listener and the coordinator.
///
/// The first [`shutdown`](Self::shutdown) records its reason and starts the
/// graceful drain; every later call is a no-op.
#[derive(Clone, Default)]
pub struct ControlServerHandle {
	inner: Arc<HandleInner>,
}

#[derive(Default)]
struct HandleInner {
	reason: OnceLock<ShutdownReason>,
	drained: CancellationToken,
}

impl ControlServerHandle {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `true` if this call initiated the shutdown.
	pub fn shutdown(&self, reason: ShutdownReason) -> bool {
		if self.inner.reason.set(reason).is_err() {
			tracing::debug!(?reason, "shutdown already in progress");
			return false;
		}
		tracing::info!(?reason, "control plane shutting down");
		self.inner.drained.cancel();
		true
	}

	pub fn is_shutting_down(&self) -> bool {
		self.inner.reason.get().is_some()
	}

	pub fn reason(&self) -> Option<ShutdownReason> {
		self.inner.reason.get().copied()
	}

	/// Resolves once shutdown has been requested.
	pub async fn wait(&self) {
		self.inner.drained.cancelled().await
	}
}

impl ShutdownTrigger for ControlServerHandle {
	fn trigger_shutdown(&self, reason: ShutdownReason) -> bool {
		self.shutdown(reason)
	}
}

/// Exit status used when a repeated signal abandons the run.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Turn Ctrl-C / SIGTERM into an operator stop plus shutdown.
///
/// The first signal drains the control plane and lets a load in progress
/// finish. A second signal exits the process immediately, leaving the
/// running-lock behind for manual intervention.
pub fn spawn_signal_listener(handle: ControlServerHandle, stop: CancellationToken) {
	let (tx, rx) = mpsc::channel(4);

	tokio::spawn(forward_ctrl_c(tx.clone()));
	#[cfg(unix)]
	tokio::spawn(forward_terminate(tx));
	#[cfg(not(unix))]
	drop(tx);

	tokio::spawn(async move {
		if let Some(signal) = relay_signals(rx, handle, stop).await {
			tracing::warn!(
				signal,
				"received second signal, exiting without waiting for the job"
			);
			std::process::exit(FORCED_EXIT_CODE);
		}
	});
}

/// Apply the first signal as stop plus shutdown, then wait for another one.
///
/// Returns the name of the second signal, or `None` once every signal source
/// has gone away.
pub(crate) async fn relay_signals(
	mut signals: mpsc::Receiver<&'static str>,
	handle: ControlServerHandle,
	stop: CancellationToken,
) -> Option<&'static str> {
	let first = signals.recv().await?;
	tracing::info!(signal = first, "received signal, stopping");
	stop.cancel();
	handle.shutdown(ShutdownReason::Signal);

	signals.recv().await
}

async fn forward_ctrl_c(tx: mpsc::Sender<&'static str>) {
	loop {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::warn!(error = %e, "failed to install Ctrl+C handler");
			return;
		}
		if tx.send("Ctrl+C").await.is_err() {
			return;
		}
	}
}

#[cfg(unix)]
async fn forward_terminate(tx: mpsc::Sender<&'static str>) {
	let mut signal = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
		Ok(signal) => signal,
		Err(e) => {
			tracing::warn!(error = %e, "failed to install SIGTERM handler");
			return;
		}
	};
	while signal.recv().await.is_some() {
		if tx.send("SIGTERM").await.is_err() {
			return;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[test]
	fn test_first_trigger_wins() {
		let handle = ControlServerHandle::new();
		assert!(!handle.is_shutting_down());
		assert!(handle.shutdown(ShutdownReason::StopRequested));
		assert!(!handle.shutdown(ShutdownReason::JobFinished));
		assert!(!handle.trigger_shutdown(ShutdownReason::ShutdownRequested));
		assert_eq!(handle.reason(), Some(ShutdownReason::StopRequested));
	}

	#[tokio::test]
	async fn test_wait_resolves_for_every_clone() {
		let handle = ControlServerHandle::new();
		let a = handle.clone();
		let b = handle.clone();
		let waiters = tokio::spawn(async move {
			tokio::join!(a.wait(), b.wait());
		});

		handle.shutdown(ShutdownReason::JobFinished);
		tokio::time::timeout(Duration::from_secs(1), waiters)
			.await
			.expect("waiters should wake")
			.unwrap();
	}

	#[tokio::test]
	async fn test_concurrent_triggers_pick_one_reason() {
		let handle = ControlServerHandle::new();
		let mut tasks = Vec::new();
		for reason in [
			ShutdownReason::JobFinished,
			ShutdownReason::StopRequested,
			ShutdownReason::ShutdownRequested,
			ShutdownReason::Signal,
		] {
			let handle = handle.clone();
			tasks.push(tokio::spawn(async move { handle.shutdown(reason) }));
		}

		let mut winners = 0;
		for task in tasks {
			if task.await.unwrap() {
				winners += 1;
			}
		}
		assert_eq!(winners, 1);
		assert!(handle.reason().is_some());
	}

	#[tokio::test]
	async fn test_first_signal_drains_and_second_is_reported() {
		let handle = ControlServerHandle::new();
		let stop = CancellationToken::new();
		let (tx, rx) = mpsc::channel(4);
		let relay = tokio::spawn(relay_signals(rx, handle.clone(), stop.clone()));

		tx.send("SIGTERM").await.unwrap();
		tokio::time::timeout(Duration::from_secs(1), handle.wait())
			.await
			.expect("first signal should start shutdown");
		assert!(stop.is_cancelled());
		assert_eq!(handle.reason(), Some(ShutdownReason::Signal));
		assert!(!relay.is_finished());

		tx.send("Ctrl+C").await.unwrap();
		let second = tokio::time::timeout(Duration::from_secs(1), relay)
			.await
			.expect("second signal should end the relay")
			.unwrap();
		assert_eq!(second, Some("Ctrl+C"));
	}

	#[tokio::test]
	async fn test_signal_after_job_finished_keeps_job_reason() {
		let handle = ControlServerHandle::new();
		let stop = CancellationToken::new();
		handle.shutdown(ShutdownReason::JobFinished);

		let (tx, rx) = mpsc::channel(4);
		let relay = tokio::spawn(relay_signals(rx, handle.clone(), stop.clone()));
		tx.send("Ctrl+C").await.unwrap();
		drop(tx);

		let second = tokio::time::timeout(Duration::from_secs(1), relay)
			.await
			.expect("relay should end when the sources close")
			.unwrap();
		assert_eq!(second, None);
		assert!(stop.is_cancelled());
		assert_eq!(handle.reason(), Some(ShutdownReason::JobFinished));
	}

	#[tokio::test]
	async fn test_closed_signal_sources_never_force_exit() {
		let (tx, rx) = mpsc::channel::<&'static str>(1);
		drop(tx);
		let second = relay_signals(rx, ControlServerHandle::new(), CancellationToken::new()).await;
		assert_eq!(second, None);
	}
}
