// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// One-way, idempotent cancellation flag that can also be awaited.
///
/// Used for the operator stop signal, for cancelling the load at the cutoff,
/// and inside the control-plane shutdown handle.
#[derive(Clone)]
pub struct CancellationToken {
	inner: Arc<TokenInner>,
}

struct TokenInner {
	cancelled: AtomicBool,
	notify: Notify,
}

impl CancellationToken {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(TokenInner {
				cancelled: AtomicBool::new(false),
				notify: Notify::new(),
			}),
		}
	}

	/// Returns `true` only for the call that actually flipped the flag.
	pub fn cancel(&self) -> bool {
		if self.inner.cancelled.swap(true, Ordering::SeqCst) {
			return false;
		}
		self.inner.notify.notify_waiters();
		true
	}

	pub fn is_cancelled(&self) -> bool {
		self.inner.cancelled.load(Ordering::SeqCst)
	}

	/// Resolves once [`cancel`](Self::cancel) has been called, immediately if
	/// it already was.
	pub async fn cancelled(&self) {
		loop {
			// Register before checking the flag so a concurrent cancel cannot slip between.
			let notified = self.inner.notify.notified();
			if self.is_cancelled() {
				return;
			}
			notified.await;
		}
	}
}

impl Default for CancellationToken {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for CancellationToken {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CancellationToken")
			.field("cancelled", &self.is_cancelled())
			.finish()
	}
}

/// Why the control plane is going down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownReason {
	JobFinished,
	StopRequested,
	ShutdownRequested,
	Signal,
}

/// Non-owning view of the control-plane server used by the coordinator.
///
/// Implementations must be idempotent: only the first trigger has an effect
/// and it reports `true`, every later one is a no-op returning `false`.
pub trait ShutdownTrigger: Send + Sync {
	fn trigger_shutdown(&self, reason: ShutdownReason) -> bool;
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[test]
	fn test_cancel_is_one_shot() {
		let token = CancellationToken::new();
		assert!(!token.is_cancelled());
		assert!(token.cancel());
		assert!(!token.cancel());
		assert!(token.is_cancelled());
	}

	#[test]
	fn test_clones_share_state() {
		let token = CancellationToken::new();
		let clone = token.clone();
		clone.cancel();
		assert!(token.is_cancelled());
	}

	#[tokio::test]
	async fn test_cancelled_resolves_after_cancel() {
		let token = CancellationToken::new();
		let waiter = {
			let token = token.clone();
			tokio::spawn(async move { token.cancelled().await })
		};

		tokio::time::sleep(Duration::from_millis(10)).await;
		token.cancel();

		tokio::time::timeout(Duration::from_secs(1), waiter)
			.await
			.expect("waiter should wake")
			.unwrap();
	}

	#[tokio::test]
	async fn test_cancelled_resolves_immediately_when_already_cancelled() {
		let token = CancellationToken::new();
		token.cancel();
		tokio::time::timeout(Duration::from_millis(100), token.cancelled())
			.await
			.expect("already cancelled token should not block");
	}
}
