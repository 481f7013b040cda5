// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Load phase seam.

use std::time::Duration;

use async_trait::async_trait;
use auxload_server_config::LoadStubConfig;
use serde::Serialize;
use tracing::debug;

use crate::context::CancellationToken;
use crate::error::LoadError;
use crate::status::StatusBoard;
use crate::types::Schema;

pub struct LoadContext {
	pub run_id: String,
	pub control_file: String,
	pub target: Schema,
	pub cancellation_token: CancellationToken,
	pub status: StatusBoard,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
	pub message: String,
	pub steps_completed: u32,
}

/// Bulk transfer into the offline schema.
///
/// Implementations should return [`LoadError::Cancelled`] promptly once the
/// context's token is cancelled.
#[async_trait]
pub trait Loader: Send + Sync {
	async fn load(&self, ctx: &LoadContext) -> Result<LoadReport, LoadError>;
}

/// Placeholder transfer: a fixed number of timed steps with progress
/// reporting and cancellation between steps.
pub struct StagedLoader {
	steps: u32,
	step: Duration,
}

impl StagedLoader {
	pub fn new(config: LoadStubConfig) -> Self {
		Self {
			steps: config.steps,
			step: config.step,
		}
	}
}

#[async_trait]
impl Loader for StagedLoader {
	async fn load(&self, ctx: &LoadContext) -> Result<LoadReport, LoadError> {
		ctx.status.report_progress(0, self.steps);

		for step in 1..=self.steps {
			tokio::select! {
				_ = tokio::time::sleep(self.step) => {}
				_ = ctx.cancellation_token.cancelled() => return Err(LoadError::Cancelled),
			}
			ctx.status.report_progress(step, self.steps);
			debug!(run_id = %ctx.run_id, step, total = self.steps, schema = %ctx.target, "load step done");
		}

		Ok(LoadReport {
			message: format!("loaded {} into schema {}", ctx.control_file, ctx.target),
			steps_completed: self.steps,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::status::LoadProgress;

	fn context() -> LoadContext {
		LoadContext {
			run_id: "run-1".to_string(),
			control_file: "daily".to_string(),
			target: Schema::B,
			cancellation_token: CancellationToken::new(),
			status: StatusBoard::new("daily"),
		}
	}

	#[tokio::test]
	async fn test_staged_load_reports_progress() {
		let loader = StagedLoader::new(LoadStubConfig {
			steps: 3,
			step: Duration::from_millis(1),
		});
		let ctx = context();

		let report = loader.load(&ctx).await.unwrap();
		assert_eq!(report.steps_completed, 3);
		assert_eq!(report.message, "loaded daily into schema B");
		assert_eq!(
			ctx.status.snapshot().progress,
			Some(LoadProgress {
				completed_steps: 3,
				total_steps: 3
			})
		);
	}

	#[tokio::test]
	async fn test_staged_load_stops_when_cancelled() {
		let loader = StagedLoader::new(LoadStubConfig {
			steps: 100,
			step: Duration::from_secs(10),
		});
		let ctx = context();
		ctx.cancellation_token.cancel();

		let result = tokio::time::timeout(Duration::from_secs(1), loader.load(&ctx))
			.await
			.expect("cancelled load should return promptly");
		assert!(matches!(result, Err(LoadError::Cancelled)));
	}
}
