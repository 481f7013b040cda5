// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::{CancellationToken, ShutdownReason, ShutdownTrigger};
use crate::error::{LoadError, LockError};
use crate::load::{LoadContext, Loader, StagedLoader};
use crate::markers::{marker_exists, RunningLock, ScopeDirectory};
use crate::notify::{CommandNotifier, Notification, Notifier};
use crate::probe::{CommandProber, SchemaProber};
use crate::status::StatusBoard;
use crate::types::{Phase, RunOutcome, RunStatus, Schema, SchemaSelection};
use auxload_server_config::RunConfiguration;
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Verdict of the pre-flight checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preflight {
	Proceed,
	Abort(RunStatus),
}

/// Stop-file first, then the running-lock. Neither check has side effects.
pub fn evaluate_preflight(config: &RunConfiguration, scope: &ScopeDirectory) -> Preflight {
	let stop_file = scope.join(&config.stop_file_name);
	if marker_exists(&stop_file) {
		warn!(path = %stop_file.display(), "stop file found, stopping process");
		return Preflight::Abort(RunStatus::AbortedStopFile);
	}

	let lock_file = scope.join(config.lock_file_name());
	if marker_exists(&lock_file) {
		error!(
			path = %lock_file.display(),
			"running-lock found: aux database load was already running when it tried to start, manual intervention needed"
		);
		return Preflight::Abort(RunStatus::AbortedAlreadyRunning);
	}

	Preflight::Proceed
}

/// Ask the prober which schema is live and pick the other one.
pub async fn select_target_schema(
	prober: &dyn SchemaProber,
) -> Result<SchemaSelection, crate::error::ProbeError> {
	let output = prober.probe().await?;
	let active = Schema::from_probe_output(&output)?;
	let selection = SchemaSelection {
		probe_output: output.trim().to_string(),
		active,
		target: active.opposite(),
	};
	info!(
		current = %selection.probe_output,
		active = %selection.active,
		target = %selection.target,
		"selected offline schema"
	);
	Ok(selection)
}

/// Status plus context collected while a run unwinds.
struct Verdict {
	status: RunStatus,
	target_schema: Option<Schema>,
	detail: Option<String>,
}

impl Verdict {
	fn new(status: RunStatus) -> Self {
		Self {
			status,
			target_schema: None,
			detail: None,
		}
	}

	fn with_target(mut self, target: Schema) -> Self {
		self.target_schema = Some(target);
		self
	}

	fn with_detail(mut self, detail: impl Into<String>) -> Self {
		self.detail = Some(detail.into());
		self
	}
}

/// Runs exactly one load: pre-flight, schema selection, load, finalize.
///
/// `run` consumes the coordinator, so a process produces at most one
/// [`RunOutcome`].
pub struct JobCoordinator {
	config: RunConfiguration,
	scope: ScopeDirectory,
	prober: Arc<dyn SchemaProber>,
	loader: Arc<dyn Loader>,
	notifier: Arc<dyn Notifier>,
	shutdown: Arc<dyn ShutdownTrigger>,
	stop: CancellationToken,
	status: StatusBoard,
}

impl JobCoordinator {
	/// Build a coordinator wired to the external prober, the staged loader
	/// and the command notifier described by `config`.
	pub fn new(
		config: RunConfiguration,
		scope: ScopeDirectory,
		shutdown: Arc<dyn ShutdownTrigger>,
		stop: CancellationToken,
		status: StatusBoard,
	) -> Self {
		let prober = Arc::new(CommandProber::new(
			&scope,
			&config.schema_probe_program,
			config.probe_timeout,
		));
		let loader = Arc::new(StagedLoader::new(config.load));
		let notifier = Arc::new(CommandNotifier::new(
			config.notify_program.clone(),
			NOTIFY_TIMEOUT,
		));

		Self {
			config,
			scope,
			prober,
			loader,
			notifier,
			shutdown,
			stop,
			status,
		}
	}

	pub fn with_prober(mut self, prober: Arc<dyn SchemaProber>) -> Self {
		self.prober = prober;
		self
	}

	pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
		self.loader = loader;
		self
	}

	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;
		self
	}

	#[instrument(skip(self), fields(control_file = %self.config.control_file_id))]
	pub async fn run(self) -> RunOutcome {
		let run_id = uuid::Uuid::new_v4().to_string();
		let started_at = Utc::now();
		let deadline = self
			.config
			.cutoff_time
			.map(|cutoff| cutoff.deadline_after(&Local::now()).with_timezone(&Utc));

		self.status.update(|s| {
			s.run_id = Some(run_id.clone());
			s.started_at = Some(started_at);
			s.deadline = deadline;
		});
		info!(run_id = %run_id, config = %self.config, deadline = ?deadline, "starting run");

		let verdict = self.execute(&run_id, deadline).await;

		let outcome = RunOutcome {
			run_id,
			status: verdict.status,
			target_schema: verdict.target_schema,
			detail: verdict.detail,
			started_at,
			finished_at: Utc::now(),
		};
		self.finalize(&outcome).await;
		outcome
	}

	async fn execute(&self, run_id: &str, deadline: Option<DateTime<Utc>>) -> Verdict {
		if let Some(verdict) = self.check_stop_requested("before preflight") {
			return verdict;
		}

		self.status.enter_phase(Phase::Preflight);
		if let Preflight::Abort(status) = evaluate_preflight(&self.config, &self.scope) {
			return Verdict::new(status);
		}

		let lock = match RunningLock::acquire(self.scope.join(self.config.lock_file_name()), run_id) {
			Ok(lock) => lock,
			Err(LockError::AlreadyHeld(path)) => {
				error!(path = %path.display(), "another run took the running-lock first, manual intervention needed");
				return Verdict::new(RunStatus::AbortedAlreadyRunning)
					.with_detail(format!("{} appeared during preflight", path.display()));
			}
			Err(e) => {
				error!(error = %e, "could not create running-lock");
				return Verdict::new(RunStatus::LoadFailed).with_detail(e.to_string());
			}
		};

		if let Some(verdict) = self.check_stop_requested("before schema probe") {
			return verdict;
		}

		self.status.enter_phase(Phase::ProbingSchema);
		let selection = match select_target_schema(self.prober.as_ref()).await {
			Ok(selection) => selection,
			Err(e) => {
				error!(error = %e, "error trying to get current schema, refusing to guess the offline schema");
				return Verdict::new(RunStatus::AbortedProbeFailure).with_detail(e.to_string());
			}
		};
		self.status.update(|s| {
			s.active_schema = Some(selection.active);
			s.target_schema = Some(selection.target);
		});

		if let Some(verdict) = self.check_stop_requested("before load") {
			return verdict.with_target(selection.target);
		}

		let verdict = self.run_load(run_id, selection.target, deadline).await;
		drop(lock);
		verdict
	}

	fn check_stop_requested(&self, checkpoint: &str) -> Option<Verdict> {
		if !self.stop.is_cancelled() {
			return None;
		}
		warn!(checkpoint, "stop requested by operator, not proceeding");
		Some(Verdict::new(RunStatus::AbortedByOperator).with_detail(format!("stop requested {checkpoint}")))
	}

	#[instrument(skip(self, deadline), fields(schema = %target))]
	async fn run_load(&self, run_id: &str, target: Schema, deadline: Option<DateTime<Utc>>) -> Verdict {
		self.status.enter_phase(Phase::Loading);
		info!(run_id, "we will load to schema {target}");

		let ctx = LoadContext {
			run_id: run_id.to_string(),
			control_file: self.config.control_file_id.clone(),
			target,
			cancellation_token: CancellationToken::new(),
			status: self.status.clone(),
		};

		let result = match deadline {
			Some(deadline) => {
				let remaining = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
				match tokio::time::timeout(remaining, self.loader.load(&ctx)).await {
					Ok(result) => result,
					Err(_) => {
						ctx.cancellation_token.cancel();
						error!(deadline = %deadline, "cutoff reached before the load finished");
						return Verdict::new(RunStatus::CutoffExceeded)
							.with_target(target)
							.with_detail(format!("load still running at cutoff {}", deadline.to_rfc3339()));
					}
				}
			}
			None => self.loader.load(&ctx).await,
		};

		match result {
			Ok(report) => {
				info!(steps = report.steps_completed, "{}", report.message);
				Verdict::new(RunStatus::Completed).with_target(target)
			}
			Err(LoadError::Cancelled) => {
				Verdict::new(RunStatus::LoadFailed)
					.with_target(target)
					.with_detail("load cancelled")
			}
			Err(LoadError::Failed(message)) => {
				error!(error = %message, "load failed");
				Verdict::new(RunStatus::LoadFailed)
					.with_target(target)
					.with_detail(message)
			}
		}
	}

	async fn finalize(&self, outcome: &RunOutcome) {
		if self.shutdown.trigger_shutdown(ShutdownReason::JobFinished) {
			info!("control plane shutdown triggered by job completion");
		}
		self.status.record_outcome(outcome);

		if outcome.status.is_aborted() {
			warn!(
				run_id = %outcome.run_id,
				status = %outcome.status,
				target_schema = ?outcome.target_schema,
				detail = ?outcome.detail,
				duration_ms = outcome.duration_ms(),
				"run aborted"
			);
			self.notify_failure(outcome).await;
		} else {
			info!(
				run_id = %outcome.run_id,
				status = %outcome.status,
				target_schema = ?outcome.target_schema,
				duration_ms = outcome.duration_ms(),
				"run completed"
			);
		}
	}

	async fn notify_failure(&self, outcome: &RunOutcome) {
		let notification = Notification::for_outcome(&self.config.control_file_id, outcome);
		let Some(target) = self.config.on_fail_notify_target.as_deref() else {
			warn!(subject = %notification.subject, "no failure notification target configured, not sending");
			return;
		};

		match tokio::time::timeout(NOTIFY_TIMEOUT, self.notifier.notify(target, &notification)).await {
			Ok(Ok(())) => info!(target, "failure notification sent"),
			Ok(Err(e)) => warn!(target, error = %e, "failure notification could not be sent"),
			Err(_) => warn!(target, "failure notification timed out"),
		}
	}
}
