// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Failure notification seam.
//!
//! Delivery is delegated to an external program (mail(1) by default). The
//! coordinator treats it as fire-and-forget: errors are logged, never raised.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::NotifyError;
use crate::types::RunOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
	pub subject: String,
	pub body: String,
}

impl Notification {
	pub fn for_outcome(control_file: &str, outcome: &RunOutcome) -> Self {
		let subject = if outcome.status.requires_manual_intervention() {
			format!("[auxload] {control_file}: {} (manual intervention required)", outcome.status)
		} else {
			format!("[auxload] {control_file}: {}", outcome.status)
		};

		let mut body = format!(
			"Auxiliary database load for control file {control_file} did not complete.\n\n\
			 Status: {}\nRun: {}\nStarted: {}\nFinished: {}\n",
			outcome.status,
			outcome.run_id,
			outcome.started_at.to_rfc3339(),
			outcome.finished_at.to_rfc3339(),
		);
		if let Some(schema) = outcome.target_schema {
			body.push_str(&format!("Target schema: {schema}\n"));
		}
		if let Some(detail) = &outcome.detail {
			body.push_str(&format!("Detail: {detail}\n"));
		}

		Self { subject, body }
	}
}

#[async_trait]
pub trait Notifier: Send + Sync {
	async fn notify(&self, target: &str, notification: &Notification) -> Result<(), NotifyError>;
}

/// Pipes the body into `<program> -s <subject> <target>`.
pub struct CommandNotifier {
	program: String,
	timeout: Duration,
}

impl CommandNotifier {
	pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
		Self {
			program: program.into(),
			timeout,
		}
	}
}

#[async_trait]
impl Notifier for CommandNotifier {
	async fn notify(&self, target: &str, notification: &Notification) -> Result<(), NotifyError> {
		debug!(program = %self.program, target, "sending failure notification");

		let mut child = Command::new(&self.program)
			.arg("-s")
			.arg(&notification.subject)
			.arg(target)
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| NotifyError::Spawn {
				program: self.program.clone(),
				source: e,
			})?;

		let deliver = async {
			if let Some(mut stdin) = child.stdin.take() {
				stdin.write_all(notification.body.as_bytes()).await?;
				stdin.shutdown().await?;
			}
			child.wait_with_output().await
		};

		let output = tokio::time::timeout(self.timeout, deliver)
			.await
			.map_err(|_| NotifyError::TimedOut(self.timeout))??;

		if !output.status.success() {
			return Err(NotifyError::Failed {
				status: output.status.to_string(),
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			});
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{RunStatus, Schema};
	use chrono::Utc;

	fn outcome(status: RunStatus) -> RunOutcome {
		let now = Utc::now();
		RunOutcome {
			run_id: "run-1".to_string(),
			status,
			target_schema: Some(Schema::B),
			detail: Some("probe said nothing".to_string()),
			started_at: now,
			finished_at: now,
		}
	}

	#[test]
	fn test_notification_for_probe_failure() {
		let n = Notification::for_outcome("daily", &outcome(RunStatus::AbortedProbeFailure));
		assert_eq!(n.subject, "[auxload] daily: aborted_probe_failure");
		assert!(n.body.contains("Run: run-1"));
		assert!(n.body.contains("Target schema: B"));
		assert!(n.body.contains("Detail: probe said nothing"));
	}

	#[test]
	fn test_notification_flags_manual_intervention() {
		let n = Notification::for_outcome("daily", &outcome(RunStatus::AbortedAlreadyRunning));
		assert!(n.subject.contains("manual intervention required"));
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_command_notifier_pipes_body() {
		use std::os::unix::fs::PermissionsExt;

		let dir = tempfile::tempdir().unwrap();
		let sink = dir.path().join("sent");
		let script = dir.path().join("fake-mail");
		std::fs::write(
			&script,
			format!(
				"#!/bin/sh\necho \"$2|$3\" > {sink}\ncat >> {sink}\n",
				sink = sink.display()
			),
		)
		.unwrap();
		std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

		let notifier = CommandNotifier::new(script.display().to_string(), Duration::from_secs(5));
		let notification = Notification {
			subject: "subject line".to_string(),
			body: "body text".to_string(),
		};
		notifier.notify("dba@example.com", &notification).await.unwrap();

		let sent = std::fs::read_to_string(&sink).unwrap();
		assert_eq!(sent, "subject line|dba@example.com\nbody text");
	}

	#[tokio::test]
	async fn test_command_notifier_missing_program() {
		let notifier = CommandNotifier::new("/nonexistent/auxload-mail", Duration::from_secs(1));
		let notification = Notification {
			subject: "s".to_string(),
			body: "b".to_string(),
		};
		assert!(matches!(
			notifier.notify("dba@example.com", &notification).await,
			Err(NotifyError::Spawn { .. })
		));
	}
}
