// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema prober seam.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::ProbeError;
use crate::markers::ScopeDirectory;

/// Reports which schema is currently live. Returns the raw identifier; the
/// coordinator does the parsing.
#[async_trait]
pub trait SchemaProber: Send + Sync {
	async fn probe(&self) -> Result<String, ProbeError>;
}

/// Runs an external executable from the scope directory with no arguments
/// and takes its standard output as the schema identifier.
pub struct CommandProber {
	program: PathBuf,
	working_dir: PathBuf,
	timeout: Duration,
}

impl CommandProber {
	pub fn new(scope: &ScopeDirectory, program: &str, timeout: Duration) -> Self {
		Self {
			program: scope.join(program),
			working_dir: scope.path().to_path_buf(),
			timeout,
		}
	}
}

#[async_trait]
impl SchemaProber for CommandProber {
	async fn probe(&self) -> Result<String, ProbeError> {
		debug!(program = %self.program.display(), "running schema probe");

		let child = Command::new(&self.program)
			.current_dir(&self.working_dir)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| ProbeError::Unreachable {
				program: self.program.clone(),
				source: e,
			})?;

		let output = tokio::time::timeout(self.timeout, child.wait_with_output())
			.await
			.map_err(|_| ProbeError::TimedOut(self.timeout))?
			.map_err(|e| ProbeError::Unreachable {
				program: self.program.clone(),
				source: e,
			})?;

		if !output.status.success() {
			return Err(ProbeError::NonZeroExit {
				status: output.status.to_string(),
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			});
		}

		let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
		debug!(output = %stdout, "schema probe answered");
		Ok(stdout)
	}
}
