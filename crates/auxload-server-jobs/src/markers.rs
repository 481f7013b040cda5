// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lock and signal files under the scope directory.
//!
//! - `<scope>/<stopFileName>`: operator kill-switch, presence aborts the run.
//! - `<scope>/<controlFileID>.running`: mutual exclusion between invocations.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::LockError;

/// The working directory every marker, the prober and the log live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeDirectory(PathBuf);

impl ScopeDirectory {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self(path.into())
	}

	pub fn path(&self) -> &Path {
		&self.0
	}

	pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
		self.0.join(name)
	}
}

/// Whether a marker file is present.
///
/// A stat failure other than "not found" counts as present: when in doubt
/// the run does not proceed.
pub fn marker_exists(path: &Path) -> bool {
	match path.try_exists() {
		Ok(exists) => exists,
		Err(e) => {
			warn!(path = %path.display(), error = %e, "could not stat marker, treating as present");
			true
		}
	}
}

/// Held `<controlFileID>.running` marker, removed on drop.
#[derive(Debug)]
pub struct RunningLock {
	path: PathBuf,
}

impl RunningLock {
	/// Atomically create the marker. Fails with [`LockError::AlreadyHeld`] if
	/// any other run created it first.
	pub fn acquire(path: PathBuf, run_id: &str) -> Result<Self, LockError> {
		let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
			Ok(file) => file,
			Err(e) if e.kind() == ErrorKind::AlreadyExists => {
				return Err(LockError::AlreadyHeld(path));
			}
			Err(e) => return Err(LockError::Io { path, source: e }),
		};

		let contents = format!(
			"pid={}\nrun_id={}\nstarted_at={}\n",
			std::process::id(),
			run_id,
			Utc::now().to_rfc3339()
		);
		if let Err(e) = file.write_all(contents.as_bytes()) {
			// The marker itself is what matters; its contents are informational.
			warn!(path = %path.display(), error = %e, "failed to write running-lock details");
		}

		debug!(path = %path.display(), "running-lock acquired");
		Ok(Self { path })
	}
}

impl Drop for RunningLock {
	fn drop(&mut self) {
		match std::fs::remove_file(&self.path) {
			Ok(()) => debug!(path = %self.path.display(), "running-lock released"),
			Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove running-lock"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_marker_exists() {
		let dir = tempdir().unwrap();
		let scope = ScopeDirectory::new(dir.path());
		let stop = scope.join("stop.txt");
		assert!(!marker_exists(&stop));
		std::fs::write(&stop, "").unwrap();
		assert!(marker_exists(&stop));
	}

	#[test]
	fn test_lock_acquire_and_release() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("daily.running");

		let lock = RunningLock::acquire(path.clone(), "run-1").unwrap();
		assert!(path.exists());
		let contents = std::fs::read_to_string(&path).unwrap();
		assert!(contents.contains("run_id=run-1"));

		drop(lock);
		assert!(!path.exists());
	}

	#[test]
	fn test_lock_is_exclusive() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("daily.running");

		let _held = RunningLock::acquire(path.clone(), "run-1").unwrap();
		let err = RunningLock::acquire(path.clone(), "run-2").unwrap_err();
		assert!(matches!(err, LockError::AlreadyHeld(_)));
		assert!(std::fs::read_to_string(&path).unwrap().contains("run-1"));
	}

	#[test]
	fn test_foreign_lock_is_left_alone() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("daily.running");
		std::fs::write(&path, "left by a crashed run").unwrap();

		assert!(RunningLock::acquire(path.clone(), "run-2").is_err());
		assert_eq!(
			std::fs::read_to_string(&path).unwrap(),
			"left by a crashed run"
		);
	}

	#[test]
	fn test_lock_in_missing_directory_is_io_error() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("missing").join("daily.running");
		assert!(matches!(
			RunningLock::acquire(path, "run-1"),
			Err(LockError::Io { .. })
		));
	}
}
