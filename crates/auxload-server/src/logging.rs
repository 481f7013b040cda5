// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Logging setup.
//!
//! Every event goes to stdout and is appended to `auxload.log` in the scope
//! directory. The log file is never truncated or rotated; a run's history
//! accumulates there across invocations. `RUST_LOG` overrides the default
//! `info` filter.

use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Result, ServerError};

pub const LOG_FILE_NAME: &str = "auxload.log";

/// Keep alive for the life of the process. Dropping it flushes the file writer.
pub struct LoggingGuard {
	_file_guard: WorkerGuard,
}

pub fn init_logging(scope: &Path) -> Result<LoggingGuard> {
	// Fail early with a clear error if the log cannot be opened for append.
	OpenOptions::new()
		.create(true)
		.append(true)
		.open(scope.join(LOG_FILE_NAME))?;

	let file_appender = tracing_appender::rolling::never(scope, LOG_FILE_NAME);
	let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(file_writer)
				.with_ansi(false),
		)
		.try_init()
		.map_err(|e| ServerError::Logging(e.to_string()))?;

	Ok(LoggingGuard {
		_file_guard: file_guard,
	})
}
