// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

use auxload_server_config::ConfigError;

#[derive(Debug, Error)]
pub enum ServerError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("invalid listen address {addr}: {message}")]
	ListenAddress { addr: String, message: String },

	#[error("logging setup failed: {0}")]
	Logging(String),

	#[error("job task failed: {0}")]
	Job(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
