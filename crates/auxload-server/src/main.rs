// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Auxiliary database load binary.

use std::path::PathBuf;

use clap::Parser;

use auxload_server::{init_logging, spawn_signal_listener, AppState, ControlPlane, DEFAULT_LISTEN_ADDR};
use auxload_server_config::CONFIG_FILE_NAME;
use auxload_server_jobs::ScopeDirectory;

/// Run one auxiliary database load behind an HTTP control plane.
#[derive(Parser, Debug)]
#[command(name = "auxload", about = "Auxiliary database load job", version)]
struct Args {
	/// Control file to load; also names the `<ctl>.running` lock.
	#[arg(long = "ctl", env = "AUXLOAD_CTL")]
	ctl: String,

	/// Control-plane listen address (`host:port` or `:port`).
	#[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
	host: String,

	/// Directory holding the config, markers, prober and log.
	/// Defaults to the directory of the executable.
	#[arg(long)]
	scope_dir: Option<PathBuf>,

	/// Configuration document, relative to the scope directory unless absolute.
	#[arg(long, default_value = CONFIG_FILE_NAME)]
	config: PathBuf,
}

fn executable_dir() -> std::io::Result<PathBuf> {
	let exe = std::env::current_exe()?;
	exe.parent().map(|p| p.to_path_buf()).ok_or_else(|| {
		std::io::Error::new(
			std::io::ErrorKind::NotFound,
			format!("{} has no parent directory", exe.display()),
		)
	})
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	let scope = ScopeDirectory::new(match args.scope_dir {
		Some(dir) => dir,
		None => executable_dir()?,
	});

	let _logging = init_logging(scope.path())?;

	let config_path = scope.join(&args.config);
	let config = match auxload_server_config::load_config(&config_path, &args.ctl) {
		Ok(config) => config,
		Err(e) => {
			tracing::error!(path = %config_path.display(), error = %e, "failed to load configuration");
			return Err(e.into());
		}
	};

	tracing::info!(
		control_file = %args.ctl,
		scope = %scope.path().display(),
		host = %args.host,
		config = %config,
		"starting auxload"
	);

	let state = AppState::new(&config.control_file_id);
	let plane = ControlPlane::bind(&args.host, state).await?;
	spawn_signal_listener(plane.state().shutdown.clone(), plane.state().stop.clone());

	let coordinator = plane.coordinator(config, scope);
	let outcome = plane.run_with(coordinator).await?;

	tracing::info!(
		run_id = %outcome.run_id,
		status = %outcome.status,
		duration_ms = outcome.duration_ms(),
		"Finished"
	);
	Ok(())
}
