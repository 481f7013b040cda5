// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP control plane for the auxiliary database load.
//!
//! Exposes liveness, run status, and the two operator controls (`/stop`,
//! `/shutdown`) while a single [`JobCoordinator`](auxload_server_jobs::JobCoordinator)
//! run executes in the background.

pub mod api;
pub mod error;
pub mod logging;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use api::{create_router, AppState};
pub use error::{Result, ServerError};
pub use logging::{init_logging, LoggingGuard, LOG_FILE_NAME};
pub use server::{normalize_listen_addr, serve, ControlPlane, DEFAULT_LISTEN_ADDR};
pub use shutdown::{spawn_signal_listener, ControlServerHandle};
