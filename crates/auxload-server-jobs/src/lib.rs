// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job coordinator for the auxiliary database load.
//!
//! This crate decides whether a run may start (stop-file, running-lock),
//! picks the offline blue/green schema from the schema prober's answer, runs
//! the load bounded by the cutoff, and always triggers control-plane shutdown
//! when the run is over.

pub mod context;
pub mod coordinator;
pub mod error;
pub mod load;
pub mod markers;
pub mod notify;
pub mod probe;
pub mod status;
pub mod types;

pub use context::{CancellationToken, ShutdownReason, ShutdownTrigger};
pub use coordinator::{evaluate_preflight, select_target_schema, JobCoordinator, Preflight};
pub use error::{LoadError, LockError, NotifyError, ProbeError};
pub use load::{LoadContext, LoadReport, Loader, StagedLoader};
pub use markers::{marker_exists, RunningLock, ScopeDirectory};
pub use notify::{CommandNotifier, Notification, Notifier};
pub use probe::{CommandProber, SchemaProber};
pub use status::{LoadProgress, RunSnapshot, StatusBoard};
pub use types::{Phase, RunOutcome, RunStatus, Schema, SchemaSelection};
