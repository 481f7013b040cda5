// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

/// GET / - Liveness probe.
pub async fn liveness() -> &'static str {
	"OK"
}
