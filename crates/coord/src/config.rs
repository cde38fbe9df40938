// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Default gap between poll iterations while waiting on the human.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Orchestrator configuration; constructed once and passed in, no globals.
#[derive(Debug, Clone)]
pub struct CoordConfig {
    /// Overall budget for one `start_session` call. Zero means wait forever.
    pub session_timeout: Duration,
    /// Sleep between wait-loop iterations.
    pub poll_interval: Duration,
}

impl Default for CoordConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::ZERO,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl CoordConfig {
    pub fn with_timeout(session_timeout: Duration) -> Self {
        Self {
            session_timeout,
            ..Self::default()
        }
    }

    /// Effective wait budget: 90% of the session timeout, leaving the caller
    /// slack to clean up and report before any harder enclosing deadline.
    /// `None` means unbounded.
    pub(crate) fn wait_budget(&self) -> Option<Duration> {
        if self.session_timeout.is_zero() {
            None
        } else {
            Some(self.session_timeout * 9 / 10)
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
