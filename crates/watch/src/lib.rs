// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! iq-watch: consumer-side session discovery.
//!
//! The interactive client uses this crate to find work without scanning the
//! whole session tree on every tick: a filesystem watcher on the session
//! root reports new session directories, and the [`SessionWatcher`] turns
//! those into loaded, ready-to-render session events.

mod fs_events;
mod session_watcher;

pub use fs_events::{wait_for_file, watch_new_subdirs, SubdirEvents, WatchError};
pub use session_watcher::{NewSession, SessionWatcher};
