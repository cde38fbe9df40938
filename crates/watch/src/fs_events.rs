// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Low-level filesystem event primitives over `notify`.
//!
//! The creation race is the whole reason this module is shaped the way it
//! is: a file may be written *before* a watch attaches. [`wait_for_file`]
//! therefore attaches the watch first and only then checks for existence,
//! so the file can never slip between the two.

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from filesystem watching.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to watch {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("timed out waiting for {path}")]
    Timeout { path: PathBuf },
    #[error("watch event channel closed")]
    Closed,
}

/// Resolve once `file_name` exists inside `dir`, or fail after `timeout`.
///
/// The watch is attached before the existence check; a file created at any
/// point relative to this call is observed either by the check or by the
/// watcher.
pub async fn wait_for_file(
    dir: &Path,
    file_name: &str,
    timeout: Duration,
) -> Result<PathBuf, WatchError> {
    let target = dir.join(file_name);

    let (tx, mut rx) = mpsc::channel::<()>(32);
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                let _ = tx.blocking_send(());
            }
        }
    })
    .map_err(|source| WatchError::Setup {
        path: dir.to_owned(),
        source,
    })?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Setup {
            path: dir.to_owned(),
            source,
        })?;

    if target.exists() {
        return Ok(target);
    }

    let deadline = Instant::now() + timeout;
    loop {
        let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
            return Err(WatchError::Timeout { path: target });
        };
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(())) => {
                if target.exists() {
                    return Ok(target);
                }
            }
            Ok(None) => return Err(WatchError::Closed),
            Err(_) => return Err(WatchError::Timeout { path: target }),
        }
    }
}

/// Stream of newly created subdirectories under a watched root.
///
/// Holds the underlying watcher; dropping this stops the watch.
pub struct SubdirEvents {
    rx: mpsc::Receiver<PathBuf>,
    _watcher: RecommendedWatcher,
}

impl SubdirEvents {
    /// Next new subdirectory, or `None` once the watch has shut down.
    pub async fn next(&mut self) -> Option<PathBuf> {
        self.rx.recv().await
    }
}

/// Watch `root` for newly appearing subdirectories.
///
/// Bursts of creation events for the same path within `debounce` are
/// collapsed to a single emission.
pub fn watch_new_subdirs(root: &Path, debounce: Duration) -> Result<SubdirEvents, WatchError> {
    let (raw_tx, mut raw_rx) = mpsc::channel::<PathBuf>(64);
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Create(_)) {
                for path in event.paths {
                    let _ = raw_tx.blocking_send(path);
                }
            }
        }
    })
    .map_err(|source| WatchError::Setup {
        path: root.to_owned(),
        source,
    })?;
    watcher
        .watch(root, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Setup {
            path: root.to_owned(),
            source,
        })?;

    let (tx, rx) = mpsc::channel::<PathBuf>(64);
    tokio::spawn(async move {
        let mut last_emit: HashMap<PathBuf, Instant> = HashMap::new();
        while let Some(path) = raw_rx.recv().await {
            if !path.is_dir() {
                continue;
            }
            let now = Instant::now();
            // Entries past the window can never suppress again; drop them so
            // the map stays bounded over a long-lived watch.
            last_emit.retain(|_, emitted| now.duration_since(*emitted) < debounce);
            if last_emit.contains_key(&path) {
                continue;
            }
            last_emit.insert(path.clone(), now);
            if tx.send(path).await.is_err() {
                break;
            }
        }
    });

    Ok(SubdirEvents {
        rx,
        _watcher: watcher,
    })
}

#[cfg(test)]
#[path = "fs_events_tests.rs"]
mod tests;
