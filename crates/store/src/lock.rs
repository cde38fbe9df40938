// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process advisory locking via exclusive-create lock files.
//!
//! A lock on `<path>` is a sibling file `<path>.lock` containing the holder's
//! process id. `O_EXCL` creation is the atomic test-and-set, so no external
//! lock service is needed. If the recorded holder is dead the lock is
//! reclaimed immediately, which keeps the store usable after a process is
//! killed mid-operation.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Sleep between acquisition attempts while the holder is alive.
const ACQUIRE_POLL: Duration = Duration::from_millis(25);

/// Errors from lock acquisition.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out acquiring lock {path} after {waited_ms}ms (held by pid {holder:?})")]
    Timeout {
        path: PathBuf,
        waited_ms: u64,
        holder: Option<u32>,
    },
    #[error("lock io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An acquired lock; released (the lock file removed) on drop.
#[derive(Debug)]
pub struct FileLock {
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquire the lock guarding `target`, waiting up to `timeout`.
    pub async fn acquire(target: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = lock_path_for(target);
        let started = Instant::now();

        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(mut file) => {
                    if let Err(source) = file.write_all(std::process::id().to_string().as_bytes())
                    {
                        let _ = std::fs::remove_file(&lock_path);
                        return Err(LockError::Io {
                            path: lock_path,
                            source,
                        });
                    }
                    return Ok(Self { lock_path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    let holder = read_holder(&lock_path);
                    if let Some(pid) = holder {
                        if !process_exists(pid) {
                            warn!(
                                lock = %lock_path.display(),
                                holder = pid,
                                "reclaiming stale lock from dead process"
                            );
                            let _ = std::fs::remove_file(&lock_path);
                            continue;
                        }
                    }
                    // Holder alive, or lock file not yet readable (the owner
                    // may still be writing its pid). Wait and retry.
                    if started.elapsed() >= timeout {
                        return Err(LockError::Timeout {
                            path: lock_path,
                            waited_ms: started.elapsed().as_millis() as u64,
                            holder,
                        });
                    }
                    tokio::time::sleep(ACQUIRE_POLL).await;
                }
                Err(source) => {
                    return Err(LockError::Io {
                        path: lock_path,
                        source,
                    })
                }
            }
        }
    }

    /// Path of the lock file itself.
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(lock = %self.lock_path.display(), error = %e, "failed to remove lock file");
            }
        }
    }
}

/// `<path>.lock`, appended to the full file name (not swapping the extension).
pub(crate) fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}

fn read_holder(lock_path: &Path) -> Option<u32> {
    std::fs::read_to_string(lock_path)
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Liveness probe: `kill -0 <pid>` succeeds iff the process exists.
///
/// Values outside the kernel pid range must read as dead before reaching
/// `kill`: it would alias e.g. `u32::MAX` to the wildcard pid `-1`, which
/// always "exists", turning a garbage lock file into a permanent lock.
pub(crate) fn process_exists(pid: u32) -> bool {
    if pid == 0 || pid > i32::MAX as u32 {
        return false;
    }
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
