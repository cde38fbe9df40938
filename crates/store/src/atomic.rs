// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic single-file operations.
//!
//! Every mutation of a shared document goes through here. Writes land via a
//! uniquely-named temp file followed by an atomic rename, so a reader can
//! only ever observe the old complete content or the new complete content.
//! The temp file is re-read and byte-compared before the rename, guarding
//! against silent truncation by a full or failing disk.

use crate::lock::FileLock;
use crate::{StoreConfig, StoreError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::warn;

/// Owner read/write bits every document must retain.
const MIN_FILE_MODE: u32 = 0o600;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Lock-protected atomic file operations, parameterized by the store config.
#[derive(Debug, Clone)]
pub struct AtomicStore {
    lock_timeout: Duration,
    read_retries: u32,
    retry_base_delay: Duration,
}

impl AtomicStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            lock_timeout: config.lock_timeout,
            read_retries: config.read_retries,
            retry_base_delay: config.retry_base_delay,
        }
    }

    /// Write `bytes` to `path` atomically with the given permission bits.
    pub async fn write(&self, path: &Path, bytes: &[u8], mode: u32) -> Result<(), StoreError> {
        let lock = FileLock::acquire(path, self.lock_timeout).await?;
        let result = write_locked(path, bytes, mode);
        // Lock released on drop regardless of the write outcome.
        drop(lock);
        result
    }

    /// Read the full contents of `path`.
    ///
    /// Returns `Ok(None)` if the file does not exist — callers use this to
    /// tell "no answer yet" apart from "corrupt answer". Transient failures
    /// are retried with exponential backoff; not-found and permission-denied
    /// are terminal.
    pub async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        let mut attempt: u32 = 0;
        loop {
            if !path.exists() {
                return Ok(None);
            }
            let lock = FileLock::acquire(path, self.lock_timeout).await?;
            let result = fs::read(path);
            drop(lock);

            match result {
                Ok(bytes) => return Ok(Some(bytes)),
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    return Err(StoreError::Read {
                        path: path.to_owned(),
                        attempts: attempt + 1,
                        source: e,
                    });
                }
                Err(e) => {
                    if attempt >= self.read_retries {
                        return Err(StoreError::Read {
                            path: path.to_owned(),
                            attempts: attempt + 1,
                            source: e,
                        });
                    }
                    let delay = self.retry_base_delay * 2u32.saturating_pow(attempt);
                    warn!(
                        path = %path.display(),
                        attempt,
                        error = %e,
                        "transient read failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Delete `path`. Absence is success, not an error.
    pub async fn delete(&self, path: &Path) -> Result<(), StoreError> {
        if !path.exists() {
            return Ok(());
        }
        let lock = FileLock::acquire(path, self.lock_timeout).await?;
        let result = match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: path.to_owned(),
                source,
            }),
        };
        drop(lock);
        result
    }

    /// Copy `source` to `dest` with the given permission bits.
    ///
    /// Refuses to overwrite: an existing `dest` is an error.
    pub async fn copy(&self, source: &Path, dest: &Path, mode: u32) -> Result<(), StoreError> {
        if dest.exists() {
            return Err(StoreError::DestinationExists {
                path: dest.to_owned(),
            });
        }
        let lock = FileLock::acquire(dest, self.lock_timeout).await?;
        let result = (|| {
            fs::copy(source, dest)?;
            fs::set_permissions(dest, fs::Permissions::from_mode(mode))
        })()
        .map_err(|source_err| StoreError::Io {
            path: dest.to_owned(),
            source: source_err,
        });
        drop(lock);
        result
    }
}

fn write_locked(path: &Path, bytes: &[u8], mode: u32) -> Result<(), StoreError> {
    let tmp = temp_path(path);
    let result = write_via_temp(path, &tmp, bytes, mode);
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map_err(|source| StoreError::Write {
        path: path.to_owned(),
        source,
    })
}

fn write_via_temp(path: &Path, tmp: &Path, bytes: &[u8], mode: u32) -> std::io::Result<()> {
    {
        let mut file = fs::File::create(tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    // Re-read and byte-compare before renaming into place.
    let readback = fs::read(tmp)?;
    if readback != bytes {
        return Err(std::io::Error::new(
            ErrorKind::InvalidData,
            format!(
                "temp file verification failed: wrote {} bytes, read back {}",
                bytes.len(),
                readback.len()
            ),
        ));
    }

    fs::set_permissions(tmp, fs::Permissions::from_mode(mode))?;
    fs::rename(tmp, path)?;

    // A prior writer (or umask) may have left the final file unreadable to
    // its own owner; repair to at least owner read/write.
    let current = fs::metadata(path)?.permissions().mode() & 0o777;
    if current & MIN_FILE_MODE != MIN_FILE_MODE {
        fs::set_permissions(path, fs::Permissions::from_mode(current | MIN_FILE_MODE))?;
    }

    Ok(())
}

/// Unique sibling temp name: `.<name>.<pid>.<n>.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), n))
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
