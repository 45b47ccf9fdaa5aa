//! Writer lock for the store directory

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Lock file name inside the store directory
pub const LOCK_FILE: &str = ".write.lock";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A lock file older than this many acquire timeouts is treated as abandoned
const STALE_FACTOR: u32 = 4;

/// Lower bound on the stale age, whatever the timeout
const MIN_STALE_AGE: Duration = Duration::from_secs(60);

/// Exclusive writer lock on a store directory.
///
/// Backed by a lock file created with `create_new`, so it also excludes
/// writers in other processes. Released on drop. The file holds the owner's
/// PID; a file left behind by a killed writer is broken once it has not been
/// touched for `STALE_FACTOR` timeouts (at least `MIN_STALE_AGE`).
#[derive(Debug)]
pub struct WriterLock {
    path: PathBuf,
}

impl WriterLock {
    /// Acquire the lock, waiting up to `timeout`
    pub fn acquire(dir: &Path, timeout: Duration) -> Result<Self> {
        let path = dir.join(LOCK_FILE);
        let deadline = Instant::now() + timeout;
        let stale_after = (timeout * STALE_FACTOR).max(MIN_STALE_AGE);

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{}", std::process::id()) {
                        tracing::warn!("Could not record PID in {}: {}", path.display(), e);
                    }
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if break_if_stale(&path, stale_after) {
                        continue;
                    }
                    if Instant::now() >= deadline {
                        let owner = holder_pid(&path)
                            .map(|pid| format!(" (pid {})", pid))
                            .unwrap_or_default();
                        return Err(Error::storage(format!(
                            "Store {} is locked by another writer{}; if no build is running, remove {}",
                            dir.display(),
                            owner,
                            path.display()
                        )));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(Error::storage(format!(
                        "Cannot create lock file {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
    }
}

/// PID recorded in a lock file, if readable
fn holder_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Remove the lock file if it was last modified more than `stale_after` ago.
/// Returns true when the caller should retry immediately.
fn break_if_stale(path: &Path, stale_after: Duration) -> bool {
    let age = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified.elapsed().unwrap_or_default(),
        // Vanished between create_new and here
        Err(e) if e.kind() == ErrorKind::NotFound => return true,
        Err(_) => return false,
    };
    if age < stale_after {
        return false;
    }

    tracing::warn!(
        "Breaking stale store lock {} (pid {}, untouched for {}s)",
        path.display(),
        holder_pid(path).map_or_else(|| "unknown".to_string(), |pid| pid.to_string()),
        age.as_secs()
    );
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!("Could not remove stale lock {}: {}", path.display(), e);
            false
        }
    }
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to release store lock {}: {}", self.path.display(), e);
        }
    }
}
