//! Record lock acquisition.

use super::guard::LockGuard;
use super::metadata::LockMetadata;
use crate::error::{LeaseError, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

/// How long to wait for a busy lock and when to consider it abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Total time to keep retrying a busy lock before giving up.
    pub wait: Duration,
    /// Pause between attempts.
    pub retry: Duration,
    /// Age after which an existing lock file is broken.
    pub stale: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            wait: Duration::from_millis(2_000),
            retry: Duration::from_millis(10),
            stale: Duration::from_millis(30_000),
        }
    }
}

/// Acquire the lock file at `lock_path`, retrying per `policy`.
///
/// # Returns
///
/// * `Ok(LockGuard)` - Lock held until the guard is dropped
/// * `Err(LeaseError::StoreUnavailable)` - Still busy after `policy.wait`
/// * `Err(LeaseError::Transport)` - Filesystem failure
pub fn acquire_record_lock(
    lock_path: &Path,
    operation: &str,
    policy: &LockPolicy,
) -> Result<LockGuard> {
    if let Some(parent) = lock_path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            LeaseError::Transport(format!(
                "failed to create locks directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let metadata = LockMetadata::new(operation);
    let started = Instant::now();

    loop {
        match try_create(lock_path, &metadata)? {
            Some(guard) => return Ok(guard),
            None => {
                if break_if_stale(lock_path, policy.stale) {
                    continue;
                }
                if started.elapsed() >= policy.wait {
                    return Err(busy_error(lock_path, policy.wait));
                }
                debug!(path = %lock_path.display(), "record lock busy, retrying");
                std::thread::sleep(policy.retry);
            }
        }
    }
}

/// Create the lock file exclusively. `Ok(None)` means it already exists.
fn try_create(lock_path: &Path, metadata: &LockMetadata) -> Result<Option<LockGuard>> {
    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => {
            return Err(LeaseError::Transport(format!(
                "failed to create lock '{}': {}",
                lock_path.display(),
                e
            )));
        }
    };

    let json = metadata.to_json()?;
    file.write_all(json.as_bytes()).map_err(|e| {
        let _ = fs::remove_file(lock_path);
        LeaseError::Transport(format!("failed to write lock metadata: {}", e))
    })?;

    Ok(Some(LockGuard::new(lock_path.to_path_buf())))
}

/// Remove the lock at `lock_path` if it is older than `stale`.
///
/// Lock files whose metadata cannot be parsed (a holder may be between
/// creating and writing the file) are aged by their modification time.
fn break_if_stale(lock_path: &Path, stale: Duration) -> bool {
    let is_stale = match LockMetadata::from_file(lock_path) {
        Ok(meta) => meta.is_stale(stale),
        Err(_) => fs::metadata(lock_path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age > stale),
    };

    if !is_stale {
        return false;
    }

    match fs::remove_file(lock_path) {
        Ok(()) => {
            warn!(path = %lock_path.display(), "broke stale record lock");
            true
        }
        // Someone else broke or released it first; just retry.
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %lock_path.display(), error = %e, "failed to break stale record lock");
            false
        }
    }
}

fn busy_error(lock_path: &Path, waited: Duration) -> LeaseError {
    let holder = match LockMetadata::from_file(lock_path) {
        Ok(meta) => format!(
            " (held by {} for {}ms, operation {})",
            meta.owner,
            meta.age().num_milliseconds(),
            meta.operation
        ),
        Err(_) => String::new(),
    };
    LeaseError::StoreUnavailable(format!(
        "record lock '{}' still busy after {}ms{}",
        lock_path.display(),
        waited.as_millis(),
        holder
    ))
}
