//! RAII lock guard implementation.

use std::fs;
use std::path::PathBuf;

/// RAII guard for a record lock file.
///
/// When dropped, the lock file is deleted. If deletion fails a warning is
/// logged; the lock then ages into staleness and is broken by a later caller.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    pub(super) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release record lock");
        }
    }
}
