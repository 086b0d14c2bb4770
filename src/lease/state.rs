//! Handle-local lease state.

use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// The token a handle believes it holds.
///
/// This is a hint for the next conditional write, not a claim: the store
/// decides whether the token is still current.
#[derive(Debug, Default)]
pub struct LocalLeaseState {
    current_token: Mutex<Option<Uuid>>,
}

impl LocalLeaseState {
    pub fn new(token: Option<Uuid>) -> Self {
        Self {
            current_token: Mutex::new(token),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Uuid>> {
        self.current_token
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    pub fn current(&self) -> Option<Uuid> {
        *self.lock()
    }

    pub(crate) fn set(&self, token: Uuid) {
        *self.lock() = Some(token);
    }

    /// Clear the state, returning what was held.
    pub(crate) fn take(&self) -> Option<Uuid> {
        self.lock().take()
    }
}
