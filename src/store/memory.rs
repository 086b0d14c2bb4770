//! In-process store.

use super::{
    CONDITIONAL_FUNCTIONS, Clock, ConditionalStore, DELETE_IF_MATCH, DeleteOutcome, LeaseKey,
    LeaseRecord, SET_IF_EXPIRED, SetOutcome, SystemClock,
};
use crate::error::{LeaseError, Result};
use crate::lease::protocol::{SetDecision, decide_delete, decide_set};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    installed: BTreeSet<String>,
    records: BTreeMap<LeaseKey, LeaseRecord>,
}

/// A store kept in memory behind a single mutex.
///
/// Every operation runs under the mutex, which makes both conditional
/// operations trivially atomic. Useful for tests and for coordinating
/// threads of one process.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn require(inner: &Inner, function: &str) -> Result<()> {
        if inner.installed.contains(function) {
            Ok(())
        } else {
            Err(LeaseError::FunctionNotInstalled(function.to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionalStore for MemoryStore {
    fn functions_installed(&self) -> Result<bool> {
        let inner = self.lock();
        Ok(CONDITIONAL_FUNCTIONS
            .iter()
            .all(|f| inner.installed.contains(*f)))
    }

    fn install_functions(&self) -> Result<()> {
        let mut inner = self.lock();
        for function in CONDITIONAL_FUNCTIONS {
            inner.installed.insert(function.to_string());
        }
        Ok(())
    }

    fn read(&self, key: &LeaseKey) -> Result<Option<LeaseRecord>> {
        Ok(self.lock().records.get(key).cloned())
    }

    fn set_if_expired(
        &self,
        key: &LeaseKey,
        old_token: Option<Uuid>,
        new_token: Uuid,
        ttl_ms: u64,
    ) -> Result<SetOutcome> {
        let mut inner = self.lock();
        Self::require(&inner, SET_IF_EXPIRED)?;

        let now = self.clock.now();
        match decide_set(inner.records.get(key), old_token, new_token, ttl_ms, now)? {
            SetDecision::Write(kind) => {
                let record = LeaseRecord::new(key, Some(new_token), now);
                inner.records.insert(key.clone(), record.clone());
                debug!(%key, %kind, token = %new_token, "memory store granted lease");
                Ok(SetOutcome::Granted { kind, record })
            }
            SetDecision::NotExpired => {
                let record = inner.records.get(key).cloned().ok_or_else(|| {
                    LeaseError::Transport(format!("record {} vanished during evaluation", key))
                })?;
                Ok(SetOutcome::NotExpired { record })
            }
        }
    }

    fn delete_if_match(&self, key: &LeaseKey, expected: Uuid) -> Result<DeleteOutcome> {
        let mut inner = self.lock();
        Self::require(&inner, DELETE_IF_MATCH)?;

        if !decide_delete(inner.records.get(key), expected) {
            return Ok(DeleteOutcome::Mismatch);
        }

        let record = LeaseRecord::new(key, None, self.clock.now());
        inner.records.insert(key.clone(), record);
        Ok(DeleteOutcome::Deleted)
    }
}
