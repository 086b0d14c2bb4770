//! The lease handle.

use super::connection::Connection;
use super::state::LocalLeaseState;
use crate::error::{LeaseError, Result};
use crate::store::{Clock, DeleteOutcome, LeaseKey, SetOutcome, SystemClock, expires_at};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A lease the caller now holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeaseGrant {
    /// Fencing token; pass it downstream so stale holders can be rejected.
    pub token: Uuid,
    /// Milliseconds left before the lease may be seized, measured from
    /// before the request was sent.
    pub remaining_ms: i64,
}

/// A lease on one attribute of one resource.
#[derive(Debug)]
pub struct LeaseHandle {
    key: LeaseKey,
    ttl_ms: u64,
    connection: Connection,
    clock: Arc<dyn Clock>,
    state: LocalLeaseState,
}

impl LeaseHandle {
    /// Bind a handle to `resource_id`/`attribute` on `connection`.
    ///
    /// Installs the store's conditional operations on first use of the
    /// connection.
    pub fn new(
        resource_id: impl Into<String>,
        attribute: impl Into<String>,
        connection: &Connection,
        ttl_ms: u64,
    ) -> Result<Self> {
        if ttl_ms == 0 {
            return Err(LeaseError::UserError(
                "lease ttl must be greater than 0ms".to_string(),
            ));
        }

        let key = LeaseKey::new(resource_id, attribute)?;
        connection.ensure_installed()?;

        Ok(Self {
            key,
            ttl_ms,
            connection: connection.clone(),
            clock: Arc::new(SystemClock),
            state: LocalLeaseState::default(),
        })
    }

    /// Measure round trips with `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start from a token issued to an earlier handle, so it can be renewed
    /// or released.
    pub fn with_token(mut self, token: Option<Uuid>) -> Self {
        self.state = LocalLeaseState::new(token);
        self
    }

    pub fn key(&self) -> &LeaseKey {
        &self.key
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// The token this handle last obtained, if any.
    pub fn token(&self) -> Option<Uuid> {
        self.state.current()
    }

    /// Acquire the lease, or renew it if this handle already holds it.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(grant))` - The lease is ours with `grant.remaining_ms` left
    /// * `Ok(None)` - Someone else holds it, or the round trip used up the TTL
    /// * `Err(LeaseError::InvalidNewValue)` - Token collision
    /// * `Err(_)` - Store failure, passed through unchanged
    pub fn acquire(&self) -> Result<Option<LeaseGrant>> {
        let old_token = self.state.current();
        let new_token = Uuid::new_v4();

        let started = self.clock.now();
        let outcome =
            self.connection
                .store()
                .set_if_expired(&self.key, old_token, new_token, self.ttl_ms)?;
        let finished = self.clock.now();

        let kind = match outcome {
            SetOutcome::Granted { kind, .. } => kind,
            SetOutcome::NotExpired { record } => {
                debug!(
                    key = %self.key,
                    holder = ?record.holder_token,
                    last_write_at = %record.last_write_at,
                    "lease held elsewhere"
                );
                return Ok(None);
            }
        };

        let remaining_ms = (expires_at(started, self.ttl_ms) - finished).num_milliseconds();
        if remaining_ms <= 0 {
            warn!(
                key = %self.key,
                ttl_ms = self.ttl_ms,
                elapsed_ms = (finished - started).num_milliseconds(),
                "lease granted but the round trip consumed its ttl"
            );
            return Ok(None);
        }

        self.state.set(new_token);
        info!(key = %self.key, %kind, token = %new_token, remaining_ms, "lease acquired");
        Ok(Some(LeaseGrant {
            token: new_token,
            remaining_ms,
        }))
    }

    /// Release the lease if this handle holds a token.
    ///
    /// Always returns `Ok(true)`: a lease already taken over by someone else
    /// is left alone without complaint. The local token is forgotten even
    /// when the store call fails.
    pub fn release(&self) -> Result<bool> {
        let Some(token) = self.state.take() else {
            debug!(key = %self.key, "release with no token held");
            return Ok(true);
        };

        match self.connection.store().delete_if_match(&self.key, token)? {
            DeleteOutcome::Deleted => info!(key = %self.key, %token, "lease released"),
            DeleteOutcome::Mismatch => {
                debug!(key = %self.key, %token, "lease already reassigned; nothing released")
            }
        }

        Ok(true)
    }
}
