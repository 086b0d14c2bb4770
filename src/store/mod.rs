//! The conditional transaction executor.
//!
//! A [`ConditionalStore`] holds one [`LeaseRecord`] per `(resource, attribute)`
//! pair and executes exactly two mutating operations against it, each as one
//! atomic step evaluated against the store's own clock:
//!
//! - `lease/set-if-expired`: write a new holder token if the slot is vacant,
//!   held by the caller's previous token, or expired
//! - `lease/delete-if-match`: clear the holder token if it still equals the
//!   caller's token
//!
//! Both operations must be installed before use. Installation is idempotent
//! and normally driven by [`crate::lease::Connection`].
//!
//! Implementations:
//! - [`MemoryStore`]: a mutex-guarded map, for embedding and tests
//! - [`FileStore`]: a directory shared by processes on one host, with a
//!   lock file serializing each record's read-decide-write step

mod clock;
mod file;
mod memory;


pub use clock::{Clock, ManualClock, SystemClock};
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::{LeaseError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

/// Name of the conditional set operation.
pub const SET_IF_EXPIRED: &str = "lease/set-if-expired";

/// Name of the conditional delete operation.
pub const DELETE_IF_MATCH: &str = "lease/delete-if-match";

/// Every operation a store must have installed.
pub const CONDITIONAL_FUNCTIONS: [&str; 2] = [SET_IF_EXPIRED, DELETE_IF_MATCH];

static KEY_PART_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("Invalid key part regex")
});

/// Address of a lease record: one attribute of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeaseKey {
    resource_id: String,
    attribute: String,
}

impl LeaseKey {
    /// Build a key, rejecting parts that are empty, too long, or contain
    /// anything besides ASCII letters, digits, `.`, `_` and `-`.
    pub fn new(resource_id: impl Into<String>, attribute: impl Into<String>) -> Result<Self> {
        let resource_id = resource_id.into();
        let attribute = attribute.into();

        for (what, part) in [("resource id", &resource_id), ("attribute", &attribute)] {
            if !KEY_PART_REGEX.is_match(part) {
                return Err(LeaseError::InvalidKey(format!(
                    "{} '{}' must match {}",
                    what,
                    part,
                    KEY_PART_REGEX.as_str()
                )));
            }
        }

        Ok(Self {
            resource_id,
            attribute,
        })
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }
}

impl fmt::Display for LeaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_id, self.attribute)
    }
}

/// The authoritative lease state for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    pub resource_id: String,
    pub attribute: String,

    /// Current holder, or `None` after a release.
    pub holder_token: Option<Uuid>,

    /// Commit time of the transaction that last wrote `holder_token`,
    /// stamped by the store.
    pub last_write_at: DateTime<Utc>,
}

impl LeaseRecord {
    pub(crate) fn new(key: &LeaseKey, holder_token: Option<Uuid>, at: DateTime<Utc>) -> Self {
        Self {
            resource_id: key.resource_id.clone(),
            attribute: key.attribute.clone(),
            holder_token,
            last_write_at: at,
        }
    }

    /// Whether a lease written at `last_write_at` has outlived `ttl_ms` at `now`.
    pub fn is_expired_at(&self, ttl_ms: u64, now: DateTime<Utc>) -> bool {
        expires_at(self.last_write_at, ttl_ms) < now
    }
}

/// `at + ttl_ms`, saturating at the far end of the calendar.
pub(crate) fn expires_at(at: DateTime<Utc>, ttl_ms: u64) -> DateTime<Utc> {
    i64::try_from(ttl_ms)
        .ok()
        .and_then(chrono::Duration::try_milliseconds)
        .and_then(|ttl| at.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Which rule let a conditional set through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    /// No holder was recorded.
    Vacant,
    /// The caller presented the current holder token.
    Renewed,
    /// The previous holder's lease had expired.
    Seized,
}

impl fmt::Display for GrantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantKind::Vacant => write!(f, "vacant"),
            GrantKind::Renewed => write!(f, "renewed"),
            GrantKind::Seized => write!(f, "seized"),
        }
    }
}

/// Result of `lease/set-if-expired`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// The new token was written; `record` is the committed state.
    Granted { kind: GrantKind, record: LeaseRecord },
    /// Someone else holds an unexpired lease; `record` is left untouched.
    NotExpired { record: LeaseRecord },
}

/// Result of `lease/delete-if-match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The holder token matched and was cleared.
    Deleted,
    /// The stored token differed (or was absent); nothing was written.
    Mismatch,
}

/// Store boundary for lease records.
///
/// Implementations must evaluate each conditional operation against a
/// consistent view of the record and apply it atomically with respect to
/// every other writer of the same key. `last_write_at` must come from the
/// store's clock, never from the caller.
pub trait ConditionalStore: Send + Sync + fmt::Debug {
    /// Whether both conditional operations are installed.
    fn functions_installed(&self) -> Result<bool>;

    /// Install both conditional operations. Installing twice is harmless.
    fn install_functions(&self) -> Result<()>;

    /// Point read of the current record.
    fn read(&self, key: &LeaseKey) -> Result<Option<LeaseRecord>>;

    /// Atomically write `new_token` if the slot is vacant, held by
    /// `old_token`, or expired under `ttl_ms`.
    ///
    /// Fails with [`LeaseError::InvalidNewValue`] if `new_token` is already
    /// the stored token.
    fn set_if_expired(
        &self,
        key: &LeaseKey,
        old_token: Option<Uuid>,
        new_token: Uuid,
        ttl_ms: u64,
    ) -> Result<SetOutcome>;

    /// Atomically clear the holder token if it equals `expected`.
    fn delete_if_match(&self, key: &LeaseKey, expected: Uuid) -> Result<DeleteOutcome>;
}
