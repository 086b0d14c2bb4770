//! Directory-backed store shared by processes on one host.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   functions.json                      installed conditional operations
//!   events.ndjson                       transaction log
//!   records/<resource>/<attribute>.json lease records
//!   locks/<resource>/<attribute>.lock   per-record critical section
//!   locks/functions.lock                guards functions.json
//! ```
//!
//! Each conditional operation takes the record lock, reads the record,
//! stamps `now` from the store clock, decides, and replaces the record file
//! atomically before releasing the lock. Readers never take the lock: they
//! see whole records thanks to the rename.

use super::{
    CONDITIONAL_FUNCTIONS, Clock, ConditionalStore, DELETE_IF_MATCH, DeleteOutcome, LeaseKey,
    LeaseRecord, SET_IF_EXPIRED, SetOutcome, SystemClock,
};
use crate::error::{LeaseError, Result};
use crate::events::{self, Event, EventAction};
use crate::fs::atomic_write_file;
use crate::lease::protocol::{SetDecision, decide_delete, decide_set};
use crate::locks::{LockPolicy, acquire_record_lock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Revision of the decision rules written into `functions.json`.
const FUNCTION_REVISION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FunctionManifest {
    #[serde(default)]
    functions: BTreeMap<String, InstalledFunction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InstalledFunction {
    revision: u32,
    installed_at: DateTime<Utc>,
}

impl FunctionManifest {
    fn has_all(&self) -> bool {
        CONDITIONAL_FUNCTIONS
            .iter()
            .all(|f| self.functions.contains_key(*f))
    }
}

/// A store living in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    lock_policy: LockPolicy,
}

impl FileStore {
    /// Open (creating if needed) the store rooted at `root`.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            LeaseError::StoreUnavailable(format!(
                "cannot open store directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self {
            root,
            clock: Arc::new(SystemClock),
            lock_policy: LockPolicy::default(),
        })
    }

    /// Use `clock` for transaction timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn events_path(&self) -> PathBuf {
        self.root.join("events.ndjson")
    }

    /// The full transaction log, oldest first.
    pub fn read_events(&self) -> Result<Vec<Event>> {
        events::read_events(&self.events_path())
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join("functions.json")
    }

    fn record_path(&self, key: &LeaseKey) -> PathBuf {
        self.root
            .join("records")
            .join(key.resource_id())
            .join(format!("{}.json", key.attribute()))
    }

    fn lock_path(&self, key: &LeaseKey) -> PathBuf {
        self.root
            .join("locks")
            .join(key.resource_id())
            .join(format!("{}.lock", key.attribute()))
    }

    fn read_manifest(&self) -> Result<FunctionManifest> {
        Ok(read_json(&self.manifest_path())?.unwrap_or_default())
    }

    fn require(&self, function: &str) -> Result<()> {
        if self.read_manifest()?.functions.contains_key(function) {
            Ok(())
        } else {
            Err(LeaseError::FunctionNotInstalled(function.to_string()))
        }
    }

    fn write_record(&self, key: &LeaseKey, record: &LeaseRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record).map_err(|e| {
            LeaseError::Transport(format!("failed to serialize record {}: {}", key, e))
        })?;
        atomic_write_file(self.record_path(key), &json)
    }

    /// Append to the transaction log. The record write has already
    /// committed, so a failure here is logged rather than returned.
    fn log_event(&self, event: &Event) {
        if let Err(e) = events::append_event(&self.events_path(), event) {
            warn!(error = %e, action = %event.action, "failed to append to transaction log");
        }
    }
}

impl ConditionalStore for FileStore {
    fn functions_installed(&self) -> Result<bool> {
        Ok(self.read_manifest()?.has_all())
    }

    fn install_functions(&self) -> Result<()> {
        let _guard = acquire_record_lock(
            &self.root.join("locks").join("functions.lock"),
            "install",
            &self.lock_policy,
        )?;

        let mut manifest = self.read_manifest()?;
        if manifest.has_all() {
            debug!(root = %self.root.display(), "conditional operations already installed");
            return Ok(());
        }

        let now = self.clock.now();
        for function in CONDITIONAL_FUNCTIONS {
            manifest
                .functions
                .entry(function.to_string())
                .or_insert(InstalledFunction {
                    revision: FUNCTION_REVISION,
                    installed_at: now,
                });
        }

        let json = serde_json::to_string_pretty(&manifest).map_err(|e| {
            LeaseError::Transport(format!("failed to serialize function manifest: {}", e))
        })?;
        atomic_write_file(self.manifest_path(), &json)?;
        self.log_event(&Event::new(EventAction::Install, now));

        info!(root = %self.root.display(), "installed conditional operations");
        Ok(())
    }

    fn read(&self, key: &LeaseKey) -> Result<Option<LeaseRecord>> {
        read_json(&self.record_path(key))
    }

    fn set_if_expired(
        &self,
        key: &LeaseKey,
        old_token: Option<Uuid>,
        new_token: Uuid,
        ttl_ms: u64,
    ) -> Result<SetOutcome> {
        self.require(SET_IF_EXPIRED)?;
        let _guard = acquire_record_lock(&self.lock_path(key), SET_IF_EXPIRED, &self.lock_policy)?;

        let current = self.read(key)?;
        let now = self.clock.now();

        match decide_set(current.as_ref(), old_token, new_token, ttl_ms, now)? {
            SetDecision::Write(kind) => {
                let record = LeaseRecord::new(key, Some(new_token), now);
                self.write_record(key, &record)?;
                self.log_event(
                    &Event::new(kind.into(), now)
                        .with_key(key)
                        .with_token(new_token)
                        .with_previous(current.and_then(|r| r.holder_token)),
                );
                debug!(%key, %kind, token = %new_token, "file store granted lease");
                Ok(SetOutcome::Granted { kind, record })
            }
            SetDecision::NotExpired => {
                let record = current.ok_or_else(|| {
                    LeaseError::Transport(format!("record {} vanished during evaluation", key))
                })?;
                Ok(SetOutcome::NotExpired { record })
            }
        }
    }

    fn delete_if_match(&self, key: &LeaseKey, expected: Uuid) -> Result<DeleteOutcome> {
        self.require(DELETE_IF_MATCH)?;
        let _guard =
            acquire_record_lock(&self.lock_path(key), DELETE_IF_MATCH, &self.lock_policy)?;

        if !decide_delete(self.read(key)?.as_ref(), expected) {
            return Ok(DeleteOutcome::Mismatch);
        }

        let now = self.clock.now();
        self.write_record(key, &LeaseRecord::new(key, None, now))?;
        self.log_event(
            &Event::new(EventAction::Release, now)
                .with_key(key)
                .with_previous(Some(expected)),
        );
        Ok(DeleteOutcome::Deleted)
    }
}

/// Read and decode a JSON file; `Ok(None)` if it does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(LeaseError::Transport(format!(
                "failed to read '{}': {}",
                path.display(),
                e
            )));
        }
    };

    serde_json::from_str(&content).map(Some).map_err(|e| {
        LeaseError::Transport(format!("failed to parse '{}': {}", path.display(), e))
    })
}
