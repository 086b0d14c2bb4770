//! Transaction log for the file-backed store.
//!
//! Every committed write appends one NDJSON line to `events.ndjson` in the
//! store directory. Lines are appended while the record lock is held, so the
//! log order for a given key matches its commit order.
//!
//! # Event Format
//!
//! - `ts`: store commit time (RFC3339)
//! - `action`: `install`, `acquire`, `renew`, `seize` or `release`
//! - `actor`: `user@HOST` of the writing process
//! - `resource` / `attribute`: the record written (absent for `install`)
//! - `token`: the token written (absent for `install` and `release`)
//! - `previous`: the holder token the write replaced or cleared

use crate::error::{LeaseError, Result};
use crate::locks::get_owner_string;
use crate::store::{GrantKind, LeaseKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use uuid::Uuid;

/// Kinds of committed writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Conditional operations installed
    Install,
    /// Vacant slot taken
    Acquire,
    /// Holder renewed its own lease
    Renew,
    /// Expired lease taken over
    Seize,
    /// Holder token cleared
    Release,
}

impl From<GrantKind> for EventAction {
    fn from(kind: GrantKind) -> Self {
        match kind {
            GrantKind::Vacant => EventAction::Acquire,
            GrantKind::Renewed => EventAction::Renew,
            GrantKind::Seized => EventAction::Seize,
        }
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Install => write!(f, "install"),
            EventAction::Acquire => write!(f, "acquire"),
            EventAction::Renew => write!(f, "renew"),
            EventAction::Seize => write!(f, "seize"),
            EventAction::Release => write!(f, "release"),
        }
    }
}

/// One line of the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,
    pub action: EventAction,
    pub actor: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Uuid>,
}

impl Event {
    /// Create an event committed at `ts` by the current process.
    pub fn new(action: EventAction, ts: DateTime<Utc>) -> Self {
        Self {
            ts,
            action,
            actor: get_owner_string(),
            resource: None,
            attribute: None,
            token: None,
            previous: None,
        }
    }

    pub fn with_key(mut self, key: &LeaseKey) -> Self {
        self.resource = Some(key.resource_id().to_string());
        self.attribute = Some(key.attribute().to_string());
        self
    }

    pub fn with_token(mut self, token: Uuid) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_previous(mut self, previous: Option<Uuid>) -> Self {
        self.previous = previous;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| LeaseError::Transport(format!("failed to serialize event: {}", e)))
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:<7} {}",
            self.ts.to_rfc3339(),
            self.action.to_string(),
            self.actor
        )?;
        if let (Some(resource), Some(attribute)) = (&self.resource, &self.attribute) {
            write!(f, " {}/{}", resource, attribute)?;
        }
        if let Some(token) = self.token {
            write!(f, " token={}", token)?;
        }
        if let Some(previous) = self.previous {
            write!(f, " previous={}", previous)?;
        }
        Ok(())
    }
}

/// Append an event to the log at `path`, creating the file if needed.
pub fn append_event(path: &Path, event: &Event) -> Result<()> {
    let json_line = event.to_ndjson_line()?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LeaseError::Transport(format!(
                "failed to open events file '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        LeaseError::Transport(format!(
            "failed to write event to '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        LeaseError::Transport(format!(
            "failed to sync events file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Read every event from the log at `path`. A missing log is empty.
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(LeaseError::Transport(format!(
                "failed to read events file '{}': {}",
                path.display(),
                e
            )));
        }
    };

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                LeaseError::Transport(format!(
                    "failed to parse event on line {} of '{}': {}",
                    i + 1,
                    path.display(),
                    e
                ))
            })
        })
        .collect()
}
