//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for a leasehold store directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lease defaults
    // =========================================================================
    /// TTL used when a command does not pass `--ttl-ms`.
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    /// Attribute used when a command does not pass `--attribute`.
    #[serde(default = "default_attribute")]
    pub default_attribute: String,

    // =========================================================================
    // Record lock settings
    // =========================================================================
    /// How long a conditional operation waits for a busy record lock.
    #[serde(default = "default_lock_wait_ms")]
    pub lock_wait_ms: u64,

    /// Pause between attempts on a busy record lock.
    #[serde(default = "default_lock_retry_ms")]
    pub lock_retry_ms: u64,

    /// Age after which a record lock is considered abandoned and broken.
    #[serde(default = "default_lock_stale_ms")]
    pub lock_stale_ms: u64,

    // =========================================================================
    // Logging
    // =========================================================================
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: default_ttl_ms(),
            default_attribute: default_attribute(),
            lock_wait_ms: default_lock_wait_ms(),
            lock_retry_ms: default_lock_retry_ms(),
            lock_stale_ms: default_lock_stale_ms(),
            log_filter: default_log_filter(),
        }
    }
}
