//! Configuration defaults and environment names.

/// Environment variable naming the store directory.
pub const STORE_DIR_ENV: &str = "LEASEHOLD_STORE";

/// Store directory used when neither `--store` nor the environment set one.
pub const DEFAULT_STORE_DIR: &str = ".leasehold";

/// File name of the config inside the store directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

// Default value functions for serde
pub(crate) fn default_ttl_ms() -> u64 {
    30_000
}
pub(crate) fn default_attribute() -> String {
    "holder".to_string()
}
pub(crate) fn default_lock_wait_ms() -> u64 {
    2_000
}
pub(crate) fn default_lock_retry_ms() -> u64 {
    10
}
pub(crate) fn default_lock_stale_ms() -> u64 {
    30_000
}
pub(crate) fn default_log_filter() -> String {
    "leasehold=warn".to_string()
}
