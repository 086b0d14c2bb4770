//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{LeaseError, Result};
use crate::locks::LockPolicy;
use crate::store::LeaseKey;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(LeaseError::UserError)` - Read, parse or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LeaseError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from `path`, or use defaults if the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match std::fs::metadata(path.as_ref()) {
            Ok(_) => Self::load(path),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(LeaseError::UserError(format!(
                "failed to stat config file '{}': {}",
                path.as_ref().display(),
                e
            ))),
        }
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| LeaseError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            LeaseError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - every duration must be greater than 0
    /// - `lock_retry_ms` must not exceed `lock_wait_ms`
    /// - `default_attribute` must be a valid key part
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("default_ttl_ms", self.default_ttl_ms),
            ("lock_wait_ms", self.lock_wait_ms),
            ("lock_retry_ms", self.lock_retry_ms),
            ("lock_stale_ms", self.lock_stale_ms),
        ] {
            if value == 0 {
                return Err(LeaseError::UserError(format!(
                    "config validation failed: {} must be greater than 0",
                    name
                )));
            }
        }

        if self.lock_retry_ms > self.lock_wait_ms {
            return Err(LeaseError::UserError(format!(
                "config validation failed: lock_retry_ms ({}) must not exceed lock_wait_ms ({})",
                self.lock_retry_ms, self.lock_wait_ms
            )));
        }

        LeaseKey::new("config-check", self.default_attribute.as_str()).map_err(|e| {
            LeaseError::UserError(format!("config validation failed: default_attribute: {}", e))
        })?;

        Ok(())
    }

    /// Record lock policy for the file store.
    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy {
            wait: Duration::from_millis(self.lock_wait_ms),
            retry: Duration::from_millis(self.lock_retry_ms),
            stale: Duration::from_millis(self.lock_stale_ms),
        }
    }
}
