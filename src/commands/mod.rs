//! Command implementations for leasehold.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Commands report their own exit code so that "lease not
//! held" can exit non-zero without being an error.

mod hold;
mod inspect;
mod lease;

#[cfg(test)]
mod tests;

use crate::cli::{Cli, Command, LeaseTarget};
use crate::config::Config;
use crate::config::types::CONFIG_FILE_NAME;
use crate::error::{LeaseError, Result};
use crate::lease::{Connection, LeaseHandle};
use crate::store::FileStore;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Everything a command needs: the opened store and its config.
pub struct StoreContext {
    pub config: Config,
    pub store: Arc<FileStore>,
    pub connection: Connection,
}

impl StoreContext {
    /// Open the store at `dir` with an already loaded `config`.
    pub fn open(dir: &Path, config: Config) -> Result<Self> {
        let store = Arc::new(FileStore::open(dir)?.with_lock_policy(config.lock_policy()));
        let connection = Connection::new(store.clone());

        Ok(Self {
            config,
            store,
            connection,
        })
    }

    fn attribute<'a>(&'a self, target: &'a LeaseTarget) -> &'a str {
        target
            .attribute
            .as_deref()
            .unwrap_or(&self.config.default_attribute)
    }

    fn ttl_ms(&self, ttl_ms: Option<u64>) -> u64 {
        ttl_ms.unwrap_or(self.config.default_ttl_ms)
    }

    /// Build a handle for `target`, optionally resuming `token`.
    fn handle(
        &self,
        target: &LeaseTarget,
        ttl_ms: Option<u64>,
        token: Option<Uuid>,
    ) -> Result<LeaseHandle> {
        Ok(LeaseHandle::new(
            target.resource.as_str(),
            self.attribute(target),
            &self.connection,
            self.ttl_ms(ttl_ms),
        )?
        .with_token(token))
    }
}

/// Read the store's config file, falling back to defaults.
pub fn load_config(dir: &Path) -> Result<Config> {
    Config::load_or_default(dir.join(CONFIG_FILE_NAME))
}

/// Dispatch a command to its implementation and return the exit code.
///
/// Command output goes to `out`; diagnostics go through `tracing`.
pub fn dispatch(cli: Cli, config: Config, out: &mut dyn Write) -> Result<i32> {
    let ctx = StoreContext::open(&cli.store, config)?;

    match cli.command {
        Command::Install => lease::cmd_install(&ctx, out),
        Command::Acquire(args) => lease::cmd_acquire(&ctx, args, out),
        Command::Release(args) => lease::cmd_release(&ctx, args, out),
        Command::Status(args) => inspect::cmd_status(&ctx, args, out),
        Command::History(args) => inspect::cmd_history(&ctx, args, out),
        Command::Hold(args) => hold::cmd_hold(&ctx, args, out),
    }
}

/// Write one line of command output.
fn emit(out: &mut dyn Write, line: impl std::fmt::Display) -> Result<()> {
    writeln!(out, "{}", line)
        .map_err(|e| LeaseError::UserError(format!("failed to write output: {}", e)))
}

/// Serialize `value` as one line of JSON output.
fn emit_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)
        .map_err(|e| LeaseError::UserError(format!("failed to serialize output: {}", e)))?;
    emit(out, json)
}
