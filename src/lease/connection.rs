//! Store connections shared by lease handles.

use crate::error::Result;
use crate::store::ConditionalStore;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::info;

/// A shared handle on a store.
///
/// Clones share the store and the "operations installed" latch, so the
/// install check runs once per connection no matter how many lease handles
/// are created from it.
#[derive(Clone)]
pub struct Connection {
    store: Arc<dyn ConditionalStore>,
    installed: Arc<Mutex<bool>>,
}

impl Connection {
    pub fn new(store: Arc<dyn ConditionalStore>) -> Self {
        Self {
            store,
            installed: Arc::new(Mutex::new(false)),
        }
    }

    pub fn store(&self) -> &dyn ConditionalStore {
        self.store.as_ref()
    }

    /// Install the conditional operations unless this connection already
    /// saw them installed.
    ///
    /// The latch is held across the check so concurrent callers on one
    /// connection issue at most one install.
    pub fn ensure_installed(&self) -> Result<()> {
        let mut installed = self
            .installed
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        if *installed {
            return Ok(());
        }

        if !self.store.functions_installed()? {
            self.store.install_functions()?;
            info!("installed conditional operations");
        }

        *installed = true;
        Ok(())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
