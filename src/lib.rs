//! Leasehold: time-bounded exclusive leases built on a store's atomic
//! conditional writes.
//!
//! Independent processes agree on who holds a resource by racing
//! conditional writes against one record per `(resource, attribute)`. The
//! store's own clock timestamps every write; a lease nobody renews within
//! its TTL may be seized by anyone. See [`lease`] for the client side and
//! [`store`] for the store boundary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod lease;
pub mod locks;
pub mod logging;
pub mod store;

#[cfg(test)]
mod test_support;

pub use error::{LeaseError, Result};
pub use lease::{Connection, LeaseGrant, LeaseHandle};
