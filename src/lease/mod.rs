//! Leases: time-bounded exclusive claims on a resource.
//!
//! A [`LeaseHandle`] binds one `(resource, attribute)` record and a TTL to a
//! [`Connection`]. It keeps the last token it was granted and offers two
//! operations:
//!
//! - `acquire()` takes a vacant or expired lease, or renews the handle's own
//!   lease, and returns a fresh fencing token with the time left on it.
//!   Losing the race is `Ok(None)`, not an error.
//! - `release()` clears the stored token if it is still ours and always
//!   forgets the local token.
//!
//! All exclusion is decided by the store; the handle never assumes it still
//! holds a lease between calls. Renewal cadence is the caller's business.
//!
//! ```no_run
//! use leasehold::lease::{Connection, LeaseHandle};
//! use leasehold::store::FileStore;
//! use std::sync::Arc;
//!
//! let connection = Connection::new(Arc::new(FileStore::open(".leasehold")?));
//! let lease = LeaseHandle::new("db-primary", "holder", &connection, 30_000)?;
//! if let Some(grant) = lease.acquire()? {
//!     println!("holding {} for {}ms", grant.token, grant.remaining_ms);
//!     lease.release()?;
//! }
//! # Ok::<(), leasehold::error::LeaseError>(())
//! ```

mod connection;
mod handle;
pub mod protocol;
mod state;


pub use connection::Connection;
pub use handle::{LeaseGrant, LeaseHandle};
pub use state::LocalLeaseState;
