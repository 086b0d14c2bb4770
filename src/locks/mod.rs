//! Record locks for the file-backed store.
//!
//! A record lock turns "read record, decide, write record" into a single
//! critical section across processes. Lock files live under
//! `<store>/locks/<resource>/<attribute>.lock` and are created with
//! **create_new** semantics, so exactly one process holds a given lock.
//!
//! # Lock Metadata
//!
//! Each lock file contains JSON metadata:
//! - `owner`: `user@HOST` of the holder
//! - `pid`: the holder's process ID
//! - `created_at`: RFC3339 timestamp
//! - `operation`: the conditional operation being executed
//!
//! # Stale Locks
//!
//! A holder that crashes inside the critical section leaves its lock file
//! behind. Locks older than the policy's stale threshold are broken by the
//! next acquirer. Critical sections only read and write one small file, so
//! the threshold can be far larger than any legitimate hold time.
//!
//! Guards release the lock when dropped; a failed removal is logged and
//! otherwise ignored.

mod guard;
mod metadata;
mod operations;


pub use guard::LockGuard;
pub use metadata::LockMetadata;
pub(crate) use metadata::get_owner_string;
pub use operations::{LockPolicy, acquire_record_lock};
