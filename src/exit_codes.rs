//! Exit code constants for the leasehold CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, invalid key)
//! - 2: Lease not held (lost the race, or the safety margin ran out)
//! - 3: Store failure (unreachable, busy, corrupt, functions missing)
//! - 4: Token collision (generated token equals the stored one)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration or key.
pub const USER_ERROR: i32 = 1;

/// The lease is held by someone else (or was not obtained in time).
pub const NOT_HELD: i32 = 2;

/// Store failure: I/O, busy record lock, missing conditional operations.
pub const STORE_FAILURE: i32 = 3;

/// A freshly generated token collided with the stored holder token.
pub const TOKEN_COLLISION: i32 = 4;
