//! Error types for leasehold.
//!
//! Losing a race for a lease is not represented here: that is a normal
//! outcome (`SetOutcome::NotExpired`) and never surfaces as an error.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for lease and store operations.
#[derive(Error, Debug)]
pub enum LeaseError {
    /// The generated token is equal to the token currently stored.
    #[error("new token {0} collides with the stored holder token")]
    InvalidNewValue(uuid::Uuid),

    /// The store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Reading, writing or decoding store data failed.
    #[error("store transport error: {0}")]
    Transport(String),

    /// A conditional operation was invoked before being installed.
    #[error("conditional operation '{0}' is not installed in the store")]
    FunctionNotInstalled(String),

    /// Resource id or attribute cannot be used as a record key.
    #[error("invalid lease key: {0}")]
    InvalidKey(String),

    /// Bad arguments or configuration.
    #[error("{0}")]
    UserError(String),
}

impl LeaseError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LeaseError::InvalidNewValue(_) => exit_codes::TOKEN_COLLISION,
            LeaseError::StoreUnavailable(_) => exit_codes::STORE_FAILURE,
            LeaseError::Transport(_) => exit_codes::STORE_FAILURE,
            LeaseError::FunctionNotInstalled(_) => exit_codes::STORE_FAILURE,
            LeaseError::InvalidKey(_) => exit_codes::USER_ERROR,
            LeaseError::UserError(_) => exit_codes::USER_ERROR,
        }
    }
}

/// Result type alias for leasehold operations.
pub type Result<T> = std::result::Result<T, LeaseError>;
