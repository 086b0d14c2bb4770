//! Configuration model for leasehold.
//!
//! This module defines the Config struct that represents
//! `<store_dir>/config.yaml`. Parsing is forward-compatible (unknown fields
//! are ignored), every field has a default, and values are validated on load.

mod model;
mod operations;
pub mod types;


pub use model::Config;
