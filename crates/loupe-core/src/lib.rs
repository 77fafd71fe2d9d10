//! Loupe Core — shared errors and utilities.
//!
//! This crate provides the foundational types used across all Loupe crates.
//! It has no internal Loupe dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`util`]: Object-id and index-name utilities

pub mod error;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};

// Convenience re-exports from util
pub use util::ids::{fresh_object_id, valid_index_name};
