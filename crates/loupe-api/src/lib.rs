//! # loupe-api
//!
//! HTTP surface of the Loupe search emulator.
//!
//! This crate exposes the hosted search service's classic REST endpoints
//! (`/1/indexes/...`) over the local document store:
//! - document save / replace / delete, batch mutations
//! - full-text and filtered queries
//! - cursor-based bulk enumeration (browse)
//! - point lookups
//!
//! Responses match the hosted shapes closely enough for unmodified client
//! libraries to operate against a local process.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cursor;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use error::{ApiError, Result};
pub use routes::{create_router, AppState};
pub use server::{Server, ServerConfig};
