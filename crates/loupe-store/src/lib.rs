//! On-disk per-index document store for Loupe (Tantivy backend).
//!
//! This crate is the storage layer of the emulator: schemaless JSON
//! documents keyed by `objectID`, one persistent Tantivy index per logical
//! index, a process-wide registry of handles, and query composition.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        loupe-store                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  StoreRegistry (one cached IndexStore per index name)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  IndexStore (put / delete / reset / search / enumerate)     │
//! │  QuerySpec + compose (term + filters + facetFilters)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  StoreSchema (fixed 5-field layout over schemaless JSON)    │
//! │  StoredDocument (objectID ↔ internal key envelope)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Durability contract
//!
//! Every mutation commits the Tantivy index and reloads the reader before
//! returning: when a call comes back `Ok`, the write is on disk and visible
//! to the next search. This is what lets the HTTP layer acknowledge
//! mutations synchronously.
//!
//! # Example
//!
//! ```rust,ignore
//! use loupe_store::{QuerySpec, StoreRegistry, StoredDocument};
//!
//! let registry = StoreRegistry::new("/var/data");
//! let store = registry.get("movies").await?;
//!
//! store.put(&[StoredDocument::from_public(fields)]).await?;
//!
//! let spec = QuerySpec { query: Some("alien".into()), ..Default::default() };
//! for hit in store.search(&spec)? {
//!     println!("{}", hit.id);
//! }
//! ```

pub mod document;
pub mod index;
pub mod query;
pub mod registry;
pub mod schema;

// Re-exports
pub use document::{StoredDocument, OBJECT_ID};
pub use index::IndexStore;
pub use query::{FacetFilter, FacetFilters, QuerySpec};
pub use registry::{StoreRegistry, STORE_DIR};
pub use schema::StoreSchema;
