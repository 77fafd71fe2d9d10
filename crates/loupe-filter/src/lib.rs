//! Filter-expression compiler for Loupe.
//!
//! The hosted search service accepts boolean filter strings alongside
//! free-text queries:
//!
//! ```text
//! genre:horror AND (lang:en OR lang:fr) AND year >= 2004 AND NOT vhs:true
//! ```
//!
//! This crate turns such a string into an executable [`tantivy::query::Query`]
//! against the JSON attributes field of a document store. Compilation is pure:
//! given the same field and input it always produces the same query, and it
//! never mutates the index. Malformed input fails with
//! [`loupe_core::Error::Parse`].
//!
//! # Pipeline
//!
//! ```text
//! input string ──lexer──► tokens ──parser──► FilterExpr ──compile──► Query
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use loupe_filter::compile;
//!
//! let query = compile(attrs_field, "genre:horror AND year >= 2004")?;
//! searcher.search(&*query, &collector)?;
//! ```

pub mod ast;
pub mod compile;
pub mod lexer;
pub mod parser;

// Re-exports
pub use ast::{CmpOp, FilterExpr, FilterValue};
pub use compile::compile;
pub use parser::parse;
