//! Error types for loupe-core.
//!
//! Every Loupe crate funnels its failures into [`Error`]. The variants mirror
//! the three conditions the HTTP surface distinguishes — "not found",
//! "client mistake", and "everything else" — plus the parse and I/O sources
//! that feed them.

use std::path::Path;

use thiserror::Error;

/// Result type alias for Loupe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur across the Loupe crates.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An index or document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller supplied an invalid request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A filter or cursor failed to parse.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A failure inside the underlying document store.
    #[error("Store error: {0}")]
    Store(String),

    /// An I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The underlying I/O error.
        source: std::io::Error,
        /// The path the operation touched.
        path: String,
    },
}

impl Error {
    /// Build a [`Error::NotFound`].
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`Error::BadRequest`].
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Build a [`Error::Parse`].
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`Error::Store`].
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Build a [`Error::Io`] carrying the path that failed.
    pub fn io_with_path(source: std::io::Error, path: &Path) -> Self {
        Self::Io {
            source,
            path: path.display().to_string(),
        }
    }

    /// Whether this error is an absence condition.
    ///
    /// Delete paths treat absence as success; this predicate is how they
    /// decide which store failures to swallow.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_predicate() {
        assert!(Error::not_found("doc x").is_not_found());
        assert!(!Error::bad_request("nope").is_not_found());
        assert!(!Error::store("disk on fire").is_not_found());
    }

    #[test]
    fn test_display_includes_message() {
        let err = Error::bad_request("unsupported action");
        assert_eq!(err.to_string(), "Bad request: unsupported action");
    }

    #[test]
    fn test_io_with_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::io_with_path(io, Path::new("/data/.loupe/movies"));
        assert!(err.to_string().contains("/data/.loupe/movies"));
    }
}
