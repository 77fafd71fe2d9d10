//! Object identifier utilities.
//!
//! The public `objectID` of a document and its internal store key are the
//! same string; when a caller saves a document without one, the service
//! mints a fresh v4 UUID and reports it back in the acknowledgment.

/// Generate a fresh, globally unique object identifier.
///
/// # Examples
///
/// ```
/// use loupe_core::util::ids::fresh_object_id;
///
/// let a = fresh_object_id();
/// let b = fresh_object_id();
/// assert_ne!(a, b);
/// assert_eq!(a.len(), 36);
/// ```
pub fn fresh_object_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Check that a caller-supplied index name is safe to use as a directory
/// name under the data root.
///
/// Rejects empty names and names that could escape the store directory.
pub fn valid_index_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

// ============================================================================
// Tests
// ============================================================================
