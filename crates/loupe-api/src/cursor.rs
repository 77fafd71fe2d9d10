//! Browse cursor engine.
//!
//! A cursor is the decimal string of a non-negative integer offset into the
//! index's stable enumeration order — nothing more. There is no server-side
//! session: any process over the same store can resume a browse from a
//! cursor another process issued. The engine is deterministic for an
//! unmutated index; no ordering is guaranteed under concurrent mutation.

use loupe_core::{Error, Result};

/// Fixed browse page size.
pub const PAGE_SIZE: usize = 1000;

/// Decode a cursor into an offset. Absent means "start from zero".
pub fn decode(cursor: Option<&str>) -> Result<usize> {
    match cursor {
        None => Ok(0),
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| Error::bad_request(format!("invalid cursor '{raw}'"))),
    }
}

/// Cursor for the page after `offset`, if any documents remain past it.
pub fn next(offset: usize, total: usize) -> Option<String> {
    let next_offset = offset + PAGE_SIZE;
    if next_offset < total {
        Some(next_offset.to_string())
    } else {
        None
    }
}

/// Zero-based page number for an offset.
pub fn page(offset: usize) -> usize {
    offset / PAGE_SIZE
}

/// Total number of pages for a document count.
pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE)
}

// ============================================================================
// Tests
// ============================================================================
