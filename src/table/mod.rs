//! CSR numeric table and its blocked-access operations
//!
//! [`CsrTable`] is the persistent entity of the crate: three parallel arrays
//! (values, column indices, row offsets), the dense shape, the index-base
//! convention, and an ownership tag. All consumption happens through the
//! block acquisitions defined in the sibling files:
//!
//! - `row_block` / `row_block_mut` — dense row-major views (`row_block.rs`)
//! - `feature_block` — one dense column over a row range (`feature.rs`)
//! - `sparse_block` / `sparse_block_mut` — the raw CSR fragment
//!   (`sparse_block.rs`)
//! - `serialize` / `deserialize` — the persistence byte layout
//!   (`serialize.rs`)

mod core;
mod feature;
mod row_block;
mod serialize;
mod sparse_block;

pub use self::core::{CsrIndexing, CsrTable, MemoryOwnership};

use crate::error::{Error, Result};

/// Value-array window `[start, end)` covered by rows `[lo, hi]` of a 1-based
/// offset array.
///
/// The two endpoint offsets are validated against the non-zero count; offsets
/// between them are the caller's precondition and are clamped by the access
/// paths instead.
pub(crate) fn offset_window(
    row_offsets: &[u64],
    lo: usize,
    hi: usize,
    nnz: usize,
) -> Result<(usize, usize)> {
    let bound = |i: usize| -> Result<usize> {
        let off = row_offsets[i];
        match off.checked_sub(1) {
            Some(o) if o as usize <= nnz => Ok(o as usize),
            _ => Err(Error::IndexOutOfBounds {
                index: off as usize,
                size: nnz + 1,
            }),
        }
    };
    let start = bound(lo)?;
    let end = bound(hi)?;
    if start > end {
        return Err(Error::IndexOutOfBounds {
            index: start,
            size: end,
        });
    }
    Ok((start, end))
}
