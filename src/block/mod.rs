//! Block descriptors and caller-visible block views
//!
//! Every table access is mediated by a pair of objects:
//!
//! - A **descriptor** ([`BlockDescriptor`], [`CsrBlockDescriptor`]) owned by
//!   the caller and reused across acquire/release cycles. It carries the
//!   amortized scratch buffers (conversion targets, densification targets,
//!   host caches of device windows). Capacity grows geometrically and never
//!   shrinks implicitly; [`BlockDescriptor::reset`] releases it.
//! - A **view guard** ([`RowBlock`], [`RowBlockMut`], [`FeatureBlock`],
//!   [`CsrBlock`], [`CsrBlockMut`]) returned by an acquisition. The guard
//!   borrows the table and the descriptor, so a populated descriptor cannot
//!   be observed or reused until the guard is released (dropped). Write-back
//!   of converted or device-cached values happens at release.
//!
//! The guard either *aliases* table storage (zero-copy, same element type) or
//! points into the descriptor's scratch; callers cannot tell which, and must
//! not care.

mod descriptor;
mod view;

pub use descriptor::{BlockDescriptor, CsrBlockDescriptor};
pub use view::{CsrBlock, CsrBlockMut, FeatureBlock, RowBlock, RowBlockMut};

pub(crate) use descriptor::ensure_len;
pub(crate) use view::ValuesCommit;

/// Access intent recorded at acquisition time
///
/// Read-only releases discard the view; any write intent commits values back
/// to storage at release. The sparsity structure (column indices, row
/// offsets) is never writable regardless of mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadWriteMode {
    /// The caller only reads through the block
    ReadOnly,
    /// The caller overwrites every value; existing values are not read, so
    /// acquisition skips the up-cast of current storage contents
    WriteOnly,
    /// The caller reads and writes
    ReadWrite,
}

impl ReadWriteMode {
    /// Whether the caller may observe existing values
    #[inline]
    pub fn reads(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    /// Whether values are committed back to storage at release
    #[inline]
    pub fn writes(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flags() {
        assert!(ReadWriteMode::ReadOnly.reads());
        assert!(!ReadWriteMode::ReadOnly.writes());
        assert!(ReadWriteMode::WriteOnly.writes());
        assert!(!ReadWriteMode::WriteOnly.reads());
        assert!(ReadWriteMode::ReadWrite.reads() && ReadWriteMode::ReadWrite.writes());
    }
}
