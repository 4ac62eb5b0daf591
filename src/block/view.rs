//! Caller-visible block views returned by acquisitions
//!
//! A view guard borrows the table (and its descriptor) for the duration of
//! one acquire/release cycle. Releasing is dropping the guard; mutable CSR
//! views additionally offer an explicit [`CsrBlockMut::release`] that
//! surfaces device write-back failures.

use super::ReadWriteMode;
use crate::device::DeviceMemory;
use crate::dtype::{CastFn, Element};
use crate::error::Result;

/// Dense, row-major view of a contiguous row range.
///
/// `nrows() * ncols()` elements; absent sparse entries read as the numeric
/// zero of the requested type. Obtained from read-only acquisition; the
/// buffer may alias table storage or live in the descriptor.
#[derive(Debug)]
pub struct RowBlock<'a, T: Element> {
    rows_offset: usize,
    nrows: usize,
    ncols: usize,
    values: &'a [T],
}

impl<'a, T: Element> RowBlock<'a, T> {
    pub(crate) fn new(rows_offset: usize, nrows: usize, ncols: usize, values: &'a [T]) -> Self {
        debug_assert_eq!(values.len(), nrows * ncols);
        Self {
            rows_offset,
            nrows,
            ncols,
            values,
        }
    }

    /// First table row covered by this block
    pub fn rows_offset(&self) -> usize {
        self.rows_offset
    }

    /// Number of rows in the block (zero for out-of-range acquisitions)
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns (the table's full width)
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// True when the acquisition started at or past the end of the table
    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    /// The dense row-major buffer
    pub fn values(&self) -> &[T] {
        self.values
    }

    /// One row of the block
    pub fn row(&self, i: usize) -> &[T] {
        &self.values[i * self.ncols..(i + 1) * self.ncols]
    }
}

/// Mutable dense view of a single storage-aliased row.
///
/// Only exists when the descriptor aliases table storage directly (same
/// element type, row already dense), because a densifying scatter cannot be
/// losslessly written back. Writes land in storage immediately; release is
/// bookkeeping only.
#[derive(Debug)]
pub struct RowBlockMut<'a, T: Element> {
    rows_offset: usize,
    nrows: usize,
    ncols: usize,
    values: &'a mut [T],
}

impl<'a, T: Element> RowBlockMut<'a, T> {
    pub(crate) fn new(
        rows_offset: usize,
        nrows: usize,
        ncols: usize,
        values: &'a mut [T],
    ) -> Self {
        Self {
            rows_offset,
            nrows,
            ncols,
            values,
        }
    }

    /// First table row covered by this block
    pub fn rows_offset(&self) -> usize {
        self.rows_offset
    }

    /// Number of rows in the block
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// The aliased values
    pub fn values(&self) -> &[T] {
        self.values
    }

    /// The aliased values, writable
    pub fn values_mut(&mut self) -> &mut [T] {
        self.values
    }
}

/// Dense view of one feature (column) over a row range.
///
/// One value per row, zero for rows with no stored entry at that feature.
#[derive(Debug)]
pub struct FeatureBlock<'a, T: Element> {
    feature_index: usize,
    rows_offset: usize,
    values: &'a [T],
}

impl<'a, T: Element> FeatureBlock<'a, T> {
    pub(crate) fn new(feature_index: usize, rows_offset: usize, values: &'a [T]) -> Self {
        Self {
            feature_index,
            rows_offset,
            values,
        }
    }

    /// The extracted feature (0-based column position)
    pub fn feature_index(&self) -> usize {
        self.feature_index
    }

    /// First table row covered
    pub fn rows_offset(&self) -> usize {
        self.rows_offset
    }

    /// Number of rows covered
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the acquisition started past the end of the table
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// One value per row
    pub fn values(&self) -> &[T] {
        self.values
    }
}

/// Read-only CSR fragment: values, column indices, re-based row offsets.
///
/// The fragment is self-contained: `row_offsets()[0] == 1` and column
/// indices keep the table's 1-based convention. Values and column indices
/// alias table storage whenever the requested type matches.
#[derive(Debug)]
pub struct CsrBlock<'a, T: Element> {
    rows_offset: usize,
    nrows: usize,
    ncols: usize,
    values: &'a [T],
    col_indices: &'a [u64],
    row_offsets: &'a [u64],
}

impl<'a, T: Element> CsrBlock<'a, T> {
    pub(crate) fn new(
        rows_offset: usize,
        nrows: usize,
        ncols: usize,
        values: &'a [T],
        col_indices: &'a [u64],
        row_offsets: &'a [u64],
    ) -> Self {
        debug_assert_eq!(values.len(), col_indices.len());
        debug_assert_eq!(row_offsets.len(), nrows + 1);
        Self {
            rows_offset,
            nrows,
            ncols,
            values,
            col_indices,
            row_offsets,
        }
    }

    /// First table row covered
    pub fn rows_offset(&self) -> usize {
        self.rows_offset
    }

    /// Number of rows in the fragment
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns (the table's full width)
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Stored non-zeros in the fragment
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Non-zero values
    pub fn values(&self) -> &[T] {
        self.values
    }

    /// 1-based column indices, parallel to `values`
    pub fn col_indices(&self) -> &[u64] {
        self.col_indices
    }

    /// Re-based row offsets (`nrows + 1` entries, first is 1)
    pub fn row_offsets(&self) -> &[u64] {
        self.row_offsets
    }
}

/// How mutated values travel back to table storage at release.
pub(crate) enum ValuesCommit<'a, T: Element> {
    /// Same element type, host storage: the slice is the storage; writes are
    /// already in place.
    Alias(&'a mut [T]),
    /// Conversion buffer; `cast` down-converts it into the storage slice.
    Convert {
        buf: &'a mut [T],
        dest: &'a mut [u8],
        cast: CastFn,
    },
    /// Host cache of a device window; `raw` is the byte staging pushed back
    /// through `dev` at `byte_offset`. `down` converts when the requested
    /// type differs from storage.
    Device {
        buf: &'a mut [T],
        raw: &'a mut [u8],
        dev: &'a mut dyn DeviceMemory,
        byte_offset: usize,
        down: Option<CastFn>,
    },
}

/// Writable CSR fragment.
///
/// Structure-preserving: only values are writable; column indices and row
/// offsets stay read-only. With matching element types writes alias storage
/// directly; otherwise (conversion or device-resident storage) the values
/// live in the descriptor and are committed at release.
///
/// Dropping the block commits host write-backs infallibly and device
/// write-backs best-effort; call [`CsrBlockMut::release`] to observe device
/// transfer failures.
pub struct CsrBlockMut<'a, T: Element> {
    rows_offset: usize,
    nrows: usize,
    ncols: usize,
    mode: ReadWriteMode,
    commit: ValuesCommit<'a, T>,
    col_indices: &'a [u64],
    row_offsets: &'a [u64],
    released: bool,
}

impl<'a, T: Element> CsrBlockMut<'a, T> {
    pub(crate) fn new(
        rows_offset: usize,
        nrows: usize,
        ncols: usize,
        mode: ReadWriteMode,
        commit: ValuesCommit<'a, T>,
        col_indices: &'a [u64],
        row_offsets: &'a [u64],
    ) -> Self {
        Self {
            rows_offset,
            nrows,
            ncols,
            mode,
            commit,
            col_indices,
            row_offsets,
            released: false,
        }
    }

    /// First table row covered
    pub fn rows_offset(&self) -> usize {
        self.rows_offset
    }

    /// Number of rows in the fragment
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns (the table's full width)
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Access intent recorded at acquisition
    pub fn mode(&self) -> ReadWriteMode {
        self.mode
    }

    /// Stored non-zeros in the fragment
    pub fn nnz(&self) -> usize {
        self.values().len()
    }

    /// Non-zero values
    pub fn values(&self) -> &[T] {
        match &self.commit {
            ValuesCommit::Alias(b) => b,
            ValuesCommit::Convert { buf, .. } => buf,
            ValuesCommit::Device { buf, .. } => buf,
        }
    }

    /// Non-zero values, writable
    pub fn values_mut(&mut self) -> &mut [T] {
        match &mut self.commit {
            ValuesCommit::Alias(b) => b,
            ValuesCommit::Convert { buf, .. } => buf,
            ValuesCommit::Device { buf, .. } => buf,
        }
    }

    /// 1-based column indices, parallel to `values` (read-only)
    pub fn col_indices(&self) -> &[u64] {
        self.col_indices
    }

    /// Re-based row offsets (read-only)
    pub fn row_offsets(&self) -> &[u64] {
        self.row_offsets
    }

    /// Commit values back to storage and consume the block.
    ///
    /// Down-casts the conversion buffer into the storage slice when the
    /// requested type differed from storage, and pushes device caches back to
    /// the device. Without write intent this is bookkeeping only.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.commit_now()
    }

    fn commit_now(&mut self) -> Result<()> {
        if !self.mode.writes() {
            return Ok(());
        }
        match &mut self.commit {
            ValuesCommit::Alias(_) => Ok(()),
            ValuesCommit::Convert { buf, dest, cast } => {
                cast(bytemuck::cast_slice(buf), dest);
                Ok(())
            }
            ValuesCommit::Device {
                buf,
                raw,
                dev,
                byte_offset,
                down,
            } => {
                let host: &[u8] = bytemuck::cast_slice(buf);
                match down {
                    Some(cast) => cast(host, raw),
                    None => raw.copy_from_slice(host),
                }
                dev.write(*byte_offset, raw)
            }
        }
    }
}

impl<T: Element> Drop for CsrBlockMut<'_, T> {
    fn drop(&mut self) {
        if !self.released {
            // Device write-back failures are only observable via release().
            let _ = self.commit_now();
        }
    }
}
