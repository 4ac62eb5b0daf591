//! Dense row-block acquisition: densifying scatter and the aliasing fast path

use super::core::{CsrTable, TableData};
use super::offset_window;
use crate::block::{ensure_len, BlockDescriptor, RowBlock, RowBlockMut};
use crate::dtype::{cast_fn, Element};
use crate::error::{Error, Result};

impl CsrTable<'_> {
    /// Acquire a dense, row-major view of `nrows` rows starting at
    /// `rows_offset`.
    ///
    /// Absent sparse entries read as the numeric zero of `T`. The requested
    /// range is clamped to the table edge; a start at or past the end yields
    /// an empty block (see [`RowBlock::is_empty`]). When `T` matches the
    /// storage type and a single requested row is already dense and
    /// column-sequential, the view aliases table storage with no copy;
    /// otherwise the values are (up-cast and) scattered into the descriptor's
    /// buffer. Dropping the block releases it; re-acquiring through the same
    /// descriptor reuses its capacity.
    ///
    /// # Errors
    ///
    /// `UnsupportedIndexing` for 0-based tables, `UnsupportedDType` when no
    /// conversion lane exists for `T`, `OutOfMemory` when the dense buffer
    /// cannot be grown, `IndexOutOfBounds` when the endpoint row offsets are
    /// corrupt, `DeviceTransfer` when a device read fails.
    pub fn row_block<'t, T: Element>(
        &'t self,
        rows_offset: usize,
        nrows: usize,
        desc: &'t mut BlockDescriptor<T>,
    ) -> Result<RowBlock<'t, T>> {
        self.require_one_based("row_block")?;
        let count = self.clamped_rows(rows_offset, nrows);
        if count == 0 {
            return Ok(RowBlock::new(rows_offset, 0, self.ncols, &[]));
        }
        let total = count
            .checked_mul(self.ncols)
            .ok_or(Error::OutOfMemory { size: usize::MAX })?;
        let sz = self.dtype.size_in_bytes();

        if let Some((vals, cols, offs)) = self.host_parts() {
            let (start, end) = offset_window(offs, rows_offset, rows_offset + count, cols.len())?;

            // Aliasing fast path: one requested row, already dense and
            // column-sequential, stored as the requested type.
            if T::DTYPE == self.dtype && count == 1 && end - start == self.ncols {
                let seg = &cols[start..end];
                if seg.iter().enumerate().all(|(i, &c)| c == i as u64 + 1) {
                    let typed: &[T] = bytemuck::cast_slice(&vals[start * sz..end * sz]);
                    return Ok(RowBlock::new(rows_offset, 1, self.ncols, typed));
                }
            }

            ensure_len(&mut desc.buf, total, T::zero())?;
            ensure_len(&mut desc.stage, end - start, T::zero())?;
            let up = cast_fn(self.dtype, T::DTYPE, "row_block")?;
            up(
                &vals[start * sz..end * sz],
                bytemuck::cast_slice_mut(&mut desc.stage),
            );
            scatter_rows(
                &mut desc.buf,
                &desc.stage,
                &cols[start..end],
                &offs[rows_offset..=rows_offset + count],
                start,
                end,
                self.ncols,
            );
            return Ok(RowBlock::new(rows_offset, count, self.ncols, &desc.buf[..total]));
        }

        // Device-resident: materialize the offset, column, and value windows
        // into the descriptor caches, then densify as on the host.
        let TableData::Device {
            values: dvals,
            col_indices: dcols,
            row_offsets: doffs,
        } = &self.data
        else {
            return Err(Error::DeviceTransfer {
                reason: "table has no host-resident arrays".to_string(),
            });
        };
        ensure_len(&mut desc.offsets, count + 1, 0)?;
        doffs.read(rows_offset * 8, bytemuck::cast_slice_mut(&mut desc.offsets))?;
        let nnz = dvals.size_in_bytes() / sz;
        let (start, end) = offset_window(&desc.offsets, 0, count, nnz)?;
        let n = end - start;
        ensure_len(&mut desc.cols, n, 0)?;
        dcols.read(start * 8, bytemuck::cast_slice_mut(&mut desc.cols))?;
        desc.raw.resize_zeroed(n * sz)?;
        dvals.read(start * sz, desc.raw.as_bytes_mut())?;

        ensure_len(&mut desc.buf, total, T::zero())?;
        ensure_len(&mut desc.stage, n, T::zero())?;
        let up = cast_fn(self.dtype, T::DTYPE, "row_block")?;
        up(desc.raw.as_bytes(), bytemuck::cast_slice_mut(&mut desc.stage));
        scatter_rows(
            &mut desc.buf,
            &desc.stage,
            &desc.cols,
            &desc.offsets,
            start,
            end,
            self.ncols,
        );
        Ok(RowBlock::new(rows_offset, count, self.ncols, &desc.buf[..total]))
    }

    /// Acquire a writable dense view of a single storage-aliased row.
    ///
    /// A densifying scatter cannot be losslessly written back to sparse
    /// storage, so a writable row block exists only when the view can alias
    /// storage directly: `T` is the storage type, exactly one row is
    /// requested, and that row is dense with sequential column indices.
    /// Writes land in table memory immediately; dropping the block is the
    /// release. A start past the table edge yields an empty block.
    ///
    /// # Errors
    ///
    /// `StructuralWrite` when the row cannot alias storage (sparse or
    /// permuted row, multi-row request, device-resident table);
    /// `UnsupportedDType` when `T` is not the storage type;
    /// `UnsupportedIndexing` and `IndexOutOfBounds` as for
    /// [`CsrTable::row_block`].
    pub fn row_block_mut<'t, T: Element>(
        &'t mut self,
        rows_offset: usize,
        nrows: usize,
    ) -> Result<RowBlockMut<'t, T>> {
        self.require_one_based("row_block_mut")?;
        if T::DTYPE != self.dtype {
            return Err(Error::UnsupportedDType {
                dtype: T::DTYPE,
                op: "row_block_mut",
            });
        }
        let ncols = self.ncols;
        let count = self.clamped_rows(rows_offset, nrows);
        if count == 0 {
            return Ok(RowBlockMut::new(rows_offset, 0, ncols, Default::default()));
        }
        if count != 1 {
            return Err(Error::StructuralWrite {
                op: "row_block_mut over more than one row",
            });
        }
        let sz = self.dtype.size_in_bytes();
        let Some((vals, cols, offs)) = self.host_parts_mut() else {
            return Err(Error::StructuralWrite {
                op: "row_block_mut on a device-resident table",
            });
        };
        let (start, end) = offset_window(offs, rows_offset, rows_offset + 1, cols.len())?;
        let dense = end - start == ncols
            && cols[start..end].iter().enumerate().all(|(i, &c)| c == i as u64 + 1);
        if !dense {
            return Err(Error::StructuralWrite {
                op: "row_block_mut on a row that is not dense and column-sequential",
            });
        }
        let bytes = &mut vals[start * sz..end * sz];
        Ok(RowBlockMut::new(
            rows_offset,
            1,
            ncols,
            bytemuck::cast_slice_mut(bytes),
        ))
    }
}

/// Scatter a staged value window into a zeroed dense `rows × ncols` buffer.
///
/// `offsets` holds the `rows + 1` absolute 1-based offsets of the window;
/// `stage` and `cols` are window-local (index `k - start`). Row segments are
/// clamped into the window and out-of-range column indices are skipped, so a
/// table violating the construction preconditions degrades to dropped entries
/// rather than a panic.
fn scatter_rows<T: Element>(
    buf: &mut [T],
    stage: &[T],
    cols: &[u64],
    offsets: &[u64],
    start: usize,
    end: usize,
    ncols: usize,
) {
    for r in 0..offsets.len() - 1 {
        let rs = (offsets[r] as usize).saturating_sub(1).clamp(start, end);
        let re = (offsets[r + 1] as usize).saturating_sub(1).clamp(rs, end);
        for k in rs..re {
            let Some(c) = (cols[k - start] as usize).checked_sub(1) else {
                continue;
            };
            if c < ncols {
                buf[r * ncols + c] = stage[k - start];
            }
        }
    }
}
