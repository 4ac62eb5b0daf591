//! Raw sparse-block acquisition: the zero-copy CSR fragment path

use super::core::{CsrTable, TableData};
use super::offset_window;
use crate::block::{ensure_len, CsrBlock, CsrBlockDescriptor, CsrBlockMut, ReadWriteMode, ValuesCommit};
use crate::dtype::{cast_fn, DType, Element};
use crate::error::{Error, Result};

impl CsrTable<'_> {
    /// Acquire the raw CSR fragment covering `nrows` rows from `rows_offset`.
    ///
    /// The fragment is self-contained: its row offsets are re-based so the
    /// first entry is 1, and its column indices keep the table's 1-based
    /// convention. With `T` equal to the storage type, values and column
    /// indices alias table storage with no copy (and for `rows_offset == 0`
    /// the row offsets do too); a differing `T` up-casts values into the
    /// descriptor. The range is clamped to the table edge; a start past the
    /// end yields a zero-row fragment.
    ///
    /// # Errors
    ///
    /// As for [`CsrTable::row_block`].
    pub fn sparse_block<'t, T: Element>(
        &'t self,
        rows_offset: usize,
        nrows: usize,
        desc: &'t mut CsrBlockDescriptor<T>,
    ) -> Result<CsrBlock<'t, T>> {
        self.require_one_based("sparse_block")?;
        let count = self.clamped_rows(rows_offset, nrows);
        if count == 0 {
            ensure_len(&mut desc.row_offsets, 1, 1u64)?;
            return Ok(CsrBlock::new(
                rows_offset,
                0,
                self.ncols,
                &[],
                &[],
                &desc.row_offsets[..1],
            ));
        }
        let sz = self.dtype.size_in_bytes();

        if let Some((vals, cols, offs)) = self.host_parts() {
            let (start, end) = offset_window(offs, rows_offset, rows_offset + count, cols.len())?;
            let n = end - start;

            let row_offsets: &[u64] = if rows_offset == 0 {
                &offs[..count + 1]
            } else {
                rebase(
                    &mut desc.row_offsets,
                    &offs[rows_offset..=rows_offset + count],
                )?;
                &desc.row_offsets[..count + 1]
            };
            let values: &[T] = if T::DTYPE == self.dtype {
                bytemuck::cast_slice(&vals[start * sz..end * sz])
            } else {
                ensure_len(&mut desc.values, n, T::zero())?;
                let up = cast_fn(self.dtype, T::DTYPE, "sparse_block")?;
                up(
                    &vals[start * sz..end * sz],
                    bytemuck::cast_slice_mut(&mut desc.values),
                );
                &desc.values[..n]
            };
            return Ok(CsrBlock::new(
                rows_offset,
                count,
                self.ncols,
                values,
                &cols[start..end],
                row_offsets,
            ));
        }

        // Device-resident: all three arrays are materialized into the
        // descriptor; the identity conversion lane covers the same-type copy.
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
        ensure_len(&mut desc.row_offsets, count + 1, 0)?;
        doffs.read(
            rows_offset * 8,
            bytemuck::cast_slice_mut(&mut desc.row_offsets),
        )?;
        let nnz = dvals.size_in_bytes() / sz;
        let (start, end) = offset_window(&desc.row_offsets, 0, count, nnz)?;
        let n = end - start;
        rebase_in_place(&mut desc.row_offsets);
        ensure_len(&mut desc.cols, n, 0)?;
        dcols.read(start * 8, bytemuck::cast_slice_mut(&mut desc.cols))?;
        desc.raw.resize_zeroed(n * sz)?;
        dvals.read(start * sz, desc.raw.as_bytes_mut())?;
        ensure_len(&mut desc.values, n, T::zero())?;
        let up = cast_fn(self.dtype, T::DTYPE, "sparse_block")?;
        up(
            desc.raw.as_bytes(),
            bytemuck::cast_slice_mut(&mut desc.values),
        );
        Ok(CsrBlock::new(
            rows_offset,
            count,
            self.ncols,
            &desc.values[..n],
            &desc.cols[..n],
            &desc.row_offsets[..count + 1],
        ))
    }

    /// Acquire a writable CSR fragment.
    ///
    /// Structure-preserving: only values can change; column indices and row
    /// offsets are exposed read-only, so the sparsity pattern cannot be
    /// edited through a block. With `T` equal to the storage type on a
    /// host-resident table, writes alias storage directly; otherwise the
    /// values live in the descriptor and are committed at release
    /// (down-cast into storage, or pushed back to the device). `mode`
    /// records the access intent: without [`ReadWriteMode::reads`] the
    /// buffer starts zeroed instead of being populated, and without
    /// [`ReadWriteMode::writes`] release commits nothing.
    ///
    /// Dropping the block commits best-effort; use [`CsrBlockMut::release`]
    /// to observe device write-back failures.
    ///
    /// # Errors
    ///
    /// As for [`CsrTable::row_block`].
    pub fn sparse_block_mut<'t, T: Element>(
        &'t mut self,
        rows_offset: usize,
        nrows: usize,
        mode: ReadWriteMode,
        desc: &'t mut CsrBlockDescriptor<T>,
    ) -> Result<CsrBlockMut<'t, T>> {
        self.require_one_based("sparse_block_mut")?;
        let count = self.clamped_rows(rows_offset, nrows);
        let ncols = self.ncols;
        let dtype = self.dtype;
        if count == 0 {
            ensure_len(&mut desc.row_offsets, 1, 1u64)?;
            return Ok(CsrBlockMut::new(
                rows_offset,
                0,
                ncols,
                mode,
                ValuesCommit::Alias(Default::default()),
                &[],
                &desc.row_offsets[..1],
            ));
        }

        match &mut self.data {
            TableData::Attached {
                values,
                col_indices,
                row_offsets,
            } => host_block_mut(
                &mut **values,
                &**col_indices,
                &**row_offsets,
                dtype,
                rows_offset,
                count,
                ncols,
                mode,
                desc,
            ),
            TableData::Owned {
                values,
                col_indices,
                row_offsets,
            } => host_block_mut(
                values.as_bytes_mut(),
                &col_indices[..],
                &row_offsets[..],
                dtype,
                rows_offset,
                count,
                ncols,
                mode,
                desc,
            ),
            TableData::Device {
                values: dvals,
                col_indices: dcols,
                row_offsets: doffs,
            } => {
                let sz = dtype.size_in_bytes();
                ensure_len(&mut desc.row_offsets, count + 1, 0)?;
                doffs.read(
                    rows_offset * 8,
                    bytemuck::cast_slice_mut(&mut desc.row_offsets),
                )?;
                let nnz = dvals.size_in_bytes() / sz;
                let (start, end) = offset_window(&desc.row_offsets, 0, count, nnz)?;
                let n = end - start;
                rebase_in_place(&mut desc.row_offsets);
                ensure_len(&mut desc.cols, n, 0)?;
                dcols.read(start * 8, bytemuck::cast_slice_mut(&mut desc.cols))?;
                desc.raw.resize_zeroed(n * sz)?;
                ensure_len(&mut desc.values, n, T::zero())?;
                if mode.reads() {
                    dvals.read(start * sz, desc.raw.as_bytes_mut())?;
                    let up = cast_fn(dtype, T::DTYPE, "sparse_block_mut")?;
                    up(
                        desc.raw.as_bytes(),
                        bytemuck::cast_slice_mut(&mut desc.values),
                    );
                }
                let down = if T::DTYPE == dtype {
                    None
                } else {
                    Some(cast_fn(T::DTYPE, dtype, "sparse_block_mut")?)
                };
                let commit = ValuesCommit::Device {
                    buf: &mut desc.values[..n],
                    raw: desc.raw.as_bytes_mut(),
                    dev: dvals.as_mut(),
                    byte_offset: start * sz,
                    down,
                };
                Ok(CsrBlockMut::new(
                    rows_offset,
                    count,
                    ncols,
                    mode,
                    commit,
                    &desc.cols[..n],
                    &desc.row_offsets[..count + 1],
                ))
            }
        }
    }
}

/// Re-base absolute 1-based offsets into `out` so the first entry is 1.
fn rebase(out: &mut Vec<u64>, offsets: &[u64]) -> Result<()> {
    ensure_len(out, offsets.len(), 0)?;
    let base = offsets[0];
    for (d, s) in out.iter_mut().zip(offsets) {
        *d = s.saturating_sub(base) + 1;
    }
    Ok(())
}

/// In-place variant for offsets already materialized into the descriptor.
fn rebase_in_place(offsets: &mut [u64]) {
    let base = offsets[0];
    for o in offsets.iter_mut() {
        *o = o.saturating_sub(base) + 1;
    }
}

#[allow(clippy::too_many_arguments)]
fn host_block_mut<'t, T: Element>(
    vals: &'t mut [u8],
    cols: &'t [u64],
    offs: &'t [u64],
    dtype: DType,
    rows_offset: usize,
    count: usize,
    ncols: usize,
    mode: ReadWriteMode,
    desc: &'t mut CsrBlockDescriptor<T>,
) -> Result<CsrBlockMut<'t, T>> {
    let sz = dtype.size_in_bytes();
    let (start, end) = offset_window(offs, rows_offset, rows_offset + count, cols.len())?;
    let n = end - start;

    let row_offsets: &[u64] = if rows_offset == 0 {
        &offs[..count + 1]
    } else {
        rebase(
            &mut desc.row_offsets,
            &offs[rows_offset..=rows_offset + count],
        )?;
        &desc.row_offsets[..count + 1]
    };

    let dest = &mut vals[start * sz..end * sz];
    let commit = if T::DTYPE == dtype {
        ValuesCommit::Alias(bytemuck::cast_slice_mut(dest))
    } else {
        ensure_len(&mut desc.values, n, T::zero())?;
        if mode.reads() {
            let up = cast_fn(dtype, T::DTYPE, "sparse_block_mut")?;
            up(dest, bytemuck::cast_slice_mut(&mut desc.values));
        }
        let down = cast_fn(T::DTYPE, dtype, "sparse_block_mut")?;
        ValuesCommit::Convert {
            buf: &mut desc.values[..n],
            dest,
            cast: down,
        }
    };
    Ok(CsrBlockMut::new(
        rows_offset,
        count,
        ncols,
        mode,
        commit,
        &cols[start..end],
        row_offsets,
    ))
}
