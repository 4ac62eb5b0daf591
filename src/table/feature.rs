//! Single-feature (column) extraction over a row range

use super::core::{CsrTable, TableData};
use super::offset_window;
use crate::block::{ensure_len, BlockDescriptor, FeatureBlock};
use crate::dtype::{element_as_f64, Element};
use crate::error::{Error, Result};

impl CsrTable<'_> {
    /// Acquire one dense column over `nrows` rows starting at `rows_offset`.
    ///
    /// `feature_index` is the 0-based column position; the result holds one
    /// value per row, zero for rows with no stored entry at that column.
    /// Each row's sparse segment is scanned linearly, so segments need not be
    /// sorted by column index; callers extracting many features from the same
    /// row range should prefer [`CsrTable::row_block`] to avoid repeated row
    /// scans. Feature blocks are read-only: inserting a non-zero through a
    /// column view would change the sparsity pattern, which no write path
    /// supports.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` when `feature_index >= ncols()`; otherwise as for
    /// [`CsrTable::row_block`].
    pub fn feature_block<'t, T: Element>(
        &'t self,
        feature_index: usize,
        rows_offset: usize,
        nrows: usize,
        desc: &'t mut BlockDescriptor<T>,
    ) -> Result<FeatureBlock<'t, T>> {
        self.require_one_based("feature_block")?;
        if feature_index >= self.ncols {
            return Err(Error::IndexOutOfBounds {
                index: feature_index,
                size: self.ncols,
            });
        }
        let count = self.clamped_rows(rows_offset, nrows);
        if count == 0 {
            return Ok(FeatureBlock::new(feature_index, rows_offset, &[]));
        }
        ensure_len(&mut desc.buf, count, T::zero())?;
        let want = feature_index as u64 + 1;
        let sz = self.dtype.size_in_bytes();

        if let Some((vals, cols, offs)) = self.host_parts() {
            pick_feature(
                &mut desc.buf[..count],
                vals,
                cols,
                &offs[rows_offset..=rows_offset + count],
                0,
                self.dtype,
                want,
            );
            return Ok(FeatureBlock::new(
                feature_index,
                rows_offset,
                &desc.buf[..count],
            ));
        }

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
        pick_feature(
            &mut desc.buf[..count],
            desc.raw.as_bytes(),
            &desc.cols,
            &desc.offsets,
            start,
            self.dtype,
            want,
        );
        Ok(FeatureBlock::new(
            feature_index,
            rows_offset,
            &desc.buf[..count],
        ))
    }
}

/// Scan each row segment for the wanted 1-based column and convert the hit.
///
/// `vals` and `cols` are indexed by `k - base`; on the host `base` is 0 and
/// the full arrays are passed, for device windows `base` is the window start.
fn pick_feature<T: Element>(
    out: &mut [T],
    vals: &[u8],
    cols: &[u64],
    offsets: &[u64],
    base: usize,
    dtype: crate::dtype::DType,
    want: u64,
) {
    let end = base + cols.len();
    for (r, slot) in out.iter_mut().enumerate() {
        let rs = (offsets[r] as usize).saturating_sub(1).clamp(base, end);
        let re = (offsets[r + 1] as usize).saturating_sub(1).clamp(rs, end);
        for k in rs..re {
            if cols[k - base] == want {
                *slot = T::from_f64(element_as_f64(vals, dtype, k - base));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CsrIndexing;

    // [0, 5, 0]
    // [0, 0, 0]
    // [2, 0, 9]
    // [0, 1, 0]
    fn sample() -> (Vec<f64>, Vec<u64>, Vec<u64>) {
        (
            vec![5.0f64, 2.0, 9.0, 1.0],
            vec![2u64, 1, 3, 2],
            vec![1u64, 2, 2, 4, 5],
        )
    }

    #[test]
    fn test_extract_middle_feature() {
        let (mut vals, mut cols, mut offs) = sample();
        let table =
            CsrTable::attach(&mut vals, &mut cols, &mut offs, 3, 4, CsrIndexing::OneBased)
                .unwrap();
        let mut desc = BlockDescriptor::<f64>::new();
        let block = table.feature_block(1, 0, 4, &mut desc).unwrap();
        assert_eq!(block.values(), &[5.0, 0.0, 0.0, 1.0]);
        assert_eq!(block.feature_index(), 1);
    }

    #[test]
    fn test_extract_sub_range_with_conversion() {
        let (mut vals, mut cols, mut offs) = sample();
        let table =
            CsrTable::attach(&mut vals, &mut cols, &mut offs, 3, 4, CsrIndexing::OneBased)
                .unwrap();
        let mut desc = BlockDescriptor::<i32>::new();
        let block = table.feature_block(2, 2, 2, &mut desc).unwrap();
        assert_eq!(block.values(), &[9, 0]);
        assert_eq!(block.rows_offset(), 2);
    }

    #[test]
    fn test_out_of_range_feature_index() {
        let (mut vals, mut cols, mut offs) = sample();
        let table =
            CsrTable::attach(&mut vals, &mut cols, &mut offs, 3, 4, CsrIndexing::OneBased)
                .unwrap();
        let mut desc = BlockDescriptor::<f64>::new();
        let err = table.feature_block(3, 0, 4, &mut desc).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds { index: 3, size: 3 }));
    }

    #[test]
    fn test_empty_past_end() {
        let (mut vals, mut cols, mut offs) = sample();
        let table =
            CsrTable::attach(&mut vals, &mut cols, &mut offs, 3, 4, CsrIndexing::OneBased)
                .unwrap();
        let mut desc = BlockDescriptor::<f64>::new();
        let block = table.feature_block(0, 4, 2, &mut desc).unwrap();
        assert!(block.is_empty());
    }
}
