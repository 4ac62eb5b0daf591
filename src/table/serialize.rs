//! Persistence byte layout
//!
//! `[nrows: u64][ncols: u64][data_size: u64][dtype tag: u8]` followed by the
//! value bytes (`data_size × element size`), the column indices
//! (`data_size × u64`), and the row offsets (`(nrows + 1) × u64`). Header and
//! index arrays are little-endian; values carry their in-memory byte
//! representation.

use super::core::{CsrIndexing, CsrTable, TableData};
use crate::buffer::AlignedBytes;
use crate::dtype::DType;
use crate::error::{Error, Result};

const HEADER_LEN: usize = 3 * 8 + 1;

impl CsrTable<'_> {
    /// Serialize the table into the persistence byte layout.
    ///
    /// Device-resident tables are materialized to the host first.
    ///
    /// # Errors
    ///
    /// `OutOfMemory` when the output buffer cannot be allocated,
    /// `DeviceTransfer` when a device read fails, `ShapeMismatch` when the
    /// table was shaped but never allocated.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let sz = self.dtype.size_in_bytes();
        let nnz = self.nnz();
        let total = HEADER_LEN + nnz * sz + nnz * 8 + (self.nrows + 1) * 8;
        let mut out = Vec::new();
        if out.try_reserve(total).is_err() {
            return Err(Error::OutOfMemory { size: total });
        }
        out.extend_from_slice(&(self.nrows as u64).to_le_bytes());
        out.extend_from_slice(&(self.ncols as u64).to_le_bytes());
        out.extend_from_slice(&(nnz as u64).to_le_bytes());
        out.push(self.dtype.tag());

        if let Some((vals, cols, offs)) = self.host_parts() {
            // a shaped-but-unallocated table has no offset array yet
            if offs.len() != self.nrows + 1 {
                return Err(Error::ShapeMismatch {
                    expected: vec![self.nrows + 1],
                    got: vec![offs.len()],
                });
            }
            out.extend_from_slice(vals);
            for &c in cols {
                out.extend_from_slice(&c.to_le_bytes());
            }
            for &o in offs {
                out.extend_from_slice(&o.to_le_bytes());
            }
            return Ok(out);
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
        let mut vals = vec![0u8; nnz * sz];
        dvals.read(0, &mut vals)?;
        out.extend_from_slice(&vals);
        let mut idx = vec![0u64; nnz];
        dcols.read(0, bytemuck::cast_slice_mut(&mut idx))?;
        for &c in &idx {
            out.extend_from_slice(&c.to_le_bytes());
        }
        let mut offs = vec![0u64; self.nrows + 1];
        doffs.read(0, bytemuck::cast_slice_mut(&mut offs))?;
        for &o in &offs {
            out.extend_from_slice(&o.to_le_bytes());
        }
        Ok(out)
    }

    /// Rebuild an internally-owned table from the persistence byte layout.
    ///
    /// The index base is restored from the first row offset.
    ///
    /// # Errors
    ///
    /// `CorruptStream` when the header is truncated, the element-type tag is
    /// unknown, the total length disagrees with the header, or the row
    /// offsets disagree with the stored non-zero count; `OutOfMemory` when
    /// the arrays cannot be allocated.
    pub fn deserialize(bytes: &[u8]) -> Result<CsrTable<'static>> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::CorruptStream {
                reason: format!("{} bytes is shorter than the header", bytes.len()),
            });
        }
        let nrows = read_u64(bytes, 0) as usize;
        let ncols = read_u64(bytes, 8) as usize;
        let nnz = read_u64(bytes, 16) as usize;
        let tag = bytes[24];
        let dtype = DType::from_tag(tag).ok_or_else(|| Error::CorruptStream {
            reason: format!("unknown element-type tag {tag}"),
        })?;

        let sz = dtype.size_in_bytes();
        let total = nnz
            .checked_mul(sz + 8)
            .and_then(|b| b.checked_add(HEADER_LEN))
            .and_then(|b| b.checked_add(nrows.checked_add(1)?.checked_mul(8)?))
            .ok_or_else(|| Error::CorruptStream {
                reason: "header sizes overflow".to_string(),
            })?;
        if bytes.len() != total {
            return Err(Error::CorruptStream {
                reason: format!("expected {} bytes, got {}", total, bytes.len()),
            });
        }

        let vals_at = HEADER_LEN;
        let cols_at = vals_at + nnz * sz;
        let offs_at = cols_at + nnz * 8;
        let values = AlignedBytes::from_bytes(&bytes[vals_at..cols_at])?;
        let col_indices = read_u64_array(&bytes[cols_at..offs_at]);
        let row_offsets = read_u64_array(&bytes[offs_at..]);

        let indexing = if row_offsets[0] == 1 {
            CsrIndexing::OneBased
        } else {
            CsrIndexing::ZeroBased
        };
        let origin = indexing.origin();
        if row_offsets[0] != origin || row_offsets[nrows] != nnz as u64 + origin {
            return Err(Error::CorruptStream {
                reason: format!(
                    "row offsets [{}, {}] disagree with {} stored non-zeros",
                    row_offsets[0], row_offsets[nrows], nnz
                ),
            });
        }
        Ok(CsrTable {
            data: TableData::Owned {
                values,
                col_indices,
                row_offsets,
            },
            dtype,
            nrows,
            ncols,
            indexing,
        })
    }
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(word)
}

fn read_u64_array(bytes: &[u8]) -> Vec<u64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MemoryOwnership;

    fn sample_table() -> CsrTable<'static> {
        let mut table = CsrTable::with_shape(4, 3, DType::F64, CsrIndexing::OneBased);
        table
            .set_arrays::<f64>(
                vec![5.0, 2.0, 9.0, 1.0],
                vec![2, 1, 3, 2],
                vec![1, 2, 2, 4, 5],
                3,
                4,
                CsrIndexing::OneBased,
            )
            .unwrap();
        table
    }

    #[test]
    fn test_round_trip() {
        let table = sample_table();
        let bytes = table.serialize().unwrap();
        assert_eq!(bytes.len(), 25 + 4 * 8 + 4 * 8 + 5 * 8);

        let restored = CsrTable::deserialize(&bytes).unwrap();
        assert_eq!(restored.nrows(), 4);
        assert_eq!(restored.ncols(), 3);
        assert_eq!(restored.dtype(), DType::F64);
        assert_eq!(restored.indexing(), CsrIndexing::OneBased);
        assert_eq!(restored.ownership(), MemoryOwnership::InternallyAllocated);
        let (vals, cols, offs) = restored.arrays::<f64>().unwrap();
        assert_eq!(vals, &[5.0, 2.0, 9.0, 1.0]);
        assert_eq!(cols, &[2, 1, 3, 2]);
        assert_eq!(offs, &[1, 2, 2, 4, 5]);
    }

    #[test]
    fn test_truncated_stream() {
        let bytes = sample_table().serialize().unwrap();
        let err = CsrTable::deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::CorruptStream { .. }));
        let err = CsrTable::deserialize(&bytes[..10]).unwrap_err();
        assert!(matches!(err, Error::CorruptStream { .. }));
    }

    #[test]
    fn test_unknown_dtype_tag() {
        let mut bytes = sample_table().serialize().unwrap();
        bytes[24] = 0xff;
        let err = CsrTable::deserialize(&bytes).unwrap_err();
        assert!(matches!(err, Error::CorruptStream { .. }));
    }

    #[test]
    fn test_index_base_is_restored() {
        let mut table = CsrTable::with_shape(1, 1, DType::I32, CsrIndexing::ZeroBased);
        table
            .set_arrays::<i32>(vec![7], vec![0], vec![0, 1], 1, 1, CsrIndexing::ZeroBased)
            .unwrap();
        let restored = CsrTable::deserialize(&table.serialize().unwrap()).unwrap();
        assert_eq!(restored.indexing(), CsrIndexing::ZeroBased);
    }
}
