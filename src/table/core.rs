//! Core CSR table: struct, construction, attachment, raw-array access

use crate::buffer::AlignedBytes;
use crate::device::DeviceMemory;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};

/// Index-base convention of the offset and column-index arrays
///
/// Only the 1-based convention is supported by the access paths; 0-based
/// tables are representable but rejected by [`CsrTable::check`] and by every
/// acquisition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CsrIndexing {
    /// First valid index is 0
    ZeroBased,
    /// First valid index is 1 (the supported convention)
    OneBased,
}

impl CsrIndexing {
    /// The first valid index under this convention
    #[inline]
    pub const fn origin(self) -> u64 {
        match self {
            Self::ZeroBased => 0,
            Self::OneBased => 1,
        }
    }
}

/// Who owns the backing arrays
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemoryOwnership {
    /// Caller-supplied memory attached to the table; never freed by it
    UserAllocated,
    /// Memory allocated and owned by the table
    InternallyAllocated,
    /// Device-resident buffers, materialized to host per acquisition
    DeviceAllocated,
}

/// Backing arrays under one of the three storage modes.
///
/// Values are type-erased bytes; the element type lives in the table's
/// `dtype` tag so one table object can serve blocks of any supported type.
pub(crate) enum TableData<'a> {
    /// Caller-owned memory; writes land in the caller's arrays in place
    Attached {
        values: &'a mut [u8],
        col_indices: &'a mut [u64],
        row_offsets: &'a mut [u64],
    },
    /// Table-owned memory (values in 8-byte-aligned erased storage)
    Owned {
        values: AlignedBytes,
        col_indices: Vec<u64>,
        row_offsets: Vec<u64>,
    },
    /// Device-resident memory behind the [`DeviceMemory`] seam
    Device {
        values: Box<dyn DeviceMemory>,
        col_indices: Box<dyn DeviceMemory>,
        row_offsets: Box<dyn DeviceMemory>,
    },
}

/// CSR numeric table with blocked acquire/release access
///
/// The lifetime parameter is the borrow of caller-attached arrays;
/// internally-owned and device-resident tables use `CsrTable<'static>`.
///
/// # Construction preconditions
///
/// Construction validates O(1) shape facts only: array lengths, and the
/// first/last row offsets against the index base and non-zero count.
/// Monotonicity of `row_offsets` and bounds of `col_indices` are **caller
/// preconditions**, not runtime-enforced invariants; the access paths use
/// checked indexing, so violating them yields skipped entries or errors,
/// never memory unsafety.
pub struct CsrTable<'a> {
    pub(crate) data: TableData<'a>,
    pub(crate) dtype: DType,
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
    pub(crate) indexing: CsrIndexing,
}

impl std::fmt::Debug for CsrTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ownership = match self.data {
            TableData::Attached { .. } => MemoryOwnership::UserAllocated,
            TableData::Owned { .. } => MemoryOwnership::InternallyAllocated,
            TableData::Device { .. } => MemoryOwnership::DeviceAllocated,
        };
        f.debug_struct("CsrTable")
            .field("ownership", &ownership)
            .field("dtype", &self.dtype)
            .field("nrows", &self.nrows)
            .field("ncols", &self.ncols)
            .field("indexing", &self.indexing)
            .finish()
    }
}

impl<'a> CsrTable<'a> {
    /// Attach to caller-owned arrays (zero-copy)
    ///
    /// The table borrows the arrays for its lifetime and never frees them;
    /// dropping the table leaves the caller's memory untouched.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` when `row_offsets.len() != nrows + 1`, when
    /// `col_indices.len() != values.len()`, or when the first/last offsets
    /// disagree with the index base and `values.len()`.
    pub fn attach<T: Element>(
        values: &'a mut [T],
        col_indices: &'a mut [u64],
        row_offsets: &'a mut [u64],
        ncols: usize,
        nrows: usize,
        indexing: CsrIndexing,
    ) -> Result<Self> {
        validate_shape(
            values.len(),
            col_indices.len(),
            row_offsets,
            nrows,
            indexing,
        )?;
        Ok(Self {
            data: TableData::Attached {
                values: bytemuck::cast_slice_mut(values),
                col_indices,
                row_offsets,
            },
            dtype: T::DTYPE,
            nrows,
            ncols,
            indexing,
        })
    }

    /// Create an empty internally-owned table of the given shape
    ///
    /// No data memory is held until [`CsrTable::allocate_data`] is called.
    pub fn with_shape(
        nrows: usize,
        ncols: usize,
        dtype: DType,
        indexing: CsrIndexing,
    ) -> CsrTable<'static> {
        CsrTable {
            data: TableData::Owned {
                values: AlignedBytes::new(),
                col_indices: Vec::new(),
                row_offsets: Vec::new(),
            },
            dtype,
            nrows,
            ncols,
            indexing,
        }
    }

    /// Allocate table-owned arrays for `data_size` non-zeros
    ///
    /// Values are zero-initialized, column indices are zeroed, and every row
    /// offset is set to the index-base origin; the caller then populates the
    /// arrays through [`CsrTable::arrays_mut`]. Replaces any previously
    /// attached or owned arrays, making the table internally owned.
    ///
    /// # Errors
    ///
    /// `OutOfMemory` when any of the three allocations fails; the table is
    /// left in a well-defined unallocated state (no partial arrays retained).
    pub fn allocate_data(&mut self, data_size: usize) -> Result<()> {
        self.data = TableData::Owned {
            values: AlignedBytes::new(),
            col_indices: Vec::new(),
            row_offsets: Vec::new(),
        };

        let value_bytes = data_size
            .checked_mul(self.dtype.size_in_bytes())
            .ok_or(Error::OutOfMemory { size: usize::MAX })?;

        let mut values = AlignedBytes::new();
        values.resize_zeroed(value_bytes)?;
        let mut col_indices = Vec::new();
        let mut row_offsets = Vec::new();
        crate::block::ensure_len(&mut col_indices, data_size, 0u64)?;
        crate::block::ensure_len(
            &mut row_offsets,
            self.nrows + 1,
            self.indexing.origin(),
        )?;

        self.data = TableData::Owned {
            values,
            col_indices,
            row_offsets,
        };
        Ok(())
    }

    /// Build a table over device-resident buffers
    ///
    /// Buffer sizes must agree: `row_offsets` holds `nrows + 1` u64 entries,
    /// `col_indices` one u64 per stored value, and `values` a whole number of
    /// `dtype`-sized elements.
    pub fn from_device(
        values: Box<dyn DeviceMemory>,
        col_indices: Box<dyn DeviceMemory>,
        row_offsets: Box<dyn DeviceMemory>,
        dtype: DType,
        ncols: usize,
        nrows: usize,
        indexing: CsrIndexing,
    ) -> Result<CsrTable<'static>> {
        let elem = dtype.size_in_bytes();
        if values.size_in_bytes() % elem != 0 {
            return Err(Error::ShapeMismatch {
                expected: vec![values.size_in_bytes() / elem * elem],
                got: vec![values.size_in_bytes()],
            });
        }
        let data_size = values.size_in_bytes() / elem;
        if col_indices.size_in_bytes() != data_size * 8 {
            return Err(Error::ShapeMismatch {
                expected: vec![data_size * 8],
                got: vec![col_indices.size_in_bytes()],
            });
        }
        if row_offsets.size_in_bytes() != (nrows + 1) * 8 {
            return Err(Error::ShapeMismatch {
                expected: vec![(nrows + 1) * 8],
                got: vec![row_offsets.size_in_bytes()],
            });
        }
        Ok(CsrTable {
            data: TableData::Device {
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

    /// Number of rows of the dense shape
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns of the dense shape
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Element type of the stored values
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Index-base convention
    #[inline]
    pub fn indexing(&self) -> CsrIndexing {
        self.indexing
    }

    /// Who owns the backing arrays
    pub fn ownership(&self) -> MemoryOwnership {
        match self.data {
            TableData::Attached { .. } => MemoryOwnership::UserAllocated,
            TableData::Owned { .. } => MemoryOwnership::InternallyAllocated,
            TableData::Device { .. } => MemoryOwnership::DeviceAllocated,
        }
    }

    /// Number of stored non-zeros
    pub fn nnz(&self) -> usize {
        match &self.data {
            TableData::Attached { values, .. } => values.len() / self.dtype.size_in_bytes(),
            TableData::Owned { values, .. } => values.len() / self.dtype.size_in_bytes(),
            TableData::Device { values, .. } => {
                values.size_in_bytes() / self.dtype.size_in_bytes()
            }
        }
    }

    /// Bytes held by the three backing arrays
    pub fn memory_usage(&self) -> usize {
        self.nnz() * self.dtype.size_in_bytes() + self.nnz() * 8 + (self.nrows + 1) * 8
    }

    /// Validate the table's compatibility with the access paths
    ///
    /// Fails with `UnsupportedIndexing` when the index base is not 1-based.
    /// Monotonicity and column bounds are construction preconditions and are
    /// deliberately not re-checked here.
    pub fn check(&self, description: &str) -> Result<()> {
        match self.indexing {
            CsrIndexing::OneBased => Ok(()),
            CsrIndexing::ZeroBased => Err(Error::UnsupportedIndexing {
                context: description.to_string(),
            }),
        }
    }

    /// Raw escape hatch: the three backing arrays of a host-resident table
    ///
    /// # Errors
    ///
    /// `UnsupportedDType` when `T` is not the storage type; `DeviceTransfer`
    /// for device-resident tables (use block acquisition to materialize).
    pub fn arrays<T: Element>(&self) -> Result<(&[T], &[u64], &[u64])> {
        if T::DTYPE != self.dtype {
            return Err(Error::UnsupportedDType {
                dtype: T::DTYPE,
                op: "arrays",
            });
        }
        match &self.data {
            TableData::Attached {
                values,
                col_indices,
                row_offsets,
            } => Ok((bytemuck::cast_slice(&**values), &**col_indices, &**row_offsets)),
            TableData::Owned {
                values,
                col_indices,
                row_offsets,
            } => Ok((bytemuck::cast_slice(values.as_bytes()), col_indices, row_offsets)),
            TableData::Device { .. } => Err(Error::DeviceTransfer {
                reason: "backing arrays are device-resident; acquire a sparse block instead"
                    .to_string(),
            }),
        }
    }

    /// Raw escape hatch: mutable view of the three backing arrays
    ///
    /// Same contract as [`CsrTable::arrays`].
    pub fn arrays_mut<T: Element>(&mut self) -> Result<(&mut [T], &mut [u64], &mut [u64])> {
        if T::DTYPE != self.dtype {
            return Err(Error::UnsupportedDType {
                dtype: T::DTYPE,
                op: "arrays_mut",
            });
        }
        match &mut self.data {
            TableData::Attached {
                values,
                col_indices,
                row_offsets,
            } => Ok((
                bytemuck::cast_slice_mut(&mut **values),
                &mut **col_indices,
                &mut **row_offsets,
            )),
            TableData::Owned {
                values,
                col_indices,
                row_offsets,
            } => Ok((
                bytemuck::cast_slice_mut(values.as_bytes_mut()),
                col_indices,
                row_offsets,
            )),
            TableData::Device { .. } => Err(Error::DeviceTransfer {
                reason: "backing arrays are device-resident; acquire a sparse block instead"
                    .to_string(),
            }),
        }
    }

    /// Raw escape hatch: replace the backing arrays with table-owned copies
    ///
    /// The table becomes internally owned with the new shape and element
    /// type. Validation matches [`CsrTable::attach`].
    pub fn set_arrays<T: Element>(
        &mut self,
        values: Vec<T>,
        col_indices: Vec<u64>,
        row_offsets: Vec<u64>,
        ncols: usize,
        nrows: usize,
        indexing: CsrIndexing,
    ) -> Result<()> {
        validate_shape(
            values.len(),
            col_indices.len(),
            &row_offsets,
            nrows,
            indexing,
        )?;
        self.data = TableData::Owned {
            values: AlignedBytes::from_bytes(bytemuck::cast_slice(&values))?,
            col_indices,
            row_offsets,
        };
        self.dtype = T::DTYPE;
        self.nrows = nrows;
        self.ncols = ncols;
        self.indexing = indexing;
        Ok(())
    }

    // ---- internal helpers shared by the acquisition paths ----

    /// Host-resident arrays, `None` for device mode
    pub(crate) fn host_parts(&self) -> Option<(&[u8], &[u64], &[u64])> {
        match &self.data {
            TableData::Attached {
                values,
                col_indices,
                row_offsets,
            } => Some((&**values, &**col_indices, &**row_offsets)),
            TableData::Owned {
                values,
                col_indices,
                row_offsets,
            } => Some((values.as_bytes(), &col_indices[..], &row_offsets[..])),
            TableData::Device { .. } => None,
        }
    }

    /// Host-resident arrays with writable values, `None` for device mode
    pub(crate) fn host_parts_mut(&mut self) -> Option<(&mut [u8], &[u64], &[u64])> {
        match &mut self.data {
            TableData::Attached {
                values,
                col_indices,
                row_offsets,
            } => Some((&mut **values, &**col_indices, &**row_offsets)),
            TableData::Owned {
                values,
                col_indices,
                row_offsets,
            } => Some((values.as_bytes_mut(), &col_indices[..], &row_offsets[..])),
            TableData::Device { .. } => None,
        }
    }

    /// Acquisition guard: the blocked paths do their offset arithmetic
    /// 1-based, so a 0-based table fails fast instead of mis-slicing.
    pub(crate) fn require_one_based(&self, op: &'static str) -> Result<()> {
        self.check(op)
    }

    /// Clamp a requested row range to the table edge.
    ///
    /// `rows_offset >= nrows` yields zero rows, which the acquisition paths
    /// turn into a deterministically empty block rather than an error.
    pub(crate) fn clamped_rows(&self, rows_offset: usize, nrows: usize) -> usize {
        if rows_offset >= self.nrows {
            0
        } else {
            nrows.min(self.nrows - rows_offset)
        }
    }
}

/// O(1) construction-time validation shared by `attach` and `set_arrays`.
fn validate_shape(
    nnz: usize,
    col_len: usize,
    row_offsets: &[u64],
    nrows: usize,
    indexing: CsrIndexing,
) -> Result<()> {
    if row_offsets.len() != nrows + 1 {
        return Err(Error::ShapeMismatch {
            expected: vec![nrows + 1],
            got: vec![row_offsets.len()],
        });
    }
    if col_len != nnz {
        return Err(Error::ShapeMismatch {
            expected: vec![nnz],
            got: vec![col_len],
        });
    }
    let origin = indexing.origin();
    let first = row_offsets[0];
    let last = row_offsets[nrows];
    if first != origin || last != nnz as u64 + origin {
        return Err(Error::ShapeMismatch {
            expected: vec![origin as usize, nnz + origin as usize],
            got: vec![first as usize, last as usize],
        });
    }
    Ok(())
}
