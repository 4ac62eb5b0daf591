//! # numtab
//!
//! **CSR numeric-table storage with blocked acquire/release access.**
//!
//! numtab stores a two-dimensional numeric dataset in CSR (Compressed Sparse
//! Row) form and serves it to numerical algorithms that expect rectangular,
//! strided views: a contiguous range of rows densified to row-major, a single
//! feature (column) over a row range, or the raw CSR fragment itself. Callers
//! never touch the sparse arrays directly; every access goes through an
//! acquire/release pair mediated by a reusable block descriptor.
//!
//! ## Access paths
//!
//! - **Row blocks**: dense `nrows x ncols` row-major buffers, absent entries
//!   zero-filled, in any supported element type.
//! - **Feature blocks**: one dense column over a row range.
//! - **Sparse blocks**: the unmodified CSR triple (values, column indices,
//!   re-based row offsets), zero-copy when the requested type matches storage.
//!
//! ## Storage modes
//!
//! A table either *attaches* to caller-owned arrays (never freed by the
//! table), *owns* internally allocated arrays, or references device-resident
//! buffers materialized to host on demand through [`device::DeviceMemory`].
//!
//! ## Quick start
//!
//! ```
//! use numtab::prelude::*;
//!
//! // 4x3 matrix, 1-based CSR:
//! //   [0, 5, 0]
//! //   [0, 0, 0]
//! //   [2, 0, 9]
//! //   [0, 1, 0]
//! let mut values = vec![5.0f64, 2.0, 9.0, 1.0];
//! let mut cols = vec![2u64, 1, 3, 2];
//! let mut offsets = vec![1u64, 2, 2, 4, 5];
//!
//! let table = CsrTable::attach(
//!     &mut values, &mut cols, &mut offsets, 3, 4, CsrIndexing::OneBased,
//! )?;
//!
//! let mut desc = BlockDescriptor::<f64>::new();
//! let block = table.row_block(0, 4, &mut desc)?;
//! assert_eq!(block.values()[0..3], [0.0, 5.0, 0.0]);
//! # Ok::<(), numtab::error::Error>(())
//! ```
//!
//! ## Concurrency
//!
//! The engine is synchronous and lock-free. Read-only acquisition borrows the
//! table shared, so disjoint row ranges may be read from many threads with no
//! synchronization; any write intent borrows the table exclusively. Each
//! thread owns its own descriptor.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
mod buffer;
pub mod device;
pub mod dtype;
pub mod error;
pub mod table;

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::block::{BlockDescriptor, CsrBlockDescriptor, ReadWriteMode};
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::table::{CsrIndexing, CsrTable, MemoryOwnership};
}
