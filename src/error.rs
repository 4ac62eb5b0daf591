//! Error types for numtab

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using numtab's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in numtab operations
///
/// All failures are reported as status values; the storage layer never uses
/// panics for control flow. A failed acquisition returns `Err` and leaves the
/// descriptor empty, never a partially populated buffer.
#[derive(Error, Debug)]
pub enum Error {
    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Index base of the table is not the supported convention
    #[error("Unsupported indexing in {context}: only one-based CSR is supported")]
    UnsupportedIndexing {
        /// What was being checked or accessed
        context: String,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// Write intent that would alter the sparsity structure
    #[error("Structural write rejected in '{op}': sparsity pattern is immutable")]
    StructuralWrite {
        /// The operation name
        op: &'static str,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Size of the dimension
        size: usize,
    },

    /// Shape mismatch between supplied arrays and the declared table shape
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected lengths
        expected: Vec<usize>,
        /// Actual lengths
        got: Vec<usize>,
    },

    /// Malformed serialized stream
    #[error("Corrupt stream: {reason}")]
    CorruptStream {
        /// Why the stream was rejected
        reason: String,
    },

    /// Device buffer transfer failure
    #[error("Device transfer failed: {reason}")]
    DeviceTransfer {
        /// Why the transfer failed
        reason: String,
    },
}
