//! Reusable scratch descriptors backing block acquisitions

use crate::buffer::AlignedBytes;
use crate::dtype::Element;
use crate::error::{Error, Result};

/// Grow `v` to exactly `n` elements of `fill`, preserving spare capacity.
///
/// Allocation failure is surfaced as a status (`OutOfMemory`); the vector is
/// left cleared, never partially filled.
pub(crate) fn ensure_len<T: Copy>(v: &mut Vec<T>, n: usize, fill: T) -> Result<()> {
    v.clear();
    if v.try_reserve(n).is_err() {
        return Err(Error::OutOfMemory {
            size: n * std::mem::size_of::<T>(),
        });
    }
    v.resize(n, fill);
    Ok(())
}

/// Scratch for dense row-block and feature-block acquisitions.
///
/// One descriptor per caller (typically stacked on each worker's call frame);
/// descriptors are not shared across threads. Buffers keep their capacity
/// across acquire/release cycles so repeated blocked scans stop allocating
/// after the first pass.
#[derive(Debug, Default)]
pub struct BlockDescriptor<T: Element> {
    /// Densified row-major target (or dense feature column)
    pub(crate) buf: Vec<T>,
    /// Up-cast staging for the contiguous value slice before the scatter step
    pub(crate) stage: Vec<T>,
    /// Host byte cache for device-resident value windows (element-aligned)
    pub(crate) raw: AlignedBytes,
    /// Host cache for device-resident column-index windows
    pub(crate) cols: Vec<u64>,
    /// Host cache for device-resident row-offset windows
    pub(crate) offsets: Vec<u64>,
}

impl<T: Element> BlockDescriptor<T> {
    /// Create an empty descriptor
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            stage: Vec::new(),
            raw: AlignedBytes::new(),
            cols: Vec::new(),
            offsets: Vec::new(),
        }
    }

    /// Drop all retained capacity
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Retained element capacity of the dense target buffer
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

/// Scratch for raw sparse-block acquisitions.
///
/// Same reuse contract as [`BlockDescriptor`]; carries the re-based row
/// offsets, the conversion buffer for values, and host caches for
/// device-resident tables.
#[derive(Debug, Default)]
pub struct CsrBlockDescriptor<T: Element> {
    /// Converted (or device-cached) values
    pub(crate) values: Vec<T>,
    /// Re-based row offsets of the fragment
    pub(crate) row_offsets: Vec<u64>,
    /// Host cache for device-resident column indices
    pub(crate) cols: Vec<u64>,
    /// Byte staging: device read cache on acquisition, down-cast target on
    /// write-back (element-aligned)
    pub(crate) raw: AlignedBytes,
}

impl<T: Element> CsrBlockDescriptor<T> {
    /// Create an empty descriptor
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            row_offsets: Vec::new(),
            cols: Vec::new(),
            raw: AlignedBytes::new(),
        }
    }

    /// Drop all retained capacity
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Retained element capacity of the values buffer
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_len_zero_fills() {
        let mut v = vec![1.0f64, 2.0];
        ensure_len(&mut v, 4, 0.0).unwrap();
        assert_eq!(v, [0.0; 4]);
    }

    #[test]
    fn test_capacity_survives_shrink() {
        let mut v: Vec<f32> = Vec::new();
        ensure_len(&mut v, 128, 0.0).unwrap();
        let cap = v.capacity();
        ensure_len(&mut v, 8, 0.0).unwrap();
        assert_eq!(v.len(), 8);
        assert!(v.capacity() >= cap.min(128));
    }

    #[test]
    fn test_reset_clears_capacity() {
        let mut desc = BlockDescriptor::<f64>::new();
        ensure_len(&mut desc.buf, 64, 0.0).unwrap();
        assert!(desc.capacity() >= 64);
        desc.reset();
        assert_eq!(desc.capacity(), 0);
    }
}
