//! Type-erased value storage with element alignment
//!
//! Table values are stored as raw bytes with a runtime dtype tag, but those
//! bytes get reinterpreted as typed slices (`f64`, `f32`, `i32`). A plain
//! `Vec<u8>` gives no alignment guarantee for such casts, so the erased
//! storage is backed by `u64` words: every supported element type's
//! alignment divides 8.

use crate::error::{Error, Result};

/// Growable byte buffer whose data pointer is 8-byte aligned.
#[derive(Debug, Default, Clone)]
pub(crate) struct AlignedBytes {
    words: Vec<u64>,
    len: usize,
}

impl AlignedBytes {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Copy `bytes` into a freshly aligned buffer
    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = Self::new();
        buf.resize_zeroed(bytes.len())?;
        buf.as_bytes_mut().copy_from_slice(bytes);
        Ok(buf)
    }

    /// Resize to exactly `len` zeroed bytes, keeping spare capacity.
    ///
    /// Allocation failure is a status; the buffer is left empty, never
    /// partially grown.
    pub(crate) fn resize_zeroed(&mut self, len: usize) -> Result<()> {
        self.words.clear();
        self.len = 0;
        let nwords = len.div_ceil(8);
        if self.words.try_reserve(nwords).is_err() {
            return Err(Error::OutOfMemory { size: len });
        }
        self.words.resize(nwords, 0);
        self.len = len;
        Ok(())
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.words)[..self.len]
    }

    #[inline]
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.words)[..self.len]
    }
}
