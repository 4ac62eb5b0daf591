//! Device-resident buffer abstraction
//!
//! A table's backing arrays may live in memory the host cannot address
//! directly (GPU allocations, pinned pools owned by an accelerator runtime).
//! `DeviceMemory` is the seam between such buffers and the block machinery:
//! acquisition reads the needed byte window into a host-side cache, and a
//! release with write intent pushes the cache back.
//!
//! The engine never schedules device work itself; implementations wrap
//! whatever transfer primitives their runtime provides.

use crate::error::Result;

/// A buffer of raw bytes living on a compute device.
///
/// Implementations must be internally synchronized (`Send + Sync`): the table
/// may be shared across threads for read-only access, and concurrent `read`
/// calls over disjoint or overlapping windows must both be sound.
pub trait DeviceMemory: Send + Sync {
    /// Total size of the buffer in bytes
    fn size_in_bytes(&self) -> usize;

    /// Copy `dst.len()` bytes starting at `offset` into host memory
    fn read(&self, offset: usize, dst: &mut [u8]) -> Result<()>;

    /// Copy `src.len()` bytes from host memory into the buffer at `offset`
    fn write(&mut self, offset: usize, src: &[u8]) -> Result<()>;
}

/// Host-backed [`DeviceMemory`].
///
/// The degenerate device: plain host memory behind the device interface.
/// Useful for tests and as a reference implementation of the transfer
/// contract.
#[derive(Debug, Clone, Default)]
pub struct HostMemory {
    bytes: Vec<u8>,
}

impl HostMemory {
    /// Wrap a byte vector
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Copy a typed slice into a new buffer
    pub fn from_slice<T: bytemuck::Pod>(data: &[T]) -> Self {
        Self {
            bytes: bytemuck::cast_slice(data).to_vec(),
        }
    }

    /// View the underlying bytes as a typed slice
    pub fn as_slice<T: bytemuck::Pod>(&self) -> &[T] {
        bytemuck::cast_slice(&self.bytes)
    }
}

impl DeviceMemory for HostMemory {
    fn size_in_bytes(&self) -> usize {
        self.bytes.len()
    }

    fn read(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        let end = offset
            .checked_add(dst.len())
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| crate::error::Error::DeviceTransfer {
                reason: format!(
                    "read window [{}, {}) exceeds buffer of {} bytes",
                    offset,
                    offset.saturating_add(dst.len()),
                    self.bytes.len()
                ),
            })?;
        dst.copy_from_slice(&self.bytes[offset..end]);
        Ok(())
    }

    fn write(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(src.len())
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| crate::error::Error::DeviceTransfer {
                reason: format!(
                    "write window [{}, {}) exceeds buffer of {} bytes",
                    offset,
                    offset.saturating_add(src.len()),
                    self.bytes.len()
                ),
            })?;
        self.bytes[offset..end].copy_from_slice(src);
        Ok(())
    }
}
