//! Cast dispatch table for up/down conversion between element types
//!
//! Conversions are looked up once per acquisition in a static 2D table of
//! function pointers indexed by (source, destination) dtype lane, then
//! applied to whole slices. Same-type lanes degenerate to a memcpy.

use super::{DType, Element};
use crate::error::{Error, Result};

/// Copies every element of `src` into `dst`, converting between the two
/// element types the function was instantiated for.
///
/// Both slices are raw byte views of typed storage; their element counts must
/// match (`src.len() / src_size == dst.len() / dst_size`). The element count
/// mismatch is a programming error and only checked by `debug_assert`.
pub type CastFn = fn(src: &[u8], dst: &mut [u8]);

fn cast_slices<S: Element, D: Element>(src: &[u8], dst: &mut [u8]) {
    let src: &[S] = bytemuck::cast_slice(src);
    let dst: &mut [D] = bytemuck::cast_slice_mut(dst);
    debug_assert_eq!(src.len(), dst.len());
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d = D::from_f64(s.to_f64());
    }
}

fn copy_slices(src: &[u8], dst: &mut [u8]) {
    debug_assert_eq!(src.len(), dst.len());
    dst.copy_from_slice(src);
}

/// Lane order: F64, F32, I32 (see `DType::lane`).
static CAST_TABLE: [[CastFn; DType::LANES]; DType::LANES] = [
    [
        copy_slices,
        cast_slices::<f64, f32>,
        cast_slices::<f64, i32>,
    ],
    [
        cast_slices::<f32, f64>,
        copy_slices,
        cast_slices::<f32, i32>,
    ],
    [
        cast_slices::<i32, f64>,
        cast_slices::<i32, f32>,
        copy_slices,
    ],
];

/// Looks up the cast function converting `from` storage into `to` buffers.
///
/// Used for the up-cast on acquisition and the down-cast on write-back.
/// Fails with [`Error::UnsupportedDType`] when either side has no registered
/// lane, in which case no partial buffer is ever produced.
pub fn cast_fn(from: DType, to: DType, op: &'static str) -> Result<CastFn> {
    let (from_lane, to_lane) = (from.lane(), to.lane());
    if from_lane >= DType::LANES {
        return Err(Error::UnsupportedDType { dtype: from, op });
    }
    if to_lane >= DType::LANES {
        return Err(Error::UnsupportedDType { dtype: to, op });
    }
    Ok(CAST_TABLE[from_lane][to_lane])
}

/// Reads element `index` from a raw byte view of `dtype` storage, widened to
/// `f64`. The caller guarantees `index` is in bounds.
pub(crate) fn element_as_f64(bytes: &[u8], dtype: DType, index: usize) -> f64 {
    let size = dtype.size_in_bytes();
    let word = &bytes[index * size..(index + 1) * size];
    match dtype {
        DType::F64 => bytemuck::pod_read_unaligned::<f64>(word),
        DType::F32 => bytemuck::pod_read_unaligned::<f32>(word) as f64,
        DType::I32 => bytemuck::pod_read_unaligned::<i32>(word) as f64,
    }
}
