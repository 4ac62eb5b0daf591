//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};

/// Trait for types that can be elements of a table or block
///
/// This trait connects Rust's type system to numtab's runtime dtype system.
/// It is implemented for exactly the types the engine can store and convert:
/// `f64`, `f32`, and `i32`.
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - Basic trait requirements
/// - `Pod + Zeroable` - Safe memory transmutation (bytemuck), required for
///   viewing type-erased byte storage as typed slices
/// - `PartialOrd` - Comparison, used by callers scanning blocks
pub trait Element:
    Copy + Send + Sync + Pod + Zeroable + 'static + PartialOrd + std::fmt::Debug
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64, the widest supported type
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type (IEEE rounding for floats, truncation
    /// for integers)
    fn from_f64(v: f64) -> Self;

    /// Zero value, used to fill absent entries of dense blocks
    fn zero() -> Self;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as i32
    }

    #[inline]
    fn zero() -> Self {
        0
    }
}
