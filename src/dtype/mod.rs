//! Data type system for numtab tables
//!
//! This module provides the `DType` enum representing the supported element
//! types, the `Element` trait bridging Rust types to runtime tags, and the
//! cast dispatch table used for up/down conversion between storage and
//! requested block types.

mod convert;
mod element;

pub use convert::{cast_fn, CastFn};
pub(crate) use convert::element_as_f64;
pub use element::Element;

use std::fmt;

/// Element types a numtab table can store or serve
///
/// The enum represents the element type at runtime, so a single table object
/// can serve blocks in any supported type regardless of what it stores.
///
/// # Discriminant Values (Serialization Stability)
///
/// The discriminant values are **stable**: they are written verbatim as the
/// dtype tag of the serialized byte layout and are never changed. The
/// numbering leaves gaps for future floating point (0-9) and signed integer
/// (10-19) types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum DType {
    /// 64-bit floating point
    F64 = 0,
    /// 32-bit floating point
    F32 = 1,
    /// 32-bit signed integer
    I32 = 11,
}

impl DType {
    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F64 => 8,
            Self::F32 | Self::I32 => 4,
        }
    }

    /// Returns true if this is a floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F64 | Self::F32)
    }

    /// Stable tag written to the serialized layout
    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Reverse of [`DType::tag`]; `None` for unknown tags
    #[inline]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::F64),
            1 => Some(Self::F32),
            11 => Some(Self::I32),
            _ => None,
        }
    }

    /// Short name for display (e.g., "f32")
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::I32 => "i32",
        }
    }

    /// Dense index of this dtype in the cast dispatch table
    #[inline]
    pub(crate) const fn lane(self) -> usize {
        match self {
            Self::F64 => 0,
            Self::F32 => 1,
            Self::I32 => 2,
        }
    }

    /// Number of lanes in the cast dispatch table
    pub(crate) const LANES: usize = 3;
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::I32.size_in_bytes(), 4);
    }

    #[test]
    fn test_dtype_tags_stable() {
        assert_eq!(DType::F64.tag(), 0);
        assert_eq!(DType::F32.tag(), 1);
        assert_eq!(DType::I32.tag(), 11);
        assert_eq!(DType::from_tag(11), Some(DType::I32));
        assert_eq!(DType::from_tag(7), None);
    }

    #[test]
    fn test_dtype_categories() {
        assert!(DType::F32.is_float());
        assert!(!DType::I32.is_float());
        assert_eq!(DType::F64.short_name(), "f64");
    }
}
