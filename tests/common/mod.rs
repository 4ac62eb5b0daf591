//! Common test utilities
#![allow(dead_code)]

use numtab::device::HostMemory;
use numtab::prelude::*;

/// The reference 4x3 matrix used across the integration tests:
///
/// ```text
/// [0, 5, 0]
/// [0, 0, 0]
/// [2, 0, 9]
/// [0, 1, 0]
/// ```
///
/// stored 1-based as values `[5, 2, 9, 1]`, columns `[2, 1, 3, 2]`,
/// offsets `[1, 2, 2, 4, 5]`.
pub fn sample_arrays() -> (Vec<f64>, Vec<u64>, Vec<u64>) {
    (
        vec![5.0f64, 2.0, 9.0, 1.0],
        vec![2u64, 1, 3, 2],
        vec![1u64, 2, 2, 4, 5],
    )
}

/// The reference matrix as a dense row-major f64 buffer
pub fn sample_dense() -> Vec<f64> {
    vec![0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 9.0, 0.0, 1.0, 0.0]
}

/// Internally-owned copy of the reference matrix
pub fn sample_owned() -> CsrTable<'static> {
    let (vals, cols, offs) = sample_arrays();
    let mut table = CsrTable::with_shape(4, 3, DType::F64, CsrIndexing::OneBased);
    table
        .set_arrays(vals, cols, offs, 3, 4, CsrIndexing::OneBased)
        .unwrap();
    table
}

/// Device-resident copy of the reference matrix, backed by [`HostMemory`]
pub fn sample_device() -> CsrTable<'static> {
    let (vals, cols, offs) = sample_arrays();
    CsrTable::from_device(
        Box::new(HostMemory::from_slice(bytemuck::cast_slice::<_, u8>(&vals))),
        Box::new(HostMemory::from_slice(bytemuck::cast_slice::<_, u8>(&cols))),
        Box::new(HostMemory::from_slice(bytemuck::cast_slice::<_, u8>(&offs))),
        DType::F64,
        3,
        4,
        CsrIndexing::OneBased,
    )
    .unwrap()
}

/// Assert two f64 slices are bit-identical, with an index in the message
pub fn assert_same_f64(a: &[f64], b: &[f64], msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        assert!(
            x.to_bits() == y.to_bits(),
            "{}: element {} differs: {} vs {}",
            msg,
            i,
            x,
            y
        );
    }
}
