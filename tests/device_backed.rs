//! Integration tests for device-resident tables
//!
//! Uses the crate's [`HostMemory`] test double as the device, so transfers
//! are observable without real accelerator hardware.

mod common;

use common::{sample_arrays, sample_dense, sample_device};
use numtab::block::{BlockDescriptor, CsrBlockDescriptor, ReadWriteMode};
use numtab::device::HostMemory;
use numtab::prelude::*;

#[test]
fn device_table_reports_device_ownership() {
    let table = sample_device();
    assert_eq!(table.ownership(), MemoryOwnership::DeviceAllocated);
    assert_eq!(table.nnz(), 4);
    // raw array access requires host residency
    assert!(matches!(
        table.arrays::<f64>(),
        Err(Error::DeviceTransfer { .. })
    ));
}

#[test]
fn device_row_block_densifies_through_host_cache() {
    let table = sample_device();
    let mut desc = BlockDescriptor::<f64>::new();
    let block = table.row_block(0, 4, &mut desc).unwrap();
    assert_eq!(block.values(), &sample_dense()[..]);

    // sub-range with conversion
    let mut desc = BlockDescriptor::<f32>::new();
    let block = table.row_block(2, 2, &mut desc).unwrap();
    assert_eq!(block.values(), &[2.0f32, 0.0, 9.0, 0.0, 1.0, 0.0]);
}

#[test]
fn device_feature_block() {
    let table = sample_device();
    let mut desc = BlockDescriptor::<f64>::new();
    let block = table.feature_block(1, 0, 4, &mut desc).unwrap();
    assert_eq!(block.values(), &[5.0, 0.0, 0.0, 1.0]);
}

#[test]
fn device_sparse_block_materializes_all_arrays() {
    let table = sample_device();
    let mut desc = CsrBlockDescriptor::<f64>::new();
    let block = table.sparse_block(2, 2, &mut desc).unwrap();
    assert_eq!(block.values(), &[2.0, 9.0, 1.0]);
    assert_eq!(block.col_indices(), &[1, 3, 2]);
    assert_eq!(block.row_offsets(), &[1, 3, 4]);
}

#[test]
fn device_write_back_on_release() {
    let mut table = sample_device();
    let mut desc = CsrBlockDescriptor::<f64>::new();
    {
        let mut block = table
            .sparse_block_mut(0, 4, ReadWriteMode::ReadWrite, &mut desc)
            .unwrap();
        assert_eq!(block.values(), &[5.0, 2.0, 9.0, 1.0]);
        block.values_mut()[2] = -9.0;
        block.release().unwrap();
    }
    let block = table.sparse_block(0, 4, &mut desc).unwrap();
    assert_eq!(block.values(), &[5.0, 2.0, -9.0, 1.0]);
}

#[test]
fn device_write_back_of_a_sub_range_leaves_the_rest() {
    let mut table = sample_device();
    let mut desc = CsrBlockDescriptor::<f64>::new();
    {
        let mut block = table
            .sparse_block_mut(3, 1, ReadWriteMode::ReadWrite, &mut desc)
            .unwrap();
        block.values_mut()[0] = 11.0;
        block.release().unwrap();
    }
    let block = table.sparse_block(0, 4, &mut desc).unwrap();
    assert_eq!(block.values(), &[5.0, 2.0, 9.0, 11.0]);
}

#[test]
fn device_read_only_release_writes_nothing() {
    let mut table = sample_device();
    let mut desc = CsrBlockDescriptor::<f64>::new();
    {
        let mut block = table
            .sparse_block_mut(0, 4, ReadWriteMode::ReadOnly, &mut desc)
            .unwrap();
        block.values_mut()[0] = 1000.0;
        block.release().unwrap();
    }
    let block = table.sparse_block(0, 4, &mut desc).unwrap();
    assert_eq!(block.values(), &[5.0, 2.0, 9.0, 1.0]);
}

#[test]
fn from_device_validates_buffer_sizes() {
    let (vals, cols, _) = sample_arrays();
    // row-offset buffer too short for 4 rows
    let err = CsrTable::from_device(
        Box::new(HostMemory::from_slice(bytemuck::cast_slice::<_, u8>(&vals))),
        Box::new(HostMemory::from_slice(bytemuck::cast_slice::<_, u8>(&cols))),
        Box::new(HostMemory::from_slice(bytemuck::cast_slice::<_, u8>(&[1u64, 5]))),
        DType::F64,
        3,
        4,
        CsrIndexing::OneBased,
    )
    .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
}
