//! Integration tests for the blocked acquire/release access paths
//!
//! Covers densification, feature extraction, sparse fragments, type
//! conversion, boundary behavior, ownership, and concurrent read-only
//! acquisition over disjoint row ranges.

mod common;

use common::{sample_arrays, sample_dense, sample_owned};
use numtab::block::{BlockDescriptor, CsrBlockDescriptor, ReadWriteMode};
use numtab::prelude::*;

#[test]
fn densify_matches_reference_matrix() {
    let (mut vals, mut cols, mut offs) = sample_arrays();
    let table =
        CsrTable::attach(&mut vals, &mut cols, &mut offs, 3, 4, CsrIndexing::OneBased).unwrap();
    let mut desc = BlockDescriptor::<f64>::new();
    let block = table.row_block(0, 4, &mut desc).unwrap();
    assert_eq!(block.values(), &sample_dense()[..]);
}

#[test]
fn feature_one_matches_reference_column() {
    let table = sample_owned();
    let mut desc = BlockDescriptor::<f64>::new();
    let block = table.feature_block(1, 0, 4, &mut desc).unwrap();
    assert_eq!(block.values(), &[5.0, 0.0, 0.0, 1.0]);
}

#[test]
fn densified_entries_match_per_feature_extraction() {
    let table = sample_owned();
    let mut row_desc = BlockDescriptor::<f64>::new();
    let mut col_desc = BlockDescriptor::<f64>::new();

    let dense: Vec<f64> = table.row_block(0, 4, &mut row_desc).unwrap().values().to_vec();
    for col in 0..table.ncols() {
        for row in 0..table.nrows() {
            let block = table.feature_block(col, row, 1, &mut col_desc).unwrap();
            assert_eq!(
                block.values()[0],
                dense[row * table.ncols() + col],
                "mismatch at ({row}, {col})"
            );
        }
    }
}

#[test]
fn absent_entries_read_as_zero_in_every_type() {
    let table = sample_owned();
    let mut d64 = BlockDescriptor::<f64>::new();
    let mut d32 = BlockDescriptor::<f32>::new();
    let mut di = BlockDescriptor::<i32>::new();
    // row 1 is entirely empty
    assert_eq!(table.row_block(1, 1, &mut d64).unwrap().values(), &[0.0; 3]);
    assert_eq!(table.row_block(1, 1, &mut d32).unwrap().values(), &[0.0f32; 3]);
    assert_eq!(table.row_block(1, 1, &mut di).unwrap().values(), &[0i32; 3]);
}

#[test]
fn stored_f64_acquired_as_f32_is_ieee_rounded() {
    let mut vals = vec![3.14159265358979f64, 2.0];
    let mut cols = vec![1u64, 2];
    let mut offs = vec![1u64, 3];
    let table =
        CsrTable::attach(&mut vals, &mut cols, &mut offs, 2, 1, CsrIndexing::OneBased).unwrap();
    let mut desc = BlockDescriptor::<f32>::new();
    let block = table.row_block(0, 1, &mut desc).unwrap();
    assert_eq!(block.values(), &[3.14159265358979f64 as f32, 2.0f32]);
}

#[test]
fn acquisition_past_table_end_is_empty_not_an_error() {
    let table = sample_owned();
    let mut desc = BlockDescriptor::<f64>::new();
    let mut csr_desc = CsrBlockDescriptor::<f64>::new();

    let block = table.row_block(4, 3, &mut desc).unwrap();
    assert!(block.is_empty());
    let block = table.feature_block(0, 100, 1, &mut desc).unwrap();
    assert!(block.is_empty());
    let block = table.sparse_block(4, 1, &mut csr_desc).unwrap();
    assert_eq!(block.nrows(), 0);
    assert_eq!(block.row_offsets(), &[1]);
}

#[test]
fn reacquire_after_release_is_bit_identical() {
    let table = sample_owned();
    let mut desc = BlockDescriptor::<f64>::new();
    let first: Vec<f64> = table.row_block(1, 3, &mut desc).unwrap().values().to_vec();
    let block = table.row_block(1, 3, &mut desc).unwrap();
    common::assert_same_f64(block.values(), &first, "re-acquired row block");
}

#[test]
fn sparse_write_preserves_structure() {
    let mut table = sample_owned();
    let mut desc = CsrBlockDescriptor::<f64>::new();
    let (cols_before, offs_before) = {
        let block = table.sparse_block(0, 4, &mut desc).unwrap();
        (block.col_indices().to_vec(), block.row_offsets().to_vec())
    };

    {
        let mut block = table
            .sparse_block_mut(0, 4, ReadWriteMode::ReadWrite, &mut desc)
            .unwrap();
        for v in block.values_mut() {
            *v *= 10.0;
        }
        block.release().unwrap();
    }

    let block = table.sparse_block(0, 4, &mut desc).unwrap();
    assert_eq!(block.values(), &[50.0, 20.0, 90.0, 10.0]);
    assert_eq!(block.col_indices(), &cols_before[..]);
    assert_eq!(block.row_offsets(), &offs_before[..]);
}

#[test]
fn attached_arrays_survive_table_drop() {
    let (mut vals, mut cols, mut offs) = sample_arrays();
    {
        let table =
            CsrTable::attach(&mut vals, &mut cols, &mut offs, 3, 4, CsrIndexing::OneBased)
                .unwrap();
        assert_eq!(table.ownership(), MemoryOwnership::UserAllocated);
    }
    // sentinel writes after destruction: the memory is still the caller's
    vals[0] = -1.0;
    cols[0] = 1;
    offs[0] = 1;
    assert_eq!(vals[0], -1.0);
}

#[test]
fn feature_block_rejects_out_of_range_feature() {
    let table = sample_owned();
    let mut desc = BlockDescriptor::<f64>::new();
    let err = table.feature_block(3, 0, 4, &mut desc).unwrap_err();
    assert!(matches!(err, Error::IndexOutOfBounds { .. }));
}

#[test]
fn zero_based_tables_are_rejected_by_check_and_acquisition() {
    let mut vals = vec![1.0f64];
    let mut cols = vec![0u64];
    let mut offs = vec![0u64, 1];
    let table =
        CsrTable::attach(&mut vals, &mut cols, &mut offs, 1, 1, CsrIndexing::ZeroBased).unwrap();
    assert!(matches!(
        table.check("zero-based input"),
        Err(Error::UnsupportedIndexing { .. })
    ));
    let mut desc = CsrBlockDescriptor::<f64>::new();
    assert!(matches!(
        table.sparse_block(0, 1, &mut desc),
        Err(Error::UnsupportedIndexing { .. })
    ));
}

#[test]
fn descriptor_reuse_across_tables_of_different_types() {
    let mut desc = BlockDescriptor::<f64>::new();

    let table = sample_owned();
    let dense: Vec<f64> = table.row_block(0, 4, &mut desc).unwrap().values().to_vec();
    assert_eq!(dense, sample_dense());

    let mut vals = vec![7i32];
    let mut cols = vec![1u64];
    let mut offs = vec![1u64, 2];
    let int_table =
        CsrTable::attach(&mut vals, &mut cols, &mut offs, 1, 1, CsrIndexing::OneBased).unwrap();
    let block = int_table.row_block(0, 1, &mut desc).unwrap();
    assert_eq!(block.values(), &[7.0]);

    desc.reset();
    assert_eq!(desc.capacity(), 0);
}

#[test]
fn concurrent_disjoint_read_only_acquisitions() {
    use rayon::prelude::*;

    let table = sample_owned();
    let dense = sample_dense();
    let results: Vec<Vec<f64>> = (0..4usize)
        .into_par_iter()
        .map(|row| {
            let mut desc = BlockDescriptor::<f64>::new();
            table.row_block(row, 1, &mut desc).unwrap().values().to_vec()
        })
        .collect();
    for (row, got) in results.iter().enumerate() {
        assert_eq!(got, &dense[row * 3..(row + 1) * 3], "row {row}");
    }
}
