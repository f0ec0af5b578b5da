//! Test fixtures and mock providers for Calor development.
//!
//! [`fixtures`] builds standard input grids and proptest strategies;
//! [`providers`] has discovery doubles that fail in controlled ways.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod providers;

/// Assert two fields are equal bit for bit, reporting the first mismatch.
#[track_caller]
pub fn assert_bitwise_eq(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "fields differ in length");
    if let Some(i) = actual
        .iter()
        .zip(expected)
        .position(|(a, e)| a.to_bits() != e.to_bits())
    {
        panic!(
            "cell {i} differs: {} ({:#010x}) vs expected {} ({:#010x})",
            actual[i],
            actual[i].to_bits(),
            expected[i],
            expected[i].to_bits()
        );
    }
}
