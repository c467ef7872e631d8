//! Seeded input data for the regression units
//!
//! Every generator draws exclusively from the per-pair `SeedSource` the
//! harness passes in, so identical seeds reproduce identical inputs no
//! matter which other units ran before.

use numsuite_harness::seed::SeedSource;
use numsuite_harness::value::NumArray;

const ACGT: [char; 4] = ['A', 'C', 'G', 'T'];

/// Uniform random feature matrix: one row per feature, one column per vector
pub fn random_features(seed: &mut SeedSource, feats: usize, vectors: usize) -> NumArray {
    let data = seed.fill_reals(feats * vectors);
    NumArray::matrix(feats, vectors, data).expect("generated data fills the shape")
}

/// Random DNA strings of a fixed length
pub fn random_dna(seed: &mut SeedSource, count: usize, len: usize) -> Vec<String> {
    (0..count)
        .map(|_| (0..len).map(|_| ACGT[seed.next_index(4)]).collect())
        .collect()
}
