//! Explicit, per-pair deterministic random sources
//!
//! Units never share ambient global random state. Each invocation receives
//! its own `SeedSource`, derived from the run's base seed plus the pair
//! identity, so a unit's results do not depend on which other units ran
//! before it and previously generated fixtures stay valid under reordering.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic random source handed to a unit's entry callable.
#[derive(Debug)]
pub struct SeedSource {
    rng: StdRng,
}

impl SeedSource {
    /// Source seeded directly from a raw seed
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source for one (unit, setting index) pair. The derivation is a fixed
    /// hash, not `DefaultHasher`, so fixtures stay valid across toolchains.
    pub fn for_pair(base: u64, unit: &str, index: usize) -> Self {
        let mut h = fnv1a(unit.as_bytes());
        h = mix(h ^ base);
        h = mix(h ^ index as u64);
        Self::from_seed(h)
    }

    /// Next uniform real in [0, 1)
    pub fn next_real(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Next integer in [0, bound)
    pub fn next_index(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }

    /// A vector of uniform reals in [0, 1)
    pub fn fill_reals(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.next_real()).collect()
    }

    /// Direct access for units with richer sampling needs
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        h ^= u64::from(*b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
