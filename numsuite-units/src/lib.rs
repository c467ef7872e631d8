//! Regression units for the numsuite harness
//!
//! Ports the kernel examples of the wrapped library into harness units:
//! each unit computes one kernel configuration over seeded random features
//! and snapshots the resulting matrices as golden fixtures.

pub mod dataops;
pub mod kernels;
pub mod units;

pub use units::{catalog, registry, BLACKLIST};
