//! Benchmark support crate for vecnav.
//!
//! Provides synthetic vector sources, a brute-force oracle and recall
//! scoring used by the Criterion benchmarks.

pub mod error;
pub mod recall;
pub mod source;
