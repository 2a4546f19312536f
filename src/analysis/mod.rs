//! Aggregate statistics over the loaded dataset.

pub mod aggregator;

pub use aggregator::*;
