//! Derived three-way service health

pub mod aggregator;

pub use aggregator::*;
