//! Historical snapshot and live tail merge for bot logs

pub mod filter;
pub mod merger;

pub use filter::*;
pub use merger::*;
