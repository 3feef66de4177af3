//! Single-owner state container and its cooperative event loop

pub mod events;
pub mod stats;
pub mod dashboard;

pub use events::*;
pub use stats::*;
pub use dashboard::*;
