//! Periodic bulk pull of entity snapshots

pub mod source;
pub mod snapshot;

pub use source::*;
pub use snapshot::*;
