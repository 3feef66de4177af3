//! Error handling and recovery mechanisms

pub mod dash_error;
pub mod recovery;

pub use dash_error::*;
pub use recovery::*;
