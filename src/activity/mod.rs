//! Bounded feed of notable bot events

pub mod feed;
pub mod summary;

pub use feed::*;
pub use summary::*;
