//! Revision-ordered merge of push and pull updates

pub mod state;

pub use state::*;
