//! Utility functions and helpers

pub mod ring;
pub mod notify;
pub mod logging;
pub mod display;

pub use ring::*;
pub use notify::*;
pub use logging::*;
pub use display::*;
