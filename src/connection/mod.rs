//! Push channel supervision and message routing

pub mod transport;
pub mod dispatch;
pub mod supervisor;

pub use transport::*;
pub use dispatch::*;
pub use supervisor::*;
