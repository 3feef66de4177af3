//! Core data types and structures

pub mod connection;
pub mod snapshot;
pub mod entities;
pub mod activity;
pub mod logs;
pub mod health;
pub mod messages;

pub use connection::*;
pub use snapshot::*;
pub use entities::*;
pub use activity::*;
pub use logs::*;
pub use health::*;
pub use messages::*;
