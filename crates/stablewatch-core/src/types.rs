//! Core domain types for the Stablewatch workers.

pub mod alert;
pub mod channel;
pub mod event;
pub mod network;
pub mod transfer;
pub mod wallet;

pub use alert::*;
pub use channel::*;
pub use event::*;
pub use network::*;
pub use transfer::*;
pub use wallet::*;
