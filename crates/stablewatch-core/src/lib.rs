//! Stablewatch Core Library
//!
//! Shared types, chain explorer clients, configuration, and storage for the
//! transaction monitor and notification dispatcher workers.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use store::{DispatchStore, MemoryStore, MonitorStore};
