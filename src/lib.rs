//! Stablewatch: USDT wallet transfer monitor and alert dispatcher
//!
//! This is the root crate that provides integration test and benchmark access
//! to the workspace. For actual functionality, use the individual crates:
//!
//! - `stablewatch-core`: Core types, explorer clients, configuration, storage
//! - `tx-monitor`: Incremental transfer detection and rule evaluation
//! - `notify-dispatcher`: Alert formatting and channel fan-out

pub use notify_dispatcher as dispatcher;
pub use stablewatch_core as core;
pub use tx_monitor as monitor;
