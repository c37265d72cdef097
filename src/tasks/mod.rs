//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Stats reporter: logs cache occupancy and hit rate at a fixed interval

mod reporter;

pub use reporter::spawn_stats_reporter;
