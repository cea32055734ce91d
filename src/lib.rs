//! lift - Personal strength training log
//!
//! Program-driven or freestyle workout logging with shorthand set entry,
//! resumable sessions and personal record detection.

pub mod calc;
pub mod config;
pub mod console;
pub mod db;
pub mod exercises;
pub mod records;
pub mod session;
pub mod stats;
pub mod tui;

pub use db::Database;
