#![forbid(unsafe_code)]

//! Core library for the liftlog workout tracker client.
//!
//! This crate provides:
//! - Domain types mirroring the workout API (users, workouts, calendars, snapshots)
//! - The HTTP gateway to that API
//! - Progress aggregation (daily series, muscle tallies, lifetime totals)
//! - Calendar month projection of snapshots
//! - Session persistence, configuration and logging

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod gateway;
pub mod aggregate;
pub mod calendar;
pub mod session;
pub mod validate;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use gateway::{ApiClient, CalendarBundle};
pub use aggregate::{DashboardStats, DaySummary, LifetimeTotals, ProgressReport, TimeRange};
pub use calendar::{CalendarCursor, DayCell, MonthGrid, MonthRef};
pub use session::{Session, SessionStore, Theme};
