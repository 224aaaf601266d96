//! Core domain logic for the lap tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Lap times: fixed-precision durations in two display variants
//! - Standards: tier cutoff tables and rank resolution
//! - Timesheets: per-track derived rows and aggregate statistics
//! - Categories: speed class and item rule combinations with their
//!   reference data

pub mod category;
pub mod context;
pub mod lap_time;
pub mod standards;
mod timesheet;

pub use category::{Category, CategoryError, ItemRule, SpeedClass};
pub use context::{ReferenceBook, ReferenceTables};
pub use lap_time::{LapTime, LapTimeExt, TimeError, TimeOperand, Variant};
pub use standards::{Rank, StandardSet, StandardsError, StandardsTable, UNRANKED};
pub use timesheet::{
    DiffStats, ImprovementRow, NumericColumn, SheetStats, TimesheetError, TimesheetRow,
    UnknownColumn, build_timesheet, improvement_rows, sheet_stats, top_n,
};
