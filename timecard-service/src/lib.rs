//! Timecard Service
//!
//! Timesheet computation and aggregation: raw clock and location records in,
//! payable hours, mileage, pay tiers and year/week/employee/date roll-ups out.
//! The calculation modules are pure; [`TimecardService`] wraps them behind a
//! schedule source and exposes them via tower::Service for InProcess calls.

pub mod aggregate;
pub mod calculator;
pub mod config;
pub mod export;
pub mod geo;
pub mod models;
pub mod pay;
pub mod repository;
pub mod service;
pub mod timestamp;
pub mod week;

pub use aggregate::{
    aggregate, group_by_category, AggregateNode, AggregateTree, CategoryGroup, NodeKey,
};
pub use calculator::{calculate, compute_schedule, compute_schedules, EntryCalculation};
pub use config::{EngineConfig, OvertimeBasis};
pub use models::{ComputedRecord, EntryType, Schedule, SpecialActivity, TimesheetEntry};
pub use pay::{apply_pay, PayBreakdown};
pub use repository::{InMemoryScheduleSource, ScheduleSource};
pub use service::{ReportRequest, TimecardService, TimesheetReport};
pub use week::WeekRange;
