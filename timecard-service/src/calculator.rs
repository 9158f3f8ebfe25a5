//! Timesheet record calculator
//!
//! Turns one raw timesheet entry into payable hours and driven distance.
//! Every path degrades to zero instead of failing: an incomplete record
//! undercounts, it never breaks a report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::geo;
use crate::models::{ComputedRecord, EntryType, Schedule, TimesheetEntry};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Derived values for a single entry
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EntryCalculation {
    pub hours: f64,
    pub distance: f64,
    /// Geodistance before any manual override, for audit display
    pub calculated_distance: f64,
}

/// Compute hours and distance for one entry.
pub fn calculate(entry: &TimesheetEntry, config: &EngineConfig) -> EntryCalculation {
    let result = match entry.entry_type {
        EntryType::DriveTime => drive_time(entry, config),
        EntryType::SiteTime => site_time(entry, config),
        EntryType::Unknown => EntryCalculation::default(),
    };

    EntryCalculation {
        hours: finite_or_zero(result.hours),
        distance: finite_or_zero(result.distance),
        calculated_distance: finite_or_zero(result.calculated_distance),
    }
}

fn drive_time(entry: &TimesheetEntry, config: &EngineConfig) -> EntryCalculation {
    let calculated_distance = geo::driving_distance_between(
        entry.location_in.as_deref(),
        entry.location_out.as_deref(),
        config.driving_factor,
    );
    let distance = entry.distance_override().unwrap_or(calculated_distance);

    let hours = match entry.duration_override() {
        Some(manual) => manual,
        None => {
            let travel = if config.average_speed_mph > 0.0 {
                distance / config.average_speed_mph
            } else {
                0.0
            };
            travel + special_activity_hours(entry, config)
        }
    };

    EntryCalculation {
        hours,
        distance,
        calculated_distance,
    }
}

/// Fixed hours credited for washouts and shop time.
pub fn special_activity_hours(entry: &TimesheetEntry, config: &EngineConfig) -> f64 {
    f64::from(entry.dump_washout.quantity()) * config.washout_hours_per_unit
        + f64::from(entry.shop_time.quantity()) * config.shop_hours_per_unit
}

fn site_time(entry: &TimesheetEntry, config: &EngineConfig) -> EntryCalculation {
    let hours = match entry.duration_override() {
        Some(manual) => manual,
        None => site_elapsed_hours(entry, config),
    };

    EntryCalculation {
        hours,
        distance: 0.0,
        calculated_distance: 0.0,
    }
}

fn site_elapsed_hours(entry: &TimesheetEntry, config: &EngineConfig) -> f64 {
    let (Some(clock_in), Some(clock_out)) = (entry.clock_in, entry.clock_out) else {
        return 0.0;
    };

    let mut duration_ms = (clock_out - clock_in).num_milliseconds();
    if let (Some(lunch_start), Some(lunch_end)) = (entry.lunch_start, entry.lunch_end) {
        if lunch_end > lunch_start {
            duration_ms -= (lunch_end - lunch_start).num_milliseconds();
        }
    }
    if duration_ms <= 0 {
        return 0.0;
    }

    let raw_hours = duration_ms as f64 / MS_PER_HOUR;
    round_site_hours(raw_hours, clock_in, config.rounding_cutoff)
}

/// Apply the date-gated rounding policy to raw Site Time hours.
///
/// Entries clocked in before `cutoff` keep their raw value. From the cutoff
/// on, hours in `[7.75, 8.0)` snap to 8, and otherwise the minutes are
/// banded down to a quarter hour.
pub fn round_site_hours(raw_hours: f64, clock_in: DateTime<Utc>, cutoff: DateTime<Utc>) -> f64 {
    if clock_in < cutoff {
        return raw_hours;
    }
    if (7.75..8.0).contains(&raw_hours) {
        return 8.0;
    }

    let whole = raw_hours.floor();
    let minutes = ((raw_hours - whole) * 60.0).round();
    let (whole, quarter) = match minutes {
        m if m <= 14.0 => (whole, 0.0),
        m if m <= 29.0 => (whole, 15.0),
        m if m <= 44.0 => (whole, 30.0),
        m if m <= 59.0 => (whole, 45.0),
        // 59.5 and up rounds to a full hour
        _ => (whole + 1.0, 0.0),
    };
    whole + quarter / 60.0
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Compute every entry of a schedule, attaching schedule context.
///
/// Drive Time entries without a clock-in use the schedule start date as
/// their grouping instant.
pub fn compute_schedule(schedule: &Schedule, config: &EngineConfig) -> Vec<ComputedRecord> {
    schedule
        .timesheets
        .iter()
        .map(|entry| {
            let calc = calculate(entry, config);
            let clock_in = match entry.entry_type {
                EntryType::DriveTime => entry.clock_in.or(schedule.start_date),
                _ => entry.clock_in,
            };
            ComputedRecord {
                entry: entry.clone(),
                clock_in,
                hours: calc.hours,
                distance: calc.distance,
                calculated_distance: calc.calculated_distance,
                schedule_id: entry
                    .schedule_id
                    .clone()
                    .unwrap_or_else(|| schedule.id.clone()),
                job_title: schedule.job_title.clone(),
                job_reference: schedule.job_reference.clone(),
                category: schedule.fringe.clone(),
                pay: None,
            }
        })
        .collect()
}

/// Compute every entry of every schedule.
pub fn compute_schedules(schedules: &[Schedule], config: &EngineConfig) -> Vec<ComputedRecord> {
    schedules
        .iter()
        .flat_map(|schedule| compute_schedule(schedule, config))
        .collect()
}

impl TimesheetEntry {
    /// Close an active Drive Time entry.
    ///
    /// Returns a new entry with the clock-out and end location set and the
    /// computed distance and hours frozen into the manual fields, so later
    /// recomputation yields the same values.
    pub fn close(
        &self,
        clock_out: DateTime<Utc>,
        location_out: Option<String>,
        config: &EngineConfig,
    ) -> TimesheetEntry {
        let mut closed = self.clone();
        closed.clock_out = Some(clock_out);
        if location_out.is_some() {
            closed.location_out = location_out;
        }

        let calc = calculate(&closed, config);
        closed.manual_distance = Some(calc.distance);
        closed.manual_duration = Some(calc.hours);
        closed
    }
}
