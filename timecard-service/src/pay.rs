//! Pay tiers
//!
//! Splits hours into regular, overtime and double-time buckets and prices
//! them at an hourly rate.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, OvertimeBasis};
use crate::models::ComputedRecord;

/// Hours and pay per tier
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PayBreakdown {
    pub reg_hrs: f64,
    pub ot_hrs: f64,
    pub dt_hrs: f64,
    pub reg_pay: f64,
    pub ot_pay: f64,
    pub dt_pay: f64,
    pub gross_pay: f64,
}

impl PayBreakdown {
    /// Tier a block of hours on its own.
    pub fn for_hours(hours: f64, rate: f64, config: &EngineConfig) -> Self {
        let hours = sanitize(hours);
        let regular_limit = config.regular_hours_limit;
        let overtime_band = (config.overtime_hours_limit - regular_limit).max(0.0);

        let reg_hrs = hours.min(regular_limit);
        let ot_hrs = (hours - regular_limit).max(0.0).min(overtime_band);
        let dt_hrs = (hours - config.overtime_hours_limit).max(0.0);

        Self::priced(reg_hrs, ot_hrs, dt_hrs, rate, config)
    }

    /// Tier a block of hours that starts `hours_before` into the day.
    ///
    /// Used to split an employee-day total across its records.
    pub fn for_hours_offset(
        hours: f64,
        hours_before: f64,
        rate: f64,
        config: &EngineConfig,
    ) -> Self {
        let start = sanitize(hours_before);
        let end = start + sanitize(hours);
        let regular_limit = config.regular_hours_limit;
        let overtime_limit = config.overtime_hours_limit.max(regular_limit);

        let overlap = |lo: f64, hi: f64| (end.min(hi) - start.max(lo)).max(0.0);
        let reg_hrs = overlap(0.0, regular_limit);
        let ot_hrs = overlap(regular_limit, overtime_limit);
        let dt_hrs = overlap(overtime_limit, f64::INFINITY);

        Self::priced(reg_hrs, ot_hrs, dt_hrs, rate, config)
    }

    fn priced(reg_hrs: f64, ot_hrs: f64, dt_hrs: f64, rate: f64, config: &EngineConfig) -> Self {
        let rate = sanitize(rate);
        let reg_pay = reg_hrs * rate;
        let ot_pay = ot_hrs * rate * config.overtime_multiplier;
        let dt_pay = dt_hrs * rate * config.double_time_multiplier;

        Self {
            reg_hrs,
            ot_hrs,
            dt_hrs,
            reg_pay,
            ot_pay,
            dt_pay,
            gross_pay: reg_pay + ot_pay + dt_pay,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.reg_hrs + self.ot_hrs + self.dt_hrs
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Attach pay to each record using the configured overtime basis.
///
/// Employees missing from `rates` are priced at zero.
pub fn apply_pay(
    records: &mut [ComputedRecord],
    rates: &HashMap<String, f64>,
    config: &EngineConfig,
) {
    match config.overtime_basis {
        OvertimeBasis::PerRecord => {
            for record in records.iter_mut() {
                let rate = rates.get(record.employee()).copied().unwrap_or(0.0);
                record.pay = Some(PayBreakdown::for_hours(record.hours, rate, config));
            }
        }
        OvertimeBasis::PerEmployeeDay => apply_pay_per_employee_day(records, rates, config),
    }
}

fn apply_pay_per_employee_day(
    records: &mut [ComputedRecord],
    rates: &HashMap<String, f64>,
    config: &EngineConfig,
) {
    let mut days: BTreeMap<(String, Option<NaiveDate>), Vec<usize>> = BTreeMap::new();
    for (idx, record) in records.iter().enumerate() {
        days.entry((record.employee().to_string(), record.work_date()))
            .or_default()
            .push(idx);
    }

    for ((employee, _), mut indices) in days {
        // Earlier work in the day fills the regular band first
        indices.sort_by(|a, b| {
            records[*a]
                .clock_in
                .cmp(&records[*b].clock_in)
                .then_with(|| a.cmp(b))
        });

        let rate = rates.get(&employee).copied().unwrap_or(0.0);
        let mut hours_before = 0.0;
        for idx in indices {
            let hours = records[idx].hours;
            records[idx].pay = Some(PayBreakdown::for_hours_offset(hours, hours_before, rate, config));
            hours_before += sanitize(hours);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryType, TimesheetEntry};
    use chrono::{TimeZone, Utc};

    fn record(employee: &str, hour: u32, hours: f64) -> ComputedRecord {
        ComputedRecord {
            entry: TimesheetEntry::new(employee, EntryType::SiteTime),
            clock_in: Some(Utc.with_ymd_and_hms(2025, 6, 2, hour, 0, 0).unwrap()),
            hours,
            distance: 0.0,
            calculated_distance: 0.0,
            schedule_id: "s1".to_string(),
            job_title: None,
            job_reference: None,
            category: None,
            pay: None,
        }
    }

    #[test]
    fn test_regular_only() {
        let pay = PayBreakdown::for_hours(6.0, 20.0, &EngineConfig::default());
        assert_eq!(pay.reg_hrs, 6.0);
        assert_eq!(pay.ot_hrs, 0.0);
        assert_eq!(pay.dt_hrs, 0.0);
        assert_eq!(pay.gross_pay, 120.0);
    }

    #[test]
    fn test_all_three_tiers() {
        let pay = PayBreakdown::for_hours(14.0, 20.0, &EngineConfig::default());
        assert_eq!(pay.reg_hrs, 8.0);
        assert_eq!(pay.ot_hrs, 4.0);
        assert_eq!(pay.dt_hrs, 2.0);
        assert_eq!(pay.reg_pay, 160.0);
        assert_eq!(pay.ot_pay, 120.0);
        assert_eq!(pay.dt_pay, 80.0);
        assert_eq!(pay.gross_pay, 360.0);
        assert_eq!(pay.total_hours(), 14.0);
    }

    #[test]
    fn test_overtime_band_only() {
        let pay = PayBreakdown::for_hours(10.0, 10.0, &EngineConfig::default());
        assert_eq!(pay.ot_hrs, 2.0);
        assert_eq!(pay.dt_hrs, 0.0);
        assert_eq!(pay.gross_pay, 80.0 + 30.0);
    }

    #[test]
    fn test_invalid_inputs_price_to_zero() {
        let config = EngineConfig::default();
        assert_eq!(PayBreakdown::for_hours(f64::NAN, 20.0, &config), PayBreakdown::default());
        assert_eq!(PayBreakdown::for_hours(-3.0, 20.0, &config), PayBreakdown::default());
        assert_eq!(PayBreakdown::for_hours(5.0, f64::NAN, &config).gross_pay, 0.0);
    }

    #[test]
    fn test_offset_matches_whole_day() {
        let config = EngineConfig::default();
        let first = PayBreakdown::for_hours_offset(6.0, 0.0, 10.0, &config);
        let second = PayBreakdown::for_hours_offset(7.0, 6.0, 10.0, &config);
        let whole = PayBreakdown::for_hours(13.0, 10.0, &config);

        assert_eq!(first.reg_hrs + second.reg_hrs, whole.reg_hrs);
        assert_eq!(first.ot_hrs + second.ot_hrs, whole.ot_hrs);
        assert_eq!(first.dt_hrs + second.dt_hrs, whole.dt_hrs);
        assert_eq!(first.gross_pay + second.gross_pay, whole.gross_pay);
    }

    #[test]
    fn test_per_record_basis_tiers_each_record() {
        let config = EngineConfig::default();
        let rates = HashMap::from([("EMP001".to_string(), 10.0)]);
        let mut records = vec![record("EMP001", 6, 6.0), record("EMP001", 13, 6.0)];

        apply_pay(&mut records, &rates, &config);

        for r in &records {
            let pay = r.pay.unwrap();
            assert_eq!(pay.reg_hrs, 6.0);
            assert_eq!(pay.ot_hrs, 0.0);
        }
    }

    #[test]
    fn test_per_employee_day_basis_credits_overtime() {
        let config = EngineConfig::default().with_overtime_basis(OvertimeBasis::PerEmployeeDay);
        let rates = HashMap::from([("EMP001".to_string(), 10.0)]);
        // Later record listed first; clock-in order decides who fills the regular band
        let mut records = vec![record("EMP001", 13, 6.0), record("EMP001", 6, 6.0)];

        apply_pay(&mut records, &rates, &config);

        let later = records[0].pay.unwrap();
        let earlier = records[1].pay.unwrap();
        assert_eq!(earlier.reg_hrs, 6.0);
        assert_eq!(later.reg_hrs, 2.0);
        assert_eq!(later.ot_hrs, 4.0);
        assert_eq!(earlier.gross_pay + later.gross_pay, 80.0 + 60.0);
    }

    #[test]
    fn test_missing_rate_is_zero_pay() {
        let config = EngineConfig::default();
        let mut records = vec![record("EMP404", 8, 9.0)];
        apply_pay(&mut records, &HashMap::new(), &config);

        let pay = records[0].pay.unwrap();
        assert_eq!(pay.ot_hrs, 1.0);
        assert_eq!(pay.gross_pay, 0.0);
    }
}
