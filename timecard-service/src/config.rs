use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// How overtime thresholds are applied when computing pay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OvertimeBasis {
    /// Each timesheet record is tiered on its own hours
    #[default]
    PerRecord,
    /// Tiers apply to an employee's total for a calendar day
    PerEmployeeDay,
}

impl OvertimeBasis {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "per_record" | "record" => Some(Self::PerRecord),
            "per_employee_day" | "employee_day" | "day" => Some(Self::PerEmployeeDay),
            _ => None,
        }
    }
}

/// Timesheet engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Multiplier from straight-line to road distance
    pub driving_factor: f64,

    /// Average driving speed used to turn miles into hours
    pub average_speed_mph: f64,

    /// Hours credited per unit of dump washout
    pub washout_hours_per_unit: f64,

    /// Hours credited per unit of shop time
    pub shop_hours_per_unit: f64,

    /// Site Time clocked in before this instant is not rounded
    pub rounding_cutoff: DateTime<Utc>,

    /// Hours paid at the regular rate
    pub regular_hours_limit: f64,

    /// Hours up to which overtime applies; beyond is double time
    pub overtime_hours_limit: f64,

    /// Overtime rate multiplier
    pub overtime_multiplier: f64,

    /// Double-time rate multiplier
    pub double_time_multiplier: f64,

    /// Where pay tier thresholds are applied
    pub overtime_basis: OvertimeBasis,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            driving_factor: 1.19,
            average_speed_mph: 55.0,
            washout_hours_per_unit: 0.50,
            shop_hours_per_unit: 0.25,
            rounding_cutoff: default_rounding_cutoff(),
            regular_hours_limit: 8.0,
            overtime_hours_limit: 12.0,
            overtime_multiplier: 1.5,
            double_time_multiplier: 2.0,
            overtime_basis: OvertimeBasis::PerRecord,
        }
    }
}

fn default_rounding_cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

impl EngineConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(factor) = std::env::var("TIMESHEET_DRIVING_FACTOR") {
            if let Ok(n) = factor.parse::<f64>() {
                if n.is_finite() && n > 0.0 {
                    config.driving_factor = n;
                }
            }
        }

        if let Ok(speed) = std::env::var("TIMESHEET_AVERAGE_SPEED_MPH") {
            if let Ok(n) = speed.parse::<f64>() {
                if n.is_finite() && n > 0.0 {
                    config.average_speed_mph = n;
                }
            }
        }

        if let Ok(cutoff) = std::env::var("TIMESHEET_ROUNDING_CUTOFF") {
            if let Some(instant) = timestamp::normalize(&cutoff) {
                config.rounding_cutoff = instant;
            }
        }

        if let Ok(basis) = std::env::var("TIMESHEET_OVERTIME_BASIS") {
            if let Some(basis) = OvertimeBasis::parse(&basis) {
                config.overtime_basis = basis;
            }
        }

        config
    }

    /// Set the rounding cutoff instant.
    pub fn with_rounding_cutoff(mut self, cutoff: DateTime<Utc>) -> Self {
        self.rounding_cutoff = cutoff;
        self
    }

    /// Set the overtime basis.
    pub fn with_overtime_basis(mut self, basis: OvertimeBasis) -> Self {
        self.overtime_basis = basis;
        self
    }

    /// Set the driving factor.
    pub fn with_driving_factor(mut self, factor: f64) -> Self {
        self.driving_factor = factor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.driving_factor, 1.19);
        assert_eq!(config.average_speed_mph, 55.0);
        assert_eq!(config.overtime_basis, OvertimeBasis::PerRecord);
        assert_eq!(timestamp::canonical(&config.rounding_cutoff), "2025-05-05T00:00:00Z");
    }

    #[test]
    fn test_overtime_basis_parse() {
        assert_eq!(OvertimeBasis::parse("per_employee_day"), Some(OvertimeBasis::PerEmployeeDay));
        assert_eq!(OvertimeBasis::parse(" Record "), Some(OvertimeBasis::PerRecord));
        assert_eq!(OvertimeBasis::parse("weekly"), None);
    }
}
