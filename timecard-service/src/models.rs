//! Timesheet models
//!
//! Schedule documents and the timesheet entries embedded in them, as they
//! arrive from the external store. Loose encodings are parsed once here, at
//! the boundary; nothing downstream re-parses them.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::pay::PayBreakdown;
use crate::timestamp;

/// Kind of timesheet entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Travel between sites, paid by distance
    #[serde(rename = "Drive Time", alias = "DriveTime", alias = "drive_time")]
    DriveTime,
    /// On-site work, paid by elapsed clock time
    #[serde(rename = "Site Time", alias = "SiteTime", alias = "site_time")]
    SiteTime,
    /// Anything else; computes to zero
    #[serde(other)]
    Unknown,
}

impl Default for EntryType {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Special activity logged against a Drive Time entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialActivity {
    #[default]
    None,
    Quantity(u32),
}

static ENCODED_ACTIVITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*[\d.]+\s*hrs?\s*\(\s*(\d+)\s*qty\s*\)\s*$").expect("valid regex")
});

impl SpecialActivity {
    /// Build from a raw quantity; zero means no activity.
    pub fn from_quantity(quantity: u32) -> Self {
        if quantity == 0 {
            Self::None
        } else {
            Self::Quantity(quantity)
        }
    }

    /// Parse the string encodings used by the field app.
    ///
    /// `"0.50 hrs (2 qty)"` carries an explicit quantity; a truthy flag string
    /// counts as one unit; an empty or falsy string is no activity.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(caps) = ENCODED_ACTIVITY.captures(trimmed) {
            let quantity = caps[1].parse().unwrap_or(0);
            return Self::from_quantity(quantity);
        }
        if let Ok(n) = trimmed.parse::<u32>() {
            return Self::from_quantity(n);
        }
        match trimmed.to_lowercase().as_str() {
            "" | "false" | "no" | "null" | "undefined" => Self::None,
            _ => Self::Quantity(1),
        }
    }

    /// Number of units; zero for `None`.
    pub fn quantity(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Quantity(n) => *n,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl<'de> Deserialize<'de> for SpecialActivity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::Bool(true)) => Self::Quantity(1),
            Some(serde_json::Value::Number(n)) => whole_quantity(&n)
                .map(|q| Self::from_quantity(u32::try_from(q).unwrap_or(u32::MAX)))
                .unwrap_or_default(),
            Some(serde_json::Value::String(s)) => Self::parse(&s),
            _ => Self::None,
        })
    }
}

impl Serialize for SpecialActivity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::None => serializer.serialize_none(),
            Self::Quantity(n) => serializer.serialize_u32(*n),
        }
    }
}

/// Non-negative whole number, whether JSON wrote it as `2` or `2.0`.
fn whole_quantity(n: &serde_json::Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

/// Lenient numeric field: numbers or numeric strings, anything else is `None`.
mod lenient_number {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        let number = match value {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(number.filter(|n| n.is_finite()))
    }
}

/// Lenient text fields: only JSON strings count, anything else is absent.
mod lenient_text {
    use super::*;

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        })
    }

    /// Absent or non-string values become the empty string.
    pub fn required<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(optional(deserializer)?.unwrap_or_default())
    }
}

fn lenient_entry_type<'de, D>(deserializer: D) -> Result<EntryType, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(value @ serde_json::Value::String(_)) => {
            serde_json::from_value(value).unwrap_or_default()
        }
        _ => EntryType::Unknown,
    })
}

/// Keeps every entry that parses; a null list or a non-object entry is dropped.
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<TimesheetEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// One clock event for one employee on one schedule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    #[serde(default, alias = "_id", deserialize_with = "lenient_text::optional")]
    pub id: Option<String>,
    /// Empty when the source left it out; such entries are never aggregated
    #[serde(default, deserialize_with = "lenient_text::required")]
    pub employee: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_entry_type")]
    pub entry_type: EntryType,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub clock_in: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub clock_out: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub lunch_start: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub lunch_end: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_text::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub location_in: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub location_out: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub manual_distance: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub manual_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "SpecialActivity::is_none")]
    pub dump_washout: SpecialActivity,
    #[serde(default, skip_serializing_if = "SpecialActivity::is_none")]
    pub shop_time: SpecialActivity,
    #[serde(
        default,
        deserialize_with = "lenient_text::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub schedule_id: Option<String>,
}

impl TimesheetEntry {
    /// Create a new entry for an employee
    pub fn new(employee: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            employee: employee.into(),
            entry_type,
            ..Self::default()
        }
    }

    /// A Drive Time entry is active until it has a clock-out
    pub fn is_active(&self) -> bool {
        self.entry_type == EntryType::DriveTime && self.clock_out.is_none()
    }

    /// Manual distance if it overrides the computed one
    pub fn distance_override(&self) -> Option<f64> {
        self.manual_distance.filter(|d| *d > 0.0)
    }

    /// Manual duration if it overrides the computed one
    pub fn duration_override(&self) -> Option<f64> {
        self.manual_duration.filter(|d| *d > 0.0)
    }
}

/// Schedule document owning a list of timesheet entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default, alias = "_id", deserialize_with = "lenient_text::required")]
    pub id: String,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_text::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_title: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_reference: Option<String>,
    /// Benefit category code
    #[serde(
        default,
        deserialize_with = "lenient_text::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub fringe: Option<String>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub timesheets: Vec<TimesheetEntry>,
}

impl Schedule {
    /// Create an empty schedule
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// A timesheet entry with its derived values and schedule context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedRecord {
    pub entry: TimesheetEntry,
    /// Clock-in used for grouping; schedule start for Drive Time without one
    #[serde(with = "timestamp::optional")]
    pub clock_in: Option<DateTime<Utc>>,
    pub hours: f64,
    pub distance: f64,
    /// Geodistance before any manual override
    pub calculated_distance: f64,
    pub schedule_id: String,
    pub job_title: Option<String>,
    pub job_reference: Option<String>,
    pub category: Option<String>,
    pub pay: Option<PayBreakdown>,
}

impl ComputedRecord {
    pub fn employee(&self) -> &str {
        &self.entry.employee
    }

    /// Instant the record is grouped under; `None` when it cannot be placed
    /// in the year/week/employee/date hierarchy.
    pub fn grouping_instant(&self) -> Option<DateTime<Utc>> {
        self.clock_in.filter(|_| !self.entry.employee.trim().is_empty())
    }

    pub fn is_excluded(&self) -> bool {
        self.grouping_instant().is_none()
    }

    /// Calendar date (UTC) of the effective clock-in
    pub fn work_date(&self) -> Option<NaiveDate> {
        self.clock_in.map(|t| t.date_naive())
    }

    pub fn total_pay(&self) -> f64 {
        self.pay.as_ref().map(|p| p.gross_pay).unwrap_or(0.0)
    }
}
