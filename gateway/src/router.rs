//! Service Router
//!
//! Routes report requests to the timecard service via InProcess calls using
//! tower::ServiceExt, and handles the file-level concerns around them.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use error::{AppError, ErrorResponse};
use tower::ServiceExt;

use timecard_service::{
    export, EngineConfig, InMemoryScheduleSource, NodeKey, ReportRequest, ScheduleSource,
    TimecardService, TimesheetReport, WeekRange,
};

/// Summary line per employee for console output
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeSummary {
    pub employee: String,
    pub label: String,
    pub hours: f64,
    pub pay: f64,
}

/// Service router that manages InProcess service calls
pub struct ServiceRouter<S = InMemoryScheduleSource> {
    timecard_service: TimecardService<S>,
}

impl ServiceRouter<InMemoryScheduleSource> {
    pub fn new() -> Self {
        Self {
            timecard_service: TimecardService::new(),
        }
    }

    /// Router over schedules loaded from a JSON file
    pub fn from_schedules_file(path: &Path, config: EngineConfig) -> Result<Self> {
        let source = InMemoryScheduleSource::from_json_file(path)
            .with_context(|| format!("Failed to load schedules from {}", path.display()))?;
        tracing::info!("Loaded {} schedules from {}", source.len(), path.display());
        Ok(Self::with_source(source, config))
    }
}

impl Default for ServiceRouter<InMemoryScheduleSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ScheduleSource + 'static> ServiceRouter<S> {
    pub fn with_source(source: S, config: EngineConfig) -> Self {
        Self {
            timecard_service: TimecardService::with_source(source, config),
        }
    }

    pub fn timecard_service(&self) -> &TimecardService<S> {
        &self.timecard_service
    }

    /// Weekly report via InProcess call to timecard service.
    ///
    /// `week_offset` shifts the week containing `reference` (-1 = the week before).
    pub async fn weekly_report(
        &self,
        reference: DateTime<Utc>,
        week_offset: i64,
        rates: Option<HashMap<String, f64>>,
        employee_labels: HashMap<String, String>,
    ) -> error::Result<TimesheetReport> {
        let period = WeekRange::containing(reference)
            .shifted(week_offset)
            .ok_or_else(|| {
                AppError::Validation(format!("week offset {} is out of range", week_offset))
            })?;
        let mut request = ReportRequest::new(period).with_employee_labels(employee_labels);
        if let Some(rates) = rates {
            request = request.with_rates(rates);
        }

        let report = self
            .timecard_service
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| {
                tracing::error!("Report generation failed: {}", e);
                e
            })?;
        Ok(report)
    }

    /// Write the category CSV for a report
    pub fn export_report(
        &self,
        report: &TimesheetReport,
        employee_labels: &HashMap<String, String>,
        path: &Path,
    ) -> error::Result<usize> {
        let rows = export::write_csv_file(path, &report.records, employee_labels).map_err(|e| {
            tracing::error!("Failed to write export to {}: {}", path.display(), e);
            e
        })?;
        tracing::info!("Wrote {} rows to {}", rows, path.display());
        Ok(rows)
    }
}

/// Client payload for a failed report or export, logged at error level
pub fn error_response(err: &AppError) -> ErrorResponse {
    let response = ErrorResponse::from(err);
    tracing::error!(code = %response.code, "{}", response.message);
    response
}

/// Per-employee totals across the report, ordered by label
pub fn employee_summaries(report: &TimesheetReport) -> Vec<EmployeeSummary> {
    let mut totals: HashMap<String, EmployeeSummary> = HashMap::new();

    for year in report.tree.root.children.values() {
        for week in year.children.values() {
            for (key, node) in &week.children {
                let NodeKey::Employee(employee) = key else {
                    continue;
                };
                let summary = totals.entry(employee.clone()).or_insert_with(|| EmployeeSummary {
                    employee: employee.clone(),
                    label: node.label.clone(),
                    hours: 0.0,
                    pay: 0.0,
                });
                summary.hours += node.total_hours;
                summary.pay += node.total_pay;
            }
        }
    }

    let mut summaries: Vec<EmployeeSummary> = totals.into_values().collect();
    summaries.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.employee.cmp(&b.employee)));
    summaries
}

/// Read a JSON object map (employee id -> value)
pub fn load_json_map<T: serde::de::DeserializeOwned>(path: &Path) -> Result<HashMap<String, T>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let map = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(map)
}
