//! Timecard service
//!
//! Report generation on top of a schedule source.
//! Implements tower::Service for InProcess calls.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use error::AppError;
use serde::Serialize;

use crate::aggregate::{aggregate, filter_period, group_by_category, AggregateTree, CategoryGroup};
use crate::calculator::compute_schedule;
use crate::config::EngineConfig;
use crate::models::ComputedRecord;
use crate::pay::apply_pay;
use crate::repository::{InMemoryScheduleSource, ScheduleSource};
use crate::week::WeekRange;

/// Report request
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub period: WeekRange,
    /// Hourly rates by employee; pay is only computed when present
    pub rates: Option<HashMap<String, f64>>,
    /// Display labels by employee
    pub employee_labels: HashMap<String, String>,
}

impl ReportRequest {
    pub fn new(period: WeekRange) -> Self {
        Self {
            period,
            rates: None,
            employee_labels: HashMap::new(),
        }
    }

    pub fn with_rates(mut self, rates: HashMap<String, f64>) -> Self {
        self.rates = Some(rates);
        self
    }

    pub fn with_employee_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.employee_labels = labels;
        self
    }
}

/// Computed report for one period
#[derive(Debug, Clone, Serialize)]
pub struct TimesheetReport {
    pub period: WeekRange,
    /// In-period records followed by the excluded ones; the tree and the
    /// category groups index into this list
    pub records: Vec<ComputedRecord>,
    pub tree: AggregateTree,
    pub categories: BTreeMap<String, CategoryGroup>,
}

impl TimesheetReport {
    pub fn total_hours(&self) -> f64 {
        self.tree.total_hours()
    }

    pub fn total_pay(&self) -> f64 {
        self.tree.root.total_pay
    }

    /// Records that could not be placed in the tree
    pub fn excluded(&self) -> impl Iterator<Item = &ComputedRecord> {
        self.tree.excluded.iter().map(|idx| &self.records[*idx])
    }

    pub fn excluded_count(&self) -> usize {
        self.tree.excluded.len()
    }
}

/// Timecard service for report generation
pub struct TimecardService<S = InMemoryScheduleSource> {
    source: Arc<S>,
    config: Arc<EngineConfig>,
}

impl<S> Clone for TimecardService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: Arc::clone(&self.config),
        }
    }
}

impl TimecardService<InMemoryScheduleSource> {
    /// Create a new timecard service with an empty in-memory source
    pub fn new() -> Self {
        Self::with_source(InMemoryScheduleSource::new(), EngineConfig::default())
    }
}

impl Default for TimecardService<InMemoryScheduleSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ScheduleSource> TimecardService<S> {
    pub fn with_source(source: S, config: EngineConfig) -> Self {
        Self {
            source: Arc::new(source),
            config: Arc::new(config),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a report from a fresh snapshot of the source.
    pub async fn report(&self, request: ReportRequest) -> Result<TimesheetReport, AppError> {
        if request.period.end < request.period.start {
            return Err(AppError::Validation("period ends before it starts".to_string()));
        }

        let schedules = self.source.fetch_schedules(&request.period).await?;
        tracing::debug!(schedules = schedules.len(), "Fetched schedule snapshot");

        let mut placed = Vec::new();
        let mut excluded = Vec::new();
        for schedule in &schedules {
            for record in compute_schedule(schedule, &self.config) {
                if !record.is_excluded() {
                    placed.push(record);
                    continue;
                }
                // Period of its own clock-in if any, else of its schedule
                let anchor = record.clock_in.or(schedule.start_date);
                if anchor.map_or(true, |t| request.period.contains(t)) {
                    excluded.push(record);
                }
            }
        }
        if !excluded.is_empty() {
            tracing::warn!(
                count = excluded.len(),
                "Records without a clock-in or employee were left out of the totals"
            );
        }

        let mut records = filter_period(placed, &request.period);
        if let Some(rates) = &request.rates {
            apply_pay(&mut records, rates, &self.config);
        }
        records.extend(excluded);

        let tree = aggregate(&records, &request.employee_labels);
        let categories = group_by_category(&records);

        tracing::info!(
            period = %request.period.label(),
            records = records.len(),
            excluded = tree.excluded.len(),
            total_hours = tree.total_hours(),
            "Generated timesheet report"
        );

        Ok(TimesheetReport {
            period: request.period,
            records,
            tree,
            categories,
        })
    }
}

impl<S> tower::Service<ReportRequest> for TimecardService<S>
where
    S: ScheduleSource + 'static,
{
    type Response = TimesheetReport;
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<TimesheetReport, AppError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ReportRequest) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { service.report(request).await })
    }
}
