//! Schedule source
//!
//! Read access to the external schedule store. The engine only ever reads a
//! snapshot; writes and reconciliation belong to the store client.

use std::path::Path;

use async_trait::async_trait;
use error::StoreError;

use crate::models::Schedule;
use crate::week::WeekRange;

/// Source of schedule documents
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Fetch schedules that may hold entries inside `range`.
    ///
    /// Implementations may return extra schedules; callers filter computed
    /// records by period afterwards.
    async fn fetch_schedules(&self, range: &WeekRange) -> Result<Vec<Schedule>, StoreError>;
}

/// In-memory source for tests and batch runs
pub struct InMemoryScheduleSource {
    schedules: std::sync::RwLock<Vec<Schedule>>,
}

impl InMemoryScheduleSource {
    pub fn new() -> Self {
        Self::from_schedules(Vec::new())
    }

    pub fn from_schedules(schedules: Vec<Schedule>) -> Self {
        Self {
            schedules: std::sync::RwLock::new(schedules),
        }
    }

    /// Load a JSON array of schedule documents.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let schedules: Vec<Schedule> =
            serde_json::from_str(json).map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(Self::from_schedules(schedules))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Replace a schedule by id, or add it.
    pub fn upsert(&self, schedule: Schedule) -> Result<(), StoreError> {
        let mut schedules = self
            .schedules
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        match schedules.iter_mut().find(|s| s.id == schedule.id) {
            Some(existing) => *existing = schedule,
            None => schedules.push(schedule),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.schedules.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryScheduleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleSource for InMemoryScheduleSource {
    async fn fetch_schedules(&self, range: &WeekRange) -> Result<Vec<Schedule>, StoreError> {
        let schedules = self
            .schedules
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // Entries may be clocked days after the schedule starts, so only
        // schedules starting after the period are ruled out.
        Ok(schedules
            .iter()
            .filter(|s| s.start_date.map_or(true, |start| start <= range.end))
            .cloned()
            .collect())
    }
}
