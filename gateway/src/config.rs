use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use timecard_service::{timestamp, EngineConfig};

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// JSON array of schedule documents
    pub schedules_path: PathBuf,

    /// Optional JSON object of employee id -> hourly rate
    pub rates_path: Option<PathBuf>,

    /// Optional JSON object of employee id -> display label
    pub employees_path: Option<PathBuf>,

    /// Where the category CSV is written
    pub export_path: PathBuf,

    /// Weeks relative to the reference week (-1 = last week)
    pub week_offset: i64,

    /// Instant whose week is reported; now when unset
    pub reference_date: Option<DateTime<Utc>>,

    /// Calculation settings
    pub engine: EngineConfig,

    /// Service version
    pub version: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            schedules_path: PathBuf::from("./schedules.json"),
            rates_path: None,
            employees_path: None,
            export_path: PathBuf::from("./timesheet-report.csv"),
            week_offset: 0,
            reference_date: None,
            engine: EngineConfig::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl GatewayConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("SCHEDULES_PATH") {
            config.schedules_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("RATES_PATH") {
            config.rates_path = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("EMPLOYEES_PATH") {
            config.employees_path = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("EXPORT_PATH") {
            config.export_path = PathBuf::from(path);
        }

        if let Ok(offset) = std::env::var("REPORT_WEEK_OFFSET") {
            if let Ok(n) = offset.trim().parse() {
                config.week_offset = n;
            }
        }

        if let Ok(date) = std::env::var("REPORT_REFERENCE_DATE") {
            config.reference_date = timestamp::normalize(&date);
        }

        config.engine = EngineConfig::from_env();
        config
    }

    /// Reference instant for period selection
    pub fn reference(&self) -> DateTime<Utc> {
        self.reference_date.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.schedules_path, PathBuf::from("./schedules.json"));
        assert_eq!(config.week_offset, 0);
        assert!(config.rates_path.is_none());
        assert!(config.reference_date.is_none());
    }
}
