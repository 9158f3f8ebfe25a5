//! Integration tests for gateway with timecard-service
//!
//! These tests verify the InProcess call integration between
//! gateway and timecard-service, from schedule JSON to CSV export.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use error::AppError;
use gateway_lib::{employee_summaries, error_response, ServiceRouter};
use timecard_service::{EngineConfig, InMemoryScheduleSource};

const SCHEDULES: &str = r#"[
    {
        "_id": "sched-100",
        "startDate": "2025-06-02T00:00:00.000Z",
        "jobTitle": "Lift station rehab",
        "jobReference": "J-100",
        "fringe": "LU-12",
        "timesheets": [
            {
                "employee": "EMP001",
                "type": "Site Time",
                "clockIn": "2025-06-02T07:00:00.000Z",
                "clockOut": "2025-06-02T15:30:00.000Z",
                "lunchStart": "2025-06-02T11:00:00.000Z",
                "lunchEnd": "2025-06-02T11:30:00.000Z"
            },
            {
                "employee": "EMP001",
                "type": "Drive Time",
                "locationIn": "33.0,-117.0",
                "locationOut": "33.0,-117.0",
                "dumpWashout": "1.00 hrs (2 qty)"
            },
            {
                "employee": "EMP002",
                "type": "Site Time",
                "clockIn": "2025-06-10 07:00",
                "clockOut": "2025-06-10 11:00"
            }
        ]
    },
    {
        "_id": "sched-200",
        "startDate": "2025-06-03",
        "jobTitle": "Storm drain",
        "timesheets": [
            {
                "employee": "EMP002",
                "type": "Drive Time",
                "manualDistance": 55,
                "clockOut": "2025-06-03T09:00:00Z"
            },
            {
                "employee": "EMP003",
                "type": "Site Time"
            }
        ]
    }
]"#;

fn router() -> ServiceRouter {
    let source = InMemoryScheduleSource::from_json(SCHEDULES).unwrap();
    ServiceRouter::with_source(source, EngineConfig::default())
}

#[tokio::test]
async fn test_weekly_report_totals() {
    let router = router();
    let reference = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();

    let report = router
        .weekly_report(reference, 0, None, HashMap::new())
        .await
        .unwrap();

    // EMP001: 8.0 site + 1.0 washout; EMP002: 1.0 drive; EMP003 has no clock-in
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.tree.leaf_count(), 3);
    assert_eq!(report.excluded_count(), 1);
    assert!((report.total_hours() - 10.0).abs() < 1e-9);
    assert_eq!(report.categories["LU-12"].total_hours, 9.0);
    assert_eq!(report.categories["Uncategorized"].total_hours, 1.0);
}

#[tokio::test]
async fn test_previous_and_next_week_offsets() {
    let router = router();
    let reference = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();

    let next = router
        .weekly_report(reference, 1, None, HashMap::new())
        .await
        .unwrap();
    assert_eq!(next.records.len(), 1);
    assert_eq!(next.total_hours(), 4.0);

    let previous = router
        .weekly_report(reference, -1, None, HashMap::new())
        .await
        .unwrap();
    assert!(previous.records.is_empty());
    assert_eq!(previous.total_hours(), 0.0);
}

#[tokio::test]
async fn test_week_offset_out_of_range() {
    let router = router();
    let reference = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();

    let err = router
        .weekly_report(reference, i64::MAX, None, HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(error_response(&err).code, "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_incomplete_entries_do_not_sink_the_snapshot() {
    let json = r#"[{
        "_id": "sched-300",
        "startDate": "2025-06-02",
        "timesheets": [
            {"employee": "EMP001", "type": "Site Time",
             "clockIn": "2025-06-02T07:00:00Z", "clockOut": "2025-06-02T15:00:00Z"},
            {"employee": null, "type": "Site Time", "clockIn": "2025-06-02T07:00:00Z"},
            {"employee": "EMP002", "type": "Drive Time", "locationOut": 12}
        ]
    }, {"_id": "sched-301", "timesheets": null}]"#;
    let source = InMemoryScheduleSource::from_json(json).unwrap();
    let router = ServiceRouter::with_source(source, EngineConfig::default());
    let reference = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();

    let report = router
        .weekly_report(reference, 0, None, HashMap::new())
        .await
        .unwrap();
    assert_eq!(report.total_hours(), 8.0);
    assert_eq!(report.excluded_count(), 1);
}

#[tokio::test]
async fn test_payroll_summaries() {
    let router = router();
    let reference = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();
    let rates = HashMap::from([("EMP001".to_string(), 30.0), ("EMP002".to_string(), 25.0)]);
    let labels = HashMap::from([("EMP001".to_string(), "Ana Ruiz".to_string())]);

    let report = router
        .weekly_report(reference, 0, Some(rates), labels)
        .await
        .unwrap();
    let summaries = employee_summaries(&report);

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].label, "Ana Ruiz");
    assert_eq!(summaries[0].pay, 9.0 * 30.0);
    assert_eq!(summaries[1].employee, "EMP002");
    assert_eq!(summaries[1].pay, 25.0);
}

#[tokio::test]
async fn test_export_report_to_file() {
    let router = router();
    let reference = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();
    let report = router
        .weekly_report(reference, 0, None, HashMap::new())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");
    let rows = router
        .export_report(&report, &HashMap::new(), &path)
        .unwrap();

    assert_eq!(rows, 3);
    let csv = std::fs::read_to_string(&path).unwrap();
    assert!(csv.starts_with("Employee,Date,Job Title,Job Reference,Category,Hours"));
    assert!(csv.contains("EMP001,2025-06-02,Lift station rehab,J-100,LU-12,8.00"));
    assert!(csv.contains("EMP002,2025-06-03,Storm drain,,Uncategorized,1.00"));
}

#[tokio::test]
async fn test_export_failure_maps_to_error_response() {
    let router = router();
    let reference = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();
    let report = router
        .weekly_report(reference, 0, None, HashMap::new())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("report.csv");
    let err = router
        .export_report(&report, &HashMap::new(), &path)
        .unwrap_err();

    assert!(matches!(err, AppError::Export(_)));
    let response = error_response(&err);
    assert_eq!(response.code, "EXPORT_IO_FAILED");
    assert!(response.details.is_some());
}

#[test]
fn test_missing_schedules_file() {
    let result = ServiceRouter::from_schedules_file(
        std::path::Path::new("/nonexistent/schedules.json"),
        EngineConfig::default(),
    );
    assert!(result.is_err());
}
