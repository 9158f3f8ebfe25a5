//! Gateway main entry point
//!
//! Batch report run: loads a schedule snapshot, builds the weekly timesheet
//! report through the ServiceRouter, prints per-employee totals and writes
//! the category CSV.

use std::collections::HashMap;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway_lib::{
    employee_summaries, error_response, load_json_map, GatewayConfig, ServiceRouter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway=info,timecard_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = GatewayConfig::from_env();
    tracing::info!("Starting timesheet gateway v{}", config.version);

    let router = ServiceRouter::from_schedules_file(&config.schedules_path, config.engine.clone())?;

    let rates = match &config.rates_path {
        Some(path) => Some(load_json_map::<f64>(path)?),
        None => None,
    };
    let labels: HashMap<String, String> = match &config.employees_path {
        Some(path) => load_json_map(path)?,
        None => HashMap::new(),
    };

    let report = match router
        .weekly_report(config.reference(), config.week_offset, rates, labels.clone())
        .await
    {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&error_response(&e))?);
            return Err(e.into());
        }
    };

    println!("Timesheet report: {}", report.period.label());
    for summary in employee_summaries(&report) {
        if report.total_pay() > 0.0 {
            println!("  {:<30} {:>8.2} h  ${:>10.2}", summary.label, summary.hours, summary.pay);
        } else {
            println!("  {:<30} {:>8.2} h", summary.label, summary.hours);
        }
    }
    println!("  {:<30} {:>8.2} h", "Total", report.total_hours());

    if let Err(e) = router.export_report(&report, &labels, &config.export_path) {
        eprintln!("{}", serde_json::to_string(&error_response(&e))?);
        return Err(e.into());
    }

    Ok(())
}
