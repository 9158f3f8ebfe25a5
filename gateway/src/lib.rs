//! Gateway library for InProcess service calls
//!
//! This module exposes the gateway functionality as a library,
//! enabling report generation from batch jobs and other services.

pub mod config;
pub mod router;

pub use config::GatewayConfig;
pub use router::{
    employee_summaries, error_response, load_json_map, EmployeeSummary, ServiceRouter,
};
