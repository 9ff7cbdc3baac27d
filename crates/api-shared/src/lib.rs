//! # API Shared
//!
//! Wire types shared by the admissions core, the REST API and the CLI.
//!
//! Contains:
//! - The persisted patient record shape ([`PatientRecord`])
//! - Request and response bodies with OpenAPI schemas (`wire` module)
//! - The shared [`HealthService`]

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
