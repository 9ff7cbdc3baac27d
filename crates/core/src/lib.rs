//! # Admissions Core
//!
//! Core business logic for the patient admissions service.
//!
//! This crate owns:
//! - the patient domain model and its invariants ([`patient`])
//! - reference data (genders, wards and their rooms, doctors) loaded once at startup
//!   ([`reference`])
//! - request body validation ([`validation`])
//! - SQLite persistence behind the [`repositories::PatientRepository`] trait
//! - [`PatientService`], the transport-agnostic operations used by the REST API and the CLI
//!
//! **No API concerns**: HTTP routing, status codes and OpenAPI docs belong in `api-rest`; wire
//! types shared between transports live in `api-shared`.

pub mod config;
pub mod constants;
mod error;
pub mod patient;
pub mod reference;
pub mod repositories;
pub mod service;
pub mod validation;

pub use admissions_types::{Age, AgeError, NonEmptyText, TextError};
pub use admissions_uuid::PatientId;
pub use api_shared::PatientRecord;

pub use config::CoreConfig;
pub use error::{NO_SEARCH_MATCHES, PATIENT_NOT_FOUND, PatientError, PatientResult};
pub use reference::ReferenceData;
pub use service::{PatientService, UpdateOutcome};
