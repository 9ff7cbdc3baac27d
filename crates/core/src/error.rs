use crate::repositories::DbError;

/// Message for any id that does not name a stored patient.
pub const PATIENT_NOT_FOUND: &str = "Patient not found";

/// Message for a search that matched nothing.
pub const NO_SEARCH_MATCHES: &str = "No patients found with that name";

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    /// Field-level validation failure. The message is safe to show to callers verbatim.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
    #[error("stored patient record is corrupt: {0}")]
    CorruptRecord(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read reference data file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
}

impl PatientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound(PATIENT_NOT_FOUND)
    }
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
