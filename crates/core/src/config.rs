//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Request
//! handling never reads process-wide environment variables; the binaries read them and hand the
//! raw values to the `*_from_env_value` helpers below.

use crate::constants::DEFAULT_DATABASE_PATH;
use crate::reference::ReferenceData;
use crate::{PatientError, PatientResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    reference: Arc<ReferenceData>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if `database_path` is empty.
    pub fn new(database_path: PathBuf, reference: ReferenceData) -> PatientResult<Self> {
        if database_path.as_os_str().is_empty() {
            return Err(PatientError::InvalidInput(
                "database path cannot be empty".into(),
            ));
        }

        Ok(Self {
            database_path,
            reference: Arc::new(reference),
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// The immutable reference data (genders, wards, rooms, doctors) for this process.
    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }
}

/// Resolve the database path from an optional raw value.
///
/// `None` or a blank value falls back to [`DEFAULT_DATABASE_PATH`].
pub fn database_path_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
}

/// Resolve reference data from an optional YAML file path.
///
/// `None` or a blank value yields the built-in defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not describe valid reference data.
pub fn reference_data_from_env_value(value: Option<String>) -> PatientResult<ReferenceData> {
    let path = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match path {
        Some(path) => ReferenceData::load(Path::new(&path)),
        None => Ok(ReferenceData::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_rejects_empty_database_path() {
        let err = CoreConfig::new(PathBuf::new(), ReferenceData::default())
            .expect_err("empty path should be rejected");
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn test_database_path_defaults_when_unset_or_blank() {
        assert_eq!(
            database_path_from_env_value(None),
            PathBuf::from(DEFAULT_DATABASE_PATH)
        );
        assert_eq!(
            database_path_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_DATABASE_PATH)
        );
        assert_eq!(
            database_path_from_env_value(Some("/tmp/ward.db".into())),
            PathBuf::from("/tmp/ward.db")
        );
    }

    #[test]
    fn test_reference_data_defaults_when_unset() {
        let reference = reference_data_from_env_value(None).expect("defaults should load");
        assert_eq!(reference, ReferenceData::default());
    }

    #[test]
    fn test_reference_data_loads_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("reference.yaml");
        fs::write(
            &path,
            "genders: [Male, Female]\nwards:\n  7: [\"71\", \"72\"]\ndoctors: [\"Dr. Who\"]\n",
        )
        .expect("should write reference file");

        let reference =
            reference_data_from_env_value(Some(path.display().to_string())).expect("should load");
        assert_eq!(reference.genders(), ["Male", "Female"]);
        assert_eq!(reference.ward_numbers().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_reference_data_missing_file_is_an_error() {
        let err = reference_data_from_env_value(Some("/definitely/not/here.yaml".into()))
            .expect_err("missing file should fail");
        assert!(matches!(err, PatientError::FileRead(_)));
    }
}
