//! Constants used throughout the admissions core crate.

/// Default SQLite database file when `ADMISSIONS_DB_PATH` is not set.
pub const DEFAULT_DATABASE_PATH: &str = "patient.db";

/// Default listen address for the REST API.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:5001";

/// Environment variable naming the SQLite database file.
pub const DATABASE_PATH_ENV: &str = "ADMISSIONS_DB_PATH";

/// Environment variable naming an optional reference data YAML file.
pub const REFERENCE_DATA_ENV: &str = "ADMISSIONS_REFERENCE_DATA";

/// Environment variable naming the REST listen address.
pub const REST_ADDR_ENV: &str = "ADMISSIONS_REST_ADDR";

/// Fields a partial update may touch. Anything else in an update body is dropped.
pub const UPDATABLE_FIELDS: [&str; 5] = ["name", "age", "gender", "room", "ward"];

/// Fields a create request must carry.
pub const REQUIRED_CREATE_FIELDS: [&str; 3] = ["name", "gender", "age"];
