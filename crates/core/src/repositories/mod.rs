//! Patient persistence.
//!
//! Storage sits behind the [`PatientRepository`] trait so services can be tested against doubles.
//! The production implementation, [`SqlitePatientRepository`], keeps a single SQLite connection
//! behind a mutex and holds the lock for exactly one statement per call. Multi-step flows (update
//! then re-fetch, for example) are therefore not transactional; callers must treat a record that
//! vanishes between steps as not found.

mod patients;
mod schema;

pub use schema::SCHEMA;

use crate::reference::{Gender, Placement};
use crate::{Age, NonEmptyText, PatientId, patient::Patient};
use api_shared::PatientRecord;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating it and the schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Column changes for a single patient. `None` means "leave as is".
///
/// `placement` is doubly optional: `Some(None)` clears ward and room together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientChanges {
    pub name: Option<NonEmptyText>,
    pub age: Option<Age>,
    pub gender: Option<Gender>,
    pub placement: Option<Option<Placement>>,
    pub checkout: Option<DateTime<Utc>>,
}

impl PatientChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.placement.is_none()
            && self.checkout.is_none()
    }
}

/// Durable storage for patient records. Every method is atomic on its own.
pub trait PatientRepository: Send + Sync {
    /// Persists a newly admitted patient and returns its id.
    fn insert(&self, patient: &Patient) -> DbResult<PatientId>;

    /// All records, oldest checkin first.
    fn fetch_all(&self) -> DbResult<Vec<PatientRecord>>;

    fn fetch_by_id(&self, id: &PatientId) -> DbResult<Option<PatientRecord>>;

    /// Case-insensitive substring match on name. `%` and `_` in `term` match literally.
    fn search_by_name(&self, term: &str) -> DbResult<Vec<PatientRecord>>;

    /// Applies `changes` and returns the number of rows changed.
    ///
    /// Zero means the patient does not exist *or* every supplied value equals the stored one;
    /// callers tell the two apart with [`fetch_by_id`](Self::fetch_by_id).
    fn update(&self, id: &PatientId, changes: &PatientChanges) -> DbResult<usize>;

    /// Returns the number of rows deleted; zero means the patient did not exist.
    fn delete(&self, id: &PatientId) -> DbResult<usize>;
}

/// SQLite-backed [`PatientRepository`].
#[derive(Clone)]
pub struct SqlitePatientRepository {
    db: Arc<Mutex<Database>>,
}

impl SqlitePatientRepository {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn in_memory() -> DbResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))
    }
}
