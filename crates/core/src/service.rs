//! Transport-agnostic patient operations.
//!
//! [`PatientService`] is what the REST handlers and the CLI call. It validates request bodies
//! against the configured reference data before touching storage, and turns the repository's
//! row counts into explicit outcomes:
//!
//! - zero rows from an update is followed by an existence check, giving either
//!   [`UpdateOutcome::Unchanged`] or [`PatientError::NotFound`];
//! - a record that disappears between two steps is reported as not found, never as a storage
//!   failure.

use crate::config::CoreConfig;
use crate::error::{NO_SEARCH_MATCHES, PatientError, PatientResult};
use crate::patient::Patient;
use crate::reference::ReferenceData;
use crate::repositories::{PatientChanges, PatientRepository, SqlitePatientRepository};
use crate::{PatientId, validation};
use api_shared::PatientRecord;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Result of an update that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// At least one column changed; carries the re-fetched record.
    Updated(PatientRecord),
    /// The patient exists and already held every supplied value.
    Unchanged,
}

#[derive(Clone)]
pub struct PatientService {
    cfg: Arc<CoreConfig>,
    repo: Arc<dyn PatientRepository>,
}

/// Any id that is not in canonical form cannot name a stored patient.
fn parse_id(raw: &str) -> PatientResult<PatientId> {
    PatientId::parse(raw).map_err(|_| PatientError::not_found())
}

impl PatientService {
    pub fn new(cfg: Arc<CoreConfig>, repo: Arc<dyn PatientRepository>) -> Self {
        Self { cfg, repo }
    }

    /// Opens (creating if needed) the SQLite database named by the configuration.
    pub fn open(cfg: Arc<CoreConfig>) -> PatientResult<Self> {
        let repo = SqlitePatientRepository::open(cfg.database_path())?;
        tracing::info!(path = %cfg.database_path().display(), "opened patient database");
        Ok(Self::new(cfg, Arc::new(repo)))
    }

    /// A service backed by a private in-memory database. The configured path is ignored.
    pub fn in_memory(cfg: Arc<CoreConfig>) -> PatientResult<Self> {
        let repo = SqlitePatientRepository::in_memory()?;
        Ok(Self::new(cfg, Arc::new(repo)))
    }

    pub fn reference(&self) -> &ReferenceData {
        self.cfg.reference()
    }

    pub fn list(&self) -> PatientResult<Vec<PatientRecord>> {
        Ok(self.repo.fetch_all()?)
    }

    pub fn get(&self, id: &str) -> PatientResult<PatientRecord> {
        let id = parse_id(id)?;
        self.repo
            .fetch_by_id(&id)?
            .ok_or_else(PatientError::not_found)
    }

    /// Validates a create body, admits the patient and persists it.
    pub fn create(&self, body: &Value) -> PatientResult<PatientRecord> {
        let new = validation::new_patient(body, self.reference())?;
        let patient = Patient::admit(new, self.reference())?;
        let id = self.repo.insert(&patient)?;
        tracing::info!(patient_id = %id, "patient admitted");
        Ok(patient.to_record())
    }

    /// Applies a partial update of name, age, gender and ward/room.
    pub fn update(&self, id: &str, body: &Value) -> PatientResult<UpdateOutcome> {
        let changes = validation::patient_changes(body, self.reference())?;
        let id = parse_id(id)?;
        self.apply_changes(&id, &changes)
    }

    /// Moves a patient to a new ward and room.
    pub fn set_room(&self, id: &str, body: &Value) -> PatientResult<UpdateOutcome> {
        let placement = validation::room_assignment(body, self.reference())?;
        let id = parse_id(id)?;
        let changes = PatientChanges {
            placement: Some(Some(placement)),
            ..Default::default()
        };
        self.apply_changes(&id, &changes)
    }

    /// Stamps the checkout time and returns it. Repeated checkouts refresh the timestamp.
    pub fn checkout(&self, id: &str) -> PatientResult<DateTime<Utc>> {
        let id = parse_id(id)?;
        let record = self
            .repo
            .fetch_by_id(&id)?
            .ok_or_else(PatientError::not_found)?;

        let mut patient = Patient::restore(record)?;
        let checkout_time = patient.checkout();

        let changes = PatientChanges {
            checkout: Some(checkout_time),
            ..Default::default()
        };
        if self.repo.update(&id, &changes)? == 0 && self.repo.fetch_by_id(&id)?.is_none() {
            return Err(PatientError::not_found());
        }

        tracing::info!(patient_id = %id, "patient checked out");
        Ok(checkout_time)
    }

    pub fn delete(&self, id: &str) -> PatientResult<()> {
        let id = parse_id(id)?;
        if self.repo.delete(&id)? == 0 {
            return Err(PatientError::not_found());
        }
        tracing::info!(patient_id = %id, "patient deleted");
        Ok(())
    }

    /// Case-insensitive name search. No matches is reported as not found.
    pub fn search(&self, term: Option<&str>) -> PatientResult<Vec<PatientRecord>> {
        let term = validation::search_term(term)?;
        let hits = self.repo.search_by_name(term)?;
        if hits.is_empty() {
            return Err(PatientError::NotFound(NO_SEARCH_MATCHES));
        }
        Ok(hits)
    }

    fn apply_changes(&self, id: &PatientId, changes: &PatientChanges) -> PatientResult<UpdateOutcome> {
        if self.repo.update(id, changes)? == 0 {
            return match self.repo.fetch_by_id(id)? {
                Some(_) => Ok(UpdateOutcome::Unchanged),
                None => Err(PatientError::not_found()),
            };
        }

        tracing::debug!(patient_id = %id, "patient updated");
        self.repo
            .fetch_by_id(id)?
            .map(UpdateOutcome::Updated)
            .ok_or_else(PatientError::not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PATIENT_NOT_FOUND;
    use crate::repositories::{DbError, DbResult};
    use serde_json::json;
    use std::path::PathBuf;

    fn config() -> Arc<CoreConfig> {
        Arc::new(
            CoreConfig::new(PathBuf::from("patient.db"), ReferenceData::default())
                .expect("valid config"),
        )
    }

    fn service() -> PatientService {
        PatientService::in_memory(config()).expect("in-memory service")
    }

    fn ann(service: &PatientService) -> PatientRecord {
        service
            .create(&json!({"name": "Ann", "gender": "F", "age": 40}))
            .expect("valid create")
    }

    /// Deletes the target record as a side effect of `update`, imitating a concurrent delete.
    struct VanishingRepository {
        inner: SqlitePatientRepository,
        report_rows: usize,
    }

    impl PatientRepository for VanishingRepository {
        fn insert(&self, patient: &Patient) -> DbResult<PatientId> {
            self.inner.insert(patient)
        }
        fn fetch_all(&self) -> DbResult<Vec<PatientRecord>> {
            self.inner.fetch_all()
        }
        fn fetch_by_id(&self, id: &PatientId) -> DbResult<Option<PatientRecord>> {
            self.inner.fetch_by_id(id)
        }
        fn search_by_name(&self, term: &str) -> DbResult<Vec<PatientRecord>> {
            self.inner.search_by_name(term)
        }
        fn update(&self, id: &PatientId, _changes: &PatientChanges) -> DbResult<usize> {
            self.inner.delete(id)?;
            Ok(self.report_rows)
        }
        fn delete(&self, id: &PatientId) -> DbResult<usize> {
            self.inner.delete(id)
        }
    }

    struct BrokenRepository;

    impl PatientRepository for BrokenRepository {
        fn insert(&self, _patient: &Patient) -> DbResult<PatientId> {
            Err(DbError::LockPoisoned("broken".into()))
        }
        fn fetch_all(&self) -> DbResult<Vec<PatientRecord>> {
            Err(DbError::LockPoisoned("broken".into()))
        }
        fn fetch_by_id(&self, _id: &PatientId) -> DbResult<Option<PatientRecord>> {
            Err(DbError::LockPoisoned("broken".into()))
        }
        fn search_by_name(&self, _term: &str) -> DbResult<Vec<PatientRecord>> {
            Err(DbError::LockPoisoned("broken".into()))
        }
        fn update(&self, _id: &PatientId, _changes: &PatientChanges) -> DbResult<usize> {
            Err(DbError::LockPoisoned("broken".into()))
        }
        fn delete(&self, _id: &PatientId) -> DbResult<usize> {
            Err(DbError::LockPoisoned("broken".into()))
        }
    }

    fn vanishing(report_rows: usize) -> (PatientService, PatientRecord) {
        let inner = SqlitePatientRepository::in_memory().unwrap();
        let seeded = PatientService::new(config(), Arc::new(inner.clone()));
        let record = ann(&seeded);
        let service = PatientService::new(
            config(),
            Arc::new(VanishingRepository { inner, report_rows }),
        );
        (service, record)
    }

    #[test]
    fn test_create_then_get_round_trips() {
        let service = service();
        let created = ann(&service);

        assert_eq!(created.name, "Ann");
        assert_eq!(created.gender, "F");
        assert_eq!(created.age, 40);
        assert!(created.checkout.is_none());
        assert!(PatientId::is_canonical(&created.id));

        assert_eq!(service.get(&created.id).unwrap(), created);
        assert_eq!(service.list().unwrap(), vec![created]);
    }

    #[test]
    fn test_create_with_placement() {
        let service = service();

        let created = service
            .create(&json!({"name": "Ann", "gender": "F", "age": 40, "ward": 3, "room": "31"}))
            .unwrap();
        assert_eq!((created.ward, created.room), (Some(3), Some(31)));

        let err = service
            .create(&json!({"name": "Bo", "gender": "M", "age": 4, "ward": 3, "room": "99"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid ward or room number");

        let err = service
            .create(&json!({"name": "Bo", "gender": "M", "age": 4, "room": "31"}))
            .unwrap_err();
        assert!(matches!(err, PatientError::Validation(_)));

        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_update_changes_then_reports_unchanged() {
        let service = service();
        let created = ann(&service);

        let outcome = service.update(&created.id, &json!({"age": 41})).unwrap();
        match outcome {
            UpdateOutcome::Updated(record) => assert_eq!(record.age, 41),
            UpdateOutcome::Unchanged => panic!("age changed"),
        }

        let again = service.update(&created.id, &json!({"age": 41})).unwrap();
        assert_eq!(again, UpdateOutcome::Unchanged);
    }

    #[test]
    fn test_update_validates_before_lookup() {
        let service = service();

        let err = service.update(&PatientId::new().to_string(), &json!({"age": 0}));
        assert!(matches!(err, Err(PatientError::Validation(_))));

        let err = service.update(&PatientId::new().to_string(), &json!({"age": 30}));
        assert!(matches!(err, Err(PatientError::NotFound(PATIENT_NOT_FOUND))));
    }

    #[test]
    fn test_set_room_moves_and_detects_no_change() {
        let service = service();
        let created = ann(&service);

        let moved = service
            .set_room(&created.id, &json!({"ward": 2, "room": 21}))
            .unwrap();
        match moved {
            UpdateOutcome::Updated(record) => {
                assert_eq!((record.ward, record.room), (Some(2), Some(21)))
            }
            UpdateOutcome::Unchanged => panic!("room changed"),
        }

        let same = service
            .set_room(&created.id, &json!({"ward": 2, "room": "21"}))
            .unwrap();
        assert_eq!(same, UpdateOutcome::Unchanged);
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let service = service();
        let missing = PatientId::new().to_string();

        for id in [missing.as_str(), "not-an-id"] {
            assert!(matches!(service.get(id), Err(PatientError::NotFound(_))));
            assert!(matches!(service.delete(id), Err(PatientError::NotFound(_))));
            assert!(matches!(service.checkout(id), Err(PatientError::NotFound(_))));
            assert!(matches!(
                service.set_room(id, &json!({"ward": 1, "room": 11})),
                Err(PatientError::NotFound(_))
            ));
        }
    }

    #[test]
    fn test_repeated_checkout_refreshes_timestamp() {
        let service = service();
        let created = ann(&service);

        let first = service.checkout(&created.id).unwrap();
        let second = service.checkout(&created.id).unwrap();
        assert!(second >= first);

        let stored = service.get(&created.id).unwrap();
        let stored_at = DateTime::parse_from_rfc3339(stored.checkout.as_deref().unwrap()).unwrap();
        assert_eq!(stored_at.with_timezone(&Utc), second);
    }

    #[test]
    fn test_search_outcomes() {
        let service = service();
        ann(&service);

        assert_eq!(service.search(Some("an")).unwrap().len(), 1);
        assert!(matches!(
            service.search(Some("zed")),
            Err(PatientError::NotFound(NO_SEARCH_MATCHES))
        ));
        assert!(matches!(
            service.search(None),
            Err(PatientError::Validation(_))
        ));
    }

    #[test]
    fn test_configured_room_round_trips_through_set_room() {
        let reference =
            ReferenceData::from_yaml_str("genders: [F]\nwards:\n  1: [\"10\", 12]\n").unwrap();
        let cfg = CoreConfig::new(PathBuf::from("patient.db"), reference).unwrap();
        let service = PatientService::in_memory(Arc::new(cfg)).unwrap();

        let created = service
            .create(&json!({"name": "Ann", "gender": "F", "age": 40, "ward": 1, "room": "10"}))
            .expect("configured room should be accepted");
        assert_eq!((created.ward, created.room), (Some(1), Some(10)));

        let same = service
            .set_room(&created.id, &json!({"ward": created.ward, "room": created.room}))
            .unwrap();
        assert_eq!(same, UpdateOutcome::Unchanged);
    }

    #[test]
    fn test_search_keeps_whitespace_in_term() {
        let service = service();
        for name in ["Ann Lee", "Annabel"] {
            service
                .create(&json!({"name": name, "gender": "F", "age": 40}))
                .unwrap();
        }

        let names: Vec<String> = service
            .search(Some("Ann "))
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Ann Lee"]);

        assert_eq!(service.search(Some(" ")).unwrap().len(), 1);
        assert!(matches!(
            service.search(Some("")),
            Err(PatientError::Validation(_))
        ));
    }

    #[test]
    fn test_create_update_delete_scenario() {
        let service = service();
        let created = ann(&service);

        service.update(&created.id, &json!({"age": 41})).unwrap();
        service.delete(&created.id).unwrap();

        assert!(matches!(
            service.get(&created.id),
            Err(PatientError::NotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_delete_during_checkout_is_not_found() {
        let (service, record) = vanishing(0);
        assert!(matches!(
            service.checkout(&record.id),
            Err(PatientError::NotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_delete_before_refetch_is_not_found() {
        let (service, record) = vanishing(1);
        assert!(matches!(
            service.update(&record.id, &json!({"age": 50})),
            Err(PatientError::NotFound(_))
        ));
    }

    #[test]
    fn test_storage_failures_surface_as_storage_errors() {
        let service = PatientService::new(config(), Arc::new(BrokenRepository));
        assert!(matches!(service.list(), Err(PatientError::Storage(_))));
        assert!(matches!(
            service.get(&PatientId::new().to_string()),
            Err(PatientError::Storage(_))
        ));
    }
}
