//! The patient admission domain model.
//!
//! A [`Patient`] is only ever built in two ways:
//!
//! - [`Patient::admit`] validates a [`NewPatient`] and allocates a fresh id and checkin time. It
//!   either returns a patient that satisfies every invariant or an error; no partially-valid
//!   patient escapes.
//! - [`Patient::restore`] rehydrates a record the repository already holds, so transitions like
//!   checkout run against the existing patient instead of a re-admitted copy.
//!
//! Once persisted, the repository owns the authoritative state; a `Patient` value is a working copy.

use crate::error::{PatientError, PatientResult};
use crate::reference::{DoctorName, Gender, Placement, ReferenceData};
use crate::{Age, NonEmptyText, PatientId};
use api_shared::PatientRecord;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

pub const INVALID_NAME: &str = "Name must be a non-empty string";
pub const INVALID_AGE: &str = "Age must be a positive integer";
pub const INCOMPLETE_PLACEMENT: &str = "Both ward and room must be provided together";

/// Unvalidated input for a new admission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPatient {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub ward: Option<i64>,
    /// Room in string form, as listed in the reference data.
    pub room: Option<String>,
    pub doctor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    id: PatientId,
    name: NonEmptyText,
    age: Age,
    gender: Gender,
    checkin: DateTime<Utc>,
    checkout: Option<DateTime<Utc>>,
    placement: Option<Placement>,
    doctor: Option<DoctorName>,
}

/// The current time at the precision records store.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Renders a timestamp the way records store it.
pub fn render_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> PatientResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PatientError::CorruptRecord(format!("timestamp '{raw}': {e}")))
}

impl Patient {
    /// Validates `new` and admits the patient now.
    ///
    /// Fields are checked in the order name, gender, age, ward/room, doctor and the first failure
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Validation` if any field is invalid, if exactly one of ward/room is
    /// supplied, or if the room does not belong to the ward.
    pub fn admit(new: NewPatient, reference: &ReferenceData) -> PatientResult<Self> {
        let name = NonEmptyText::new(&new.name).map_err(|_| PatientError::validation(INVALID_NAME))?;
        let gender = reference.gender(&new.gender)?;
        let age = Age::new(new.age).map_err(|_| PatientError::validation(INVALID_AGE))?;

        let mut patient = Self {
            id: PatientId::new(),
            name,
            age,
            gender,
            checkin: now(),
            checkout: None,
            placement: None,
            doctor: None,
        };

        match (new.ward, new.room.as_deref()) {
            (Some(ward), Some(room)) => patient.assign_placement(ward, room, reference)?,
            (None, None) => {}
            _ => return Err(PatientError::validation(INCOMPLETE_PLACEMENT)),
        }

        if let Some(doctor) = new.doctor_name.as_deref() {
            patient.assign_doctor(doctor, reference)?;
        }

        Ok(patient)
    }

    /// Rehydrates a stored record without re-validating it against the reference data.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::CorruptRecord` if the stored values cannot form a patient at all
    /// (bad id or timestamp, non-positive age, half a ward/room pair).
    pub fn restore(record: PatientRecord) -> PatientResult<Self> {
        let corrupt = |what: &str| PatientError::CorruptRecord(format!("{what} (id {})", record.id));

        let id = PatientId::parse(&record.id).map_err(|e| corrupt(&e.to_string()))?;
        let name = NonEmptyText::new(&record.name).map_err(|_| corrupt("blank name"))?;
        let age = Age::new(record.age).map_err(|e| corrupt(&e.to_string()))?;

        let placement = match (record.ward, record.room) {
            (Some(ward), Some(room)) => {
                let ward = u32::try_from(ward).map_err(|_| corrupt("ward out of range"))?;
                let room = u32::try_from(room).map_err(|_| corrupt("room out of range"))?;
                Some(Placement::from_stored(ward, room))
            }
            (None, None) => None,
            _ => return Err(corrupt("ward and room must both be set or both be empty")),
        };

        Ok(Self {
            id,
            name,
            age,
            gender: Gender::from_stored(record.gender),
            checkin: parse_timestamp(&record.checkin)?,
            checkout: record.checkout.as_deref().map(parse_timestamp).transpose()?,
            placement,
            doctor: record.doctor_name.map(DoctorName::from_stored),
        })
    }

    /// Assigns a ward and room together.
    ///
    /// On an invalid combination both fields are cleared before the error is returned, so the
    /// patient is left unassigned rather than half-assigned.
    pub fn assign_placement(
        &mut self,
        ward: i64,
        room: &str,
        reference: &ReferenceData,
    ) -> PatientResult<()> {
        match reference.placement(ward, room) {
            Ok(placement) => {
                self.placement = Some(placement);
                Ok(())
            }
            Err(e) => {
                self.placement = None;
                Err(e)
            }
        }
    }

    /// Assigns a doctor from the roster. An unknown name leaves the current doctor in place.
    pub fn assign_doctor(&mut self, name: &str, reference: &ReferenceData) -> PatientResult<()> {
        self.doctor = Some(reference.doctor(name)?);
        Ok(())
    }

    /// Stamps the checkout time with the current time and returns it.
    ///
    /// There is no terminal state: checking out again simply refreshes the timestamp.
    pub fn checkout(&mut self) -> DateTime<Utc> {
        let at = now();
        self.checkout = Some(at);
        at
    }

    pub fn id(&self) -> PatientId {
        self.id
    }

    pub fn name(&self) -> &NonEmptyText {
        &self.name
    }

    pub fn age(&self) -> Age {
        self.age
    }

    pub fn gender(&self) -> &Gender {
        &self.gender
    }

    pub fn checkin(&self) -> DateTime<Utc> {
        self.checkin
    }

    pub fn checkout_time(&self) -> Option<DateTime<Utc>> {
        self.checkout
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn doctor(&self) -> Option<&DoctorName> {
        self.doctor.as_ref()
    }

    pub fn to_record(&self) -> PatientRecord {
        PatientRecord::from(self)
    }
}

impl From<&Patient> for PatientRecord {
    fn from(patient: &Patient) -> Self {
        PatientRecord {
            id: patient.id.to_string(),
            name: patient.name.as_str().to_string(),
            age: patient.age.years(),
            gender: patient.gender.as_str().to_string(),
            checkin: render_timestamp(patient.checkin),
            checkout: patient.checkout.map(render_timestamp),
            ward: patient.placement.map(|p| i64::from(p.ward())),
            room: patient.placement.map(|p| i64::from(p.room())),
            doctor_name: patient.doctor.as_ref().map(|d| d.as_str().to_string()),
        }
    }
}
