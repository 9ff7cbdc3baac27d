//! Reference data: the static tables patient fields are validated against.
//!
//! The tables are loaded once at startup (built-in defaults or a YAML file) into an immutable
//! [`ReferenceData`] and shared through [`CoreConfig`](crate::CoreConfig). Nothing mutates them
//! afterwards.
//!
//! ## YAML layout
//!
//! ```yaml
//! genders: [M, F, O]
//! wards:
//!   1: ["11", "12"]
//!   3: [31, 32]        # integers are accepted and stored in string form
//! doctors: ["Dr. Adams", "Dr. Chen"]
//! ```
//!
//! Room identifiers must be numeric because records persist `room` as an integer.

use crate::{PatientError, PatientResult};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

pub const INVALID_PLACEMENT: &str = "Invalid ward or room number";
pub const INVALID_DOCTOR_NAME: &str = "Doctor name must be a non-empty string";

const DEFAULT_GENDERS: [&str; 3] = ["M", "F", "O"];
const DEFAULT_WARD_COUNT: u32 = 5;
const DEFAULT_DOCTORS: [&str; 5] = [
    "Dr. Adams",
    "Dr. Baker",
    "Dr. Chen",
    "Dr. Okafor",
    "Dr. Patel",
];

/// A gender value that is present in the configured gender list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gender(String);

impl Gender {
    /// Wraps a value read back from storage. Storage is trusted; new input goes through
    /// [`ReferenceData::gender`].
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A doctor name that is present in the configured roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DoctorName(String);

impl DoctorName {
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated ward/room pair: the room belongs to the ward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    ward: u32,
    room: u32,
}

impl Placement {
    pub(crate) fn from_stored(ward: u32, room: u32) -> Self {
        Self { ward, room }
    }

    pub fn ward(&self) -> u32 {
        self.ward
    }

    pub fn room(&self) -> u32 {
        self.room
    }
}

/// Immutable validation tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceData {
    genders: Vec<String>,
    wards: BTreeMap<u32, BTreeSet<String>>,
    doctors: BTreeSet<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoomEntry {
    Number(u32),
    Text(String),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ReferenceDataFile {
    genders: Vec<String>,
    wards: BTreeMap<u32, Vec<RoomEntry>>,
    #[serde(default)]
    doctors: Vec<String>,
}

/// Rooms are stored as integers, so only the spelling an integer renders back to is accepted.
fn is_canonical_room(room: &str) -> bool {
    room.parse::<u32>().map(|n| n.to_string()).as_deref() == Ok(room)
}

impl Default for ReferenceData {
    /// Genders `M`/`F`/`O`, wards 1–5 each owning rooms `<ward>1` and `<ward>2`, and a fixed
    /// doctor roster.
    fn default() -> Self {
        let wards = (1..=DEFAULT_WARD_COUNT)
            .map(|ward| {
                let rooms = (1..=2).map(|n| format!("{ward}{n}")).collect();
                (ward, rooms)
            })
            .collect();

        Self {
            genders: DEFAULT_GENDERS.iter().map(|g| g.to_string()).collect(),
            wards,
            doctors: DEFAULT_DOCTORS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl ReferenceData {
    /// Builds reference data from explicit tables.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if there are no genders or wards, a ward owns no
    /// rooms, any entry is blank, or a room identifier is not a canonical whole number (`"01"`
    /// and `"+31"` are rejected).
    pub fn new(
        genders: Vec<String>,
        wards: BTreeMap<u32, BTreeSet<String>>,
        doctors: BTreeSet<String>,
    ) -> PatientResult<Self> {
        if genders.is_empty() || genders.iter().any(|g| g.trim().is_empty()) {
            return Err(PatientError::InvalidInput(
                "genders must be a non-empty list of non-blank values".into(),
            ));
        }

        if wards.is_empty() {
            return Err(PatientError::InvalidInput(
                "at least one ward must be configured".into(),
            ));
        }

        for (ward, rooms) in &wards {
            if rooms.is_empty() {
                return Err(PatientError::InvalidInput(format!(
                    "ward {ward} has no rooms"
                )));
            }
            if let Some(bad) = rooms.iter().find(|r| !is_canonical_room(r)) {
                return Err(PatientError::InvalidInput(format!(
                    "room '{bad}' in ward {ward} must be a whole number written without sign or \
                     leading zeros"
                )));
            }
        }

        if doctors.iter().any(|d| d.trim().is_empty()) {
            return Err(PatientError::InvalidInput(
                "doctor names cannot be blank".into(),
            ));
        }

        Ok(Self {
            genders,
            wards,
            doctors,
        })
    }

    /// Parses reference data from YAML text.
    pub fn from_yaml_str(raw: &str) -> PatientResult<Self> {
        let file: ReferenceDataFile =
            serde_yaml::from_str(raw).map_err(PatientError::YamlDeserialization)?;

        let wards = file
            .wards
            .into_iter()
            .map(|(ward, rooms)| {
                let rooms = rooms
                    .into_iter()
                    .map(|room| match room {
                        RoomEntry::Number(n) => n.to_string(),
                        RoomEntry::Text(s) => s,
                    })
                    .collect();
                (ward, rooms)
            })
            .collect();

        Self::new(file.genders, wards, file.doctors.into_iter().collect())
    }

    /// Reads and parses a YAML reference data file.
    pub fn load(path: &Path) -> PatientResult<Self> {
        let raw = fs::read_to_string(path).map_err(PatientError::FileRead)?;
        Self::from_yaml_str(&raw)
    }

    pub fn genders(&self) -> &[String] {
        &self.genders
    }

    pub fn ward_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.wards.keys().copied()
    }

    pub fn rooms(&self, ward: u32) -> Option<&BTreeSet<String>> {
        self.wards.get(&ward)
    }

    pub fn doctors(&self) -> &BTreeSet<String> {
        &self.doctors
    }

    /// The error reported for any gender outside the configured list.
    pub fn invalid_gender(&self) -> PatientError {
        PatientError::validation(format!(
            "Invalid gender provided. Must be one of: {}",
            self.genders.join(", ")
        ))
    }

    /// Checks `candidate` against the gender list. Matching is exact.
    pub fn gender(&self, candidate: &str) -> PatientResult<Gender> {
        if self.genders.iter().any(|g| g == candidate) {
            Ok(Gender(candidate.to_string()))
        } else {
            Err(self.invalid_gender())
        }
    }

    /// Checks that `room` (in string form) belongs to `ward`.
    pub fn placement(&self, ward: i64, room: &str) -> PatientResult<Placement> {
        let invalid = || PatientError::validation(INVALID_PLACEMENT);

        let ward = u32::try_from(ward).map_err(|_| invalid())?;
        let rooms = self.wards.get(&ward).ok_or_else(invalid)?;
        if !rooms.contains(room) {
            return Err(invalid());
        }
        let room = room.parse::<u32>().map_err(|_| invalid())?;

        Ok(Placement { ward, room })
    }

    pub fn doctor(&self, candidate: &str) -> PatientResult<DoctorName> {
        if candidate.trim().is_empty() {
            return Err(PatientError::validation(INVALID_DOCTOR_NAME));
        }
        if !self.doctors.contains(candidate) {
            return Err(PatientError::validation(format!(
                "Doctor '{candidate}' is not recognized."
            )));
        }
        Ok(DoctorName(candidate.to_string()))
    }
}
