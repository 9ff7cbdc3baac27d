//! Request body validation.
//!
//! Request bodies arrive as untyped JSON so that each failure can be reported with its own
//! message, in a fixed field order, before anything touches storage. Each function here either
//! returns a strongly-typed value or a `PatientError::Validation` carrying the message callers see.

use crate::constants::{REQUIRED_CREATE_FIELDS, UPDATABLE_FIELDS};
use crate::error::{PatientError, PatientResult};
use crate::patient::{INCOMPLETE_PLACEMENT, INVALID_AGE, INVALID_NAME, NewPatient};
use crate::reference::{
    DoctorName, Gender, INVALID_DOCTOR_NAME, INVALID_PLACEMENT, Placement, ReferenceData,
};
use crate::repositories::PatientChanges;
use crate::{Age, NonEmptyText};
use serde_json::{Map, Value};

pub const EMPTY_BODY: &str = "Request body cannot be empty";
pub const NOT_AN_OBJECT: &str = "Request body must be a JSON object";
pub const NO_UPDATABLE_FIELDS: &str = "No valid fields provided for update";
pub const MISSING_ROOM_FIELDS: &str = "Missing required fields: ward, room";
pub const MISSING_SEARCH_TERM: &str = "search_name parameter is required";

/// True for `null`, `false`, zero, `""`, `[]` and `{}`.
fn is_blank(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Requires a non-empty JSON object. Blank values of any JSON type count as an empty body.
pub fn object_body(body: &Value) -> PatientResult<&Map<String, Value>> {
    if is_blank(body) {
        return Err(PatientError::validation(EMPTY_BODY));
    }
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(PatientError::validation(NOT_AN_OBJECT)),
    }
}

pub fn name(value: &Value) -> PatientResult<NonEmptyText> {
    value
        .as_str()
        .and_then(|s| NonEmptyText::new(s).ok())
        .ok_or_else(|| PatientError::validation(INVALID_NAME))
}

pub fn gender(value: &Value, reference: &ReferenceData) -> PatientResult<Gender> {
    match value.as_str() {
        Some(candidate) => reference.gender(candidate),
        None => Err(reference.invalid_gender()),
    }
}

/// A JSON integer greater than zero. Floats, strings and booleans are rejected even when they
/// look like whole numbers.
pub fn age(value: &Value) -> PatientResult<Age> {
    value
        .as_i64()
        .and_then(|n| Age::new(n).ok())
        .ok_or_else(|| PatientError::validation(INVALID_AGE))
}

/// A room as its string form. Rooms may be sent as integers or strings.
pub fn room_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn checked_placement(
    ward: &Value,
    room: &Value,
    reference: &ReferenceData,
) -> PatientResult<Placement> {
    let invalid = || PatientError::validation(INVALID_PLACEMENT);
    let ward = ward.as_i64().ok_or_else(invalid)?;
    let room = room_text(room).ok_or_else(invalid)?;
    reference.placement(ward, &room)
}

/// The optional placement of a new admission. A `null` ward or room counts as absent.
pub fn placement(
    ward: Option<&Value>,
    room: Option<&Value>,
    reference: &ReferenceData,
) -> PatientResult<Option<Placement>> {
    match (present(ward), present(room)) {
        (Some(ward), Some(room)) => checked_placement(ward, room, reference).map(Some),
        (None, None) => Ok(None),
        _ => Err(PatientError::validation(INCOMPLETE_PLACEMENT)),
    }
}

/// The placement change carried by an update body.
///
/// - neither key present: `None` (placement untouched)
/// - both keys `null`: `Some(None)` (placement cleared)
/// - both keys set: `Some(Some(_))` once the pair is validated
///
/// Anything else is rejected so the pair is never half-set.
pub fn placement_change(
    ward: Option<&Value>,
    room: Option<&Value>,
    reference: &ReferenceData,
) -> PatientResult<Option<Option<Placement>>> {
    match (ward, room) {
        (None, None) => Ok(None),
        (Some(Value::Null), Some(Value::Null)) => Ok(Some(None)),
        (Some(ward), Some(room)) if !ward.is_null() && !room.is_null() => {
            checked_placement(ward, room, reference).map(|p| Some(Some(p)))
        }
        _ => Err(PatientError::validation(INCOMPLETE_PLACEMENT)),
    }
}

pub fn doctor_name(value: &Value, reference: &ReferenceData) -> PatientResult<DoctorName> {
    match value.as_str() {
        Some(candidate) => reference.doctor(candidate),
        None => Err(PatientError::validation(INVALID_DOCTOR_NAME)),
    }
}

/// Validates a create body into a [`NewPatient`].
///
/// Checks run in the order name, gender, age, ward/room, doctor and stop at the first failure.
pub fn new_patient(body: &Value, reference: &ReferenceData) -> PatientResult<NewPatient> {
    let map = object_body(body)?;

    if !REQUIRED_CREATE_FIELDS.iter().all(|k| map.contains_key(*k)) {
        return Err(PatientError::validation(format!(
            "Missing required fields: {}",
            REQUIRED_CREATE_FIELDS.join(", ")
        )));
    }

    let name = name(&map["name"])?;
    let gender = gender(&map["gender"], reference)?;
    let age = age(&map["age"])?;
    let placement = placement(map.get("ward"), map.get("room"), reference)?;
    let doctor = present(map.get("doctor_name"))
        .map(|v| doctor_name(v, reference))
        .transpose()?;

    Ok(NewPatient {
        name: name.into_inner(),
        age: age.years(),
        gender: gender.as_str().to_string(),
        ward: placement.map(|p| i64::from(p.ward())),
        room: placement.map(|p| p.room().to_string()),
        doctor_name: doctor.map(|d| d.as_str().to_string()),
    })
}

/// Validates a partial update body into the set of column changes.
///
/// Keys outside the updatable set are dropped before anything else is checked.
pub fn patient_changes(body: &Value, reference: &ReferenceData) -> PatientResult<PatientChanges> {
    let map = object_body(body)?;

    let allowed: Map<String, Value> = map
        .iter()
        .filter(|(k, _)| UPDATABLE_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if allowed.is_empty() {
        return Err(PatientError::validation(NO_UPDATABLE_FIELDS));
    }

    let mut changes = PatientChanges::default();
    if let Some(value) = allowed.get("name") {
        changes.name = Some(name(value)?);
    }
    if let Some(value) = allowed.get("gender") {
        changes.gender = Some(gender(value, reference)?);
    }
    if let Some(value) = allowed.get("age") {
        changes.age = Some(age(value)?);
    }
    changes.placement = placement_change(allowed.get("ward"), allowed.get("room"), reference)?;

    Ok(changes)
}

/// Validates a set-room body. Both keys must be present; `null` values are invalid.
pub fn room_assignment(body: &Value, reference: &ReferenceData) -> PatientResult<Placement> {
    let map = match body {
        Value::Object(map) => map,
        _ => return Err(PatientError::validation(MISSING_ROOM_FIELDS)),
    };

    match (map.get("ward"), map.get("room")) {
        (Some(ward), Some(room)) => checked_placement(ward, room, reference),
        _ => Err(PatientError::validation(MISSING_ROOM_FIELDS)),
    }
}

/// A search term must be present and non-empty. It is returned untouched: whitespace is part
/// of the substring being searched for.
pub fn search_term(raw: Option<&str>) -> PatientResult<&str> {
    raw.filter(|s| !s.is_empty())
        .ok_or_else(|| PatientError::validation(MISSING_SEARCH_TERM))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn message(err: PatientError) -> String {
        err.to_string()
    }

    #[test]
    fn test_object_body_rejects_empty_and_non_objects() {
        assert_eq!(message(object_body(&Value::Null).unwrap_err()), EMPTY_BODY);
        assert_eq!(message(object_body(&json!({})).unwrap_err()), EMPTY_BODY);
        assert_eq!(message(object_body(&json!([1])).unwrap_err()), NOT_AN_OBJECT);
        assert_eq!(message(object_body(&json!(7)).unwrap_err()), NOT_AN_OBJECT);
        assert!(object_body(&json!({"a": 1})).is_ok());
    }

    #[test]
    fn test_blank_scalar_bodies_count_as_empty() {
        for body in [json!(0), json!(0.0), json!(false), json!(""), json!([])] {
            assert_eq!(message(object_body(&body).unwrap_err()), EMPTY_BODY, "{body}");
        }
    }

    #[test]
    fn test_new_patient_requires_all_fields() {
        let reference = ReferenceData::default();
        let err = new_patient(&json!({"name": "Ann", "age": 40}), &reference).unwrap_err();
        assert_eq!(message(err), "Missing required fields: name, gender, age");
    }

    #[test]
    fn test_new_patient_reports_first_failure_in_field_order() {
        let reference = ReferenceData::default();

        let err = new_patient(&json!({"name": "", "gender": "X", "age": 0}), &reference);
        assert_eq!(message(err.unwrap_err()), INVALID_NAME);

        let err = new_patient(&json!({"name": "Ann", "gender": "X", "age": 0}), &reference);
        assert_eq!(
            message(err.unwrap_err()),
            "Invalid gender provided. Must be one of: M, F, O"
        );

        let err = new_patient(&json!({"name": "Ann", "gender": "F", "age": 0}), &reference);
        assert_eq!(message(err.unwrap_err()), INVALID_AGE);
    }

    #[test]
    fn test_new_patient_accepts_numeric_or_string_room() {
        let reference = ReferenceData::default();

        for room in [json!(31), json!("31")] {
            let new = new_patient(
                &json!({"name": "Ann", "gender": "F", "age": 40, "ward": 3, "room": room}),
                &reference,
            )
            .expect("valid placement");
            assert_eq!(new.ward, Some(3));
            assert_eq!(new.room.as_deref(), Some("31"));
        }
    }

    #[test]
    fn test_new_patient_treats_null_placement_as_absent() {
        let reference = ReferenceData::default();
        let new = new_patient(
            &json!({"name": "Ann", "gender": "F", "age": 40, "ward": null, "room": null}),
            &reference,
        )
        .unwrap();
        assert_eq!(new.ward, None);
        assert_eq!(new.room, None);
    }

    #[test]
    fn test_new_patient_rejects_half_or_invalid_placement() {
        let reference = ReferenceData::default();

        let err = new_patient(
            &json!({"name": "Ann", "gender": "F", "age": 40, "ward": 3}),
            &reference,
        );
        assert_eq!(message(err.unwrap_err()), INCOMPLETE_PLACEMENT);

        let err = new_patient(
            &json!({"name": "Ann", "gender": "F", "age": 40, "ward": "3", "room": "31"}),
            &reference,
        );
        assert_eq!(message(err.unwrap_err()), INVALID_PLACEMENT);
    }

    #[test]
    fn test_new_patient_checks_doctor() {
        let reference = ReferenceData::default();

        let new = new_patient(
            &json!({"name": "Ann", "gender": "F", "age": 40, "doctor_name": "Dr. Chen"}),
            &reference,
        )
        .unwrap();
        assert_eq!(new.doctor_name.as_deref(), Some("Dr. Chen"));

        let err = new_patient(
            &json!({"name": "Ann", "gender": "F", "age": 40, "doctor_name": 7}),
            &reference,
        );
        assert_eq!(message(err.unwrap_err()), INVALID_DOCTOR_NAME);
    }

    #[test]
    fn test_patient_changes_drops_unknown_fields() {
        let reference = ReferenceData::default();

        let err = patient_changes(&json!({"doctor_name": "Dr. Chen", "id": "x"}), &reference);
        assert_eq!(message(err.unwrap_err()), NO_UPDATABLE_FIELDS);

        let changes = patient_changes(&json!({"age": 41, "colour": "blue"}), &reference).unwrap();
        assert_eq!(changes.age.map(|a| a.years()), Some(41));
        assert!(changes.name.is_none());
        assert!(changes.placement.is_none());
    }

    #[test]
    fn test_patient_changes_validates_present_fields() {
        let reference = ReferenceData::default();

        let err = patient_changes(&json!({"age": -2}), &reference);
        assert_eq!(message(err.unwrap_err()), INVALID_AGE);

        let err = patient_changes(&json!({"name": "   "}), &reference);
        assert_eq!(message(err.unwrap_err()), INVALID_NAME);
    }

    #[test]
    fn test_patient_changes_placement_rules() {
        let reference = ReferenceData::default();

        let err = patient_changes(&json!({"ward": 3}), &reference);
        assert_eq!(message(err.unwrap_err()), INCOMPLETE_PLACEMENT);

        let err = patient_changes(&json!({"ward": 3, "room": null}), &reference);
        assert_eq!(message(err.unwrap_err()), INCOMPLETE_PLACEMENT);

        let cleared = patient_changes(&json!({"ward": null, "room": null}), &reference).unwrap();
        assert_eq!(cleared.placement, Some(None));

        let moved = patient_changes(&json!({"ward": 2, "room": 22}), &reference).unwrap();
        let placement = moved.placement.flatten().expect("placement set");
        assert_eq!((placement.ward(), placement.room()), (2, 22));
    }

    #[test]
    fn test_room_assignment_requires_both_keys() {
        let reference = ReferenceData::default();

        for body in [json!({}), Value::Null, json!({"ward": 3})] {
            let err = room_assignment(&body, &reference).unwrap_err();
            assert_eq!(message(err), MISSING_ROOM_FIELDS);
        }

        let err = room_assignment(&json!({"ward": 3, "room": null}), &reference);
        assert_eq!(message(err.unwrap_err()), INVALID_PLACEMENT);

        let placement = room_assignment(&json!({"ward": 3, "room": "32"}), &reference).unwrap();
        assert_eq!(placement.room(), 32);
    }

    #[test]
    fn test_search_term_must_be_present() {
        assert_eq!(message(search_term(None).unwrap_err()), MISSING_SEARCH_TERM);
        assert_eq!(message(search_term(Some("")).unwrap_err()), MISSING_SEARCH_TERM);
        assert_eq!(search_term(Some("  ")).unwrap(), "  ");
        assert_eq!(search_term(Some(" an ")).unwrap(), " an ");
    }

    #[test]
    fn test_age_rejects_non_integers() {
        for value in [json!(40.0), json!("40"), json!(true), json!(null)] {
            assert_eq!(message(age(&value).unwrap_err()), INVALID_AGE);
        }
    }

    proptest! {
        #[test]
        fn prop_age_accepts_exactly_positive_integers(n in any::<i64>()) {
            let result = age(&json!(n));
            prop_assert_eq!(result.is_ok(), n > 0);
            if let Ok(age) = result {
                prop_assert_eq!(age.years(), n);
            }
        }
    }
}
