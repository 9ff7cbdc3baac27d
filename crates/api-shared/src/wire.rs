//! Request and response bodies.
//!
//! Absent optional fields on [`PatientRecord`] serialise as `null`, matching the stored columns.
//! Request types skip `None` fields so that a serialised [`UpdatePatientReq`] only carries the
//! fields the caller actually wants to change.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A patient admission record as persisted and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientRecord {
    /// 32 lowercase hex characters.
    pub id: String,
    pub name: String,
    pub age: i64,
    pub gender: String,
    /// RFC 3339 UTC timestamp.
    pub checkin: String,
    pub checkout: Option<String>,
    pub ward: Option<i64>,
    pub room: Option<i64>,
    pub doctor_name: Option<String>,
}

/// A room identifier as accepted on input: either `31` or `"31"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RoomInput {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub name: String,
    pub gender: String,
    pub age: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
}

/// Partial update. Unknown fields in the request body are ignored by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdatePatientReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SetRoomReq {
    pub ward: i64,
    pub room: RoomInput,
}

/// Returned by update and set-room: either the fresh record or an "unchanged" message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum UpdatePatientRes {
    Updated(PatientRecord),
    Unchanged(MessageRes),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

impl MessageRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRes {
    pub message: String,
    pub checkout_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serialises_absent_fields_as_null() {
        let record = PatientRecord {
            id: "550e8400e29b41d4a716446655440000".into(),
            name: "Ann".into(),
            age: 40,
            gender: "F".into(),
            checkin: "2026-01-01T00:00:00+00:00".into(),
            checkout: None,
            ward: None,
            room: None,
            doctor_name: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["checkout"].is_null());
        assert!(value["ward"].is_null());
        assert!(value["doctor_name"].is_null());
    }

    #[test]
    fn room_input_accepts_number_or_string() {
        let n: RoomInput = serde_json::from_str("31").unwrap();
        let s: RoomInput = serde_json::from_str("\"31\"").unwrap();
        assert_eq!(n, RoomInput::Number(31));
        assert_eq!(s, RoomInput::Text("31".into()));
    }

    #[test]
    fn update_req_omits_unset_fields() {
        let req = UpdatePatientReq {
            age: Some(41),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"age":41}"#);
    }
}
