//! Patient table operations.

use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use super::{DbResult, PatientChanges, PatientRepository, SqlitePatientRepository};
use crate::PatientId;
use crate::patient::{Patient, render_timestamp};
use api_shared::PatientRecord;

const SELECT_COLUMNS: &str =
    "SELECT id, name, age, gender, checkin, checkout, ward, room, doctor_name FROM patients";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<PatientRecord> {
    Ok(PatientRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        checkin: row.get(4)?,
        checkout: row.get(5)?,
        ward: row.get(6)?,
        room: row.get(7)?,
        doctor_name: row.get(8)?,
    })
}

/// Escapes `LIKE` metacharacters so the term matches literally. Pair with `ESCAPE '\'`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Builds `SET col = ?n` assignments alongside a null-safe `col IS NOT ?n` guard per column,
/// so the statement only matches a row that would actually change.
struct Assignments {
    values: Vec<Value>,
    sets: Vec<String>,
    guards: Vec<String>,
}

impl Assignments {
    fn for_id(id: &PatientId) -> Self {
        Self {
            values: vec![Value::Text(id.to_string())],
            sets: Vec::new(),
            guards: Vec::new(),
        }
    }

    fn push(&mut self, column: &str, value: Value) {
        self.values.push(value);
        let n = self.values.len();
        self.sets.push(format!("{column} = ?{n}"));
        self.guards.push(format!("{column} IS NOT ?{n}"));
    }

    fn from_changes(id: &PatientId, changes: &PatientChanges) -> Self {
        let mut assignments = Self::for_id(id);

        if let Some(name) = &changes.name {
            assignments.push("name", Value::Text(name.as_str().to_string()));
        }
        if let Some(age) = changes.age {
            assignments.push("age", Value::Integer(age.years()));
        }
        if let Some(gender) = &changes.gender {
            assignments.push("gender", Value::Text(gender.as_str().to_string()));
        }
        if let Some(placement) = changes.placement {
            let (ward, room) = match placement {
                Some(p) => (
                    Value::Integer(i64::from(p.ward())),
                    Value::Integer(i64::from(p.room())),
                ),
                None => (Value::Null, Value::Null),
            };
            assignments.push("ward", ward);
            assignments.push("room", room);
        }
        if let Some(checkout) = changes.checkout {
            assignments.push("checkout", Value::Text(render_timestamp(checkout)));
        }

        assignments
    }

    fn statement(&self) -> String {
        format!(
            "UPDATE patients SET {} WHERE id = ?1 AND ({})",
            self.sets.join(", "),
            self.guards.join(" OR ")
        )
    }
}

impl PatientRepository for SqlitePatientRepository {
    fn insert(&self, patient: &Patient) -> DbResult<PatientId> {
        let record = patient.to_record();
        let db = self.lock()?;
        db.conn().execute(
            r#"
            INSERT INTO patients (
                id, name, age, gender, checkin, checkout, ward, room, doctor_name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.name,
                record.age,
                record.gender,
                record.checkin,
                record.checkout,
                record.ward,
                record.room,
                record.doctor_name,
            ],
        )?;
        Ok(patient.id())
    }

    fn fetch_all(&self) -> DbResult<Vec<PatientRecord>> {
        let db = self.lock()?;
        let mut stmt = db
            .conn()
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY checkin, id"))?;
        let rows = stmt.query_map([], record_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn fetch_by_id(&self, id: &PatientId) -> DbResult<Option<PatientRecord>> {
        let db = self.lock()?;
        let record = db
            .conn()
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id.to_string()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn search_by_name(&self, term: &str) -> DbResult<Vec<PatientRecord>> {
        let db = self.lock()?;
        let mut stmt = db.conn().prepare(&format!(
            "{SELECT_COLUMNS} WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name, checkin"
        ))?;
        let rows = stmt.query_map([like_pattern(term)], record_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn update(&self, id: &PatientId, changes: &PatientChanges) -> DbResult<usize> {
        if changes.is_empty() {
            return Ok(0);
        }

        let assignments = Assignments::from_changes(id, changes);
        let db = self.lock()?;
        let rows = db.conn().execute(
            &assignments.statement(),
            params_from_iter(assignments.values.iter()),
        )?;
        Ok(rows)
    }

    fn delete(&self, id: &PatientId) -> DbResult<usize> {
        let db = self.lock()?;
        let rows = db
            .conn()
            .execute("DELETE FROM patients WHERE id = ?1", [id.to_string()])?;
        Ok(rows)
    }
}
