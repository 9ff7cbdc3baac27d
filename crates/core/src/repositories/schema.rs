//! SQLite schema definition.

/// Patient table. Created on open if missing; there are no migrations.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER NOT NULL CHECK (age > 0),
    gender TEXT NOT NULL,
    checkin TEXT NOT NULL,
    checkout TEXT,
    ward INTEGER,
    room INTEGER,
    doctor_name TEXT,
    CHECK ((ward IS NULL) = (room IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
"#;
