use std::sync::Arc;

use admissions_core::{
    config::{database_path_from_env_value, reference_data_from_env_value},
    constants::{DATABASE_PATH_ENV, REFERENCE_DATA_ENV},
    patient::render_timestamp,
    CoreConfig, PatientRecord, PatientService, UpdateOutcome,
};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "admissions")]
#[command(about = "Patient admissions CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    List,
    /// Show a single patient
    Show {
        /// Patient id
        id: String,
    },
    /// Search patients by name (case-insensitive substring)
    Search { term: String },
    /// Admit a new patient
    Admit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        age: i64,
        /// Ward number (requires --room)
        #[arg(long, requires = "room")]
        ward: Option<i64>,
        /// Room within the ward (requires --ward)
        #[arg(long, requires = "ward")]
        room: Option<String>,
        /// Attending doctor
        #[arg(long)]
        doctor: Option<String>,
    },
    /// Move a patient to a ward and room
    AssignRoom {
        id: String,
        ward: i64,
        room: String,
    },
    /// Record the checkout time for a patient
    Checkout { id: String },
    /// Remove a patient record
    Discharge { id: String },
}

fn print_record(record: &PatientRecord) {
    let placement = match (record.ward, record.room) {
        (Some(ward), Some(room)) => format!("ward {ward}, room {room}"),
        _ => "unassigned".to_string(),
    };
    println!(
        "ID: {}, Name: {}, Age: {}, Gender: {}, Checkin: {}, Checkout: {}, Placement: {}, Doctor: {}",
        record.id,
        record.name,
        record.age,
        record.gender,
        record.checkin,
        record.checkout.as_deref().unwrap_or("-"),
        placement,
        record.doctor_name.as_deref().unwrap_or("-"),
    );
}

fn admit_body(
    name: String,
    gender: String,
    age: i64,
    ward: Option<i64>,
    room: Option<String>,
    doctor: Option<String>,
) -> Value {
    let mut body = Map::new();
    body.insert("name".into(), json!(name));
    body.insert("gender".into(), json!(gender));
    body.insert("age".into(), json!(age));
    if let Some(ward) = ward {
        body.insert("ward".into(), json!(ward));
    }
    if let Some(room) = room {
        body.insert("room".into(), json!(room));
    }
    if let Some(doctor) = doctor {
        body.insert("doctor_name".into(), json!(doctor));
    }
    Value::Object(body)
}

fn open_service() -> anyhow::Result<PatientService> {
    let database_path = database_path_from_env_value(std::env::var(DATABASE_PATH_ENV).ok());
    let reference = reference_data_from_env_value(std::env::var(REFERENCE_DATA_ENV).ok())?;
    let cfg = Arc::new(CoreConfig::new(database_path, reference)?);
    Ok(PatientService::open(cfg)?)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'admissions --help' for commands");
        return Ok(());
    };

    let service = open_service()?;

    match command {
        Commands::List => {
            let patients = service.list()?;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                patients.iter().for_each(print_record);
            }
        }
        Commands::Show { id } => print_record(&service.get(&id)?),
        Commands::Search { term } => service.search(Some(&term))?.iter().for_each(print_record),
        Commands::Admit {
            name,
            gender,
            age,
            ward,
            room,
            doctor,
        } => {
            let record = service.create(&admit_body(name, gender, age, ward, room, doctor))?;
            println!("Admitted patient with ID: {}", record.id);
        }
        Commands::AssignRoom { id, ward, room } => {
            match service.set_room(&id, &json!({"ward": ward, "room": room}))? {
                UpdateOutcome::Updated(record) => print_record(&record),
                UpdateOutcome::Unchanged => {
                    println!("Patient room is the same, no update performed")
                }
            }
        }
        Commands::Checkout { id } => {
            let at = service.checkout(&id)?;
            println!("Checked out patient {} at {}", id, render_timestamp(at));
        }
        Commands::Discharge { id } => {
            service.delete(&id)?;
            println!("Discharged patient {}", id);
        }
    }

    Ok(())
}
