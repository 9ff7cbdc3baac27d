//! # API REST
//!
//! REST API for the patient admissions service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! All patient logic lives in `admissions-core`; handlers only decode requests and map
//! [`PatientError`] onto status codes.

#![warn(rust_2018_idioms)]

use axum::{
    body::Bytes,
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use admissions_core::patient::render_timestamp;
use admissions_core::{PatientError, PatientRecord, PatientService, UpdateOutcome};
use api_shared::{
    CheckoutRes, CreatePatientReq, HealthRes, HealthService, MessageRes, RoomInput, SetRoomReq,
    UpdatePatientReq, UpdatePatientRes,
};

pub const WELCOME: &str = "Welcome to the Patient API!";
pub const PATIENT_DELETED: &str = "Patient deleted successfully";
pub const PATIENT_CHECKED_OUT: &str = "Patient checked out successfully";
pub const DATA_UNCHANGED: &str = "Patient data is the same, no update performed";
pub const ROOM_UNCHANGED: &str = "Patient room is the same, no update performed";
pub const INVALID_JSON: &str = "Request body must be valid JSON";

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: PatientService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        index,
        health,
        list_patients,
        create_patient,
        search_patients,
        get_patient,
        update_patient,
        delete_patient,
        set_room,
        checkout_patient,
    ),
    components(schemas(
        PatientRecord,
        CreatePatientReq,
        UpdatePatientReq,
        UpdatePatientRes,
        SetRoomReq,
        RoomInput,
        MessageRes,
        CheckoutRes,
        HealthRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/patients", get(list_patients).post(create_patient))
        .route("/patients/search", get(search_patients))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/patients/:id/room", put(set_room))
        .route("/patients/:id/checkout", put(checkout_patient))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A [`PatientError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(PatientError);

impl From<PatientError> for ApiError {
    fn from(err: PatientError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            PatientError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            PatientError::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            other => {
                tracing::error!("Patient operation failed: {:?}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };
        (status, Json(MessageRes::new(message))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Decodes a raw request body. An empty body decodes to `null` so the core can report it.
fn json_body(body: &Bytes) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        ApiError(PatientError::validation(INVALID_JSON))
    })
}

fn update_response(outcome: UpdateOutcome, unchanged: &str) -> Json<UpdatePatientRes> {
    match outcome {
        UpdateOutcome::Updated(record) => Json(UpdatePatientRes::Updated(record)),
        UpdateOutcome::Unchanged => Json(UpdatePatientRes::Unchanged(MessageRes::new(unchanged))),
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Welcome message", body = MessageRes)
    )
)]
async fn index() -> Json<MessageRes> {
    Json(MessageRes::new(WELCOME))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patient records", body = Vec<PatientRecord>),
        (status = 500, description = "Internal server error", body = MessageRes)
    )
)]
/// List all patients in the system
///
/// # Errors
/// Returns `500 Internal Server Error` if the database cannot be read.
async fn list_patients(State(state): State<AppState>) -> ApiResult<Json<Vec<PatientRecord>>> {
    Ok(Json(state.service.list()?))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient admitted", body = PatientRecord),
        (status = 400, description = "Validation failure", body = MessageRes),
        (status = 500, description = "Internal server error", body = MessageRes)
    )
)]
/// Admit a new patient
///
/// The body is validated field by field (name, gender, age, ward/room, doctor) and the first
/// failure is returned as a `400` with its message. On success the full stored record is
/// returned with a server-assigned `id` and `checkin`.
async fn create_patient(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<PatientRecord>)> {
    let body = json_body(&body)?;
    let record = state.service.create(&body)?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    search_name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/patients/search",
    params(
        ("search_name" = String, Query, description = "Case-insensitive name substring")
    ),
    responses(
        (status = 200, description = "Matching patient records", body = Vec<PatientRecord>),
        (status = 400, description = "Missing search term", body = MessageRes),
        (status = 404, description = "No patient matched", body = MessageRes)
    )
)]
async fn search_patients(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<PatientRecord>>> {
    Ok(Json(state.service.search(params.search_name.as_deref())?))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient record", body = PatientRecord),
        (status = 404, description = "Patient not found", body = MessageRes)
    )
)]
async fn get_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<PatientRecord>> {
    Ok(Json(state.service.get(&id)?))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Updated record, or a message if nothing changed", body = UpdatePatientRes),
        (status = 400, description = "Validation failure", body = MessageRes),
        (status = 404, description = "Patient not found", body = MessageRes)
    )
)]
/// Partially update a patient
///
/// Only `name`, `age`, `gender`, `ward` and `room` are considered; other keys are ignored.
/// `ward` and `room` must be sent together.
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    body: Bytes,
) -> ApiResult<Json<UpdatePatientRes>> {
    let body = json_body(&body)?;
    let outcome = state.service.update(&id, &body)?;
    Ok(update_response(outcome, DATA_UNCHANGED))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient deleted", body = MessageRes),
        (status = 404, description = "Patient not found", body = MessageRes)
    )
)]
async fn delete_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<MessageRes>> {
    state.service.delete(&id)?;
    Ok(Json(MessageRes::new(PATIENT_DELETED)))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/room",
    params(("id" = String, Path, description = "Patient id")),
    request_body = SetRoomReq,
    responses(
        (status = 200, description = "Updated record, or a message if the room is unchanged", body = UpdatePatientRes),
        (status = 400, description = "Validation failure", body = MessageRes),
        (status = 404, description = "Patient not found", body = MessageRes)
    )
)]
async fn set_room(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    body: Bytes,
) -> ApiResult<Json<UpdatePatientRes>> {
    let body = json_body(&body)?;
    let outcome = state.service.set_room(&id, &body)?;
    Ok(update_response(outcome, ROOM_UNCHANGED))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/checkout",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Checkout recorded", body = CheckoutRes),
        (status = 404, description = "Patient not found", body = MessageRes)
    )
)]
/// Check a patient out
///
/// Always stamps the current time, even if the patient was already checked out.
async fn checkout_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<CheckoutRes>> {
    let checkout_time = state.service.checkout(&id)?;
    Ok(Json(CheckoutRes {
        message: PATIENT_CHECKED_OUT.into(),
        checkout_time: render_timestamp(checkout_time),
    }))
}
