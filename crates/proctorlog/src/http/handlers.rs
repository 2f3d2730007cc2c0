//! Route handlers.
//!
//! Each handler is a thin mapping from request parameters to one
//! [`RecordStore`] call. Store work runs on the blocking pool since backends do
//! synchronous file or database I/O.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use crate::error::{Error, Result};
use crate::record::{ProctoringLog, RiskScore, Student};
use crate::storage::RecordStore;

use super::error::ApiError;
use super::extract::{JsonBody, QueryParams};
use super::models::{
    EmailQuery, FlagEventQuery, FlagEventResponse, GenericResponse, LoginResponse, LogsResponse,
    RegisterResponse, ReviewDecisionResponse, ReviewQuery, StartExamResponse, StudentsResponse,
};
use super::AppState;

/// Run `f` against the store on the blocking thread pool.
async fn with_store<T, F>(state: &AppState, f: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce(&dyn RecordStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store: Arc<dyn RecordStore> = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| ApiError::internal(format!("store task failed: {e}")))?
        .map_err(ApiError::from)
}

/// `GET /health`
pub async fn health_checker() -> impl IntoResponse {
    Json(GenericResponse {
        status: "success".to_string(),
        message: "proctorlog is running".to_string(),
    })
}

/// `POST /register`
pub async fn register_student(
    State(state): State<AppState>,
    JsonBody(student): JsonBody<Student>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let total_students = with_store(&state, move |store| store.register_student(student)).await?;
    info!("Registered student, {} total", total_students);

    Ok(Json(RegisterResponse {
        message: "Student registered successfully".to_string(),
        total_students,
    }))
}

/// `POST /login`
pub async fn login_student(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<EmailQuery>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let student = with_store(&state, move |store| {
        store
            .find_student(&query.email)?
            .ok_or_else(|| Error::student_not_found(query.email))
    })
    .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        role: student.role.clone(),
        student,
    }))
}

/// `GET /students`
pub async fn list_students(
    State(state): State<AppState>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let students = with_store(&state, |store| store.students()).await?;

    Ok(Json(StudentsResponse {
        total_students: students.len(),
        students,
    }))
}

/// `POST /start_exam`
///
/// Only checks that the student exists. No session is created.
pub async fn start_exam(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<EmailQuery>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let student = with_store(&state, move |store| {
        store
            .find_student(&query.email)?
            .ok_or_else(|| Error::student_not_found(query.email))
    })
    .await?;
    info!("Exam started for {}", student.email);

    Ok(Json(StartExamResponse {
        message: "Exam started".to_string(),
        student: student.email,
        status: "monitoring".to_string(),
    }))
}

/// `POST /flag_event`
pub async fn flag_event(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<FlagEventQuery>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let log = ProctoringLog::new(query.email, query.event);
    let stored = log.clone();
    let total = with_store(&state, move |store| store.flag_event(stored)).await?;
    info!("Flagged '{}' for {} ({} events total)", log.event, log.email, total);

    Ok(Json(FlagEventResponse {
        message: "Event flagged".to_string(),
        log,
    }))
}

/// `GET /proctoring_logs`
pub async fn list_logs(
    State(state): State<AppState>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let logs = with_store(&state, |store| store.logs()).await?;

    Ok(Json(LogsResponse {
        total_events: logs.len(),
        logs,
    }))
}

/// `GET /risk_score`
pub async fn risk_score(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<EmailQuery>,
) -> std::result::Result<Json<RiskScore>, ApiError> {
    let score = with_store(&state, move |store| store.risk_score(&query.email)).await?;
    Ok(Json(score))
}

/// `POST /review_decision`
///
/// Echo only: nothing is read or written.
pub async fn review_decision(QueryParams(query): QueryParams<ReviewQuery>) -> impl IntoResponse {
    Json(ReviewDecisionResponse {
        email: query.email,
        final_decision: query.decision,
        reviewed_by: "faculty".to_string(),
    })
}
