//! Request parameters and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use crate::record::{ProctoringLog, Student};

/// `?email=`
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    /// Student email.
    pub email: String,
}

/// `?email=&event=`
#[derive(Debug, Deserialize)]
pub struct FlagEventQuery {
    /// Email the event is recorded against.
    pub email: String,
    /// Free-text event label.
    pub event: String,
}

/// `?email=&decision=`
#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    /// Reviewed student's email.
    pub email: String,
    /// Free-text decision.
    pub decision: String,
}

/// Liveness check body.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenericResponse {
    /// `"success"` or `"error"`.
    pub status: String,
    /// Human-readable message.
    pub message: String,
}

/// `POST /register`
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Confirmation message.
    pub message: String,
    /// Students registered so far, duplicates included.
    pub total_students: usize,
}

/// `POST /login`
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Confirmation message.
    pub message: String,
    /// Role of the matched student.
    pub role: String,
    /// The full matched record.
    pub student: Student,
}

/// `GET /students`
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentsResponse {
    /// Number of students.
    pub total_students: usize,
    /// All students in registration order.
    pub students: Vec<Student>,
}

/// `POST /start_exam`
#[derive(Debug, Serialize, Deserialize)]
pub struct StartExamResponse {
    /// Confirmation message.
    pub message: String,
    /// Email of the student starting the exam.
    pub student: String,
    /// Always `"monitoring"`.
    pub status: String,
}

/// `POST /flag_event`
#[derive(Debug, Serialize, Deserialize)]
pub struct FlagEventResponse {
    /// Confirmation message.
    pub message: String,
    /// The stored log entry.
    pub log: ProctoringLog,
}

/// `GET /proctoring_logs`
#[derive(Debug, Serialize, Deserialize)]
pub struct LogsResponse {
    /// Number of flagged events.
    pub total_events: usize,
    /// All events in submission order.
    pub logs: Vec<ProctoringLog>,
}

/// `POST /review_decision`
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewDecisionResponse {
    /// Reviewed student's email.
    pub email: String,
    /// The decision, echoed verbatim.
    pub final_decision: String,
    /// Always `"faculty"`.
    pub reviewed_by: String,
}
