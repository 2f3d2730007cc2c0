//! Core record types for proctorlog.
//!
//! This module defines the two persisted record kinds (registered students and
//! flagged proctoring events) and the risk assessment derived from them.

use serde::{Deserialize, Serialize};

/// A registered student.
///
/// Email acts as the identifier but is not unique: registering the same email
/// twice keeps both records, and lookups return the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Display name.
    pub name: String,
    /// Email address used for login and event attribution.
    pub email: String,
    /// Free-form role, e.g. `"student"` or `"faculty"`.
    pub role: String,
}

impl Student {
    /// Create a new student record.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: role.into(),
        }
    }
}

/// A suspicious occurrence flagged against an email during an exam.
///
/// The event label is opaque. Nothing checks that the email belongs to a
/// registered student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProctoringLog {
    /// Email the event is recorded against.
    pub email: String,
    /// Free-text event label, e.g. `"look_away"`.
    pub event: String,
}

impl ProctoringLog {
    /// Create a new proctoring log entry.
    #[must_use]
    pub fn new(email: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            event: event.into(),
        }
    }
}

/// Three-tier bucket derived from a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// At most one flagged event.
    Low,
    /// Two or three flagged events.
    Medium,
    /// Four or more flagged events.
    High,
}

impl RiskLevel {
    /// Bucket an event count.
    #[must_use]
    pub fn from_score(score: usize) -> Self {
        match score {
            0 | 1 => Self::Low,
            2 | 3 => Self::Medium,
            _ => Self::High,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Risk assessment for a single email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScore {
    /// The email that was scored.
    pub email: String,
    /// Number of events logged against the email.
    pub risk_score: usize,
    /// Bucketed level for `risk_score`.
    pub risk_level: RiskLevel,
}

impl RiskScore {
    /// Build the assessment for an email with the given event count.
    #[must_use]
    pub fn new(email: impl Into<String>, count: usize) -> Self {
        Self {
            email: email.into(),
            risk_score: count,
            risk_level: RiskLevel::from_score(count),
        }
    }
}
