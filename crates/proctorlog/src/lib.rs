//! `proctorlog` - An exam-proctoring record service
//!
//! This library provides the record store for registered students and flagged
//! exam events, risk scoring over those events, and the HTTP/JSON API that
//! exposes them.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod record;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use http::{build_router, AppState};
pub use logging::init_logging;
pub use record::{ProctoringLog, RiskLevel, RiskScore, Student};
pub use storage::{RecordStore, StoreStats};
