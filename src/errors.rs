//! Unified application error types.
//! `SessionError` is the taxonomy surfaced by the time-clock engine,
//! `AppError` wraps it together with everything else the CLI can hit.

use crate::models::session::TimerStatus;
use chrono::NaiveDate;
use std::io;
use thiserror::Error;

/// Errors returned by the session engine and the stores behind it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("A work session is already in progress for {date}")]
    AlreadyActive { date: NaiveDate },

    #[error("No active work session for today")]
    NoActiveSession,

    #[error("Cannot {action} while the session is {status}")]
    InvalidTransition {
        action: &'static str,
        status: TimerStatus,
    },

    #[error("Temporarily unable to record time: {0}")]
    StoreUnavailable(String),

    #[error("Session completed, but the attendance record was not updated: {0}")]
    ReconciliationFailed(String),

    #[error("Another time-clock operation is still in progress")]
    Busy,
}

impl SessionError {
    /// True for failures a caller may retry later without changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::StoreUnavailable(_)
                | SessionError::ReconciliationFailed(_)
                | SessionError::Busy
        )
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid work location: {0}")]
    InvalidLocation(String),

    #[error("Invalid break reason: {0}")]
    InvalidReason(String),

    #[error("Invalid attendance status: {0}")]
    InvalidStatus(String),

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    // ---------------------------
    // Time clock
    // ---------------------------
    #[error(transparent)]
    Session(#[from] SessionError),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),
}

pub type AppResult<T> = Result<T, AppError>;
