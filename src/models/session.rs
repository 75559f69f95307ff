use super::break_interval::{BreakInterval, BreakReason};
use super::location::WorkLocation;
use crate::errors::{SessionError, SessionResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persisted status of a session (⇔ sessions.status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Break,
    Completed,
}

impl SessionStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Break => "break",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SessionStatus::Active),
            "break" => Some(SessionStatus::Break),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, SessionStatus::Active | SessionStatus::Break)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Active => "active",
            SessionStatus::Break => "on break",
            SessionStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// What the user sees: a session status, or no session at all today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimerStatus {
    NotStarted,
    Active,
    Break,
    Completed,
}

impl From<SessionStatus> for TimerStatus {
    fn from(s: SessionStatus) -> Self {
        match s {
            SessionStatus::Active => TimerStatus::Active,
            SessionStatus::Break => TimerStatus::Break,
            SessionStatus::Completed => TimerStatus::Completed,
        }
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerStatus::NotStarted => f.write_str("not started"),
            TimerStatus::Active => fmt::Display::fmt(&SessionStatus::Active, f),
            TimerStatus::Break => fmt::Display::fmt(&SessionStatus::Break, f),
            TimerStatus::Completed => fmt::Display::fmt(&SessionStatus::Completed, f),
        }
    }
}

impl TimerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, TimerStatus::Active | TimerStatus::Break)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimerStatus::NotStarted => "Ready to Start",
            TimerStatus::Active => "Working",
            TimerStatus::Break => "On Break",
            TimerStatus::Completed => "Completed",
        }
    }
}

/// One tracked work period of a user on a calendar day (⇔ one row of `sessions`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub user_id: String,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub breaks: Vec<BreakInterval>,
    pub total_break_seconds: i64,
    pub work_location: WorkLocation,
    pub status: SessionStatus,
}

impl Session {
    /// A fresh, not yet persisted session (`id = 0`), always `Active`.
    pub fn start(
        user_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
        work_location: WorkLocation,
    ) -> Self {
        Self {
            id: 0,
            user_id: user_id.to_string(),
            date,
            start_time: at,
            end_time: None,
            breaks: Vec::new(),
            total_break_seconds: 0,
            work_location,
            status: SessionStatus::Active,
        }
    }

    pub fn open_break(&self) -> Option<&BreakInterval> {
        self.breaks.iter().find(|b| b.is_open())
    }

    pub fn closed_breaks(&self) -> Vec<BreakInterval> {
        self.breaks.iter().filter(|b| !b.is_open()).cloned().collect()
    }

    pub fn begin_break(&mut self, at: DateTime<Utc>, reason: BreakReason) -> SessionResult<()> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::InvalidTransition {
                action: "start a break",
                status: self.status.into(),
            });
        }

        self.breaks.push(BreakInterval::open(at, reason));
        self.status = SessionStatus::Break;
        Ok(())
    }

    pub fn finish_break(&mut self, at: DateTime<Utc>) -> SessionResult<()> {
        let invalid = SessionError::InvalidTransition {
            action: "end a break",
            status: self.status.into(),
        };
        if self.status != SessionStatus::Break {
            return Err(invalid);
        }

        let open = self.breaks.iter_mut().find(|b| b.is_open()).ok_or(invalid)?;
        open.close(at);
        self.recompute_break_total();
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// Clock out. An open break is closed first, at the same instant.
    pub fn complete(&mut self, at: DateTime<Utc>) -> SessionResult<()> {
        if !self.status.is_in_progress() {
            return Err(SessionError::NoActiveSession);
        }

        if self.status == SessionStatus::Break {
            self.finish_break(at)?;
        }

        self.end_time = Some(at);
        self.status = SessionStatus::Completed;
        Ok(())
    }

    /// Sum of closed break durations. Never trusts the stored running total.
    pub fn recompute_break_total(&mut self) {
        self.total_break_seconds = self
            .breaks
            .iter()
            .filter_map(|b| b.duration_seconds.filter(|_| !b.is_open()))
            .sum();
    }
}
