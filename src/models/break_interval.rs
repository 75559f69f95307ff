use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakReason {
    Lunch,
    Coffee,
    Personal,
    Meeting,
    Restroom,
    Other,
}

impl BreakReason {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BreakReason::Lunch => "lunch",
            BreakReason::Coffee => "coffee",
            BreakReason::Personal => "personal",
            BreakReason::Meeting => "meeting",
            BreakReason::Restroom => "restroom",
            BreakReason::Other => "other",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "lunch" => Some(BreakReason::Lunch),
            "coffee" => Some(BreakReason::Coffee),
            "personal" => Some(BreakReason::Personal),
            "meeting" => Some(BreakReason::Meeting),
            "restroom" => Some(BreakReason::Restroom),
            "other" | "general" => Some(BreakReason::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BreakReason::Lunch => "Lunch Break",
            BreakReason::Coffee => "Coffee Break",
            BreakReason::Personal => "Personal Break",
            BreakReason::Meeting => "Meeting",
            BreakReason::Restroom => "Restroom",
            BreakReason::Other => "Break",
        }
    }
}

impl fmt::Display for BreakReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// A pause inside a session. `end_time == None` means the break is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakInterval {
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub reason: BreakReason,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
}

impl BreakInterval {
    pub fn open(start_time: DateTime<Utc>, reason: BreakReason) -> Self {
        Self {
            start_time,
            end_time: None,
            reason,
            duration_seconds: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Close the interval at `at`. Whole seconds, never negative.
    pub fn close(&mut self, at: DateTime<Utc>) {
        let secs = (at - self.start_time).num_milliseconds().max(0) / 1000;
        self.end_time = Some(at);
        self.duration_seconds = Some(secs);
    }

    /// Seconds elapsed in the interval so far (closed duration, or time since start if open).
    pub fn seconds_until(&self, now: DateTime<Utc>) -> i64 {
        match self.duration_seconds {
            Some(d) if !self.is_open() => d,
            _ => (now - self.start_time).num_milliseconds().max(0) / 1000,
        }
    }
}
