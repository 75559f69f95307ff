use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the employee is working from. Fixed once a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkLocation {
    Office,
    Home,
    ClientSite,
    CoWorking,
    Other,
}

impl WorkLocation {
    pub const ALL: [WorkLocation; 5] = [
        WorkLocation::Office,
        WorkLocation::Home,
        WorkLocation::ClientSite,
        WorkLocation::CoWorking,
        WorkLocation::Other,
    ];

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkLocation::Office => "office",
            WorkLocation::Home => "home",
            WorkLocation::ClientSite => "client-site",
            WorkLocation::CoWorking => "co-working",
            WorkLocation::Other => "other",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "office" => Some(WorkLocation::Office),
            "home" => Some(WorkLocation::Home),
            "client-site" => Some(WorkLocation::ClientSite),
            "co-working" => Some(WorkLocation::CoWorking),
            "other" => Some(WorkLocation::Other),
            _ => None,
        }
    }

    /// Helper: accepts CLI input in any case, with `_` or `-` as separator.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "wfh" | "remote" => Some(WorkLocation::Home),
            "client" | "customer" => Some(WorkLocation::ClientSite),
            "coworking" => Some(WorkLocation::CoWorking),
            other => WorkLocation::from_db_str(other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkLocation::Office => "Office",
            WorkLocation::Home => "Work from Home",
            WorkLocation::ClientSite => "Client Site",
            WorkLocation::CoWorking => "Co-working Space",
            WorkLocation::Other => "Other Location",
        }
    }
}

impl fmt::Display for WorkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_accept_aliases_and_separators() {
        assert_eq!(WorkLocation::from_code("Client_Site"), Some(WorkLocation::ClientSite));
        assert_eq!(WorkLocation::from_code(" WFH "), Some(WorkLocation::Home));
        assert_eq!(WorkLocation::from_code("coworking"), Some(WorkLocation::CoWorking));
        assert_eq!(WorkLocation::from_code("beach"), None);
    }

    #[test]
    fn every_location_has_a_db_code() {
        for loc in WorkLocation::ALL {
            assert_eq!(WorkLocation::from_db_str(loc.to_db_str()), Some(loc));
        }
    }
}
