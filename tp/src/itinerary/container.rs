//! Move source and destination identifiers

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Either a candidate list or a day of the itinerary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerId {
    List(String),
    Day(NaiveDate),
}

impl ContainerId {
    pub fn list(id: impl Into<String>) -> Self {
        Self::List(id.into())
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(id) => write!(f, "list:{}", id),
            Self::Day(date) => write!(f, "{}", date),
        }
    }
}

impl FromStr for ContainerId {
    type Err = String;

    /// `YYYY-MM-DD` is a day; anything else is a list, with an optional
    /// `list:` prefix for list IDs that happen to look like dates
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Container ID must not be empty".to_string());
        }
        if let Some(list) = s.strip_prefix("list:") {
            if list.is_empty() {
                return Err("List ID must not be empty".to_string());
            }
            return Ok(Self::List(list.to_string()));
        }
        match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Ok(Self::Day(date)),
            Err(_) => Ok(Self::List(s.to_string())),
        }
    }
}
