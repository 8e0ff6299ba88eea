//! Transport modes

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the traveller gets from one stop to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportMode {
    #[default]
    Driving,
    Walking,
    Transit,
}

impl TransportMode {
    /// Value of the `mode` query parameter in directions requests
    pub fn as_api_param(&self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Transit => "transit",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Driving => write!(f, "DRIVING"),
            Self::Walking => write!(f, "WALKING"),
            Self::Transit => write!(f, "TRANSIT"),
        }
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "driving" | "drive" | "car" => Ok(Self::Driving),
            "walking" | "walk" => Ok(Self::Walking),
            "transit" => Ok(Self::Transit),
            other => Err(format!("Unknown transport mode '{}'. Expected driving, walking or transit", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_upper_case() {
        assert_eq!(serde_json::to_string(&TransportMode::Transit).unwrap(), "\"TRANSIT\"");
        let mode: TransportMode = serde_json::from_str("\"WALKING\"").unwrap();
        assert_eq!(mode, TransportMode::Walking);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("DRIVING".parse::<TransportMode>().unwrap(), TransportMode::Driving);
        assert_eq!("walk".parse::<TransportMode>().unwrap(), TransportMode::Walking);
        assert!("bicycling".parse::<TransportMode>().is_err());
    }

    #[test]
    fn test_default_is_driving() {
        assert_eq!(TransportMode::default(), TransportMode::Driving);
        assert_eq!(TransportMode::default().as_api_param(), "driving");
    }
}
