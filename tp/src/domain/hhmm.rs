//! `HH:MM` time-of-day format
//!
//! Use as `#[serde(default, with = "crate::domain::hhmm")]` on
//! `Option<NaiveTime>` fields; `None` is written as an explicit `null`.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serializer};

const FORMAT: &str = "%H:%M";

/// Parse `HH:MM`; seconds are accepted and dropped
pub fn parse(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
        .map(truncate)
}

/// Drop everything below whole minutes, the precision that is persisted
pub fn truncate(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

pub fn format(time: &NaiveTime) -> String {
    time.format(FORMAT).to_string()
}

pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(time) => serializer.serialize_str(&format(time)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}', expected HH:MM", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Stop {
        #[serde(default, with = "super")]
        at: Option<NaiveTime>,
    }

    #[test]
    fn test_parse_and_format() {
        let t = parse("09:05").unwrap();
        assert_eq!(format(&t), "09:05");
        assert_eq!(parse(" 18:30:15 "), NaiveTime::from_hms_opt(18, 30, 0));
        assert!(parse("25:00").is_none());
        assert!(parse("noon").is_none());
    }

    #[test]
    fn test_truncate_drops_seconds_and_fractions() {
        let t = NaiveTime::from_hms_milli_opt(9, 0, 50, 250).unwrap();
        assert_eq!(truncate(t), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(parse(&format(&truncate(t))), Some(truncate(t)));
    }

    #[test]
    fn test_serde_option() {
        let stop = Stop {
            at: NaiveTime::from_hms_opt(7, 45, 0),
        };
        assert_eq!(serde_json::to_string(&stop).unwrap(), r#"{"at":"07:45"}"#);
        assert_eq!(serde_json::to_string(&Stop { at: None }).unwrap(), r#"{"at":null}"#);

        let back: Stop = serde_json::from_str(r#"{"at":"07:45"}"#).unwrap();
        assert_eq!(back, stop);
        let empty: Stop = serde_json::from_str(r#"{"at":""}"#).unwrap();
        assert_eq!(empty.at, None);
        let missing: Stop = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.at, None);
        assert!(serde_json::from_str::<Stop>(r#"{"at":"later"}"#).is_err());
    }
}
