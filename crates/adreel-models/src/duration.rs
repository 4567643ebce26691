//! Scene duration parsing.
//!
//! Script generators emit target durations in short textual forms such as
//! `5s`, `5 sec`, `7.5 seconds` or `00:05`. This module normalizes them to a
//! positive number of seconds.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Longest target duration accepted for a single scene (10 minutes).
pub const MAX_SCENE_DURATION_SECS: f64 = 600.0;

/// Unit suffixes accepted after the numeric part, longest first.
const SECOND_SUFFIXES: [&str; 5] = ["seconds", "second", "secs", "sec", "s"];

/// Duration parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DurationError {
    #[error("Duration cannot be empty")]
    Empty,

    #[error("Invalid duration value: {0}")]
    InvalidValue(String),

    #[error("Invalid duration format '{0}'. Use 5s, 5, 5 sec or MM:SS")]
    InvalidFormat(String),

    #[error("Duration must be positive, got {0}")]
    NotPositive(String),

    #[error("Duration exceeds maximum of {0} seconds")]
    ExceedsMax(f64),
}

/// Target duration of a scene, in seconds. Always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SceneDuration(f64);

impl SceneDuration {
    /// Create from a number of seconds.
    pub fn from_secs(secs: f64) -> Result<Self, DurationError> {
        if !secs.is_finite() {
            return Err(DurationError::InvalidValue(secs.to_string()));
        }
        if secs <= 0.0 {
            return Err(DurationError::NotPositive(secs.to_string()));
        }
        if secs > MAX_SCENE_DURATION_SECS {
            return Err(DurationError::ExceedsMax(MAX_SCENE_DURATION_SECS));
        }
        Ok(Self(secs))
    }

    /// Seconds as a float.
    pub fn as_secs(&self) -> f64 {
        self.0
    }

    /// As a std duration.
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs_f64(self.0)
    }
}

/// Parse a textual duration into seconds.
///
/// Supports formats:
/// - `5`, `5.5`
/// - `5s`, `5 sec`, `5 secs`, `5 second`, `5 seconds`
/// - `MM:SS` or `HH:MM:SS` (fractional seconds allowed)
///
/// # Examples
/// ```
/// use adreel_models::duration::parse_duration;
/// assert_eq!(parse_duration("5s").unwrap(), 5.0);
/// assert_eq!(parse_duration("00:07").unwrap(), 7.0);
/// ```
pub fn parse_duration(text: &str) -> Result<f64, DurationError> {
    let text = text.trim().to_ascii_lowercase();
    if text.is_empty() {
        return Err(DurationError::Empty);
    }

    if text.contains(':') {
        return parse_clock(&text);
    }

    let numeric = SECOND_SUFFIXES
        .iter()
        .find_map(|suffix| text.strip_suffix(suffix))
        .unwrap_or(&text)
        .trim();

    if numeric.is_empty() {
        return Err(DurationError::InvalidFormat(text));
    }

    numeric
        .parse::<f64>()
        .map_err(|_| DurationError::InvalidValue(numeric.to_string()))
}

fn parse_clock(text: &str) -> Result<f64, DurationError> {
    let parts: Vec<&str> = text.split(':').map(str::trim).collect();
    if parts.len() > 3 {
        return Err(DurationError::InvalidFormat(text.to_string()));
    }

    let mut total = 0.0;
    for part in &parts {
        let value: f64 = part
            .parse()
            .map_err(|_| DurationError::InvalidValue(part.to_string()))?;
        if value < 0.0 {
            return Err(DurationError::NotPositive(text.to_string()));
        }
        total = total * 60.0 + value;
    }
    Ok(total)
}

impl FromStr for SceneDuration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_secs(parse_duration(s)?)
    }
}

impl fmt::Display for SceneDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl Serialize for SceneDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SceneDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(secs) => SceneDuration::from_secs(secs),
            Raw::Text(text) => text.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_suffixes() {
        assert_eq!(parse_duration("5s").unwrap(), 5.0);
        assert_eq!(parse_duration("5").unwrap(), 5.0);
        assert_eq!(parse_duration(" 7.5 seconds ").unwrap(), 7.5);
        assert_eq!(parse_duration("3 sec").unwrap(), 3.0);
        assert_eq!(parse_duration("4 Secs").unwrap(), 4.0);
        assert_eq!(parse_duration("1 second").unwrap(), 1.0);
    }

    #[test]
    fn test_parse_duration_clock() {
        assert_eq!(parse_duration("00:05").unwrap(), 5.0);
        assert_eq!(parse_duration("01:30").unwrap(), 90.0);
        assert_eq!(parse_duration("00:01:02.5").unwrap(), 62.5);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_duration("s"), Err(DurationError::InvalidFormat(_))));
        assert!(matches!(parse_duration("five"), Err(DurationError::InvalidValue(_))));
        assert!(matches!(parse_duration("1:2:3:4"), Err(DurationError::InvalidFormat(_))));
    }

    #[test]
    fn test_scene_duration_must_be_positive() {
        assert!(matches!("0s".parse::<SceneDuration>(), Err(DurationError::NotPositive(_))));
        assert!(matches!("-2s".parse::<SceneDuration>(), Err(DurationError::NotPositive(_))));
        assert!(matches!(
            SceneDuration::from_secs(MAX_SCENE_DURATION_SECS + 1.0),
            Err(DurationError::ExceedsMax(_))
        ));
    }

    #[test]
    fn test_scene_duration_serde() {
        let d: SceneDuration = serde_json::from_str("\"5s\"").unwrap();
        assert_eq!(d.as_secs(), 5.0);
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"5s\"");

        let d: SceneDuration = serde_json::from_str("2.5").unwrap();
        assert_eq!(d.to_string(), "2.5s");
        assert_eq!(d.as_duration(), Duration::from_millis(2500));

        assert!(serde_json::from_str::<SceneDuration>("\"soon\"").is_err());
    }
}
