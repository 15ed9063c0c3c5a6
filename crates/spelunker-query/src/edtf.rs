use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Sentinel written for dates nobody knows
pub const UNKNOWN: &str = "uuuu";

/// Sentinel written for open-ended spans
pub const OPEN: &str = "..";

/// An EDTF-encoded inception or cessation date.
///
/// Only the "unknown" and "open" markers are interpreted; every other value
/// is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EdtfDate {
    Known(String),
    Open,
    #[default]
    Unknown,
}

impl EdtfDate {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "u" | "uuuu" | "unknown" => EdtfDate::Unknown,
            ".." | "open" => EdtfDate::Open,
            other => EdtfDate::Known(other.to_string()),
        }
    }

    /// Absent values are unknown
    pub fn from_optional(value: Option<&str>) -> Self {
        value.map(EdtfDate::parse).unwrap_or(EdtfDate::Unknown)
    }

    pub fn as_str(&self) -> &str {
        match self {
            EdtfDate::Known(v) => v,
            EdtfDate::Open => OPEN,
            EdtfDate::Unknown => UNKNOWN,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, EdtfDate::Unknown)
    }
}

impl fmt::Display for EdtfDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EdtfDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EdtfDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(EdtfDate::parse(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(EdtfDate::parse("uuuu"), EdtfDate::Unknown);
        assert_eq!(EdtfDate::parse(""), EdtfDate::Unknown);
        assert_eq!(EdtfDate::parse(".."), EdtfDate::Open);
        assert_eq!(
            EdtfDate::parse("2004-07-01"),
            EdtfDate::Known("2004-07-01".to_string())
        );
        assert_eq!(EdtfDate::from_optional(None).as_str(), UNKNOWN);
    }
}
