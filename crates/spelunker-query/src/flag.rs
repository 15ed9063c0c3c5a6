use crate::error::{Result, SpelunkerError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Tri-state existential flag (current, ceased, deprecated, superseded...)
///
/// Encoded as `1` (true), `0` (false) and `-1` (unknown) everywhere: in
/// storage columns, in indexed documents and in request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExistentialFlag {
    True,
    False,
    #[default]
    Unknown,
}

impl ExistentialFlag {
    pub fn from_i64(value: i64) -> Result<Self> {
        match value {
            1 => Ok(ExistentialFlag::True),
            0 => Ok(ExistentialFlag::False),
            -1 => Ok(ExistentialFlag::Unknown),
            other => Err(SpelunkerError::invalid_input(format!(
                "Invalid existential flag value '{}', expected -1, 0 or 1",
                other
            ))),
        }
    }

    /// Lenient conversion for stored values. Anything outside {-1,0,1} is unknown.
    pub fn from_stored(value: Option<i64>) -> Self {
        value
            .and_then(|v| Self::from_i64(v).ok())
            .unwrap_or(ExistentialFlag::Unknown)
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            ExistentialFlag::True => 1,
            ExistentialFlag::False => 0,
            ExistentialFlag::Unknown => -1,
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, ExistentialFlag::True)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ExistentialFlag::Unknown)
    }
}

impl From<bool> for ExistentialFlag {
    fn from(value: bool) -> Self {
        if value {
            ExistentialFlag::True
        } else {
            ExistentialFlag::False
        }
    }
}

impl FromStr for ExistentialFlag {
    type Err = SpelunkerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1" => Ok(ExistentialFlag::True),
            "0" => Ok(ExistentialFlag::False),
            "-1" => Ok(ExistentialFlag::Unknown),
            other => Err(SpelunkerError::invalid_input(format!(
                "Invalid existential flag value '{}', expected -1, 0 or 1",
                other
            ))),
        }
    }
}

impl fmt::Display for ExistentialFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

impl Serialize for ExistentialFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

impl<'de> Deserialize<'de> for ExistentialFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        ExistentialFlag::from_i64(value).map_err(serde::de::Error::custom)
    }
}
