use crate::error::{Result, SpelunkerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placetypes recognised by the gazetteer
pub const PLACETYPES: &[&str] = &[
    "planet",
    "continent",
    "ocean",
    "empire",
    "country",
    "dependency",
    "disputed",
    "marinearea",
    "macroregion",
    "region",
    "macrocounty",
    "county",
    "metroarea",
    "localadmin",
    "locality",
    "postalregion",
    "borough",
    "macrohood",
    "neighbourhood",
    "microhood",
    "campus",
    "building",
    "wing",
    "concourse",
    "arcade",
    "enclosure",
    "installation",
    "venue",
    "address",
    "intersection",
    "postalcode",
    "timezone",
    "marketarea",
    "custom",
];

pub fn is_valid_placetype(name: &str) -> bool {
    PLACETYPES.contains(&name)
}

/// A validated placetype name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Placetype(String);

impl Placetype {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_lowercase();

        if !is_valid_placetype(&name) {
            return Err(SpelunkerError::invalid_input(format!(
                "Invalid placetype '{}'",
                name
            )));
        }

        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl FromStr for Placetype {
    type Err = SpelunkerError;

    fn from_str(s: &str) -> Result<Self> {
        Placetype::new(s)
    }
}

impl TryFrom<String> for Placetype {
    type Error = SpelunkerError;

    fn try_from(value: String) -> Result<Self> {
        Placetype::new(value)
    }
}

impl From<Placetype> for String {
    fn from(pt: Placetype) -> Self {
        pt.0
    }
}

impl fmt::Display for Placetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placetype_validation() {
        assert_eq!(Placetype::new("Locality").unwrap().name(), "locality");
        assert!(Placetype::new("village").is_err());
        assert!("".parse::<Placetype>().is_err());
    }
}
