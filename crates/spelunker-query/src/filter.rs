use crate::error::{Result, SpelunkerError};
use crate::flag::ExistentialFlag;
use crate::placetype::Placetype;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// The closed set of filter schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterScheme {
    Placetype,
    Country,
    Tag,
    IsCurrent,
    IsDeprecated,
}

impl FilterScheme {
    pub const ALL: [FilterScheme; 5] = [
        FilterScheme::Placetype,
        FilterScheme::Country,
        FilterScheme::Tag,
        FilterScheme::IsCurrent,
        FilterScheme::IsDeprecated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterScheme::Placetype => "placetype",
            FilterScheme::Country => "country",
            FilterScheme::Tag => "tag",
            FilterScheme::IsCurrent => "iscurrent",
            FilterScheme::IsDeprecated => "isdeprecated",
        }
    }
}

impl FromStr for FilterScheme {
    type Err = SpelunkerError;

    fn from_str(s: &str) -> Result<Self> {
        FilterScheme::ALL
            .into_iter()
            .find(|scheme| scheme.as_str() == s)
            .ok_or_else(|| {
                SpelunkerError::invalid_input(format!("Invalid or unsupported filter scheme '{}'", s))
            })
    }
}

impl fmt::Display for FilterScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narrows results to records where a property equals a value.
///
/// Filters passed together are combined with logical AND.
///
/// Each filter has a string encoding:
///
/// - `placetype://{placetype}`
/// - `country://{code}`
/// - `tag://{tag}`
/// - `iscurrent://?flag={-1|0|1}`
/// - `isdeprecated://?flag={-1|0|1}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    Placetype(Placetype),
    Country(String),
    Tag(String),
    IsCurrent(ExistentialFlag),
    IsDeprecated(ExistentialFlag),
}

#[derive(Deserialize)]
struct FlagQuery {
    flag: String,
}

impl Filter {
    pub fn placetype(name: &str) -> Result<Self> {
        Ok(Filter::Placetype(Placetype::new(name)?))
    }

    pub fn country(code: &str) -> Result<Self> {
        let code = code.trim();

        if code.is_empty() {
            return Err(SpelunkerError::invalid_input("Empty country filter"));
        }

        Ok(Filter::Country(code.to_string()))
    }

    pub fn tag(tag: &str) -> Result<Self> {
        let tag = tag.trim();

        if tag.is_empty() {
            return Err(SpelunkerError::invalid_input("Empty tag filter"));
        }

        Ok(Filter::Tag(tag.to_string()))
    }

    pub fn scheme(&self) -> FilterScheme {
        match self {
            Filter::Placetype(_) => FilterScheme::Placetype,
            Filter::Country(_) => FilterScheme::Country,
            Filter::Tag(_) => FilterScheme::Tag,
            Filter::IsCurrent(_) => FilterScheme::IsCurrent,
            Filter::IsDeprecated(_) => FilterScheme::IsDeprecated,
        }
    }

    /// The value as it appears in a request parameter, the inverse of [`Filter::from_param`]
    pub fn value(&self) -> String {
        match self {
            Filter::Placetype(pt) => pt.name().to_string(),
            Filter::Country(code) => code.clone(),
            Filter::Tag(tag) => tag.clone(),
            Filter::IsCurrent(flag) | Filter::IsDeprecated(flag) => flag.as_i64().to_string(),
        }
    }

    /// Build a filter from a (scheme, value) pair, as received in a request parameter
    pub fn from_param(scheme: &str, value: &str) -> Result<Self> {
        match scheme.parse::<FilterScheme>()? {
            FilterScheme::Placetype => Filter::placetype(value),
            FilterScheme::Country => Filter::country(value),
            FilterScheme::Tag => Filter::tag(value),
            FilterScheme::IsCurrent => Ok(Filter::IsCurrent(value.parse()?)),
            FilterScheme::IsDeprecated => Ok(Filter::IsDeprecated(value.parse()?)),
        }
    }

    /// Decode a filter from its URI form, e.g. `placetype://locality`
    pub fn from_uri(uri: &str) -> Result<Self> {
        let (scheme, rest) = uri.split_once("://").ok_or_else(|| {
            SpelunkerError::invalid_input(format!("Invalid filter URI '{}'", uri))
        })?;

        let scheme = scheme.parse::<FilterScheme>()?;
        let (value, query) = match rest.split_once('?') {
            Some((value, query)) => (value, Some(query)),
            None => (rest, None),
        };

        match scheme {
            FilterScheme::IsCurrent | FilterScheme::IsDeprecated => {
                let query = query.ok_or_else(|| {
                    SpelunkerError::invalid_input(format!("Missing ?flag= parameter in '{}'", uri))
                })?;

                let q: FlagQuery = serde_urlencoded::from_str(query).map_err(|e| {
                    SpelunkerError::invalid_input(format!("Failed to parse query for '{}': {}", uri, e))
                })?;

                let flag = q.flag.parse::<ExistentialFlag>()?;

                Ok(match scheme {
                    FilterScheme::IsCurrent => Filter::IsCurrent(flag),
                    _ => Filter::IsDeprecated(flag),
                })
            }
            _ => {
                let value = urlencoding::decode(value).map_err(|e| {
                    SpelunkerError::invalid_input(format!("Failed to decode '{}': {}", uri, e))
                })?;

                Filter::from_param(scheme.as_str(), &value)
            }
        }
    }
}

impl FromStr for Filter {
    type Err = SpelunkerError;

    fn from_str(s: &str) -> Result<Self> {
        Filter::from_uri(s)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Placetype(pt) => write!(f, "placetype://{}", urlencoding::encode(pt.name())),
            Filter::Country(code) => write!(f, "country://{}", urlencoding::encode(code)),
            Filter::Tag(tag) => write!(f, "tag://{}", urlencoding::encode(tag)),
            Filter::IsCurrent(flag) => write!(f, "iscurrent://?flag={}", flag),
            Filter::IsDeprecated(flag) => write!(f, "isdeprecated://?flag={}", flag),
        }
    }
}
