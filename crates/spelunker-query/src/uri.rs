//! Record identity and the content-addressed paths derived from it.

use crate::error::{Result, SpelunkerError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one of several alternate geometries stored for the same record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AltGeom {
    pub source: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub extras: Vec<String>,
}

impl AltGeom {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            function: String::new(),
            extras: Vec::new(),
        }
    }

    /// Parse a label such as `quattroshapes` or `naturalearth-display-terminal`
    pub fn from_label(label: &str) -> Result<Self> {
        let mut parts = label.split('-').filter(|p| !p.is_empty());

        let source = parts.next().ok_or_else(|| {
            SpelunkerError::invalid_input(format!("Invalid alternate geometry label '{}'", label))
        })?;

        Ok(Self {
            source: source.to_string(),
            function: parts.next().unwrap_or_default().to_string(),
            extras: parts.map(str::to_string).collect(),
        })
    }

    pub fn label(&self) -> String {
        let mut parts = vec![self.source.as_str()];

        if !self.function.is_empty() {
            parts.push(&self.function);
        }

        parts.extend(self.extras.iter().map(String::as_str));
        parts.join("-")
    }
}

impl fmt::Display for AltGeom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Extra arguments qualifying a record id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriArgs {
    pub alternate: Option<AltGeom>,
}

impl UriArgs {
    pub fn alternate(alt: AltGeom) -> Self {
        Self {
            alternate: Some(alt),
        }
    }

    pub fn is_alternate(&self) -> bool {
        self.alternate.is_some()
    }

    pub fn alt_label(&self) -> Option<String> {
        self.alternate.as_ref().map(AltGeom::label)
    }
}

/// Directory tree for an id: `1327010993` becomes `132/701/099/3`
pub fn id_to_tree(id: i64) -> Result<String> {
    if id < 0 {
        return Err(SpelunkerError::invalid_input(format!(
            "Invalid record id {}",
            id
        )));
    }

    let digits = id.to_string();
    let chunks: Vec<&str> = digits
        .as_bytes()
        .chunks(3)
        .filter_map(|c| std::str::from_utf8(c).ok())
        .collect();

    Ok(chunks.join("/"))
}

/// File name for a record, with the alternate geometry label when present
pub fn id_to_filename(id: i64, args: &UriArgs) -> String {
    match args.alt_label() {
        Some(label) => format!("{}-alt-{}.geojson", id, label),
        None => format!("{}.geojson", id),
    }
}

/// Relative path of a record document, e.g. `132/701/099/3/1327010993.geojson`
pub fn id_to_rel_path(id: i64, args: &UriArgs) -> Result<String> {
    Ok(format!("{}/{}", id_to_tree(id)?, id_to_filename(id, args)))
}

/// Parse `1327010993`, `1327010993.geojson` or `1327010993-alt-quattroshapes.geojson`
pub fn parse_record_uri(uri: &str) -> Result<(i64, UriArgs)> {
    let name = uri.rsplit('/').next().unwrap_or(uri);
    let name = name.strip_suffix(".geojson").unwrap_or(name);

    let (id, args) = match name.split_once("-alt-") {
        Some((id, label)) => (id, UriArgs::alternate(AltGeom::from_label(label)?)),
        None => (name, UriArgs::default()),
    };

    let id = id
        .parse::<i64>()
        .map_err(|_| SpelunkerError::invalid_input(format!("Invalid record URI '{}'", uri)))?;

    Ok((id, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rel_path() {
        assert_eq!(
            id_to_rel_path(1327010993, &UriArgs::default()).unwrap(),
            "132/701/099/3/1327010993.geojson"
        );
        assert_eq!(
            id_to_rel_path(85633793, &UriArgs::default()).unwrap(),
            "856/337/93/85633793.geojson"
        );
        assert_eq!(id_to_rel_path(0, &UriArgs::default()).unwrap(), "0/0.geojson");
        assert!(id_to_rel_path(-1, &UriArgs::default()).is_err());
    }

    #[test]
    fn test_alternate_rel_path() {
        let args = UriArgs::alternate(AltGeom::from_label("naturalearth-display-terminal").unwrap());
        assert_eq!(
            id_to_rel_path(85633793, &args).unwrap(),
            "856/337/93/85633793-alt-naturalearth-display-terminal.geojson"
        );
    }

    #[test]
    fn test_parse_record_uri() {
        let (id, args) = parse_record_uri("101736545-alt-quattroshapes.geojson").unwrap();
        assert_eq!(id, 101736545);
        assert_eq!(args.alt_label().as_deref(), Some("quattroshapes"));

        let (id, args) = parse_record_uri("101/736/545/101736545.geojson").unwrap();
        assert_eq!(id, 101736545);
        assert!(!args.is_alternate());

        assert!(parse_record_uri("montreal").is_err());
    }
}
