use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Channel directions, seeded into `ChannelDirection` in this order
pub const CHANNEL_DIRECTIONS: &[&str] = &["From", "To", "Inter"];

/// Static reference lists seeded once at schema creation.
///
/// Loaded from a JSON document such as
/// `{"partitions": ["P1"], "equipments": ["FCU"], "modules": ["CPM1"]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    pub partitions: Vec<String>,
    pub equipments: Vec<String>,
    pub modules: Vec<String>,
}

impl ReferenceData {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference data: {:?}", path))?;
        Self::from_json(&text).with_context(|| format!("Invalid reference data in {:?}", path))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let data: ReferenceData =
            serde_json::from_str(text).context("Failed to parse reference JSON")?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_lists_default_to_empty() {
        let data = ReferenceData::from_json(r#"{"partitions": ["P1", "P2"]}"#).unwrap();
        assert_eq!(data.partitions, vec!["P1", "P2"]);
        assert!(data.equipments.is_empty());
        assert!(data.modules.is_empty());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(ReferenceData::from_json("{partitions: }").is_err());
    }
}
