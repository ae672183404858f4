//! Session configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::error::PdfSplitError;
use crate::sections::SectionMode;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// What a delete on a slot removes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteGranularity {
    /// Only the slot itself; other copies of the page stay
    #[default]
    Slot,
    /// Every slot showing the same source page
    Logical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Output files are named `{filename_prefix}{n}.pdf`
    pub filename_prefix: String,
    /// PDF version written into exported documents
    pub pdf_version: String,
    /// Compress streams of exported documents
    pub compress_output: bool,
    pub delete_granularity: DeleteGranularity,
    /// Start new sessions in interval mode with this chunk size
    pub default_interval: Option<usize>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            filename_prefix: "split_".to_string(),
            pdf_version: "1.7".to_string(),
            compress_output: true,
            delete_granularity: DeleteGranularity::Slot,
            default_interval: None,
        }
    }
}

impl SplitConfig {
    pub fn from_json(json: &str) -> Result<Self, PdfSplitError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PdfSplitError::SerializationError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, PdfSplitError> {
        serde_json::to_string(self).map_err(|e| PdfSplitError::SerializationError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), PdfSplitError> {
        if self.filename_prefix.is_empty() {
            return Err(PdfSplitError::InvalidRange(
                "Filename prefix must not be empty".into(),
            ));
        }
        if self.default_interval == Some(0) {
            return Err(PdfSplitError::InvalidRange(
                "Interval must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Section mode a fresh session starts in
    pub fn initial_mode(&self) -> SectionMode {
        self.default_interval
            .and_then(NonZeroUsize::new)
            .map_or(SectionMode::Manual, SectionMode::Interval)
    }

    /// Name of the `number`-th exported file (1-based)
    pub fn filename_for(&self, number: usize) -> String {
        format!("{}{}.pdf", self.filename_prefix, number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filename() {
        let config = SplitConfig::default();
        assert_eq!(config.filename_for(1), "split_1.pdf");
        assert_eq!(config.filename_for(12), "split_12.pdf");
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = SplitConfig::from_json("{}").unwrap();
        assert_eq!(config, SplitConfig::default());
        assert_eq!(config.initial_mode(), SectionMode::Manual);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = SplitConfig::from_json(
            r#"{"filename_prefix":"part-","delete_granularity":"logical","default_interval":3}"#,
        )
        .unwrap();
        assert_eq!(config.filename_for(2), "part-2.pdf");
        assert_eq!(config.delete_granularity, DeleteGranularity::Logical);
        assert!(config.compress_output);
        assert_eq!(
            config.initial_mode(),
            SectionMode::Interval(NonZeroUsize::new(3).unwrap())
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = SplitConfig::from_json(r#"{"default_interval":0}"#);
        assert!(matches!(result, Err(PdfSplitError::InvalidRange(_))));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let result = SplitConfig::from_json(r#"{"filename_prefix":""}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = SplitConfig::from_json("{not json");
        assert!(matches!(result, Err(PdfSplitError::SerializationError(_))));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = SplitConfig {
            compress_output: false,
            ..SplitConfig::default()
        };
        let restored = SplitConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored, config);
    }
}
