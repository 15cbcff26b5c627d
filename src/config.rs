use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How a program image is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Fifty whitespace-separated decimal values.
    #[default]
    Text,
    /// A JSON array of fifty values.
    Json,
}

/// Configuration for a program run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum steps before giving up on a program that does not halt.
    pub step_limit: usize,
    /// Values fed into INP, one per step that reads it.
    pub inputs: Vec<i32>,
    /// Format for emitted program images.
    pub format: ImageFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            step_limit: 1000,
            inputs: Vec::new(),
            format: ImageFormat::Text,
        }
    }
}

impl RunConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.step_limit, 1000);
        assert!(config.inputs.is_empty());
        assert_eq!(config.format, ImageFormat::Text);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RunConfig = serde_json::from_str(r#"{"inputs": [3, 9]}"#).unwrap();
        assert_eq!(config.inputs, vec![3, 9]);
        assert_eq!(config.step_limit, 1000);
    }

    #[test]
    fn test_format_names() {
        let config: RunConfig =
            serde_json::from_str(r#"{"format": "json", "step_limit": 5}"#).unwrap();
        assert_eq!(config.format, ImageFormat::Json);
        assert_eq!(config.step_limit, 5);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RunConfig::load(Path::new("/nonexistent/movcpu.json")).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
