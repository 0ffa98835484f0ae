//! Configuration for the document and tree facades

use serde::{Deserialize, Serialize};

/// Buffered events per observer channel before a slow subscriber lags
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Upper bound for observer channel capacity
const MAX_EVENT_CHANNEL_CAPACITY: usize = 65_536;

/// How `Update` operations are written to the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Replace the full document contents
    #[default]
    Overwrite,

    /// Merge the encoded fields into the stored document
    Merge,
}

/// Facade configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Fail writes with `ParseError` when a model cannot be encoded.
    /// When false, an unencodable model is written as an empty mapping.
    pub strict_encoding: bool,

    /// Write semantics for document-store updates
    pub document_update_mode: UpdateMode,

    /// Buffer size for tree-store observer channels
    pub event_channel_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            strict_encoding: true,
            document_update_mode: UpdateMode::Overwrite,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl ServiceConfig {
    /// Parse a JSON config document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let config: ServiceConfig =
            serde_json::from_str(json).map_err(|e| format!("invalid service config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.event_channel_capacity == 0 {
            return Err("event_channel_capacity must be greater than 0".to_string());
        }

        if self.event_channel_capacity > MAX_EVENT_CHANNEL_CAPACITY {
            return Err(format!(
                "event_channel_capacity cannot exceed {}",
                MAX_EVENT_CHANNEL_CAPACITY
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert!(config.strict_encoding);
        assert_eq!(config.document_update_mode, UpdateMode::Overwrite);
        assert_eq!(config.event_channel_capacity, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServiceConfig::default();

        config.event_channel_capacity = 0;
        assert!(config.validate().is_err());

        config.event_channel_capacity = MAX_EVENT_CHANNEL_CAPACITY + 1;
        assert!(config.validate().is_err());

        config.event_channel_capacity = 16;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = ServiceConfig::from_json_str(r#"{ "document_update_mode": "merge" }"#).unwrap();
        assert_eq!(config.document_update_mode, UpdateMode::Merge);
        assert!(config.strict_encoding);
        assert_eq!(config.event_channel_capacity, DEFAULT_EVENT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(ServiceConfig::from_json_str(r#"{ "event_channel_capacity": 0 }"#).is_err());
        assert!(ServiceConfig::from_json_str("not json").is_err());
    }
}
