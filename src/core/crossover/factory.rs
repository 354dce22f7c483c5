// Factory for creating support threshold policies

use super::*;
use std::collections::HashMap;

pub struct SupportThresholdFactory;

impl SupportThresholdFactory {
    /// Create a threshold policy by name and configuration string
    pub fn create(threshold_type: &str, config: &str) -> Result<Box<dyn SupportThreshold>, String> {
        match threshold_type {
            "edge-relaxed" => {
                EdgeRelaxedThreshold::validate_config(config)?;
                Ok(Box::new(EdgeRelaxedThreshold::new(config)?))
            }
            "fixed" => {
                FixedThreshold::validate_config(config)?;
                Ok(Box::new(FixedThreshold::new(config)?))
            }
            _ => Err(format!(
                "Unknown support threshold: {}. Available: {}",
                threshold_type,
                Self::list_available()
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }

    /// List all available threshold policies
    pub fn list_available() -> Vec<(&'static str, &'static str)> {
        vec![
            ("edge-relaxed", "Support 2 near chromosome ends, 5 in the interior (params: edge, edge_support, support)"),
            ("fixed", "Constant support (params: support)"),
        ]
    }

    /// Parse configuration string into HashMap
    pub fn parse_config(config_str: &str) -> HashMap<String, String> {
        let mut config = HashMap::new();

        if config_str.is_empty() {
            return config;
        }

        for pair in config_str.split(',') {
            let parts: Vec<&str> = pair.split('=').collect();
            if parts.len() == 2 {
                config.insert(parts[0].trim().to_string(), parts[1].trim().to_string());
            }
        }

        config
    }
}
