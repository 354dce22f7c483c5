// registry.rs - Genotype caller registry

use super::traits::GenotypeCaller;
use super::{FrequencyThresholdCaller, ProbabilisticCaller};

/// Parameters shared by the built-in callers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallerSettings {
    pub min_homo_freq: f64,
    pub no_ems_freq: f64,
    pub depth_division_threshold: f64,
}

impl Default for CallerSettings {
    fn default() -> Self {
        Self {
            min_homo_freq: 0.9,
            no_ems_freq: 0.1,
            depth_division_threshold: 1.0,
        }
    }
}

pub struct GenotypeCallerRegistry;

impl GenotypeCallerRegistry {
    /// Build a caller by registry name
    pub fn create(name: &str, settings: &CallerSettings) -> Result<Box<dyn GenotypeCaller>, String> {
        match name {
            "probabilistic" => Ok(Box::new(ProbabilisticCaller::new(
                settings.min_homo_freq,
                settings.depth_division_threshold,
            )?)),
            "frequency" => Ok(Box::new(FrequencyThresholdCaller::new(
                settings.no_ems_freq,
                settings.depth_division_threshold,
            )?)),
            _ => Err(format!(
                "Unknown genotype caller '{}'. Available: {}",
                name,
                Self::names().join(", ")
            )),
        }
    }

    pub fn list_available() -> Vec<(&'static str, &'static str)> {
        vec![
            ("probabilistic", "Homozygous/heterozygous indicator, depth floor 1200 (physical windows)"),
            ("frequency", "Alternate-ratio threshold, depth floor 10 (SNP-count windows)"),
        ]
    }

    pub fn names() -> Vec<&'static str> {
        Self::list_available().into_iter().map(|(name, _)| name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_known_callers() {
        let settings = CallerSettings::default();
        let caller = GenotypeCallerRegistry::create("probabilistic", &settings).unwrap();
        assert_eq!(caller.name(), "probabilistic");
        assert!(caller.reports_probabilities());

        let caller = GenotypeCallerRegistry::create("frequency", &settings).unwrap();
        assert_eq!(caller.name(), "frequency");
        assert!(!caller.reports_probabilities());
    }

    #[test]
    fn test_unknown_caller() {
        let err = GenotypeCallerRegistry::create("hmm", &CallerSettings::default()).unwrap_err();
        assert!(err.contains("probabilistic"));
    }

    #[test]
    fn test_invalid_settings_propagate() {
        let settings = CallerSettings { min_homo_freq: 1.5, ..CallerSettings::default() };
        assert!(GenotypeCallerRegistry::create("probabilistic", &settings).is_err());
    }
}
