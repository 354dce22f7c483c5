// threshold.rs - Required support for confirming a genotype run

use super::factory::SupportThresholdFactory;
use crate::core::genotype::Genotype;
use std::collections::HashMap;
use std::fmt::Debug;

/// One consecutive window pair of the scan, with enough of its chromosome
/// around it to decide the required support
#[derive(Debug, Clone, Copy)]
pub struct PairContext<'a> {
    pub start_win: usize,
    pub stop_win: usize,
    pub nb_windows: usize,
    pub geno_start: Genotype,
    pub geno_stop: Genotype,
    /// Genotypes of the whole chromosome, window `i` at `i - 1`
    pub genotypes: &'a [Genotype],
}

impl PairContext<'_> {
    pub fn genotype_at(&self, window: i64) -> Option<Genotype> {
        if window < 1 {
            return None;
        }
        self.genotypes.get(window as usize - 1).copied()
    }
}

/// Trait for support threshold policies
pub trait SupportThreshold: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Number of consecutive supporting windows required at this pair
    fn required_support(&self, pair: &PairContext) -> usize;

    /// Effective parameters, for the run summary
    fn get_config(&self) -> HashMap<String, String>;

    fn validate_config(config_str: &str) -> Result<(), String>
    where
        Self: Sized;
}

fn parse_param(params: &HashMap<String, String>, key: &str, default: usize) -> Result<usize, String> {
    match params.get(key) {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| format!("Invalid value '{}' for threshold parameter '{}'", value, key)),
        None => Ok(default),
    }
}

fn reject_unknown(params: &HashMap<String, String>, known: &[&str]) -> Result<(), String> {
    for key in params.keys() {
        if !known.contains(&key.as_str()) {
            return Err(format!(
                "Unknown threshold parameter '{}'. Expected: {}",
                key,
                known.join(", ")
            ));
        }
    }
    Ok(())
}

/// Same support everywhere on the chromosome
#[derive(Debug, Clone)]
pub struct FixedThreshold {
    support: usize,
}

impl FixedThreshold {
    pub const DEFAULT_SUPPORT: usize = 5;

    pub fn new(config: &str) -> Result<Self, String> {
        let params = SupportThresholdFactory::parse_config(config);
        reject_unknown(&params, &["support"])?;
        let support = parse_param(&params, "support", Self::DEFAULT_SUPPORT)?;
        Self::with_support(support)
    }

    pub fn with_support(support: usize) -> Result<Self, String> {
        if support == 0 {
            return Err("Support threshold must be at least 1".to_string());
        }
        Ok(Self { support })
    }
}

impl Default for FixedThreshold {
    fn default() -> Self {
        Self { support: Self::DEFAULT_SUPPORT }
    }
}

impl SupportThreshold for FixedThreshold {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn description(&self) -> &'static str {
        "Constant support along the chromosome"
    }

    fn required_support(&self, _pair: &PairContext) -> usize {
        self.support
    }

    fn get_config(&self) -> HashMap<String, String> {
        HashMap::from([("support".to_string(), self.support.to_string())])
    }

    fn validate_config(config_str: &str) -> Result<(), String> {
        Self::new(config_str).map(|_| ())
    }
}

/// Lower support near chromosome ends, where fewer windows can agree.
///
/// Within `edge` windows of either end the requirement drops to
/// `edge_support`, except for two stabilized situations that keep the
/// interior `support`:
/// - at the first-edge boundary pair (`stop_win == edge + 1`) when both
///   windows carry the same called genotype;
/// - on the last-edge side, while still within `support - 1` windows of its
///   boundary, when both windows repeat the genotype of window `nb - edge`,
///   or exactly at the boundary window when the pair changes genotype away
///   from a called one.
#[derive(Debug, Clone)]
pub struct EdgeRelaxedThreshold {
    edge: usize,
    edge_support: usize,
    support: usize,
}

impl EdgeRelaxedThreshold {
    pub fn new(config: &str) -> Result<Self, String> {
        let params = SupportThresholdFactory::parse_config(config);
        reject_unknown(&params, &["edge", "edge_support", "support"])?;
        let edge = parse_param(&params, "edge", 10)?;
        let edge_support = parse_param(&params, "edge_support", 2)?;
        let support = parse_param(&params, "support", 5)?;
        if edge_support == 0 || support == 0 {
            return Err("Support thresholds must be at least 1".to_string());
        }
        if edge_support > support {
            return Err(format!(
                "Edge support ({}) cannot exceed interior support ({})",
                edge_support, support
            ));
        }
        Ok(Self { edge, edge_support, support })
    }
}

impl Default for EdgeRelaxedThreshold {
    fn default() -> Self {
        Self { edge: 10, edge_support: 2, support: 5 }
    }
}

impl SupportThreshold for EdgeRelaxedThreshold {
    fn name(&self) -> &'static str {
        "edge-relaxed"
    }

    fn description(&self) -> &'static str {
        "Support 2 within 10 windows of a chromosome end, 5 elsewhere"
    }

    fn required_support(&self, pair: &PairContext) -> usize {
        let start = pair.start_win as i64;
        let stop = pair.stop_win as i64;
        let nb = pair.nb_windows as i64;
        let edge = self.edge as i64;
        let same_called = pair.geno_start == pair.geno_stop && !pair.geno_start.is_unknown();

        if start <= edge {
            if stop == edge + 1 && same_called {
                self.support
            } else {
                self.edge_support
            }
        } else if start >= nb - edge {
            let boundary = nb - edge;
            let stable_limit = boundary + self.support as i64 - 1;
            if start <= stable_limit && same_called && pair.genotype_at(boundary) == Some(pair.geno_start) {
                self.support
            } else if start == boundary && pair.geno_start != pair.geno_stop && !pair.geno_start.is_unknown() {
                self.support
            } else {
                self.edge_support
            }
        } else {
            self.support
        }
    }

    fn get_config(&self) -> HashMap<String, String> {
        HashMap::from([
            ("edge".to_string(), self.edge.to_string()),
            ("edge_support".to_string(), self.edge_support.to_string()),
            ("support".to_string(), self.support.to_string()),
        ])
    }

    fn validate_config(config_str: &str) -> Result<(), String> {
        Self::new(config_str).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Genotype::*;

    fn context(genotypes: &[Genotype], start_win: usize) -> PairContext<'_> {
        PairContext {
            start_win,
            stop_win: start_win + 1,
            nb_windows: genotypes.len(),
            geno_start: genotypes[start_win - 1],
            geno_stop: genotypes[start_win],
            genotypes,
        }
    }

    #[test]
    fn test_fixed_threshold() {
        let genotypes = vec![HomoRef; 30];
        assert_eq!(FixedThreshold::default().required_support(&context(&genotypes, 1)), 5);
        assert_eq!(FixedThreshold::new("support=3").unwrap().required_support(&context(&genotypes, 15)), 3);
        assert!(FixedThreshold::new("support=0").is_err());
        assert!(FixedThreshold::new("support=x").is_err());
        assert!(FixedThreshold::new("edge=3").is_err());
    }

    #[test]
    fn test_edge_relaxed_regions() {
        let threshold = EdgeRelaxedThreshold::default();
        let mut genotypes = vec![HomoRef; 30];
        genotypes[15] = HomoAlt;

        assert_eq!(threshold.required_support(&context(&genotypes, 2)), 2);
        assert_eq!(threshold.required_support(&context(&genotypes, 15)), 5);
        // first-edge boundary pair with a stable genotype keeps the interior support
        assert_eq!(threshold.required_support(&context(&genotypes, 10)), 5);
        // stable genotype on the last edge, within reach of window nb-10
        assert_eq!(threshold.required_support(&context(&genotypes, 22)), 5);
        assert_eq!(threshold.required_support(&context(&genotypes, 25)), 2);
        assert_eq!(threshold.required_support(&context(&genotypes, 29)), 2);
    }

    #[test]
    fn test_edge_relaxed_boundary_change() {
        let threshold = EdgeRelaxedThreshold::default();
        let mut genotypes = vec![HomoRef; 30];
        genotypes[20] = HomoAlt;
        // pair 20/21 changes genotype at window nb-10
        assert_eq!(threshold.required_support(&context(&genotypes, 20)), 5);
        // the change back at 21/22 lies past window nb-10
        assert_eq!(threshold.required_support(&context(&genotypes, 21)), 2);

        genotypes[10] = Unknown;
        // NA at the first-edge boundary pair
        assert_eq!(threshold.required_support(&context(&genotypes, 10)), 2);
    }

    #[test]
    fn test_edge_relaxed_config() {
        assert!(EdgeRelaxedThreshold::new("edge=5,edge_support=3,support=6").is_ok());
        assert!(EdgeRelaxedThreshold::new("edge_support=6,support=5").is_err());
        assert!(EdgeRelaxedThreshold::new("window=2").is_err());
    }
}
