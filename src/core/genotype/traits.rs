// traits.rs - Core traits and types for window genotype calling

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// Categorical genotype of a window or SNP, independent of the parental labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genotype {
    /// Homozygous for the reference parent
    HomoRef,
    /// Homozygous for the alternate parent
    HomoAlt,
    /// Carries both parental alleles
    Hetero,
    /// Not enough evidence to call
    Unknown,
}

impl Genotype {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Genotype::Unknown)
    }

    pub fn is_hetero(&self) -> bool {
        matches!(self, Genotype::Hetero)
    }

    /// Called and homozygous
    pub fn is_simple(&self) -> bool {
        matches!(self, Genotype::HomoRef | Genotype::HomoAlt)
    }

    /// The other homozygous state; heterozygous and unknown map to themselves
    pub fn opposite(&self) -> Genotype {
        match self {
            Genotype::HomoRef => Genotype::HomoAlt,
            Genotype::HomoAlt => Genotype::HomoRef,
            other => *other,
        }
    }

    /// Whether `other` is one of the allele states carried by `self`.
    /// A heterozygous call carries both homozygous states.
    pub fn covers(&self, other: Genotype) -> bool {
        *self == other || (self.is_hetero() && other.is_simple())
    }
}

/// Parental genotype labels used when reading and writing tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenotypeLabels {
    pub reference: String,
    pub alternate: String,
}

pub const UNKNOWN_LABEL: &str = "NA";

impl GenotypeLabels {
    pub fn new(reference: &str, alternate: &str) -> Result<Self, String> {
        let reference = reference.trim();
        let alternate = alternate.trim();
        if reference.is_empty() || alternate.is_empty() {
            return Err("Genotype labels cannot be empty".to_string());
        }
        if reference == alternate {
            return Err(format!("Reference and alternate genotype labels must differ (both '{}')", reference));
        }
        for label in [reference, alternate] {
            if label.contains('/') || label == UNKNOWN_LABEL {
                return Err(format!("Invalid genotype label '{}': must not contain '/' or be '{}'", label, UNKNOWN_LABEL));
            }
        }
        Ok(Self {
            reference: reference.to_string(),
            alternate: alternate.to_string(),
        })
    }

    pub fn label(&self, genotype: Genotype) -> String {
        match genotype {
            Genotype::HomoRef => self.reference.clone(),
            Genotype::HomoAlt => self.alternate.clone(),
            Genotype::Hetero => format!("{}/{}", self.reference, self.alternate),
            Genotype::Unknown => UNKNOWN_LABEL.to_string(),
        }
    }

    pub fn parse(&self, label: &str) -> Result<Genotype, String> {
        let label = label.trim();
        if label == UNKNOWN_LABEL {
            return Ok(Genotype::Unknown);
        }
        if label == self.reference {
            return Ok(Genotype::HomoRef);
        }
        if label == self.alternate {
            return Ok(Genotype::HomoAlt);
        }
        if let Some((left, right)) = label.split_once('/') {
            let pair = (left == self.reference && right == self.alternate)
                || (left == self.alternate && right == self.reference);
            if pair {
                return Ok(Genotype::Hetero);
            }
        }
        Err(format!(
            "Unknown genotype label '{}' (expected {}, {}, {} or {})",
            label,
            self.reference,
            self.alternate,
            self.label(Genotype::Hetero),
            UNKNOWN_LABEL
        ))
    }
}

impl Default for GenotypeLabels {
    fn default() -> Self {
        Self {
            reference: "Ref".to_string(),
            alternate: "Alt".to_string(),
        }
    }
}

/// Aggregate read depths of one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDepths {
    pub ref_depth: u64,
    pub alt_depth: u64,
    pub total_depth: u64,
}

impl WindowDepths {
    pub fn new(ref_depth: u64, alt_depth: u64, total_depth: u64) -> Self {
        Self { ref_depth, alt_depth, total_depth }
    }

    pub fn add(&mut self, other: &WindowDepths) {
        self.ref_depth += other.ref_depth;
        self.alt_depth += other.alt_depth;
        self.total_depth += other.total_depth;
    }

    /// Ratios rounded to 3 decimals, `(0.0, 0.0)` for zero depth
    pub fn ratios(&self) -> (f64, f64) {
        if self.total_depth == 0 {
            return (0.0, 0.0);
        }
        let total = self.total_depth as f64;
        (
            round_to(self.ref_depth as f64 / total, 3),
            round_to(self.alt_depth as f64 / total, 3),
        )
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Indicator values for the three genotype classes, in table column order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenotypeProbabilities {
    pub homo_ref: f64,
    pub hetero: f64,
    pub homo_alt: f64,
}

/// Result of calling one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenotypeCall {
    pub ref_ratio: f64,
    pub alt_ratio: f64,
    pub probabilities: Option<GenotypeProbabilities>,
    pub genotype: Genotype,
}

impl GenotypeCall {
    pub fn unknown() -> Self {
        Self {
            ref_ratio: 0.0,
            alt_ratio: 0.0,
            probabilities: None,
            genotype: Genotype::Unknown,
        }
    }
}

/// Trait for window genotype callers
pub trait GenotypeCaller: Send + Sync + Debug {
    /// Registry name of the caller
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Call a genotype from aggregate depths. Must be a pure function of its input.
    fn call(&self, depths: &WindowDepths) -> GenotypeCall;

    /// Whether calls carry the three probability columns
    fn reports_probabilities(&self) -> bool;
}

impl Display for Genotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Genotype::HomoRef => write!(f, "homo-ref"),
            Genotype::HomoAlt => write!(f, "homo-alt"),
            Genotype::Hetero => write!(f, "hetero"),
            Genotype::Unknown => write!(f, "NA"),
        }
    }
}
