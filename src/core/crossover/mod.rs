// mod.rs - Crossover candidates and the genotype-transition scanner
//
// Same layout as the genotype callers: a trait for the pluggable part
// (support thresholds), a factory, and the scanner that uses them.

use crate::core::genotype::{Genotype, GenotypeLabels};
use std::collections::HashMap;
use std::fmt::{self, Display};

pub mod factory;
pub mod scanner;
pub mod threshold;

pub use factory::SupportThresholdFactory;
pub use scanner::{scan_all, scan_windows, Emission, ScanResult, ScannerState, StepOutput, WindowPair};
pub use threshold::{EdgeRelaxedThreshold, FixedThreshold, PairContext, SupportThreshold};

/// `chromosome_meanWindow` anchor, mean rounded to one decimal.
///
/// Stored in tenths of a window so that equal anchors hash equally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorKey {
    pub chromosome: String,
    tenths: i64,
}

impl AnchorKey {
    /// Anchor halfway between two window indices
    pub fn between(chromosome: &str, left: i64, right: i64) -> Self {
        Self {
            chromosome: chromosome.to_string(),
            tenths: (left + right) * 5,
        }
    }

    /// Anchor at `mean`, rounded to one decimal with ties to even (2.25 -> 2.2)
    pub fn at(chromosome: &str, mean: f64) -> Self {
        Self {
            chromosome: chromosome.to_string(),
            tenths: (mean * 10.0).round_ties_even() as i64,
        }
    }

    pub fn mean_window(&self) -> f64 {
        self.tenths as f64 / 10.0
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        let (chromosome, mean) = text
            .rsplit_once('_')
            .ok_or_else(|| format!("Invalid crossover key '{}': expected chromosome_meanWindow", text))?;
        let mean: f64 = mean
            .parse()
            .map_err(|_| format!("Invalid mean window in crossover key '{}'", text))?;
        if chromosome.is_empty() || !mean.is_finite() {
            return Err(format!("Invalid crossover key '{}'", text));
        }
        Ok(Self::at(chromosome, mean))
    }
}

impl Display for AnchorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:.1}", self.chromosome, self.mean_window())
    }
}

/// A candidate crossover between two confirmed genotype runs
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub anchor: AnchorKey,
    pub start_win: usize,
    pub stop_win: usize,
    pub co_start: u64,
    pub co_stop: u64,
    pub pre_geno: Genotype,
    pub cur_geno: Genotype,
}

impl Candidate {
    pub fn chromosome(&self) -> &str {
        &self.anchor.chromosome
    }

    /// `start_win:stop_win`
    pub fn window_interval(&self) -> String {
        format!("{}:{}", self.start_win, self.stop_win)
    }

    /// `co_stop - co_start`, negative when the bounds are inverted
    pub fn span(&self) -> i64 {
        self.co_stop as i64 - self.co_start as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubleCoStatus {
    Supported,
    NotSupported,
}

impl Display for DoubleCoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoubleCoStatus::Supported => write!(f, "supported"),
            DoubleCoStatus::NotSupported => write!(f, "not_supported"),
        }
    }
}

/// Homozygous-to-homozygous transition seen by the scanner (diagnostic only)
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleCoRecord {
    pub anchor: AnchorKey,
    pub start_win: usize,
    pub stop_win: usize,
    pub pre_geno: Genotype,
    pub cur_geno: Genotype,
    pub status: DoubleCoStatus,
}

impl DoubleCoRecord {
    pub fn describe(&self, labels: &GenotypeLabels) -> String {
        format!(
            "- {} (window {}:{}): {}>{} ({})",
            self.anchor,
            self.start_win,
            self.stop_win,
            labels.label(self.pre_geno),
            labels.label(self.cur_geno),
            self.status
        )
    }
}

/// Insertion-ordered map keyed by anchor; re-inserting a key replaces the
/// value in place.
#[derive(Debug, Clone)]
pub struct AnchorMap<V> {
    entries: Vec<(AnchorKey, V)>,
    index: HashMap<AnchorKey, usize>,
}

impl<V> AnchorMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: AnchorKey, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &AnchorKey) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnchorKey, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn into_values(self) -> impl Iterator<Item = V> {
        self.entries.into_iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for AnchorMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Extend<(AnchorKey, V)> for AnchorMap<V> {
    fn extend<I: IntoIterator<Item = (AnchorKey, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl AnchorMap<Candidate> {
    pub fn from_candidates<I: IntoIterator<Item = Candidate>>(candidates: I) -> Self {
        let mut map = Self::new();
        map.extend(candidates.into_iter().map(|c| (c.anchor.clone(), c)));
        map
    }
}
