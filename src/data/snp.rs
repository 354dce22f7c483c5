// snp.rs - SNP records and per-chromosome catalogs

use crate::core::genotype::Genotype;
use std::collections::HashMap;

/// Diploid offspring call restricted to the bi-allelic states used downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiploidCall {
    HomRef,
    Het,
    HomAlt,
}

impl DiploidCall {
    /// Parse a VCF GT value; `None` for missing, multi-allelic or malformed calls
    pub fn parse(raw: &str) -> Option<Self> {
        let mut alleles = raw.split(['/', '|']);
        let first = alleles.next()?;
        let second = alleles.next()?;
        if alleles.next().is_some() {
            return None;
        }
        match (first, second) {
            ("0", "0") => Some(DiploidCall::HomRef),
            ("0", "1") | ("1", "0") => Some(DiploidCall::Het),
            ("1", "1") => Some(DiploidCall::HomAlt),
            _ => None,
        }
    }

    pub fn genotype(&self) -> Genotype {
        match self {
            DiploidCall::HomRef => Genotype::HomoRef,
            DiploidCall::Het => Genotype::Hetero,
            DiploidCall::HomAlt => Genotype::HomoAlt,
        }
    }

    /// Call carries a reference allele
    pub fn has_ref(&self) -> bool {
        matches!(self, DiploidCall::HomRef | DiploidCall::Het)
    }

    /// Call carries an alternate allele
    pub fn has_alt(&self) -> bool {
        matches!(self, DiploidCall::HomAlt | DiploidCall::Het)
    }
}

/// Anything located on a chromosome
pub trait Positioned {
    fn chromosome(&self) -> &str;
    fn position(&self) -> u64;
}

/// Parental marker: position and raw genotype call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentalSnp {
    pub chromosome: String,
    pub position: u64,
    pub call: String,
}

/// Informative offspring marker with allele depths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffspringSnp {
    pub chromosome: String,
    pub position: u64,
    pub call: DiploidCall,
    pub ref_depth: u64,
    pub alt_depth: u64,
}

impl OffspringSnp {
    /// Label derived from the raw call
    pub fn genotype(&self) -> Genotype {
        self.call.genotype()
    }
}

impl Positioned for ParentalSnp {
    fn chromosome(&self) -> &str {
        &self.chromosome
    }
    fn position(&self) -> u64 {
        self.position
    }
}

impl Positioned for OffspringSnp {
    fn chromosome(&self) -> &str {
        &self.chromosome
    }
    fn position(&self) -> u64 {
        self.position
    }
}

/// SNPs grouped by chromosome, chromosomes kept in first-seen order,
/// records sorted by position and unique per position.
#[derive(Debug, Clone)]
pub struct SnpCatalog<T> {
    order: Vec<String>,
    by_chromosome: HashMap<String, Vec<T>>,
}

impl<T: Positioned> SnpCatalog<T> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            by_chromosome: HashMap::new(),
        }
    }

    pub fn push(&mut self, snp: T) {
        if !self.by_chromosome.contains_key(snp.chromosome()) {
            self.order.push(snp.chromosome().to_string());
        }
        self.by_chromosome
            .entry(snp.chromosome().to_string())
            .or_default()
            .push(snp);
    }

    /// Sort every chromosome by position and drop repeated positions.
    /// Returns the number of duplicates removed.
    pub fn finalize(&mut self) -> usize {
        let mut removed = 0;
        for snps in self.by_chromosome.values_mut() {
            snps.sort_by_key(|s| s.position());
            let before = snps.len();
            snps.dedup_by_key(|s| s.position());
            removed += before - snps.len();
        }
        removed
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn get(&self, chromosome: &str) -> &[T] {
        self.by_chromosome
            .get(chromosome)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, chromosome: &str, position: u64) -> bool {
        self.get(chromosome)
            .binary_search_by_key(&position, |s| s.position())
            .is_ok()
    }

    /// SNPs with position in `[start, stop]`
    pub fn in_range(&self, chromosome: &str, start: u64, stop: u64) -> &[T] {
        let snps = self.get(chromosome);
        let lo = snps.partition_point(|s| s.position() < start);
        let hi = snps.partition_point(|s| s.position() <= stop);
        if lo >= hi {
            &[]
        } else {
            &snps[lo..hi]
        }
    }

    pub fn last_position(&self, chromosome: &str) -> Option<u64> {
        self.get(chromosome).last().map(|s| s.position())
    }

    pub fn len(&self) -> usize {
        self.by_chromosome.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only chromosomes accepted by `keep`
    pub fn retain_chromosomes<F: Fn(&str) -> bool>(&mut self, keep: F) {
        self.order.retain(|c| keep(c));
        let order = &self.order;
        self.by_chromosome.retain(|c, _| order.contains(c));
    }
}

impl<T: Positioned> Default for SnpCatalog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Positioned> FromIterator<T> for SnpCatalog<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for snp in iter {
            catalog.push(snp);
        }
        catalog.finalize();
        catalog
    }
}
