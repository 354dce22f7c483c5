// window.rs - Window keys, window records and ordered window tables

use crate::core::genotype::{GenotypeCall, WindowDepths};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::ops::Range;

/// `(chromosome, window_index)`, index 1-based per chromosome
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowKey {
    pub chromosome: String,
    pub index: usize,
}

impl WindowKey {
    pub fn new(chromosome: &str, index: usize) -> Self {
        Self {
            chromosome: chromosome.to_string(),
            index,
        }
    }

    /// Parse the `chr_index` form used in tables
    pub fn parse(text: &str) -> Result<Self, String> {
        let (chromosome, index) = text
            .rsplit_once('_')
            .ok_or_else(|| format!("Invalid window key '{}': expected chromosome_index", text))?;
        let index: usize = index
            .parse()
            .map_err(|_| format!("Invalid window index in '{}'", text))?;
        if chromosome.is_empty() || index == 0 {
            return Err(format!("Invalid window key '{}'", text));
        }
        Ok(Self::new(chromosome, index))
    }
}

impl Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chromosome, self.index)
    }
}

/// Physical extent of a window, coordinates inclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowBounds {
    pub key: WindowKey,
    pub start: u64,
    pub stop: u64,
}

impl WindowBounds {
    pub fn new(chromosome: &str, index: usize, start: u64, stop: u64) -> Self {
        Self {
            key: WindowKey::new(chromosome, index),
            start,
            stop,
        }
    }

    pub fn midpoint(&self) -> u64 {
        (self.start + self.stop) / 2
    }
}

pub trait Windowed {
    fn bounds(&self) -> &WindowBounds;

    fn key(&self) -> &WindowKey {
        &self.bounds().key
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParentalWindow {
    pub bounds: WindowBounds,
    pub snp_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OffspringWindow {
    pub bounds: WindowBounds,
    pub depths: WindowDepths,
    /// SNPs whose call carries the reference allele
    pub ref_snps: usize,
    /// SNPs whose call carries the alternate allele
    pub alt_snps: usize,
    pub snp_count: usize,
}

/// Window after normalization or smoothing, with its genotype call
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypedWindow {
    pub bounds: WindowBounds,
    pub depths: WindowDepths,
    pub call: GenotypeCall,
}

impl Windowed for WindowBounds {
    fn bounds(&self) -> &WindowBounds {
        self
    }
}

impl Windowed for ParentalWindow {
    fn bounds(&self) -> &WindowBounds {
        &self.bounds
    }
}

impl Windowed for OffspringWindow {
    fn bounds(&self) -> &WindowBounds {
        &self.bounds
    }
}

impl Windowed for GenotypedWindow {
    fn bounds(&self) -> &WindowBounds {
        &self.bounds
    }
}

/// Ordered window sequence with key lookup.
///
/// Windows of one chromosome are contiguous and indexed `1..=n` in order.
#[derive(Debug, Clone)]
pub struct WindowTable<W> {
    windows: Vec<W>,
    index: HashMap<WindowKey, usize>,
    spans: Vec<(String, Range<usize>)>,
}

impl<W: Windowed> WindowTable<W> {
    pub fn new() -> Self {
        Self {
            windows: Vec::new(),
            index: HashMap::new(),
            spans: Vec::new(),
        }
    }

    /// Build from per-chromosome window lists, validating index continuity
    pub fn from_chromosomes(chromosomes: Vec<(String, Vec<W>)>) -> Result<Self, String> {
        let mut table = Self::new();
        for (chromosome, windows) in chromosomes {
            table.append_chromosome(&chromosome, windows)?;
        }
        Ok(table)
    }

    /// Build from a flat ordered list (e.g. read back from a table file)
    pub fn from_windows(windows: Vec<W>) -> Result<Self, String> {
        let mut grouped: Vec<(String, Vec<W>)> = Vec::new();
        for window in windows {
            let chromosome = window.key().chromosome.clone();
            match grouped.last_mut() {
                Some((current, list)) if *current == chromosome => list.push(window),
                _ => grouped.push((chromosome, vec![window])),
            }
        }
        Self::from_chromosomes(grouped)
    }

    pub fn append_chromosome(&mut self, chromosome: &str, windows: Vec<W>) -> Result<(), String> {
        if self.spans.iter().any(|(c, _)| c == chromosome) {
            return Err(format!("Windows of chromosome {} are not contiguous", chromosome));
        }
        let begin = self.windows.len();
        for (offset, window) in windows.into_iter().enumerate() {
            let key = window.key();
            if key.chromosome != chromosome || key.index != offset + 1 {
                return Err(format!(
                    "Unexpected window {} at position {} of chromosome {}",
                    key,
                    offset + 1,
                    chromosome
                ));
            }
            self.index.insert(key.clone(), self.windows.len());
            self.windows.push(window);
        }
        let end = self.windows.len();
        if end > begin {
            self.spans.push((chromosome.to_string(), begin..end));
        }
        Ok(())
    }

    pub fn get(&self, key: &WindowKey) -> Option<&W> {
        self.index.get(key).map(|&i| &self.windows[i])
    }

    pub fn contains(&self, key: &WindowKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().map(|(c, _)| c.as_str())
    }

    /// Windows of one chromosome, index order
    pub fn chromosome(&self, chromosome: &str) -> &[W] {
        self.spans
            .iter()
            .find(|(c, _)| c == chromosome)
            .map(|(_, range)| &self.windows[range.clone()])
            .unwrap_or(&[])
    }

    pub fn window_count(&self, chromosome: &str) -> usize {
        self.chromosome(chromosome).len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &W> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl<W: Windowed> Default for WindowTable<W> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_key_parse() {
        let key = WindowKey::parse("Chr1_12").unwrap();
        assert_eq!(key, WindowKey::new("Chr1", 12));
        assert_eq!(key.to_string(), "Chr1_12");
        // chromosome names may contain underscores
        assert_eq!(WindowKey::parse("scaffold_3_7").unwrap(), WindowKey::new("scaffold_3", 7));
        assert!(WindowKey::parse("Chr1").is_err());
        assert!(WindowKey::parse("Chr1_0").is_err());
    }

    #[test]
    fn test_table_lookup() {
        let table = WindowTable::from_windows(vec![
            WindowBounds::new("Chr1", 1, 1, 100),
            WindowBounds::new("Chr1", 2, 51, 150),
            WindowBounds::new("Chr2", 1, 1, 100),
        ])
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.window_count("Chr1"), 2);
        assert_eq!(table.get(&WindowKey::new("Chr1", 2)).unwrap().start, 51);
        assert_eq!(table.chromosomes().collect::<Vec<_>>(), vec!["Chr1", "Chr2"]);
        assert!(table.chromosome("Chr3").is_empty());
    }

    #[test]
    fn test_table_rejects_gaps_and_interleaving() {
        assert!(WindowTable::from_windows(vec![
            WindowBounds::new("Chr1", 1, 1, 100),
            WindowBounds::new("Chr1", 3, 101, 200),
        ])
        .is_err());
        assert!(WindowTable::from_windows(vec![
            WindowBounds::new("Chr1", 1, 1, 100),
            WindowBounds::new("Chr2", 1, 1, 100),
            WindowBounds::new("Chr1", 2, 51, 150),
        ])
        .is_err());
    }

    #[test]
    fn test_midpoint_truncates() {
        assert_eq!(WindowBounds::new("Chr1", 1, 1, 100_000).midpoint(), 50_000);
    }
}
