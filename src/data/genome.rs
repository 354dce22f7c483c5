// genome.rs - Chromosome lengths and centromeric regions

use std::collections::HashMap;

/// Chromosome lengths in file order
#[derive(Debug, Clone, Default)]
pub struct ChromosomeLengths {
    order: Vec<String>,
    lengths: HashMap<String, u64>,
}

impl ChromosomeLengths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chromosome: &str, length: u64) {
        if self.lengths.insert(chromosome.to_string(), length).is_none() {
            self.order.push(chromosome.to_string());
        }
    }

    pub fn get(&self, chromosome: &str) -> Option<u64> {
        self.lengths.get(chromosome).copied()
    }

    /// Length of `chromosome`, or a data-consistency error
    pub fn require(&self, chromosome: &str) -> Result<u64, String> {
        self.get(chromosome)
            .ok_or_else(|| format!("No length known for chromosome {} (check the chromosome length table and prefix)", chromosome))
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Pericentromeric interval `[left, right]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Centromere {
    pub left: u64,
    pub right: u64,
}

impl Centromere {
    /// A window `[start, stop]` is clear only when it ends at or before the
    /// left border or begins at or after the right border.
    pub fn overlaps(&self, start: u64, stop: u64) -> bool {
        !(stop <= self.left || start >= self.right)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Centromeres {
    regions: HashMap<String, Centromere>,
}

impl Centromeres {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chromosome: &str, left: u64, right: u64) {
        self.regions.insert(chromosome.to_string(), Centromere { left, right });
    }

    pub fn get(&self, chromosome: &str) -> Option<Centromere> {
        self.regions.get(chromosome).copied()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centromere_overlap_borders() {
        let cen = Centromere { left: 1000, right: 2000 };
        assert!(!cen.overlaps(1, 1000));
        assert!(cen.overlaps(1, 1001));
        assert!(cen.overlaps(1200, 1300));
        assert!(cen.overlaps(1999, 3000));
        assert!(!cen.overlaps(2000, 3000));
    }

    #[test]
    fn test_lengths_keep_order() {
        let mut lengths = ChromosomeLengths::new();
        lengths.insert("Chr2", 200);
        lengths.insert("Chr1", 100);
        lengths.insert("Chr2", 250);
        assert_eq!(lengths.chromosomes().collect::<Vec<_>>(), vec!["Chr2", "Chr1"]);
        assert_eq!(lengths.get("Chr2"), Some(250));
        assert!(lengths.require("Chr3").is_err());
    }
}
