// windows.rs - Sliding window construction and normalization

use crate::core::genotype::{GenotypeCaller, WindowDepths};
use crate::data::{
    ChromosomeLengths, GenotypedWindow, OffspringSnp, OffspringWindow, ParentalSnp, ParentalWindow,
    SnpCatalog, WindowBounds, WindowTable, Windowed,
};
use rayon::prelude::*;
use std::ops::Range;

pub const MAX_WINDOW_KB: u64 = 1000;

/// How chromosomes are cut into windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Fixed physical size in kb, sliding by half a window
    Physical { window_kb: u64 },
    /// Fixed number of offspring SNPs, sliding by half the count
    SnpCount { snps_per_window: usize },
}

impl WindowPolicy {
    pub fn physical(window_kb: u64) -> Result<Self, String> {
        if window_kb == 0 || window_kb > MAX_WINDOW_KB || window_kb % 2 != 0 {
            return Err(format!(
                "Window size must be an even number of kb between 2 and {} (got {})",
                MAX_WINDOW_KB, window_kb
            ));
        }
        Ok(WindowPolicy::Physical { window_kb })
    }

    pub fn snp_count(snps_per_window: usize) -> Result<Self, String> {
        if snps_per_window < 2 {
            return Err(format!("SNPs per window must be at least 2 (got {})", snps_per_window));
        }
        Ok(WindowPolicy::SnpCount { snps_per_window })
    }

    pub fn label(&self) -> String {
        match self {
            WindowPolicy::Physical { window_kb } => format!("{} kb", window_kb),
            WindowPolicy::SnpCount { snps_per_window } => format!("{} SNPs", snps_per_window),
        }
    }

    /// Suffix appended to per-resolution output files
    pub fn file_suffix(&self) -> String {
        match self {
            WindowPolicy::Physical { window_kb } => format!("_{}_kb", window_kb),
            WindowPolicy::SnpCount { snps_per_window } => format!("_{}_snps", snps_per_window),
        }
    }
}

/// Half a physical window in bp
pub fn sliding_size(window_kb: u64) -> u64 {
    window_kb * 1000 / 2
}

/// Physical window grid of one chromosome.
///
/// Window `i` spans `[1 + s*(i-1), min(w + s*(i-1), length)]` with `w` the
/// window size and `s` half of it; the last window always ends at `length`.
pub fn physical_bounds(chromosome: &str, length: u64, window_kb: u64) -> Result<Vec<WindowBounds>, String> {
    WindowPolicy::physical(window_kb)?;
    if length == 0 {
        return Err(format!("Chromosome {} has zero length", chromosome));
    }
    let window = window_kb * 1000;
    let sliding = sliding_size(window_kb);
    let nb_windows = (length / sliding).max(1);

    Ok((1..=nb_windows)
        .map(|i| {
            let offset = sliding * (i - 1);
            WindowBounds::new(chromosome, i as usize, 1 + offset, (window + offset).min(length))
        })
        .collect())
}

/// SNP index ranges of the SNP-count policy.
///
/// The first two windows hold half a window each and do not overlap; after
/// that each full window slides by half its size. The remainder is flushed
/// as one or two shorter windows.
pub fn snp_count_ranges(n_snps: usize, snps_per_window: usize) -> Vec<Range<usize>> {
    let half = snps_per_window / 2;
    let mut ranges = Vec::new();
    if half == 0 || n_snps == 0 {
        return ranges;
    }

    let mut lo = 0;
    let mut initial_windows = 0;
    for i in 0..n_snps {
        let len = i + 1 - lo;
        if initial_windows < 2 {
            if len == half {
                ranges.push(lo..i + 1);
                lo = i + 1;
                initial_windows += 1;
            }
        } else if len >= snps_per_window {
            ranges.push(lo..i + 1);
            lo += len / 2;
        }
    }

    if lo < n_snps {
        let len = n_snps - lo;
        if len >= 2 * half {
            ranges.push(lo..lo + half);
            ranges.push(lo + half..lo + 2 * half);
        } else if len >= half {
            ranges.push(lo..lo + half);
            if len > half {
                ranges.push(lo + half..n_snps);
            }
        } else {
            ranges.push(lo..n_snps);
        }
    }
    ranges
}

/// Sum depths by the allele each call supports
fn aggregate(bounds: WindowBounds, snps: &[OffspringSnp]) -> OffspringWindow {
    let mut window = OffspringWindow {
        bounds,
        depths: WindowDepths::default(),
        ref_snps: 0,
        alt_snps: 0,
        snp_count: snps.len(),
    };
    for snp in snps {
        if snp.call.has_ref() {
            window.depths.ref_depth += snp.ref_depth;
            window.depths.total_depth += snp.ref_depth;
            window.ref_snps += 1;
        }
        if snp.call.has_alt() {
            window.depths.alt_depth += snp.alt_depth;
            window.depths.total_depth += snp.alt_depth;
            window.alt_snps += 1;
        }
    }
    window
}

type ChromosomeWindows = (String, Vec<ParentalWindow>, Vec<OffspringWindow>);

fn build_chromosome(
    chromosome: &str,
    policy: WindowPolicy,
    lengths: &ChromosomeLengths,
    parental: &SnpCatalog<ParentalSnp>,
    offspring: &SnpCatalog<OffspringSnp>,
) -> Result<ChromosomeWindows, String> {
    let snps = offspring.get(chromosome);
    let mut parental_windows = Vec::new();
    let mut offspring_windows = Vec::new();

    match policy {
        WindowPolicy::Physical { window_kb } => {
            let length = lengths.require(chromosome)?;
            for bounds in physical_bounds(chromosome, length, window_kb)? {
                let snp_count = parental.in_range(chromosome, bounds.start, bounds.stop).len();
                let lo = snps.partition_point(|s| s.position < bounds.start);
                let hi = snps.partition_point(|s| s.position <= bounds.stop);
                parental_windows.push(ParentalWindow { bounds: bounds.clone(), snp_count });
                offspring_windows.push(aggregate(bounds, &snps[lo..hi.max(lo)]));
            }
        }
        WindowPolicy::SnpCount { snps_per_window } => {
            for (i, range) in snp_count_ranges(snps.len(), snps_per_window).into_iter().enumerate() {
                let members = &snps[range];
                let start = members.first().map(|s| s.position).unwrap_or(0);
                let stop = members.last().map(|s| s.position).unwrap_or(0);
                let bounds = WindowBounds::new(chromosome, i + 1, start, stop);
                let snp_count = parental.in_range(chromosome, start, stop).len();
                parental_windows.push(ParentalWindow { bounds: bounds.clone(), snp_count });
                offspring_windows.push(aggregate(bounds, members));
            }
        }
    }

    Ok((chromosome.to_string(), parental_windows, offspring_windows))
}

/// Build parental and offspring windows over the same grid, one chromosome per task
pub fn build_windows(
    chromosomes: &[String],
    policy: WindowPolicy,
    lengths: &ChromosomeLengths,
    parental: &SnpCatalog<ParentalSnp>,
    offspring: &SnpCatalog<OffspringSnp>,
) -> Result<(WindowTable<ParentalWindow>, WindowTable<OffspringWindow>), String> {
    let built: Vec<ChromosomeWindows> = chromosomes
        .par_iter()
        .map(|chromosome| build_chromosome(chromosome, policy, lengths, parental, offspring))
        .collect::<Result<Vec<_>, String>>()?;

    let mut parental_table = WindowTable::new();
    let mut offspring_table = WindowTable::new();
    for (chromosome, parental_windows, offspring_windows) in built {
        parental_table.append_chromosome(&chromosome, parental_windows)?;
        offspring_table.append_chromosome(&chromosome, offspring_windows)?;
    }
    Ok((parental_table, offspring_table))
}

/// Zero out under-covered windows and call every window.
///
/// A window keeps its depths only when its total depth reaches `min_reads`
/// and the parental window on the same key holds at least `min_snps` SNPs.
pub fn normalize(
    parental: &WindowTable<ParentalWindow>,
    offspring: &WindowTable<OffspringWindow>,
    min_reads: u64,
    min_snps: usize,
    caller: &dyn GenotypeCaller,
) -> Result<WindowTable<GenotypedWindow>, String> {
    let mut chromosomes = Vec::new();
    for chromosome in offspring.chromosomes() {
        let mut windows = Vec::with_capacity(offspring.window_count(chromosome));
        for window in offspring.chromosome(chromosome) {
            let parental_window = parental.get(window.key()).ok_or_else(|| {
                format!(
                    "Offspring window {} has no parental counterpart; both grids must be built over the same coordinates",
                    window.key()
                )
            })?;
            let depths = if window.depths.total_depth >= min_reads && parental_window.snp_count >= min_snps {
                window.depths
            } else {
                WindowDepths::default()
            };
            windows.push(GenotypedWindow {
                bounds: window.bounds.clone(),
                depths,
                call: caller.call(&depths),
            });
        }
        chromosomes.push((chromosome.to_string(), windows));
    }
    WindowTable::from_chromosomes(chromosomes)
}
