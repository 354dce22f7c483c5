// smoothing.rs - Neighbor smoothing of window genotypes with centromere masking

use crate::core::genotype::{GenotypeCaller, WindowDepths};
use crate::data::{Centromere, Centromeres, GenotypedWindow, WindowKey, WindowTable};
use rayon::prelude::*;
use std::fmt::{self, Display};
use std::str::FromStr;

/// How windows overlapping the pericentromeric region are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CentromerePolicy {
    /// Centromeric windows are `NA` and never lend depth to their neighbors
    #[default]
    MaskNeighbors,
    /// Centromeric windows are `NA` but flanking windows still sum every neighbor
    MaskWindow,
    /// No masking
    Off,
}

impl CentromerePolicy {
    pub fn names() -> Vec<&'static str> {
        vec!["mask-neighbors", "mask-window", "off"]
    }
}

impl FromStr for CentromerePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mask-neighbors" => Ok(CentromerePolicy::MaskNeighbors),
            "mask-window" => Ok(CentromerePolicy::MaskWindow),
            "off" | "none" => Ok(CentromerePolicy::Off),
            _ => Err(format!(
                "Unknown centromere policy '{}'. Available: {}",
                s,
                Self::names().join(", ")
            )),
        }
    }
}

impl Display for CentromerePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CentromerePolicy::MaskNeighbors => "mask-neighbors",
            CentromerePolicy::MaskWindow => "mask-window",
            CentromerePolicy::Off => "off",
        };
        write!(f, "{}", name)
    }
}

/// Audit row: which neighbors were summed for one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothingTrace {
    pub key: WindowKey,
    pub start: u64,
    pub stop: u64,
    pub start_smooth: usize,
    pub stop_smooth: usize,
    pub contributors: Vec<usize>,
}

impl SmoothingTrace {
    /// `:`-joined contributing window indices, empty when masked
    pub fn contributors_label(&self) -> String {
        self.contributors
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(":")
    }
}

pub struct SmoothedTable {
    pub windows: WindowTable<GenotypedWindow>,
    pub traces: Vec<SmoothingTrace>,
}

fn smooth_chromosome(
    windows: &[GenotypedWindow],
    centromere: Option<Centromere>,
    policy: CentromerePolicy,
    caller: &dyn GenotypeCaller,
) -> (Vec<GenotypedWindow>, Vec<SmoothingTrace>) {
    let nb_windows = windows.len();
    let masked = |w: &GenotypedWindow| match (policy, centromere) {
        (CentromerePolicy::Off, _) | (_, None) => false,
        (_, Some(cen)) => cen.overlaps(w.bounds.start, w.bounds.stop),
    };

    let mut smoothed = Vec::with_capacity(nb_windows);
    let mut traces = Vec::with_capacity(nb_windows);

    for (i, window) in windows.iter().enumerate() {
        let index = i + 1;
        let start_smooth = index.saturating_sub(1).max(1);
        let stop_smooth = (index + 1).min(nb_windows);

        let mut depths = WindowDepths::default();
        let mut contributors = Vec::new();
        if !masked(window) {
            for neighbor in start_smooth..=stop_smooth {
                let other = &windows[neighbor - 1];
                if policy == CentromerePolicy::MaskNeighbors && masked(other) {
                    continue;
                }
                depths.add(&other.depths);
                contributors.push(neighbor);
            }
        }

        traces.push(SmoothingTrace {
            key: window.bounds.key.clone(),
            start: window.bounds.start,
            stop: window.bounds.stop,
            start_smooth,
            stop_smooth,
            contributors,
        });
        smoothed.push(GenotypedWindow {
            bounds: window.bounds.clone(),
            depths,
            call: caller.call(&depths),
        });
    }

    (smoothed, traces)
}

/// Re-call every window from the summed depths of itself and its two neighbors.
/// Chromosomes without a centromere entry are not masked.
pub fn smooth(
    normalized: &WindowTable<GenotypedWindow>,
    centromeres: &Centromeres,
    policy: CentromerePolicy,
    caller: &dyn GenotypeCaller,
) -> Result<SmoothedTable, String> {
    let chromosomes: Vec<&str> = normalized.chromosomes().collect();
    let results: Vec<(String, Vec<GenotypedWindow>, Vec<SmoothingTrace>)> = chromosomes
        .par_iter()
        .map(|&chromosome| {
            let (windows, traces) = smooth_chromosome(
                normalized.chromosome(chromosome),
                centromeres.get(chromosome),
                policy,
                caller,
            );
            (chromosome.to_string(), windows, traces)
        })
        .collect();

    let mut per_chromosome = Vec::with_capacity(results.len());
    let mut traces = Vec::new();
    for (chromosome, windows, chromosome_traces) in results {
        per_chromosome.push((chromosome, windows));
        traces.extend(chromosome_traces);
    }

    Ok(SmoothedTable {
        windows: WindowTable::from_chromosomes(per_chromosome)?,
        traces,
    })
}
