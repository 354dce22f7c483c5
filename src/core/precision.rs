// precision.rs - Re-scan candidate neighborhoods at a finer window resolution

use crate::core::crossover::{scan_windows, AnchorKey, AnchorMap, Candidate, DoubleCoRecord, SupportThreshold};
use crate::data::{GenotypedWindow, WindowTable};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

pub const DEFAULT_PRECISION_PADDING: u64 = 100_000;

/// How a precise candidate was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    /// Found by the fine-resolution scan
    Rescanned,
    /// No transition at the fine resolution: neighborhood extent with coarse genotypes
    Neighborhood,
    /// No fine window inside the neighborhood: coarse candidate unchanged
    Unchanged,
}

#[derive(Debug, Default)]
pub struct PrecisionResult {
    pub candidates: AnchorMap<Candidate>,
    pub double_cos: AnchorMap<DoubleCoRecord>,
    pub neighborhood_fallbacks: usize,
    pub unchanged: usize,
}

pub struct PrecisionRefiner<'a> {
    fine: &'a WindowTable<GenotypedWindow>,
    threshold: &'a dyn SupportThreshold,
    padding: u64,
}

struct CandidateRefinement {
    candidates: Vec<Candidate>,
    double_cos: Vec<DoubleCoRecord>,
    kind: Refinement,
}

impl<'a> PrecisionRefiner<'a> {
    pub fn new(fine: &'a WindowTable<GenotypedWindow>, threshold: &'a dyn SupportThreshold, padding: u64) -> Self {
        Self { fine, threshold, padding }
    }

    /// Window indices of the fine windows lying inside the padded interval
    fn neighborhood(&self, candidate: &Candidate) -> Option<(usize, usize)> {
        let lo = candidate.co_start as i64 - self.padding as i64;
        let hi = candidate.co_stop as i64 + self.padding as i64;
        let mut inside = self
            .fine
            .chromosome(candidate.chromosome())
            .iter()
            .filter(|w| w.bounds.start as i64 >= lo + 1 && w.bounds.stop as i64 <= hi)
            .map(|w| w.bounds.key.index);
        let first = inside.next()?;
        let last = inside.last().unwrap_or(first);
        Some((first, last))
    }

    fn refine_one(&self, candidate: &Candidate) -> CandidateRefinement {
        let Some((first, last)) = self.neighborhood(candidate) else {
            return CandidateRefinement {
                candidates: vec![candidate.clone()],
                double_cos: Vec::new(),
                kind: Refinement::Unchanged,
            };
        };

        let windows = self.fine.chromosome(candidate.chromosome());
        let scan = scan_windows(windows, first..=last, self.threshold);
        if !scan.candidates.is_empty() {
            return CandidateRefinement {
                candidates: scan.candidates.into_values().collect(),
                double_cos: scan.double_cos.into_values().collect(),
                kind: Refinement::Rescanned,
            };
        }

        CandidateRefinement {
            candidates: vec![Candidate {
                anchor: AnchorKey::between(candidate.chromosome(), first as i64, last as i64),
                start_win: first,
                stop_win: last,
                ..candidate.clone()
            }],
            double_cos: scan.double_cos.into_values().collect(),
            kind: Refinement::Neighborhood,
        }
    }

    /// Refine every coarse candidate. Each one yields at least one precise
    /// candidate; results share one anchor map, later anchors overwrite.
    pub fn refine_all(&self, coarse: &AnchorMap<Candidate>) -> PrecisionResult {
        let candidates: Vec<&Candidate> = coarse.values().collect();
        let pb = ProgressBar::new(candidates.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} candidates ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let refined: Vec<CandidateRefinement> = candidates
            .par_iter()
            .map(|candidate| {
                let refinement = self.refine_one(candidate);
                pb.inc(1);
                refinement
            })
            .collect();
        pb.finish_with_message("Precision refinement complete");

        let mut result = PrecisionResult::default();
        for (coarse_candidate, refinement) in candidates.iter().zip(refined) {
            match refinement.kind {
                Refinement::Rescanned => {}
                Refinement::Neighborhood => {
                    result.neighborhood_fallbacks += 1;
                    log::debug!("No fine transition around {}, keeping the neighborhood", coarse_candidate.anchor);
                }
                Refinement::Unchanged => {
                    result.unchanged += 1;
                    log::warn!(
                        "No fine window inside the neighborhood of {}, candidate kept unchanged",
                        coarse_candidate.anchor
                    );
                }
            }
            result
                .candidates
                .extend(refinement.candidates.into_iter().map(|c| (c.anchor.clone(), c)));
            result
                .double_cos
                .extend(refinement.double_cos.into_iter().map(|d| (d.anchor.clone(), d)));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crossover::FixedThreshold;
    use crate::core::genotype::{Genotype, GenotypeCall, WindowDepths};
    use crate::data::WindowBounds;
    use Genotype::*;

    /// 20 kb windows sliding by 10 kb
    fn fine_table(genotypes: &[Genotype]) -> WindowTable<GenotypedWindow> {
        let windows = genotypes
            .iter()
            .enumerate()
            .map(|(i, &genotype)| {
                let start = 1 + 10_000 * i as u64;
                GenotypedWindow {
                    bounds: WindowBounds::new("Chr1", i + 1, start, start + 19_999),
                    depths: WindowDepths::default(),
                    call: GenotypeCall { genotype, ..GenotypeCall::unknown() },
                }
            })
            .collect();
        WindowTable::from_windows(windows).unwrap()
    }

    fn coarse(co_start: u64, co_stop: u64) -> Candidate {
        Candidate {
            anchor: AnchorKey::between("Chr1", 5, 6),
            start_win: 5,
            stop_win: 6,
            co_start,
            co_stop,
            pre_geno: HomoRef,
            cur_geno: HomoAlt,
        }
    }

    #[test]
    fn test_rescan_tightens_breakpoint() {
        let genotypes: Vec<Genotype> = (0..60).map(|i| if i < 30 { HomoRef } else { HomoAlt }).collect();
        let table = fine_table(&genotypes);
        let threshold = FixedThreshold::default();
        let refiner = PrecisionRefiner::new(&table, &threshold, DEFAULT_PRECISION_PADDING);

        let coarse = AnchorMap::from_candidates(vec![coarse(250_000, 350_000)]);
        let result = refiner.refine_all(&coarse);
        assert_eq!(result.candidates.len(), 1);
        let precise = result.candidates.values().next().unwrap();
        assert_eq!(precise.window_interval(), "30:31");
        assert_eq!(precise.anchor.to_string(), "Chr1_30.5");
        assert_eq!(result.neighborhood_fallbacks, 0);
    }

    #[test]
    fn test_fallback_never_discards() {
        let table = fine_table(&vec![Unknown; 60]);
        let threshold = FixedThreshold::default();
        let refiner = PrecisionRefiner::new(&table, &threshold, DEFAULT_PRECISION_PADDING);

        let coarse = AnchorMap::from_candidates(vec![coarse(250_000, 350_000)]);
        let result = refiner.refine_all(&coarse);
        assert_eq!(result.candidates.len(), 1);
        let precise = result.candidates.values().next().unwrap();
        // windows fully inside [150001, 450000]
        assert_eq!((precise.start_win, precise.stop_win), (16, 44));
        assert_eq!((precise.co_start, precise.co_stop), (250_000, 350_000));
        assert_eq!((precise.pre_geno, precise.cur_geno), (HomoRef, HomoAlt));
        assert_eq!(result.neighborhood_fallbacks, 1);
    }

    #[test]
    fn test_empty_neighborhood_keeps_candidate() {
        let table = fine_table(&vec![HomoRef; 10]);
        let threshold = FixedThreshold::default();
        let refiner = PrecisionRefiner::new(&table, &threshold, 0);

        let candidate = coarse(2_000_000, 2_100_000);
        let result = refiner.refine_all(&AnchorMap::from_candidates(vec![candidate.clone()]));
        assert_eq!(result.candidates.values().next(), Some(&candidate));
        assert_eq!(result.unchanged, 1);
    }
}
