// border.rs - SNP-level breakpoint refinement and re-merging of refined intervals

use crate::core::crossover::{AnchorKey, AnchorMap, Candidate};
use crate::core::genotype::Genotype;
use crate::data::{OffspringSnp, SnpCatalog};
use rayon::prelude::*;
use serde::Serialize;

/// Distance the fallback bound is pushed past the padded interval
pub const FALLBACK_OFFSET: i64 = 2000;

/// Breakpoint interval after border refinement
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedCo {
    pub anchor: AnchorKey,
    pub start: i64,
    pub stop: i64,
    pub pre_geno: Genotype,
    pub cur_geno: Genotype,
}

impl RefinedCo {
    pub fn chromosome(&self) -> &str {
        &self.anchor.chromosome
    }
}

/// Shape of the genotype change, which decides the scan direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionShape {
    SimpleToHetero,
    HeteroToSimple,
    Other,
}

impl TransitionShape {
    fn of(pre: Genotype, cur: Genotype) -> Self {
        match (pre.is_hetero(), cur.is_hetero()) {
            (false, true) => TransitionShape::SimpleToHetero,
            (true, false) => TransitionShape::HeteroToSimple,
            _ => TransitionShape::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

pub struct BorderOutcome {
    pub refined: RefinedCo,
    pub fell_back: bool,
}

pub struct BorderRefiner<'a> {
    snps: &'a SnpCatalog<OffspringSnp>,
    padding: i64,
}

impl<'a> BorderRefiner<'a> {
    /// `padding` is half a window, in bp
    pub fn new(snps: &'a SnpCatalog<OffspringSnp>, padding: u64) -> Self {
        Self { snps, padding: padding as i64 }
    }

    /// Informative SNPs of `[start, stop)` labelled as the "before" or the
    /// "after" genotype, in position order
    fn marker_snps(&self, chromosome: &str, start: i64, stop: i64, before: Genotype, after: Genotype) -> Vec<(i64, Side)> {
        if stop <= start.max(0) {
            return Vec::new();
        }
        self.snps
            .in_range(chromosome, start.max(0) as u64, (stop - 1) as u64)
            .iter()
            .filter_map(|snp| {
                let genotype = snp.genotype();
                if genotype == before {
                    Some((snp.position as i64, Side::Before))
                } else if genotype == after {
                    Some((snp.position as i64, Side::After))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Push the start to the last "before" SNP and the stop to the first
    /// "after" SNP of the padded candidate interval.
    pub fn refine(&self, candidate: &Candidate) -> BorderOutcome {
        let chromosome = candidate.chromosome();
        let padded_start = candidate.co_start as i64 - self.padding;
        let padded_stop = candidate.co_stop as i64 + self.padding;
        let (pre, cur) = (candidate.pre_geno, candidate.cur_geno);
        let shape = TransitionShape::of(pre, cur);

        // the heterozygous side cannot anchor a bound, its opposite parent type does
        let (before, after) = match shape {
            TransitionShape::SimpleToHetero => (pre, pre.opposite()),
            TransitionShape::HeteroToSimple => (cur.opposite(), cur),
            TransitionShape::Other => (pre, cur),
        };
        let markers = self.marker_snps(chromosome, padded_start, padded_stop, before, after);

        let mut start = padded_start;
        let mut stop = padded_stop;
        let mut fell_back = false;

        match shape {
            TransitionShape::HeteroToSimple => {
                for &(position, side) in markers.iter().rev() {
                    match side {
                        Side::Before if position > start => {
                            start = position;
                            if stop != padded_stop {
                                break;
                            }
                        }
                        Side::After if position < stop => stop = position,
                        _ => {}
                    }
                }
                if stop < start {
                    stop = padded_stop + FALLBACK_OFFSET;
                    fell_back = true;
                    log::warn!("Refined stop precedes start for {}, stop moved past the padded interval", candidate.anchor);
                }
            }
            TransitionShape::SimpleToHetero | TransitionShape::Other => {
                for &(position, side) in markers.iter() {
                    match side {
                        Side::Before if position > start => start = position,
                        Side::After if position < stop => {
                            stop = position;
                            if start != padded_start {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                if stop < start {
                    fell_back = true;
                    if shape == TransitionShape::SimpleToHetero {
                        start = padded_start - FALLBACK_OFFSET;
                    } else {
                        start = candidate.co_start as i64;
                        stop = candidate.co_stop as i64;
                        log::warn!("Refined stop precedes start for {}, candidate bounds kept", candidate.anchor);
                    }
                }
            }
        }

        BorderOutcome {
            refined: RefinedCo {
                anchor: candidate.anchor.clone(),
                start,
                stop,
                pre_geno: pre,
                cur_geno: cur,
            },
            fell_back,
        }
    }

    /// Refine every candidate, keeping candidate order
    pub fn refine_all(&self, candidates: &AnchorMap<Candidate>) -> (Vec<RefinedCo>, usize) {
        let candidates: Vec<&Candidate> = candidates.values().collect();
        let outcomes: Vec<BorderOutcome> = candidates.par_iter().map(|c| self.refine(c)).collect();
        let fallbacks = outcomes.iter().filter(|o| o.fell_back).count();
        (outcomes.into_iter().map(|o| o.refined).collect(), fallbacks)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub passes: usize,
    pub merged: usize,
    pub cancelled: usize,
    pub inconsistent: usize,
}

fn merged_anchor(pre: &RefinedCo, co: &RefinedCo) -> AnchorKey {
    AnchorKey::at(pre.chromosome(), (pre.anchor.mean_window() + co.anchor.mean_window()) / 2.0)
}

/// One left-to-right pass; entries are emitted only when flushed
fn merge_pass(entries: Vec<RefinedCo>, stats: &mut MergeStats) -> Vec<RefinedCo> {
    let mut merged = Vec::with_capacity(entries.len());
    let mut pending: Option<RefinedCo> = None;

    for co in entries {
        let Some(pre) = pending.take() else {
            pending = Some(co);
            continue;
        };
        if pre.chromosome() != co.chromosome() {
            merged.push(pre);
            pending = Some(co);
            continue;
        }

        if co.start <= pre.stop {
            if pre.cur_geno == co.pre_geno {
                if pre.pre_geno == co.cur_geno {
                    // A>B then B>A over the same stretch: no crossover left
                    stats.cancelled += 1;
                } else {
                    stats.merged += 1;
                    pending = Some(RefinedCo {
                        anchor: merged_anchor(&pre, &co),
                        start: pre.start,
                        stop: co.stop,
                        pre_geno: pre.pre_geno,
                        cur_geno: co.cur_geno,
                    });
                }
            } else {
                stats.inconsistent += 1;
                log::warn!(
                    "Diff GENO: refined crossover {} overlaps {} with another genotype, dropped",
                    co.anchor,
                    pre.anchor
                );
                pending = Some(pre);
            }
        } else if co.start % 1000 == 0
            && co.pre_geno.covers(pre.pre_geno)
            && co.pre_geno.covers(pre.cur_geno)
            && pre.cur_geno == co.cur_geno
        {
            stats.merged += 1;
            pending = Some(RefinedCo {
                anchor: merged_anchor(&pre, &co),
                start: pre.start,
                stop: pre.stop,
                pre_geno: pre.pre_geno,
                cur_geno: co.cur_geno,
            });
        } else {
            merged.push(pre);
            pending = Some(co);
        }
    }

    if let Some(pre) = pending {
        merged.push(pre);
    }
    merged
}

/// Collapse overlapping or abutting refined intervals per chromosome.
///
/// Passes repeat until nothing changes, so applying it to its own output
/// returns that output unchanged.
pub fn remerge(entries: Vec<RefinedCo>) -> (Vec<RefinedCo>, MergeStats) {
    let mut stats = MergeStats::default();
    let mut current = entries;
    loop {
        let before = current.len();
        current = merge_pass(current, &mut stats);
        stats.passes += 1;
        if current.len() == before {
            return (current, stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DiploidCall;
    use Genotype::*;

    fn snp(position: u64, call: DiploidCall) -> OffspringSnp {
        OffspringSnp { chromosome: "Chr1".to_string(), position, call, ref_depth: 10, alt_depth: 10 }
    }

    fn candidate(co_start: u64, co_stop: u64, pre: Genotype, cur: Genotype) -> Candidate {
        Candidate {
            anchor: AnchorKey::between("Chr1", 5, 6),
            start_win: 5,
            stop_win: 6,
            co_start,
            co_stop,
            pre_geno: pre,
            cur_geno: cur,
        }
    }

    fn refined(mean: f64, start: i64, stop: i64, pre: Genotype, cur: Genotype) -> RefinedCo {
        RefinedCo { anchor: AnchorKey::at("Chr1", mean), start, stop, pre_geno: pre, cur_geno: cur }
    }

    #[test]
    fn test_simple_to_simple() {
        let snps: SnpCatalog<OffspringSnp> = vec![
            snp(210_000, DiploidCall::HomRef),
            snp(260_000, DiploidCall::HomRef),
            snp(270_000, DiploidCall::Het),
            snp(280_000, DiploidCall::HomAlt),
            snp(330_000, DiploidCall::HomAlt),
        ]
        .into_iter()
        .collect();
        let refiner = BorderRefiner::new(&snps, 50_000);
        let outcome = refiner.refine(&candidate(250_000, 300_000, HomoRef, HomoAlt));
        assert_eq!((outcome.refined.start, outcome.refined.stop), (260_000, 280_000));
        assert!(!outcome.fell_back);
    }

    #[test]
    fn test_simple_to_hetero_uses_opposite_parent() {
        let snps: SnpCatalog<OffspringSnp> = vec![
            snp(255_000, DiploidCall::HomRef),
            snp(265_000, DiploidCall::Het),
            snp(275_000, DiploidCall::HomAlt),
            snp(290_000, DiploidCall::HomAlt),
        ]
        .into_iter()
        .collect();
        let refiner = BorderRefiner::new(&snps, 50_000);
        let outcome = refiner.refine(&candidate(250_000, 300_000, HomoRef, Hetero));
        assert_eq!((outcome.refined.start, outcome.refined.stop), (255_000, 275_000));
    }

    #[test]
    fn test_hetero_to_simple_scans_backward() {
        let snps: SnpCatalog<OffspringSnp> = vec![
            snp(240_000, DiploidCall::HomRef),
            snp(250_000, DiploidCall::HomRef),
            snp(280_000, DiploidCall::HomAlt),
            snp(300_000, DiploidCall::HomAlt),
        ]
        .into_iter()
        .collect();
        let refiner = BorderRefiner::new(&snps, 50_000);
        let outcome = refiner.refine(&candidate(250_000, 300_000, Hetero, HomoAlt));
        // before-side type is the opposite of HomoAlt
        assert_eq!((outcome.refined.start, outcome.refined.stop), (250_000, 280_000));
    }

    #[test]
    fn test_inverted_bounds_fall_back() {
        // only an "after" SNP before the only "before" SNP
        let snps: SnpCatalog<OffspringSnp> =
            vec![snp(240_000, DiploidCall::HomAlt), snp(310_000, DiploidCall::HomRef)].into_iter().collect();
        let refiner = BorderRefiner::new(&snps, 50_000);

        let outcome = refiner.refine(&candidate(250_000, 300_000, HomoRef, HomoAlt));
        assert!(outcome.fell_back);
        assert_eq!((outcome.refined.start, outcome.refined.stop), (250_000, 300_000));

        let outcome = refiner.refine(&candidate(250_000, 300_000, HomoRef, Hetero));
        assert!(outcome.fell_back);
        assert_eq!(outcome.refined.start, 200_000 - FALLBACK_OFFSET);
    }

    #[test]
    fn test_remerge_cancels_palindrome() {
        let entries = vec![
            refined(5.5, 100_000, 200_000, HomoRef, HomoAlt),
            refined(7.5, 150_000, 250_000, HomoAlt, HomoRef),
            refined(20.5, 900_000, 950_000, HomoRef, Hetero),
        ];
        let (merged, stats) = remerge(entries);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].anchor.to_string(), "Chr1_20.5");
        assert_eq!(stats.cancelled, 1);
    }

    #[test]
    fn test_remerge_joins_chain() {
        let entries = vec![
            refined(5.5, 100_000, 200_000, HomoRef, Hetero),
            refined(7.5, 150_000, 250_000, Hetero, HomoAlt),
        ];
        let (merged, _) = remerge(entries);
        assert_eq!(merged, vec![refined(6.5, 100_000, 250_000, HomoRef, HomoAlt)]);
    }

    #[test]
    fn test_remerge_absorbs_distant_hetero_echo() {
        let entries = vec![
            refined(5.5, 100_000, 200_000, HomoRef, HomoAlt),
            refined(9.5, 300_000, 350_000, Hetero, HomoAlt),
        ];
        let (merged, stats) = remerge(entries);
        assert_eq!(merged, vec![refined(7.5, 100_000, 200_000, HomoRef, HomoAlt)]);
        assert_eq!(stats.merged, 1);

        // start off the kb grid: kept apart
        let entries = vec![
            refined(5.5, 100_000, 200_000, HomoRef, HomoAlt),
            refined(9.5, 300_500, 350_000, Hetero, HomoAlt),
        ];
        assert_eq!(remerge(entries).0.len(), 2);
    }

    #[test]
    fn test_remerge_drops_inconsistent_overlap() {
        let entries = vec![
            refined(5.5, 100_000, 200_000, HomoRef, HomoAlt),
            refined(7.5, 150_000, 250_000, HomoRef, Hetero),
            refined(12.5, 400_000, 450_000, HomoAlt, Hetero),
        ];
        let (merged, stats) = remerge(entries);
        assert_eq!(
            merged,
            vec![
                refined(5.5, 100_000, 200_000, HomoRef, HomoAlt),
                refined(12.5, 400_000, 450_000, HomoAlt, Hetero),
            ]
        );
        assert_eq!(stats.inconsistent, 1);
        assert!(merged.windows(2).all(|w| w[1].start > w[0].stop));
    }

    #[test]
    fn test_remerge_is_idempotent() {
        let entries = vec![
            refined(3.5, 10_000, 60_000, HomoRef, Hetero),
            refined(4.5, 50_000, 90_000, Hetero, HomoAlt),
            refined(6.0, 80_000, 120_000, HomoAlt, Hetero),
            refined(9.5, 300_000, 350_000, HomoAlt, Hetero),
            refined(12.5, 400_000, 450_000, Hetero, HomoAlt),
            refined(15.5, 500_000, 560_000, HomoAlt, HomoRef),
        ];
        let (once, _) = remerge(entries);
        let (twice, stats) = remerge(once.clone());
        assert_eq!(once, twice);
        assert_eq!(stats.passes, 1);
    }

    #[test]
    fn test_remerge_flushes_on_chromosome_change() {
        let mut second = refined(5.5, 150_000, 250_000, HomoAlt, HomoRef);
        second.anchor = AnchorKey::at("Chr2", 5.5);
        let entries = vec![refined(5.5, 100_000, 200_000, HomoRef, HomoAlt), second];
        let (merged, _) = remerge(entries.clone());
        assert_eq!(merged, entries);
    }
}
