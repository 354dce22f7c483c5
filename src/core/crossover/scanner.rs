// scanner.rs - Genotype-transition scan over smoothed windows

use super::{AnchorKey, AnchorMap, Candidate, DoubleCoRecord, DoubleCoStatus, PairContext, SupportThreshold};
use crate::core::genotype::{Genotype, GenotypeLabels};
use crate::data::{GenotypedWindow, WindowTable};
use rayon::prelude::*;
use std::ops::RangeInclusive;

/// Two consecutive windows and the support required at this position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPair {
    pub start_win: usize,
    pub stop_win: usize,
    pub geno_start: Genotype,
    pub geno_stop: Genotype,
    pub threshold: usize,
}

/// Confirmed transition, in window indices.
/// `terminal_win` may fall outside the chromosome and is clamped by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emission {
    pub pre_win: usize,
    pub terminal_win: i64,
    pub pre_geno: Genotype,
    pub cur_geno: Genotype,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    pub emission: Option<Emission>,
    /// Homozygous-to-homozygous change at this pair, confirmed or not
    pub transition: Option<WindowPair>,
}

/// Per-chromosome scan state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerState {
    /// Consecutive windows supporting the current genotype
    pub current_support: usize,
    /// Support restored when a run resumed after `NA` turns out unconfirmed
    pub rollback_support: usize,
    /// Last confirmed genotype and the window its run ended on
    pub previous: Option<(Genotype, usize)>,
    pub na_count: usize,
    pub support_before_na: usize,
    /// Genotype and window just before the current `NA` run
    pub before_na: Option<(Genotype, usize)>,
}

impl Default for ScannerState {
    fn default() -> Self {
        Self {
            current_support: 1,
            rollback_support: 1,
            previous: None,
            na_count: 0,
            support_before_na: 0,
            before_na: None,
        }
    }
}

impl ScannerState {
    /// First window of the arriving run; NA windows folded into a
    /// partially supported run are excluded.
    fn terminal_window(&self, stop_win: usize, threshold: usize) -> i64 {
        let mut terminal = stop_win as i64 - self.current_support as i64 + 1;
        if self.support_before_na != 0 && self.support_before_na < threshold {
            terminal -= self.na_count as i64;
        }
        terminal
    }

    fn reset_after_emission(&mut self) {
        self.previous = None;
        self.na_count = 0;
        self.support_before_na = 0;
    }

    /// Advance over one window pair
    pub fn step(mut self, pair: &WindowPair) -> (Self, StepOutput) {
        let mut output = StepOutput::default();
        let (s, t, threshold) = (pair.geno_start, pair.geno_stop, pair.threshold);

        if s == t {
            if s.is_unknown() {
                self.na_count += 1;
                return (self, output);
            }
            self.current_support += 1;
            match self.previous {
                Some((pre_geno, _)) if pre_geno == s => {}
                Some((pre_geno, pre_win)) if self.current_support >= threshold => {
                    output.emission = Some(Emission {
                        pre_win,
                        terminal_win: self.terminal_window(pair.stop_win, threshold),
                        pre_geno,
                        cur_geno: t,
                    });
                    self.reset_after_emission();
                }
                _ => {}
            }
            return (self, output);
        }

        if !s.is_unknown() && t.is_unknown() {
            self.before_na = Some((s, pair.start_win));
            self.na_count = 1;
            self.support_before_na = self.current_support;
            return (self, output);
        }

        if s.is_unknown() {
            if self.before_na.map(|(geno, _)| geno) == Some(t) {
                // the NA run closes on the genotype it interrupted
                self.current_support += 1;
                self.support_before_na = self.current_support;
                if self.support_before_na >= threshold {
                    if let Some((pre_geno, pre_win)) = self.previous.filter(|(geno, _)| *geno != t) {
                        output.emission = Some(Emission {
                            pre_win,
                            terminal_win: pair.stop_win as i64
                                - self.current_support as i64
                                - self.na_count as i64
                                + 1,
                            pre_geno,
                            cur_geno: t,
                        });
                        self.reset_after_emission();
                        self.before_na = None;
                    }
                }
                return (self, output);
            }

            if self.current_support >= threshold {
                self.previous = self.before_na.take();
            } else {
                self.current_support = self.rollback_support;
                self.support_before_na = 0;
                self.before_na = None;
                return (self, output);
            }
        } else if self.current_support >= threshold {
            self.previous = Some((s, pair.start_win));
            self.support_before_na = 0;
            self.rollback_support = self.current_support;
        }

        self.current_support = 1;

        if s.is_simple() && t.is_simple() {
            output.transition = Some(*pair);
        }

        if let Some((pre_geno, pre_win)) = self.previous {
            if self.current_support >= threshold {
                output.emission = Some(Emission {
                    pre_win,
                    terminal_win: self.terminal_window(pair.stop_win, threshold),
                    pre_geno,
                    cur_geno: t,
                });
                self.reset_after_emission();
            }
        }

        (self, output)
    }
}

/// Candidates and diagnostics of one scan
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub candidates: AnchorMap<Candidate>,
    pub double_cos: AnchorMap<DoubleCoRecord>,
}

impl ScanResult {
    pub fn merge(&mut self, other: ScanResult) {
        self.candidates
            .extend(other.candidates.into_values().map(|c| (c.anchor.clone(), c)));
        self.double_cos
            .extend(other.double_cos.into_values().map(|d| (d.anchor.clone(), d)));
    }

    /// Print every recorded double-CO as one batch warning
    pub fn warn_double_cos(&self, labels: &GenotypeLabels) {
        if self.double_cos.is_empty() {
            return;
        }
        let lines: Vec<String> = self.double_cos.values().map(|d| d.describe(labels)).collect();
        log::warn!(
            "Be careful, some double COs has been found during the analysis :\n{}",
            lines.join("\n")
        );
    }
}

/// Scan the pairs `(w, w + 1)` for `w` in `range` (window indices, the last
/// pair ending on `range.end()`).
///
/// `windows` is the whole chromosome so that a breakpoint can be placed on a
/// window outside the scanned range.
pub fn scan_windows(
    windows: &[GenotypedWindow],
    range: RangeInclusive<usize>,
    threshold: &dyn SupportThreshold,
) -> ScanResult {
    let mut result = ScanResult::default();
    let nb_windows = windows.len();
    let Some(first) = windows.first() else {
        return result;
    };
    let chromosome = first.bounds.key.chromosome.clone();
    let genotypes: Vec<Genotype> = windows.iter().map(|w| w.call.genotype).collect();

    let first_win = (*range.start()).max(1);
    let last_win = (*range.end()).min(nb_windows);
    let mut state = ScannerState::default();

    for start_win in first_win..last_win {
        let stop_win = start_win + 1;
        let context = PairContext {
            start_win,
            stop_win,
            nb_windows,
            geno_start: genotypes[start_win - 1],
            geno_stop: genotypes[stop_win - 1],
            genotypes: &genotypes,
        };
        let pair = WindowPair {
            start_win,
            stop_win,
            geno_start: context.geno_start,
            geno_stop: context.geno_stop,
            threshold: threshold.required_support(&context),
        };

        let (next, output) = state.step(&pair);
        state = next;

        if let Some(transition) = output.transition {
            let anchor = AnchorKey::between(&chromosome, transition.start_win as i64, transition.stop_win as i64);
            result.double_cos.insert(
                anchor.clone(),
                DoubleCoRecord {
                    anchor,
                    start_win: transition.start_win,
                    stop_win: transition.stop_win,
                    pre_geno: transition.geno_start,
                    cur_geno: transition.geno_stop,
                    status: DoubleCoStatus::NotSupported,
                },
            );
        }

        if let Some(emission) = output.emission {
            let candidate = build_candidate(&chromosome, windows, &emission);
            if !candidate.pre_geno.is_hetero() && !candidate.cur_geno.is_hetero() {
                result.double_cos.insert(
                    candidate.anchor.clone(),
                    DoubleCoRecord {
                        anchor: candidate.anchor.clone(),
                        start_win: candidate.start_win,
                        stop_win: candidate.stop_win,
                        pre_geno: candidate.pre_geno,
                        cur_geno: candidate.cur_geno,
                        status: DoubleCoStatus::Supported,
                    },
                );
            }
            result.candidates.insert(candidate.anchor.clone(), candidate);
        }
    }

    result
}

fn build_candidate(chromosome: &str, windows: &[GenotypedWindow], emission: &Emission) -> Candidate {
    let nb_windows = windows.len() as i64;
    let terminal = emission.terminal_win.clamp(1, nb_windows.max(1)) as usize;
    if terminal as i64 != emission.terminal_win {
        log::debug!(
            "Breakpoint window {} of {} clamped to {}",
            emission.terminal_win,
            chromosome,
            terminal
        );
    }
    let pre_win = emission.pre_win.clamp(1, windows.len());

    Candidate {
        anchor: AnchorKey::between(chromosome, pre_win as i64, terminal as i64),
        start_win: pre_win,
        stop_win: terminal,
        co_start: windows[pre_win - 1].bounds.midpoint(),
        co_stop: windows[terminal - 1].bounds.midpoint(),
        pre_geno: emission.pre_geno,
        cur_geno: emission.cur_geno,
    }
}

/// Scan every chromosome of `table`, one chromosome per task; results are
/// merged back in table order.
pub fn scan_all(table: &WindowTable<GenotypedWindow>, threshold: &dyn SupportThreshold) -> ScanResult {
    let chromosomes: Vec<&str> = table.chromosomes().collect();
    let per_chromosome: Vec<ScanResult> = chromosomes
        .par_iter()
        .map(|&chromosome| {
            let windows = table.chromosome(chromosome);
            scan_windows(windows, 1..=windows.len(), threshold)
        })
        .collect();

    let mut result = ScanResult::default();
    for scan in per_chromosome {
        result.merge(scan);
    }
    result
}
