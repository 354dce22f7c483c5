// proximity.rs - Flag candidate crossovers lying suspiciously close together

use crate::core::crossover::{AnchorKey, AnchorMap, Candidate};

pub const DEFAULT_PROXIMITY_WINDOWS: f64 = 40.0;

/// Two consecutive candidates closer than the proximity limit
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityWarning {
    pub previous: AnchorKey,
    pub current: AnchorKey,
    pub distance: f64,
}

impl ProximityWarning {
    pub fn message(&self) -> String {
        format!(
            "Warning: CO at {} is only {} windows away from CO at {}. Possible double CO event.",
            self.current, self.distance as i64, self.previous
        )
    }
}

#[derive(Debug, Default)]
pub struct ProximityReport {
    pub warnings: Vec<ProximityWarning>,
    /// Every candidate involved in at least one warning, in scan order
    pub flagged: AnchorMap<Candidate>,
}

impl ProximityReport {
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Compare each candidate with the one before it on the same chromosome
pub fn proximity_warnings(candidates: &AnchorMap<Candidate>, min_windows: f64) -> ProximityReport {
    let mut report = ProximityReport::default();
    let mut previous: Option<&Candidate> = None;

    for candidate in candidates.values() {
        if let Some(pre) = previous {
            if pre.chromosome() == candidate.chromosome() {
                let distance = candidate.anchor.mean_window() - pre.anchor.mean_window();
                if distance < min_windows {
                    report.warnings.push(ProximityWarning {
                        previous: pre.anchor.clone(),
                        current: candidate.anchor.clone(),
                        distance,
                    });
                    report.flagged.insert(pre.anchor.clone(), pre.clone());
                    report.flagged.insert(candidate.anchor.clone(), candidate.clone());
                }
            }
        }
        previous = Some(candidate);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::genotype::Genotype;

    fn candidate(chromosome: &str, left: i64) -> Candidate {
        Candidate {
            anchor: AnchorKey::between(chromosome, left, left + 1),
            start_win: left as usize,
            stop_win: left as usize + 1,
            co_start: 0,
            co_stop: 0,
            pre_geno: Genotype::HomoRef,
            cur_geno: Genotype::Hetero,
        }
    }

    #[test]
    fn test_close_candidates_flagged() {
        let candidates = AnchorMap::from_candidates(vec![
            candidate("Chr1", 10),
            candidate("Chr1", 30),
            candidate("Chr1", 100),
            candidate("Chr2", 105),
        ]);
        let report = proximity_warnings(&candidates, DEFAULT_PROXIMITY_WINDOWS);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.flagged.len(), 2);
        assert_eq!(report.warnings[0].distance, 20.0);
        assert!(report.warnings[0].message().contains("Chr1_30.5"));
    }

    #[test]
    fn test_chain_flags_each_candidate_once() {
        let candidates = AnchorMap::from_candidates(vec![
            candidate("Chr1", 10),
            candidate("Chr1", 20),
            candidate("Chr1", 30),
        ]);
        let report = proximity_warnings(&candidates, DEFAULT_PROXIMITY_WINDOWS);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.flagged.len(), 3);
    }

    #[test]
    fn test_other_chromosome_not_compared() {
        let candidates = AnchorMap::from_candidates(vec![candidate("Chr1", 10), candidate("Chr2", 12)]);
        assert!(proximity_warnings(&candidates, DEFAULT_PROXIMITY_WINDOWS).is_empty());
    }
}
