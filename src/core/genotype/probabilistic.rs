// probabilistic.rs - Ratio/indicator caller for physical-size windows

use super::traits::{
    Genotype, GenotypeCall, GenotypeCaller, GenotypeProbabilities, WindowDepths,
};

/// Minimum aggregate depth (scaled by the depth division threshold) before a label is assigned
pub const PROBABILISTIC_DEPTH_FLOOR: f64 = 1200.0;

/// Homozygous/heterozygous indicator caller.
///
/// The dominant allele ratio decides between homozygous and heterozygous:
/// a window is homozygous when the dominant ratio reaches `min_homo_freq`
/// or the minor ratio stays at or below `1 - min_homo_freq`. Equal non-zero
/// ratios are heterozygous. A label is only assigned once the total depth
/// clears `1200 * depth_division_threshold`.
#[derive(Debug, Clone)]
pub struct ProbabilisticCaller {
    min_homo_freq: f64,
    depth_division_threshold: f64,
}

impl ProbabilisticCaller {
    pub fn new(min_homo_freq: f64, depth_division_threshold: f64) -> Result<Self, String> {
        if min_homo_freq <= 0.0 || min_homo_freq >= 1.0 {
            return Err(format!(
                "Invalid homozygous frequency {}: must be between 0 and 1 (excluded)",
                min_homo_freq
            ));
        }
        if depth_division_threshold < 0.0 || !depth_division_threshold.is_finite() {
            return Err(format!(
                "Invalid depth division threshold {}: must be a non-negative number",
                depth_division_threshold
            ));
        }
        Ok(Self { min_homo_freq, depth_division_threshold })
    }

    fn indicators(&self, ref_ratio: f64, alt_ratio: f64) -> GenotypeProbabilities {
        let min_hetero_freq = 1.0 - self.min_homo_freq;
        let mut probs = GenotypeProbabilities { homo_ref: 0.0, hetero: 0.0, homo_alt: 0.0 };

        if ref_ratio > alt_ratio {
            if ref_ratio >= self.min_homo_freq || alt_ratio <= min_hetero_freq {
                probs.homo_ref = 1.0;
            } else {
                probs.hetero = 1.0;
            }
        } else if ref_ratio == alt_ratio && ref_ratio != 0.0 {
            probs.hetero = 1.0;
        } else if ref_ratio < alt_ratio {
            if alt_ratio >= self.min_homo_freq || ref_ratio <= min_hetero_freq {
                probs.homo_alt = 1.0;
            } else {
                probs.hetero = 1.0;
            }
        }

        probs
    }
}

impl GenotypeCaller for ProbabilisticCaller {
    fn name(&self) -> &'static str {
        "probabilistic"
    }

    fn description(&self) -> &'static str {
        "Homozygous/heterozygous indicator from allele ratios (physical-size windows)"
    }

    fn call(&self, depths: &WindowDepths) -> GenotypeCall {
        let (ref_ratio, alt_ratio) = depths.ratios();
        let probs = self.indicators(ref_ratio, alt_ratio);

        let mut genotype = Genotype::Unknown;
        if depths.total_depth > 0
            && depths.total_depth as f64 >= PROBABILISTIC_DEPTH_FLOOR * self.depth_division_threshold
        {
            if probs.homo_ref > probs.hetero && probs.homo_ref > probs.homo_alt {
                genotype = Genotype::HomoRef;
            } else if probs.homo_alt > probs.hetero && probs.homo_alt > probs.homo_ref {
                genotype = Genotype::HomoAlt;
            } else if probs.hetero > probs.homo_ref && probs.hetero > probs.homo_alt {
                genotype = Genotype::Hetero;
            }
        }

        GenotypeCall {
            ref_ratio,
            alt_ratio,
            probabilities: Some(probs),
            genotype,
        }
    }

    fn reports_probabilities(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller() -> ProbabilisticCaller {
        ProbabilisticCaller::new(0.9, 1.0).unwrap()
    }

    #[test]
    fn test_zero_depth_is_unknown() {
        let call = caller().call(&WindowDepths::new(0, 0, 0));
        assert_eq!(call.ref_ratio, 0.0);
        assert_eq!(call.alt_ratio, 0.0);
        assert_eq!(call.genotype, Genotype::Unknown);
        let probs = call.probabilities.unwrap();
        assert_eq!((probs.homo_ref, probs.hetero, probs.homo_alt), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_depth_floor_dominates_ratio() {
        let c = caller();
        let deep = c.call(&WindowDepths::new(1170, 130, 1300));
        assert_eq!((deep.ref_ratio, deep.alt_ratio), (0.9, 0.1));
        assert_eq!(deep.genotype, Genotype::HomoRef);

        let shallow = c.call(&WindowDepths::new(1079, 120, 1199));
        assert_eq!((shallow.ref_ratio, shallow.alt_ratio), (0.9, 0.1));
        assert_eq!(shallow.genotype, Genotype::Unknown);
        // the indicator is still computed below the floor
        assert_eq!(shallow.probabilities.unwrap().homo_ref, 1.0);
    }

    #[test]
    fn test_same_input_same_call() {
        let c = caller();
        let depths = WindowDepths::new(800, 700, 1500);
        assert_eq!(c.call(&depths), c.call(&depths));
    }

    #[test]
    fn test_heterozygous_calls() {
        let c = caller();
        assert_eq!(c.call(&WindowDepths::new(750, 750, 1500)).genotype, Genotype::Hetero);
        assert_eq!(c.call(&WindowDepths::new(900, 600, 1500)).genotype, Genotype::Hetero);
        assert_eq!(c.call(&WindowDepths::new(100, 1400, 1500)).genotype, Genotype::HomoAlt);
    }

    #[test]
    fn test_depth_division_scales_floor() {
        let c = ProbabilisticCaller::new(0.9, 0.5).unwrap();
        assert_eq!(c.call(&WindowDepths::new(600, 0, 600)).genotype, Genotype::HomoRef);
        assert_eq!(c.call(&WindowDepths::new(599, 0, 599)).genotype, Genotype::Unknown);
    }

    #[test]
    fn test_invalid_frequency_rejected() {
        assert!(ProbabilisticCaller::new(0.0, 1.0).is_err());
        assert!(ProbabilisticCaller::new(1.0, 1.0).is_err());
        assert!(ProbabilisticCaller::new(0.75, -1.0).is_err());
    }
}
