// frequency.rs - Alternate-allele frequency threshold caller (EMS lines)

use super::traits::{Genotype, GenotypeCall, GenotypeCaller, WindowDepths};

pub const FREQUENCY_DEPTH_FLOOR: f64 = 10.0;

/// Two-state caller for homozygous mutagenized lines: a window whose
/// alternate ratio reaches `no_ems_freq` carries the reference parent type,
/// otherwise the alternate type. There is no heterozygous state.
#[derive(Debug, Clone)]
pub struct FrequencyThresholdCaller {
    no_ems_freq: f64,
    depth_division_threshold: f64,
}

impl FrequencyThresholdCaller {
    pub fn new(no_ems_freq: f64, depth_division_threshold: f64) -> Result<Self, String> {
        if no_ems_freq <= 0.0 || no_ems_freq >= 1.0 {
            return Err(format!(
                "Invalid non-EMS frequency {}: must be between 0 and 1 (excluded)",
                no_ems_freq
            ));
        }
        if depth_division_threshold < 0.0 || !depth_division_threshold.is_finite() {
            return Err(format!(
                "Invalid depth division threshold {}: must be a non-negative number",
                depth_division_threshold
            ));
        }
        Ok(Self { no_ems_freq, depth_division_threshold })
    }
}

impl GenotypeCaller for FrequencyThresholdCaller {
    fn name(&self) -> &'static str {
        "frequency"
    }

    fn description(&self) -> &'static str {
        "Alternate-ratio threshold, no heterozygous state (fixed-SNP-count windows)"
    }

    fn call(&self, depths: &WindowDepths) -> GenotypeCall {
        let (ref_ratio, alt_ratio) = depths.ratios();

        let genotype = if depths.total_depth > 0
            && depths.total_depth as f64 >= FREQUENCY_DEPTH_FLOOR * self.depth_division_threshold
        {
            if alt_ratio >= self.no_ems_freq {
                Genotype::HomoRef
            } else {
                Genotype::HomoAlt
            }
        } else {
            Genotype::Unknown
        };

        GenotypeCall {
            ref_ratio,
            alt_ratio,
            probabilities: None,
            genotype,
        }
    }

    fn reports_probabilities(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_split() {
        let caller = FrequencyThresholdCaller::new(0.1, 1.0).unwrap();
        assert_eq!(caller.call(&WindowDepths::new(90, 10, 100)).genotype, Genotype::HomoRef);
        assert_eq!(caller.call(&WindowDepths::new(95, 5, 100)).genotype, Genotype::HomoAlt);
        assert!(caller.call(&WindowDepths::new(95, 5, 100)).probabilities.is_none());
    }

    #[test]
    fn test_depth_floor() {
        let caller = FrequencyThresholdCaller::new(0.1, 1.0).unwrap();
        assert_eq!(caller.call(&WindowDepths::new(5, 4, 9)).genotype, Genotype::Unknown);
        assert_eq!(caller.call(&WindowDepths::new(5, 5, 10)).genotype, Genotype::HomoRef);
    }

    #[test]
    fn test_zero_depth_unknown_even_without_floor() {
        let caller = FrequencyThresholdCaller::new(0.1, 0.0).unwrap();
        let call = caller.call(&WindowDepths::default());
        assert_eq!(call.genotype, Genotype::Unknown);
        assert_eq!((call.ref_ratio, call.alt_ratio), (0.0, 0.0));
    }
}
