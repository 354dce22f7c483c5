// mod.rs - Window genotype calling

pub mod frequency;
pub mod probabilistic;
pub mod registry;
pub mod traits;

pub use frequency::FrequencyThresholdCaller;
pub use probabilistic::ProbabilisticCaller;
pub use registry::{CallerSettings, GenotypeCallerRegistry};
pub use traits::{
    round_to, Genotype, GenotypeCall, GenotypeCaller, GenotypeLabels, GenotypeProbabilities,
    WindowDepths, UNKNOWN_LABEL,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        let labels = GenotypeLabels::new("Col", "Ct").unwrap();
        for genotype in [Genotype::HomoRef, Genotype::HomoAlt, Genotype::Hetero, Genotype::Unknown] {
            assert_eq!(labels.parse(&labels.label(genotype)).unwrap(), genotype);
        }
        assert_eq!(labels.label(Genotype::Hetero), "Col/Ct");
        assert_eq!(labels.parse("Ct/Col").unwrap(), Genotype::Hetero);
        assert!(labels.parse("Ler").is_err());
    }

    #[test]
    fn test_invalid_labels() {
        assert!(GenotypeLabels::new("Col", "Col").is_err());
        assert!(GenotypeLabels::new("Col/x", "Ct").is_err());
        assert!(GenotypeLabels::new("", "Ct").is_err());
        assert!(GenotypeLabels::new("NA", "Ct").is_err());
    }

    #[test]
    fn test_covers_and_opposite() {
        assert!(Genotype::Hetero.covers(Genotype::HomoRef));
        assert!(Genotype::Hetero.covers(Genotype::HomoAlt));
        assert!(Genotype::HomoRef.covers(Genotype::HomoRef));
        assert!(!Genotype::HomoRef.covers(Genotype::HomoAlt));
        assert!(!Genotype::HomoRef.covers(Genotype::Hetero));
        assert_eq!(Genotype::HomoRef.opposite(), Genotype::HomoAlt);
        assert_eq!(Genotype::Hetero.opposite(), Genotype::Hetero);
    }
}
