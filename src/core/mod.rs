// mod.rs - Core logic module

pub mod border;
pub mod crossover;
pub mod genotype;
pub mod pipeline;
pub mod precision;
pub mod proximity;
pub mod smoothing;
pub mod windows;

// Re-export main types for convenience
pub use border::{remerge, BorderRefiner, MergeStats, RefinedCo};
pub use crossover::{scan_all, AnchorKey, AnchorMap, Candidate, DoubleCoRecord, ScanResult, SupportThreshold};
pub use genotype::{Genotype, GenotypeCaller, GenotypeLabels};
pub use pipeline::run_pipeline;
pub use precision::PrecisionRefiner;
pub use proximity::proximity_warnings;
pub use smoothing::{smooth, CentromerePolicy};
pub use windows::{build_windows, normalize, WindowPolicy};
