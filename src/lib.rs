// lib.rs - codetect library root

//! # codetect - Meiotic crossover detection from offspring SNP genotypes
//!
//! This library locates crossover breakpoints along offspring chromosomes by
//! comparing offspring allele depths against parental markers. SNPs are grouped
//! into sliding windows, each window is genotyped from its allele ratios, calls
//! are smoothed over neighboring windows, and the smoothed genotype sequence is
//! scanned for stable transitions.
//!
//! ## Features
//!
//! - **Two window policies**: fixed physical size (kb, half-window sliding) or fixed SNP count
//! - **Pluggable callers**: probabilistic ratio indicators or a frequency threshold
//! - **Centromere masking**: pericentromeric windows never lend depth to their neighbors
//! - **NA bridging**: runs of uncalled windows between identical genotypes are ignored
//! - **Refinement**: finer-resolution re-scan, then SNP-level border refinement and re-merge
//! - **Parallel**: chromosomes and candidates are processed with rayon
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use codetect::prelude::*;
//!
//! let args: Args = argh::from_env();
//! let plan = validate_args(&args)?;
//! let summary = run_pipeline(&args, &plan, "codetect")?;
//! println!("{} crossovers", summary.stages.remerged);
//! # Ok::<(), String>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, Config, ValidationResult};
    pub use crate::core::crossover::{SupportThresholdFactory, FixedThreshold, EdgeRelaxedThreshold};
    pub use crate::core::genotype::{GenotypeCallerRegistry, ProbabilisticCaller, FrequencyThresholdCaller};
    pub use crate::core::{run_pipeline, scan_all, smooth, remerge, build_windows, normalize};
    pub use crate::core::{AnchorKey, AnchorMap, Candidate, CentromerePolicy, RefinedCo, WindowPolicy};
    pub use crate::core::{Genotype, GenotypeCaller, GenotypeLabels, SupportThreshold};
    pub use crate::data::{GenotypedWindow, OffspringSnp, ParentalSnp, SnpCatalog, WindowTable};
    pub use crate::output::RunSummary;
}

// Re-export main types at the root level for convenience
pub use cli::{Args, ValidationResult};
pub use core::{Candidate, Genotype, GenotypeLabels, RefinedCo, WindowPolicy};
pub use data::{GenotypedWindow, SnpCatalog, WindowTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "codetect v{} - Meiotic crossover detection with sliding-window genotypes",
        VERSION
    )
}
