// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::core::crossover::{SupportThreshold, SupportThresholdFactory};
use crate::core::genotype::{CallerSettings, GenotypeCaller, GenotypeCallerRegistry, GenotypeLabels};
use crate::core::smoothing::CentromerePolicy;
use crate::core::windows::WindowPolicy;
use regex::Regex;
use std::str::FromStr;

pub struct ValidationResult {
    pub window_policy: WindowPolicy,
    pub fine_policy: Option<WindowPolicy>,
    pub caller: Box<dyn GenotypeCaller>,
    pub threshold: Box<dyn SupportThreshold>,
    pub centromere_policy: CentromerePolicy,
    pub labels: GenotypeLabels,
    pub chromosome_include_regex: Option<Regex>,
    pub chromosome_exclude_regex: Option<Regex>,
}

impl ValidationResult {
    /// Chromosome selection from the include/exclude patterns
    pub fn keeps_chromosome(&self, chromosome: &str) -> bool {
        if let Some(include) = &self.chromosome_include_regex {
            if !include.is_match(chromosome) {
                return false;
            }
        }
        if let Some(exclude) = &self.chromosome_exclude_regex {
            if exclude.is_match(chromosome) {
                return false;
            }
        }
        true
    }
}

fn open_unit_interval(value: f64, name: &str) -> Result<(), String> {
    if value <= 0.0 || value >= 1.0 || value.is_nan() {
        return Err(format!("{} must be strictly between 0.0 and 1.0 (got {})", name, value));
    }
    Ok(())
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    // Validate window policy and the optional finer resolution
    let (window_policy, fine_policy) = match args.window_policy.as_str() {
        "physical" => {
            if args.fine_snps_per_window.is_some() {
                return Err("--fine-snps-per-window requires --window-policy snp-count".to_string());
            }
            let policy = WindowPolicy::physical(args.window_size)?;
            let fine = match args.fine_window_size {
                Some(kb) if kb >= args.window_size => {
                    return Err(format!(
                        "Fine window size ({} kb) must be smaller than the window size ({} kb)",
                        kb, args.window_size
                    ))
                }
                Some(kb) => Some(WindowPolicy::physical(kb)?),
                None => None,
            };
            (policy, fine)
        }
        "snp-count" => {
            if args.fine_window_size.is_some() {
                return Err("--fine-window-size requires --window-policy physical".to_string());
            }
            let policy = WindowPolicy::snp_count(args.snps_per_window)?;
            let fine = match args.fine_snps_per_window {
                Some(n) if n >= args.snps_per_window => {
                    return Err(format!(
                        "Fine SNPs per window ({}) must be smaller than SNPs per window ({})",
                        n, args.snps_per_window
                    ))
                }
                Some(n) => Some(WindowPolicy::snp_count(n)?),
                None => None,
            };
            (policy, fine)
        }
        other => {
            return Err(format!(
                "Invalid window policy '{}'. Available: physical, snp-count",
                other
            ))
        }
    };

    // Validate thresholds
    open_unit_interval(args.min_homo_freq, "Minimum homozygous frequency")?;
    open_unit_interval(args.no_ems_freq, "Frequency caller threshold")?;
    if args.depth_division <= 0.0 || !args.depth_division.is_finite() {
        return Err(format!("Depth division must be a positive number (got {})", args.depth_division));
    }
    if args.proximity_windows <= 0.0 || !args.proximity_windows.is_finite() {
        return Err(format!("Proximity windows must be a positive number (got {})", args.proximity_windows));
    }
    if args.window_size == 0 {
        return Err("Window size must be greater than 0".to_string());
    }

    // Genotype caller, defaulting by window policy
    let caller_name = args.caller.clone().unwrap_or_else(|| match window_policy {
        WindowPolicy::Physical { .. } => "probabilistic".to_string(),
        WindowPolicy::SnpCount { .. } => "frequency".to_string(),
    });
    let settings = CallerSettings {
        min_homo_freq: args.min_homo_freq,
        no_ems_freq: args.no_ems_freq,
        depth_division_threshold: args.depth_division,
    };
    let caller = GenotypeCallerRegistry::create(&caller_name, &settings)?;

    let threshold = SupportThresholdFactory::create(&args.support_threshold, &args.threshold_params)?;
    let centromere_policy = CentromerePolicy::from_str(&args.centromere_policy)?;
    let labels = GenotypeLabels::new(&args.genotype_ref, &args.genotype_alt)?;

    // Compile regex patterns
    let chromosome_include_regex = if let Some(pattern) = &args.include_chromosomes {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid include_chromosomes regex: {}", e))?)
    } else {
        None
    };

    let chromosome_exclude_regex = if let Some(pattern) = &args.exclude_chromosomes {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid exclude_chromosomes regex: {}", e))?)
    } else {
        None
    };

    Ok(ValidationResult {
        window_policy,
        fine_policy,
        caller,
        threshold,
        centromere_policy,
        labels,
        chromosome_include_regex,
        chromosome_exclude_regex,
    })
}
