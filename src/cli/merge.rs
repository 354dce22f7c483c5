// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

/// Replace `current` with the file value only while it still holds the CLI default
fn override_default<T: PartialEq>(current: &mut T, default: T, from_config: Option<T>) {
    if let Some(value) = from_config {
        if *current == default {
            *current = value;
        }
    }
}

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.parental_vcf.is_none() {
            self.parental_vcf = config.parental_vcf;
        }
        if self.offspring_vcf.is_none() {
            self.offspring_vcf = config.offspring_vcf;
        }
        if self.chr_lengths.is_none() {
            self.chr_lengths = config.chr_lengths;
        }
        if self.centromeres.is_none() {
            self.centromeres = config.centromeres;
        }
        if self.outdir.is_none() {
            self.outdir = config.outdir;
        }

        // Labels (only override defaults, not explicit CLI values)
        override_default(&mut self.genotype_ref, "Ref".to_string(), config.genotype_ref);
        override_default(&mut self.genotype_alt, "Alt".to_string(), config.genotype_alt);
        override_default(&mut self.prefix_chr, "Chr".to_string(), config.prefix_chr);

        // Windows
        override_default(&mut self.window_policy, "physical".to_string(), config.window_policy);
        override_default(&mut self.window_size, 100, config.window_size);
        override_default(&mut self.snps_per_window, 20, config.snps_per_window);
        if self.fine_window_size.is_none() {
            self.fine_window_size = config.fine_window_size;
        }
        if self.fine_snps_per_window.is_none() {
            self.fine_snps_per_window = config.fine_snps_per_window;
        }

        // Genotype calling
        if self.caller.is_none() {
            self.caller = config.caller;
        }
        override_default(&mut self.min_snps, 16, config.min_snps);
        override_default(&mut self.min_reads, 10, config.min_reads);
        override_default(&mut self.min_homo_freq, 0.9, config.min_homo_freq);
        override_default(&mut self.no_ems_freq, 0.1, config.no_ems_freq);
        override_default(&mut self.depth_division, 1.0, config.depth_division);

        // Scanning
        override_default(&mut self.centromere_policy, "mask-neighbors".to_string(), config.centromere_policy);
        override_default(&mut self.support_threshold, "edge-relaxed".to_string(), config.support_threshold);
        override_default(&mut self.threshold_params, String::new(), config.threshold_params);
        override_default(&mut self.precision_padding, 100_000, config.precision_padding);
        override_default(&mut self.proximity_windows, 40.0, config.proximity_windows);

        // Run control
        if self.threads.is_none() {
            self.threads = config.threads;
        }
        if self.include_chromosomes.is_none() {
            self.include_chromosomes = config.include_chromosomes;
        }
        if self.exclude_chromosomes.is_none() {
            self.exclude_chromosomes = config.exclude_chromosomes;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.overwrite && config.overwrite.unwrap_or(false) {
            self.overwrite = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }
        if !self.verbose && config.verbose.unwrap_or(false) {
            self.verbose = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["codetect"], args).unwrap()
    }

    #[test]
    fn test_cli_values_win() {
        let args = parse(&["--window-size", "200", "--outdir", "cli_out"]);
        let config = Config {
            window_size: Some(50),
            outdir: Some("config_out".to_string()),
            min_snps: Some(8),
            genotype_ref: Some("Col".to_string()),
            ..Config::new()
        };
        let merged = args.merge_with_config(config);
        assert_eq!(merged.window_size, 200);
        assert_eq!(merged.outdir.as_deref(), Some("cli_out"));
        assert_eq!(merged.min_snps, 8);
        assert_eq!(merged.genotype_ref, "Col");
    }

    #[test]
    fn test_flags_from_config() {
        let config = Config {
            overwrite: Some(true),
            dry_run: Some(false),
            fine_window_size: Some(20),
            ..Config::new()
        };
        let merged = parse(&[]).merge_with_config(config);
        assert!(merged.overwrite);
        assert!(!merged.dry_run);
        assert_eq!(merged.fine_window_size, Some(20));
    }
}
