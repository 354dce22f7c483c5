// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub parental_vcf: Option<String>,
    pub offspring_vcf: Option<String>,
    pub chr_lengths: Option<String>,
    pub centromeres: Option<String>,
    pub outdir: Option<String>,

    // Labels
    pub genotype_ref: Option<String>,
    pub genotype_alt: Option<String>,
    pub prefix_chr: Option<String>,

    // Windows
    pub window_policy: Option<String>,
    pub window_size: Option<u64>,
    pub fine_window_size: Option<u64>,
    pub snps_per_window: Option<usize>,
    pub fine_snps_per_window: Option<usize>,

    // Genotype calling
    pub caller: Option<String>,
    pub min_snps: Option<usize>,
    pub min_reads: Option<u64>,
    pub min_homo_freq: Option<f64>,
    pub no_ems_freq: Option<f64>,
    pub depth_division: Option<f64>,

    // Scanning
    pub centromere_policy: Option<String>,
    pub support_threshold: Option<String>,
    pub threshold_params: Option<String>,
    pub precision_padding: Option<u64>,
    pub proximity_windows: Option<f64>,

    // Run control
    pub threads: Option<usize>,
    pub include_chromosomes: Option<String>,
    pub exclude_chromosomes: Option<String>,
    pub overwrite: Option<bool>,
    pub dry_run: Option<bool>,
    pub verbose: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# codetect.toml - Configuration file for codetect
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

parental_vcf = "/path/to/parent.vcf"
offspring_vcf = "/path/to/offspring.vcf"

# chromosome<TAB>length, no header
chr_lengths = "/path/to/chromosome_lengths.tsv"

# chromosome<TAB>left<TAB>right, header row allowed
centromeres = "/path/to/centromeres.tsv"

outdir = "results/"

# =============================================================================
# LABELS
# =============================================================================

# Labels of the two parental homozygous genotypes; heterozygous is "ref/alt"
genotype_ref = "Col"
genotype_alt = "Ler"

# Prefix prepended to bare chromosome names (1 -> Chr1)
prefix_chr = "Chr"

# =============================================================================
# WINDOWS
# =============================================================================

# Window policy: physical, snp-count
window_policy = "physical"

# Physical window size in kb (even, at most 1000); windows slide by half
window_size = 100

# Finer window size in kb; enables precision refinement of each candidate
# fine_window_size = 20

# SNP-count policy
snps_per_window = 20
# fine_snps_per_window = 10

# =============================================================================
# GENOTYPE CALLING
# =============================================================================

# Caller: probabilistic, frequency (default depends on the window policy)
# caller = "probabilistic"

# A window is genotyped only with enough parental SNPs and reads
min_snps = 16
min_reads = 10

# Homozygous ratio threshold for the probabilistic caller, in (0, 1)
min_homo_freq = 0.9

# Alternate ratio threshold for the frequency caller
no_ems_freq = 0.1

# Scales the depth floor of both callers (1200 and 10 reads)
depth_division = 1.0

# =============================================================================
# SCANNING
# =============================================================================

# Centromere handling: mask-neighbors, mask-window, off
centromere_policy = "mask-neighbors"

# Support threshold: edge-relaxed, fixed
support_threshold = "edge-relaxed"
threshold_params = "edge=10,edge_support=2,support=5"

# Padding in bp around coarse candidates for precision refinement
precision_padding = 100000

# Candidates closer than this many windows are reported in Warnings_dbCO.txt
proximity_windows = 40.0

# =============================================================================
# RUN CONTROL
# =============================================================================

# Number of threads (omit for auto-detection)
# threads = 8

# include_chromosomes = "^Chr[1-5]$"
# exclude_chromosomes = "ChrM|ChrC"

# Recompute window tables already present in outdir
overwrite = false

# Validate inputs without computation (dry run)
dry_run = false

verbose = false
"#
        .to_string()
    }
}
