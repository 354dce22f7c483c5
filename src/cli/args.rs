// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// codetect - Meiotic crossover detection from sliding-window offspring genotypes
pub struct Args {
    /// parental VCF (homozygous alternate markers of the mapping parent)
    #[argh(option)]
    pub parental_vcf: Option<String>,

    /// offspring VCF with GT and AD fields
    #[argh(option)]
    pub offspring_vcf: Option<String>,

    /// chromosome length table (chromosome<TAB>length)
    #[argh(option)]
    pub chr_lengths: Option<String>,

    /// centromere table (chromosome<TAB>left<TAB>right)
    #[argh(option)]
    pub centromeres: Option<String>,

    /// output directory
    #[argh(option)]
    pub outdir: Option<String>,

    /// label of the reference homozygous genotype (default: Ref)
    #[argh(option, default = "String::from(\"Ref\")")]
    pub genotype_ref: String,

    /// label of the alternate homozygous genotype (default: Alt)
    #[argh(option, default = "String::from(\"Alt\")")]
    pub genotype_alt: String,

    /// prefix prepended to bare chromosome names (default: Chr)
    #[argh(option, default = "String::from(\"Chr\")")]
    pub prefix_chr: String,

    /// window policy: physical, snp-count (default: physical)
    #[argh(option, default = "String::from(\"physical\")")]
    pub window_policy: String,

    /// physical window size in kb, even and at most 1000 (default: 100)
    #[argh(option, default = "100")]
    pub window_size: u64,

    /// finer physical window size in kb for precision refinement (physical policy)
    #[argh(option)]
    pub fine_window_size: Option<u64>,

    /// SNPs per window (snp-count policy, default: 20)
    #[argh(option, default = "20")]
    pub snps_per_window: usize,

    /// finer SNPs per window for precision refinement (snp-count policy)
    #[argh(option)]
    pub fine_snps_per_window: Option<usize>,

    /// minimum parental SNPs for a window to be genotyped (default: 16)
    #[argh(option, default = "16")]
    pub min_snps: usize,

    /// minimum total depth for a window to be genotyped (default: 10)
    #[argh(option, default = "10")]
    pub min_reads: u64,

    /// minimum ratio to call a homozygous genotype, in (0, 1) (default: 0.9)
    #[argh(option, default = "0.9")]
    pub min_homo_freq: f64,

    /// alternate ratio at or above which the frequency caller calls reference (default: 0.1)
    #[argh(option, default = "0.1")]
    pub no_ems_freq: f64,

    /// scaling factor applied to the callers' depth floors (default: 1.0)
    #[argh(option, default = "1.0")]
    pub depth_division: f64,

    /// genotype caller: probabilistic, frequency (default: probabilistic for physical, frequency for snp-count)
    #[argh(option)]
    pub caller: Option<String>,

    /// centromere handling during smoothing: mask-neighbors, mask-window, off (default: mask-neighbors)
    #[argh(option, default = "String::from(\"mask-neighbors\")")]
    pub centromere_policy: String,

    /// support threshold policy: edge-relaxed, fixed (default: edge-relaxed)
    #[argh(option, default = "String::from(\"edge-relaxed\")")]
    pub support_threshold: String,

    /// threshold parameters as key=value pairs, e.g. "edge=10,edge_support=2,support=5"
    #[argh(option, default = "String::new()")]
    pub threshold_params: String,

    /// padding in bp around coarse crossovers for precision refinement (default: 100000)
    #[argh(option, default = "100000")]
    pub precision_padding: u64,

    /// candidates closer than this many windows are flagged as possible double COs (default: 40)
    #[argh(option, default = "40.0")]
    pub proximity_windows: f64,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// include only chromosomes matching regex pattern
    #[argh(option)]
    pub include_chromosomes: Option<String>,

    /// exclude chromosomes matching regex pattern
    #[argh(option)]
    pub exclude_chromosomes: Option<String>,

    /// recompute window tables even when they already exist in the output directory
    #[argh(switch)]
    pub overwrite: bool,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// verbose diagnostics
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
