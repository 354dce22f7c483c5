// pipeline.rs - One crossover detection run, from input files to output tables

use crate::cli::{Args, ValidationResult};
use crate::core::border::{remerge, BorderRefiner};
use crate::core::crossover::{scan_all, FixedThreshold};
use crate::core::precision::PrecisionRefiner;
use crate::core::proximity::proximity_warnings;
use crate::core::smoothing::smooth;
use crate::core::windows::{build_windows, normalize, sliding_size, WindowPolicy};
use crate::data::loaders::{self, IngestionStats, OffspringIngestion};
use crate::data::{Centromeres, ChromosomeLengths, GenotypedWindow, ParentalSnp, SnpCatalog, WindowTable};
use crate::output::{self, RunSummary};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Everything read from the input files, restricted to the selected chromosomes
pub struct RunInputs {
    pub chromosomes: Vec<String>,
    pub lengths: ChromosomeLengths,
    pub centromeres: Centromeres,
    pub parental: SnpCatalog<ParentalSnp>,
    pub offspring: OffspringIngestion,
}

/// Genotyped windows of one resolution
pub struct ResolutionTables {
    pub smoothed: WindowTable<GenotypedWindow>,
    /// `None` when the smoothed table was reused from a previous run
    pub na_normalized: Option<usize>,
    pub reused: bool,
}

fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str, String> {
    value.as_deref().ok_or_else(|| format!("{} is required", flag))
}

fn count_na(table: &WindowTable<GenotypedWindow>) -> usize {
    table.iter().filter(|w| w.call.genotype.is_unknown()).count()
}

/// Load every input and apply the chromosome selection
pub fn load_inputs(args: &Args, plan: &ValidationResult) -> Result<RunInputs, String> {
    let prefix = args.prefix_chr.as_str();
    let lengths_path = required(&args.chr_lengths, "--chr-lengths")?;
    let parental_path = required(&args.parental_vcf, "--parental-vcf")?;
    let offspring_path = required(&args.offspring_vcf, "--offspring-vcf")?;

    let lengths = loaders::load_chromosome_lengths(Path::new(lengths_path), prefix)?;
    let centromeres = match &args.centromeres {
        Some(path) => loaders::load_centromeres(Path::new(path), prefix)?,
        None => {
            log::warn!("No centromere table given, smoothing runs without masking");
            Centromeres::new()
        }
    };

    let chromosomes: Vec<String> = lengths
        .chromosomes()
        .filter(|c| plan.keeps_chromosome(c))
        .map(|c| c.to_string())
        .collect();
    if chromosomes.is_empty() {
        return Err("No chromosome left after applying the include/exclude patterns".to_string());
    }
    println!("🧬 Chromosomes: {} selected of {}", chromosomes.len(), lengths.len());

    let mut parental = loaders::load_parental_vcf(Path::new(parental_path), prefix)?;
    let mut offspring = loaders::load_offspring_vcf(Path::new(offspring_path), prefix, &parental)?;

    let selected = |c: &str| chromosomes.iter().any(|s| s == c);
    let unknown: Vec<String> = offspring
        .snps
        .chromosomes()
        .filter(|c| lengths.get(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !unknown.is_empty() {
        log::warn!("Offspring SNPs on chromosomes without a length entry are ignored: {}", unknown.join(", "));
    }
    parental.retain_chromosomes(&selected);
    offspring.snps.retain_chromosomes(selected);

    Ok(RunInputs {
        chromosomes,
        lengths,
        centromeres,
        parental,
        offspring,
    })
}

/// Build, normalize and smooth the windows of one resolution, writing its tables.
///
/// An existing smoothed table is reused unless `overwrite` is set.
pub fn genotype_resolution(
    policy: WindowPolicy,
    inputs: &RunInputs,
    args: &Args,
    plan: &ValidationResult,
    outdir: &Path,
) -> Result<ResolutionTables, String> {
    let suffix = policy.file_suffix();
    let smoothed_path = outdir.join(format!("offspring_genotype_window_normalized_smoothed{}.txt", suffix));

    if smoothed_path.exists() && !args.overwrite {
        println!("♻️  Reusing smoothed windows ({}): {}", policy.label(), smoothed_path.display());
        let smoothed = output::read_genotype_table(&smoothed_path, &plan.labels)?;
        return Ok(ResolutionTables {
            smoothed,
            na_normalized: None,
            reused: true,
        });
    }

    println!("🔍 Building {} windows...", policy.label());
    let (parental_windows, offspring_windows) = build_windows(
        &inputs.chromosomes,
        policy,
        &inputs.lengths,
        &inputs.parental,
        &inputs.offspring.snps,
    )?;
    let normalized = normalize(
        &parental_windows,
        &offspring_windows,
        args.min_reads,
        args.min_snps,
        plan.caller.as_ref(),
    )?;
    let na_normalized = count_na(&normalized);
    println!(
        "✅ {} windows genotyped, {} NA after normalization",
        normalized.len(),
        na_normalized
    );

    let smoothed = smooth(&normalized, &inputs.centromeres, plan.centromere_policy, plan.caller.as_ref())?;
    println!(
        "✅ Smoothing done ({}), {} NA windows",
        plan.centromere_policy,
        count_na(&smoothed.windows)
    );

    let with_probabilities = plan.caller.reports_probabilities();
    output::write_genotype_table(
        &outdir.join(format!("offspring_genotype_window_normalized{}.txt", suffix)),
        &normalized,
        &plan.labels,
        with_probabilities,
    )?;
    output::write_genotype_table(&smoothed_path, &smoothed.windows, &plan.labels, with_probabilities)?;
    output::write_smoothing_trace(&outdir.join(format!("check_smoothing{}.txt", suffix)), &smoothed.traces)?;

    Ok(ResolutionTables {
        smoothed: smoothed.windows,
        na_normalized: Some(na_normalized),
        reused: false,
    })
}

/// Effective parameters recorded in the run summary
pub fn run_parameters(args: &Args, plan: &ValidationResult) -> BTreeMap<String, serde_json::Value> {
    let mut parameters = BTreeMap::new();
    parameters.insert("window_policy".to_string(), serde_json::json!(plan.window_policy.label()));
    parameters.insert(
        "fine_policy".to_string(),
        serde_json::json!(plan.fine_policy.map(|p| p.label())),
    );
    parameters.insert("caller".to_string(), serde_json::json!(plan.caller.name()));
    parameters.insert("support_threshold".to_string(), serde_json::json!(plan.threshold.name()));
    parameters.insert("threshold_params".to_string(), serde_json::json!(plan.threshold.get_config()));
    parameters.insert("centromere_policy".to_string(), serde_json::json!(plan.centromere_policy.to_string()));
    parameters.insert("genotype_ref".to_string(), serde_json::json!(plan.labels.reference));
    parameters.insert("genotype_alt".to_string(), serde_json::json!(plan.labels.alternate));
    parameters.insert("min_snps".to_string(), serde_json::json!(args.min_snps));
    parameters.insert("min_reads".to_string(), serde_json::json!(args.min_reads));
    parameters.insert("min_homo_freq".to_string(), serde_json::json!(args.min_homo_freq));
    parameters.insert("no_ems_freq".to_string(), serde_json::json!(args.no_ems_freq));
    parameters.insert("depth_division".to_string(), serde_json::json!(args.depth_division));
    parameters.insert("precision_padding".to_string(), serde_json::json!(args.precision_padding));
    parameters.insert("border_padding".to_string(), serde_json::json!(sliding_size(args.window_size)));
    parameters.insert("proximity_windows".to_string(), serde_json::json!(args.proximity_windows));
    parameters
}

/// Run every stage and write all tables under `--outdir`
pub fn run_pipeline(args: &Args, plan: &ValidationResult, command_line: &str) -> Result<RunSummary, String> {
    let outdir = PathBuf::from(required(&args.outdir, "--outdir")?);
    let mut summary = RunSummary::new(command_line, run_parameters(args, plan));
    let start = Instant::now();

    println!("\n📄 === LOADING INPUTS ===");
    let inputs = load_inputs(args, plan)?;
    summary.ingestion = IngestionStats {
        parental_snps: inputs.parental.len(),
        ..inputs.offspring.stats.clone()
    };
    summary.stages.chromosomes = inputs.chromosomes.len();

    if args.dry_run {
        println!("✅ Dry run completed successfully");
        println!(
            "📊 {} parental SNPs, {} informative offspring SNPs on {} chromosomes",
            inputs.parental.len(),
            inputs.offspring.snps.len(),
            inputs.chromosomes.len()
        );
        return Ok(summary);
    }

    std::fs::create_dir_all(&outdir)
        .map_err(|e| format!("Failed to create output directory '{}': {}", outdir.display(), e))?;
    loaders::vcf::write_side_logs(&outdir, &inputs.offspring)?;

    println!("\n🪟 === WINDOW GENOTYPES ({}) ===", plan.window_policy.label());
    let coarse = genotype_resolution(plan.window_policy, &inputs, args, plan, &outdir)?;
    summary.stages.windows = coarse.smoothed.len();
    summary.stages.na_windows_normalized = coarse.na_normalized;
    summary.stages.na_windows_smoothed = count_na(&coarse.smoothed);
    summary.stages.smoothed_table_reused = coarse.reused;

    println!("\n🔬 === CROSSOVER SCAN ===");
    let scan = scan_all(&coarse.smoothed, plan.threshold.as_ref());
    println!("✅ {} candidate crossovers found", scan.candidates.len());

    let proximity = proximity_warnings(&scan.candidates, args.proximity_windows);
    summary.stages.proximity_warnings = proximity.warnings.len();
    if !proximity.is_empty() {
        println!("\n⚠️  WARNING dbCOs");
        for warning in &proximity.warnings {
            println!("{}", warning.message());
        }
        output::write_candidates(&outdir.join("Warnings_dbCO.txt"), &proximity.flagged, &plan.labels)?;
    }
    output::write_candidates(&outdir.join("candidateCO.txt"), &scan.candidates, &plan.labels)?;
    summary.stages.candidates = scan.candidates.len();

    scan.warn_double_cos(&plan.labels);
    summary.stages.double_co_records = scan.double_cos.len();
    output::write_double_cos(&outdir.join("double_CO_diagnostics.txt"), &scan.double_cos, &plan.labels)?;

    if let Some(fine_policy) = plan.fine_policy {
        println!("\n🎯 === PRECISION REFINEMENT ({}) ===", fine_policy.label());
        let fine = genotype_resolution(fine_policy, &inputs, args, plan, &outdir)?;
        let threshold = FixedThreshold::default();
        let refiner = PrecisionRefiner::new(&fine.smoothed, &threshold, args.precision_padding);
        let precise = refiner.refine_all(&scan.candidates);
        let suffix = fine_policy.file_suffix();
        output::write_candidates(&outdir.join(format!("preciseCOs{}.txt", suffix)), &precise.candidates, &plan.labels)?;
        output::write_double_cos(
            &outdir.join(format!("precise_double_CO_diagnostics{}.txt", suffix)),
            &precise.double_cos,
            &plan.labels,
        )?;
        summary.stages.precise_candidates = Some(precise.candidates.len());
        summary.stages.precise_double_co_records = Some(precise.double_cos.len());
        summary.stages.precision_neighborhood_fallbacks = precise.neighborhood_fallbacks;
        summary.stages.precision_unchanged = precise.unchanged;
    }

    // Border refinement starts from the coarse scan, not from the precise candidates
    println!("\n📍 === BORDER REFINEMENT ===");
    let border = BorderRefiner::new(&inputs.offspring.snps, sliding_size(args.window_size));
    let (refined, fallbacks) = border.refine_all(&scan.candidates);
    summary.stages.refined = refined.len();
    summary.stages.border_fallbacks = fallbacks;
    if fallbacks > 0 {
        println!("⚠️  {} refinements fell back to padded bounds", fallbacks);
    }

    let (merged, merge_stats) = remerge(refined);
    println!(
        "✅ Re-refinement: {} crossovers ({} merged, {} cancelled, {} inconsistent)",
        merged.len(),
        merge_stats.merged,
        merge_stats.cancelled,
        merge_stats.inconsistent
    );
    output::write_refined(&outdir.join("refinedCOs.txt"), &merged, &plan.labels)?;
    summary.stages.remerged = merged.len();
    summary.stages.merge = merge_stats;

    println!("⏱️  Pipeline completed in {:.2}s", start.elapsed().as_secs_f64());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::validate_args;
    use crate::core::crossover::AnchorKey;
    use argh::FromArgs;
    use std::fmt::Write as _;
    use std::fs;
    use tempfile::TempDir;

    const CHROMOSOME_LENGTH: u64 = 3_000_000;
    const BREAKPOINT: u64 = 1_500_000;

    /// One parental SNP every 2 kb; the offspring is heterozygous before the
    /// breakpoint and homozygous alternate after it.
    fn write_inputs(dir: &Path) {
        let header = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsample\n";
        let mut parental = String::from(header);
        let mut offspring = String::from(header);
        for position in (1_000..CHROMOSOME_LENGTH).step_by(2_000) {
            writeln!(parental, "1\t{}\t.\tA\tT\t60\tPASS\tDP=40\tGT:AD\t1/1:0,40", position).unwrap();
            let sample = if position < BREAKPOINT { "0/1:30,30" } else { "1/1:0,60" };
            writeln!(offspring, "1\t{}\t.\tA\tT\t60\tPASS\tDP=60\tGT:AD\t{}", position, sample).unwrap();
        }
        fs::write(dir.join("parent.vcf"), parental).unwrap();
        fs::write(dir.join("offspring.vcf"), offspring).unwrap();
        fs::write(dir.join("lengths.tsv"), format!("1\t{}\n", CHROMOSOME_LENGTH)).unwrap();
        fs::write(dir.join("centromeres.tsv"), "chromosome\tleft\tright\n1\t200000\t210000\n").unwrap();
    }

    fn args_for(dir: &Path, extra: &[&str]) -> Args {
        let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
        let (parent, offspring, lengths, centromeres, outdir) = (
            path("parent.vcf"),
            path("offspring.vcf"),
            path("lengths.tsv"),
            path("centromeres.tsv"),
            path("out"),
        );
        let mut argv: Vec<&str> = vec![
            "--parental-vcf",
            parent.as_str(),
            "--offspring-vcf",
            offspring.as_str(),
            "--chr-lengths",
            lengths.as_str(),
            "--centromeres",
            centromeres.as_str(),
            "--outdir",
            outdir.as_str(),
            "--genotype-ref",
            "Col",
            "--genotype-alt",
            "Ler",
        ];
        argv.extend_from_slice(extra);
        Args::from_args(&["codetect"], &argv).unwrap()
    }

    #[test]
    fn test_single_crossover_end_to_end() {
        let dir = TempDir::new().unwrap();
        write_inputs(dir.path());
        let args = args_for(dir.path(), &["--fine-window-size", "20", "--min-snps", "5"]);
        let plan = validate_args(&args).unwrap();

        let summary = run_pipeline(&args, &plan, "codetect test").unwrap();
        assert_eq!(summary.stages.chromosomes, 1);
        assert_eq!(summary.stages.candidates, 1);
        assert_eq!(summary.stages.remerged, 1);
        assert!(!summary.stages.smoothed_table_reused);

        let out = dir.path().join("out");
        let refined = output::read_refined(&out.join("refinedCOs.txt"), &plan.labels).unwrap();
        assert_eq!(refined.len(), 1);
        let co = &refined[0];
        assert_eq!(co.chromosome(), "Chr1");
        assert!(co.start < BREAKPOINT as i64 && co.stop >= BREAKPOINT as i64);
        assert_eq!(plan.labels.label(co.pre_geno), "Col/Ler");
        assert_eq!(plan.labels.label(co.cur_geno), "Ler");

        for name in [
            "candidateCO.txt",
            "preciseCOs_20_kb.txt",
            "precise_double_CO_diagnostics_20_kb.txt",
            "double_CO_diagnostics.txt",
            "offspring_genotype_window_normalized_100_kb.txt",
            "offspring_genotype_window_normalized_smoothed_100_kb.txt",
            "check_smoothing_100_kb.txt",
            "offspring_genotype_window_normalized_smoothed_20_kb.txt",
            "log/new_snps.log",
            "log/weird_snps.log",
        ] {
            assert!(out.join(name).exists(), "missing {}", name);
        }
    }

    #[test]
    fn test_border_refinement_uses_coarse_candidates() {
        let dir = TempDir::new().unwrap();
        write_inputs(dir.path());
        let args = args_for(dir.path(), &["--fine-window-size", "20", "--min-snps", "5"]);
        let plan = validate_args(&args).unwrap();
        run_pipeline(&args, &plan, "codetect test").unwrap();

        let out = dir.path().join("out");
        let coarse = output::read_candidates(&out.join("candidateCO.txt"), &plan.labels).unwrap();
        let precise = output::read_candidates(&out.join("preciseCOs_20_kb.txt"), &plan.labels).unwrap();
        let refined = output::read_refined(&out.join("refinedCOs.txt"), &plan.labels).unwrap();

        let coarse_anchors: Vec<&AnchorKey> = coarse.values().map(|c| &c.anchor).collect();
        let refined_anchors: Vec<&AnchorKey> = refined.iter().map(|co| &co.anchor).collect();
        assert_eq!(refined_anchors, coarse_anchors);
        // fine windows are indexed on their own grid
        assert!(precise.values().all(|c| !coarse_anchors.contains(&&c.anchor)));
    }

    #[test]
    fn test_second_run_reuses_smoothed_table() {
        let dir = TempDir::new().unwrap();
        write_inputs(dir.path());
        let args = args_for(dir.path(), &[]);
        let plan = validate_args(&args).unwrap();
        let first = run_pipeline(&args, &plan, "codetect test").unwrap();

        let second = run_pipeline(&args, &plan, "codetect test").unwrap();
        assert!(second.stages.smoothed_table_reused);
        assert_eq!(second.stages.na_windows_normalized, None);
        assert_eq!(second.stages.candidates, first.stages.candidates);

        let args = args_for(dir.path(), &["--overwrite"]);
        let third = run_pipeline(&args, &plan, "codetect test").unwrap();
        assert!(!third.stages.smoothed_table_reused);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        write_inputs(dir.path());
        let args = args_for(dir.path(), &["--dry-run"]);
        let plan = validate_args(&args).unwrap();
        let summary = run_pipeline(&args, &plan, "codetect test").unwrap();
        assert_eq!(summary.ingestion.parental_snps, 1500);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_chromosome_filter_leaving_nothing() {
        let dir = TempDir::new().unwrap();
        write_inputs(dir.path());
        let args = args_for(dir.path(), &["--exclude-chromosomes", "Chr1"]);
        let plan = validate_args(&args).unwrap();
        assert!(run_pipeline(&args, &plan, "codetect test").is_err());
    }
}
