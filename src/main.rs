// main.rs - CLI entry point

use codetect::cli::Config;
use codetect::core::crossover::SupportThresholdFactory;
use codetect::core::genotype::GenotypeCallerRegistry;
use codetect::output::write_run_summary;
use codetect::prelude::*;
use log::Level;
use simple_logger::init_with_level;
use std::path::Path;
use std::time::Instant;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    let level = if args.verbose { Level::Debug } else { Level::Info };
    init_with_level(level).map_err(|e| format!("Failed to initialize logger: {}", e))?;

    println!("🚀 codetect v{}", env!("CARGO_PKG_VERSION"));

    // Configure thread pool
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        println!("🧵 Threads: {}", n);
    } else {
        let num_threads = rayon::current_num_threads();
        println!("🧵 Threads: {} (auto-detected)", num_threads);
    }

    // Validate all arguments
    let plan = match validate_args(&args) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Available genotype callers:");
            for (name, desc) in GenotypeCallerRegistry::list_available() {
                eprintln!("  - {}: {}", name, desc);
            }
            eprintln!("Available support thresholds:");
            for (name, desc) in SupportThresholdFactory::list_available() {
                eprintln!("  - {}: {}", name, desc);
            }
            return Err(e);
        }
    };

    println!("🪟 Windows: {}", plan.window_policy.label());
    if let Some(fine) = plan.fine_policy {
        println!("🎯 Precision windows: {} (padding {} bp)", fine.label(), args.precision_padding);
    }
    println!("🧪 Caller: {} ({})", plan.caller.name(), plan.caller.description());
    println!("📏 Support threshold: {} ({})", plan.threshold.name(), plan.threshold.description());
    println!("🧱 Centromere policy: {}", plan.centromere_policy);
    println!(
        "🏷️  Genotypes: {} / {} / {}",
        plan.labels.label(Genotype::HomoRef),
        plan.labels.label(Genotype::Hetero),
        plan.labels.label(Genotype::HomoAlt)
    );

    let total_start = Instant::now();
    let summary = run_pipeline(&args, &plan, &command_line)?;

    if args.dry_run {
        return Ok(());
    }

    let outdir = args.outdir.as_deref().ok_or("--outdir is required")?;
    write_run_summary(&Path::new(outdir).join("run_summary.json"), &summary)?;

    // Print summary
    let stages = &summary.stages;
    let total_elapsed = total_start.elapsed();
    println!("\n🎉 === CODETECT COMPLETED SUCCESSFULLY ===");
    println!(
        "⏱️  Total execution time: {:.2}s",
        total_elapsed.as_secs_f64()
    );
    println!(
        "📊 {} windows on {} chromosomes, {} NA after smoothing",
        stages.windows, stages.chromosomes, stages.na_windows_smoothed
    );
    println!(
        "🧬 SNPs: {} informative, {} new, {} weird, {} with DP=0",
        summary.ingestion.informative_snps,
        summary.ingestion.new_snps,
        summary.ingestion.weird_snps,
        summary.ingestion.zero_depth_records
    );
    println!(
        "🔀 Crossovers: {} candidates, {} refined after re-merge",
        stages.candidates, stages.remerged
    );
    if stages.double_co_records > 0 || stages.proximity_warnings > 0 {
        println!(
            "⚠️  {} double-CO records, {} proximity warnings",
            stages.double_co_records, stages.proximity_warnings
        );
    }
    println!("📁 Output written to: {}", outdir);
    println!("🔧 Command: {}", command_line);

    Ok(())
}
