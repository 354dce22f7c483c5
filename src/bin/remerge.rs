// remerge.rs - Re-run the refined crossover merge on an existing table

use clap::{Arg, ArgAction, Command};
use codetect::core::border::remerge;
use codetect::core::genotype::GenotypeLabels;
use codetect::output::{read_refined, write_refined};
use std::path::Path;

fn main() {
    let matches = Command::new("codetect-remerge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collapse overlapping refined crossovers of a refinedCOs table")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Refined crossover table (refinedCOs.txt)")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Merged table to write")
                .required(true),
        )
        .arg(
            Arg::new("genotype_ref")
                .long("genotype-ref")
                .value_name("LABEL")
                .help("Label of the reference homozygous genotype")
                .default_value("Ref"),
        )
        .arg(
            Arg::new("genotype_alt")
                .long("genotype-alt")
                .value_name("LABEL")
                .help("Label of the alternate homozygous genotype")
                .default_value("Alt"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Fail when the input is not already fully merged")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let input = matches.get_one::<String>("input").map(String::as_str).unwrap_or_default();
    let output = matches.get_one::<String>("output").map(String::as_str).unwrap_or_default();
    let genotype_ref = matches.get_one::<String>("genotype_ref").map(String::as_str).unwrap_or("Ref");
    let genotype_alt = matches.get_one::<String>("genotype_alt").map(String::as_str).unwrap_or("Alt");
    let check = matches.get_flag("check");

    if let Err(e) = run(input, output, genotype_ref, genotype_alt, check) {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run(input: &str, output: &str, genotype_ref: &str, genotype_alt: &str, check: bool) -> Result<(), String> {
    let labels = GenotypeLabels::new(genotype_ref, genotype_alt)?;

    println!("📄 Loading refined crossovers: {}", input);
    let refined = read_refined(Path::new(input), &labels)?;
    let before = refined.len();
    println!("✅ {} refined crossovers loaded", before);

    let input_table = refined.clone();
    let (merged, stats) = remerge(refined);
    println!(
        "🔀 {} passes: {} merged, {} cancelled, {} inconsistent",
        stats.passes, stats.merged, stats.cancelled, stats.inconsistent
    );
    println!("📊 {} -> {} crossovers", before, merged.len());

    write_refined(Path::new(output), &merged, &labels)?;

    if check && merged != input_table {
        return Err(format!(
            "Input '{}' was not fully merged ({} -> {} crossovers)",
            input,
            before,
            merged.len()
        ));
    }
    if merged == input_table {
        println!("✅ Input was already fully merged");
    }
    Ok(())
}
