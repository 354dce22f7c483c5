// inspector.rs - Window genotype table inspector
// Features: per-chromosome genotype composition, run-length segments, candidate cross-check

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use argh::FromArgs;
use codetect::core::genotype::{Genotype, GenotypeLabels};
use codetect::data::{GenotypedWindow, WindowTable};
use codetect::output::{read_candidates, read_genotype_table};

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

#[derive(FromArgs)]
/// Inspect codetect window genotype tables
struct Args {
    /// path to a window genotype table (normalized or smoothed)
    #[argh(option)]
    windows: String,

    /// label of the reference homozygous genotype (default: Ref)
    #[argh(option, default = "String::from(\"Ref\")")]
    genotype_ref: String,

    /// label of the alternate homozygous genotype (default: Alt)
    #[argh(option, default = "String::from(\"Alt\")")]
    genotype_alt: String,

    /// candidate crossover table to cross-check against the segments
    #[argh(option)]
    candidates: Option<String>,

    /// show the run-length segments of every chromosome
    #[argh(switch)]
    detailed: bool,

    /// export per-chromosome composition to TSV file
    #[argh(option)]
    export_summary: Option<String>,

    /// quiet mode - minimal output
    #[argh(switch)]
    quiet: bool,
}

// ============================================================================
// ANALYSIS
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq)]
struct Composition {
    windows: usize,
    homo_ref: usize,
    hetero: usize,
    homo_alt: usize,
    unknown: usize,
}

impl Composition {
    fn add(&mut self, genotype: Genotype) {
        self.windows += 1;
        match genotype {
            Genotype::HomoRef => self.homo_ref += 1,
            Genotype::Hetero => self.hetero += 1,
            Genotype::HomoAlt => self.homo_alt += 1,
            Genotype::Unknown => self.unknown += 1,
        }
    }

    fn na_fraction(&self) -> f64 {
        if self.windows == 0 {
            0.0
        } else {
            self.unknown as f64 / self.windows as f64
        }
    }
}

/// Maximal run of windows sharing one genotype
#[derive(Debug, Clone, PartialEq)]
struct Segment {
    genotype: Genotype,
    first: usize,
    last: usize,
    start: u64,
    stop: u64,
}

fn composition(windows: &[GenotypedWindow]) -> Composition {
    let mut composition = Composition::default();
    for window in windows {
        composition.add(window.call.genotype);
    }
    composition
}

fn segments(windows: &[GenotypedWindow]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for window in windows {
        let genotype = window.call.genotype;
        match segments.last_mut() {
            Some(segment) if segment.genotype == genotype => {
                segment.last = window.bounds.key.index;
                segment.stop = window.bounds.stop;
            }
            _ => segments.push(Segment {
                genotype,
                first: window.bounds.key.index,
                last: window.bounds.key.index,
                start: window.bounds.start,
                stop: window.bounds.stop,
            }),
        }
    }
    segments
}

/// Called segments only, with NA runs between identical genotypes folded away
fn called_transitions(segments: &[Segment]) -> usize {
    let called: Vec<Genotype> = segments
        .iter()
        .map(|s| s.genotype)
        .filter(|g| !g.is_unknown())
        .collect();
    called.windows(2).filter(|pair| pair[0] != pair[1]).count()
}

fn print_overview(table: &WindowTable<GenotypedWindow>, labels: &GenotypeLabels, args: &Args) {
    if args.quiet {
        return;
    }

    println!("\n=== WINDOW TABLE SUMMARY ===");
    println!("Chromosomes: {}", table.chromosomes().count());
    println!("Total windows: {}", table.len());

    println!(
        "\n{:<15} {:>8} {:>10} {:>10} {:>10} {:>8} {:>8} {:>12}",
        "Chromosome",
        "Windows",
        labels.label(Genotype::HomoRef),
        labels.label(Genotype::Hetero),
        labels.label(Genotype::HomoAlt),
        "NA",
        "NA %",
        "Transitions"
    );
    println!("{}", "=".repeat(89));

    for chromosome in table.chromosomes() {
        let windows = table.chromosome(chromosome);
        let c = composition(windows);
        println!(
            "{:<15} {:>8} {:>10} {:>10} {:>10} {:>8} {:>7.1}% {:>12}",
            chromosome,
            c.windows,
            c.homo_ref,
            c.hetero,
            c.homo_alt,
            c.unknown,
            c.na_fraction() * 100.0,
            called_transitions(&segments(windows))
        );
    }
}

fn print_segments(table: &WindowTable<GenotypedWindow>, labels: &GenotypeLabels) {
    println!("\n=== GENOTYPE SEGMENTS ===");
    for chromosome in table.chromosomes() {
        println!("\n{}", chromosome);
        for segment in segments(table.chromosome(chromosome)) {
            println!(
                "  windows {:>5}-{:<5} {:>11}-{:<11} {}",
                segment.first,
                segment.last,
                segment.start,
                segment.stop,
                labels.label(segment.genotype)
            );
        }
    }
}

fn cross_check(
    table: &WindowTable<GenotypedWindow>,
    candidates_path: &str,
    labels: &GenotypeLabels,
) -> Result<(), String> {
    let candidates = read_candidates(Path::new(candidates_path), labels)?;
    let mut per_chromosome: BTreeMap<&str, usize> = BTreeMap::new();
    for candidate in candidates.values() {
        *per_chromosome.entry(candidate.chromosome()).or_insert(0) += 1;
    }

    println!("\n=== CANDIDATE CROSS-CHECK ===");
    println!("{:<15} {:>12} {:>12}", "Chromosome", "Candidates", "Transitions");
    println!("{}", "=".repeat(41));
    for chromosome in table.chromosomes() {
        let found = per_chromosome.get(chromosome).copied().unwrap_or(0);
        let transitions = called_transitions(&segments(table.chromosome(chromosome)));
        let marker = if found > transitions { "  ⚠️" } else { "" };
        println!("{:<15} {:>12} {:>12}{}", chromosome, found, transitions, marker);
    }

    let orphans: Vec<&str> = per_chromosome
        .keys()
        .copied()
        .filter(|c| table.window_count(c) == 0)
        .collect();
    if !orphans.is_empty() {
        println!("⚠️  Candidates on chromosomes absent from the window table: {}", orphans.join(", "));
    }
    Ok(())
}

fn export_summary(table: &WindowTable<GenotypedWindow>, path: &str) -> Result<(), String> {
    let mut file = File::create(path).map_err(|e| format!("Failed to create summary file '{}': {}", path, e))?;
    writeln!(file, "chromosome\twindows\thomo_ref\thetero\thomo_alt\tna\tna_fraction\ttransitions")
        .map_err(|e| format!("Write error: {}", e))?;
    for chromosome in table.chromosomes() {
        let windows = table.chromosome(chromosome);
        let c = composition(windows);
        writeln!(
            file,
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.4}\t{}",
            chromosome,
            c.windows,
            c.homo_ref,
            c.hetero,
            c.homo_alt,
            c.unknown,
            c.na_fraction(),
            called_transitions(&segments(windows))
        )
        .map_err(|e| format!("Write error: {}", e))?;
    }
    println!("✅ Summary exported to: {}", path);
    Ok(())
}

// ============================================================================
// MAIN
// ============================================================================

fn run(args: &Args) -> Result<(), String> {
    let labels = GenotypeLabels::new(&args.genotype_ref, &args.genotype_alt)?;
    if !args.quiet {
        println!("Loading window table: {}", args.windows);
    }
    let table = read_genotype_table(Path::new(&args.windows), &labels)?;

    print_overview(&table, &labels, args);
    if args.detailed {
        print_segments(&table, &labels);
    }
    if let Some(path) = &args.candidates {
        cross_check(&table, path, &labels)?;
    }
    if let Some(path) = &args.export_summary {
        export_summary(&table, path)?;
    }
    Ok(())
}

fn main() {
    let args: Args = argh::from_env();
    if let Err(e) = run(&args) {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}
