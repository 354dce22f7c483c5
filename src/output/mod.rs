// mod.rs - Output tables and run summary

use crate::core::border::{MergeStats, RefinedCo};
use crate::core::crossover::{AnchorKey, AnchorMap, Candidate, DoubleCoRecord};
use crate::core::genotype::{GenotypeCall, GenotypeLabels, GenotypeProbabilities, WindowDepths};
use crate::core::smoothing::SmoothingTrace;
use crate::data::loaders::IngestionStats;
use crate::data::{GenotypedWindow, WindowBounds, WindowKey, WindowTable};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub const GENOTYPE_HEADER: &str = "chr_window\tstart\tstop\tADref/DP\tADalt/DP\tgenotype";
pub const GENOTYPE_HEADER_WITH_PROBABILITIES: &str =
    "chr_window\tstart\tstop\tADref/DP\tADalt/DP\tprobHomoRef\tprobHetero\tprobHomoAlt\tgenotype";
pub const SMOOTHING_HEADER: &str = "chr_window\tstart_window\tstop_window\tstart_smooth\tstop_smooth\twindow_smoothed";
pub const CANDIDATE_HEADER: &str =
    "chr_mean_win\tstart_win:stop_win\tstart_co\tstop_co\t(stop_co-start_co)\tpre_geno\tcur_geno";
pub const REFINED_HEADER: &str = "chr_mean_win\tstart_co\tstop_co\tpre_geno\tcur_geno";
pub const DOUBLE_CO_HEADER: &str = "chr_mean_win\tchromosome\tstart_win:stop_win\tpre_geno\tcur_geno\tstatus";

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &Path) -> Result<(), String> {
    if let Some(parent) = file_path.parent() {
        create_dir_all(parent)
            .map_err(|e| format!("Failed to create parent directory '{}': {}", parent.display(), e))?;
    }
    Ok(())
}

fn create_writer(file_path: &Path) -> Result<BufWriter<File>, String> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path)
        .map_err(|e| format!("Failed to create output file '{}': {}", file_path.display(), e))?;
    Ok(BufWriter::new(file))
}

fn finish(mut writer: BufWriter<File>) -> Result<(), String> {
    writer.flush().map_err(|e| format!("Flush error: {}", e))
}

/// Decimal rendering that keeps a trailing `.0` on whole numbers
pub fn format_ratio(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn tsv_reader(file_path: &Path) -> Result<csv::Reader<File>, String> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(file_path)
        .map_err(|e| format!("Failed to open table '{}': {}", file_path.display(), e))
}

fn field<'r>(record: &'r csv::StringRecord, index: usize, file_path: &Path, line: usize) -> Result<&'r str, String> {
    record.get(index).ok_or_else(|| {
        format!(
            "Missing column {} at line {} of '{}'",
            index + 1,
            line,
            file_path.display()
        )
    })
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str, file_path: &Path, line: usize) -> Result<T, String> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| format!("Invalid {} '{}' at line {} of '{}'", what, value, line, file_path.display()))
}

// ============================================================================
// WINDOW GENOTYPE TABLES
// ============================================================================

/// Write a normalized or smoothed window genotype table
pub fn write_genotype_table(
    file_path: &Path,
    windows: &WindowTable<GenotypedWindow>,
    labels: &GenotypeLabels,
    with_probabilities: bool,
) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    let header = if with_probabilities {
        GENOTYPE_HEADER_WITH_PROBABILITIES
    } else {
        GENOTYPE_HEADER
    };
    writeln!(writer, "{}", header).map_err(|e| format!("Write error: {}", e))?;

    for window in windows.iter() {
        let call = &window.call;
        write!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            window.bounds.key,
            window.bounds.start,
            window.bounds.stop,
            format_ratio(call.ref_ratio),
            format_ratio(call.alt_ratio)
        )
        .map_err(|e| format!("Write error: {}", e))?;
        if with_probabilities {
            match &call.probabilities {
                Some(p) => write!(
                    writer,
                    "\t{}\t{}\t{}",
                    format_ratio(p.homo_ref),
                    format_ratio(p.hetero),
                    format_ratio(p.homo_alt)
                ),
                None => write!(writer, "\tNA\tNA\tNA"),
            }
            .map_err(|e| format!("Write error: {}", e))?;
        }
        writeln!(writer, "\t{}", labels.label(call.genotype)).map_err(|e| format!("Write error: {}", e))?;
    }

    finish(writer)?;
    println!("✅ Window genotypes written to: {}", file_path.display());
    Ok(())
}

/// Load a window genotype table written by [`write_genotype_table`].
///
/// Depths are not stored in the table; loaded windows carry zero depths and
/// the stored ratios and call.
pub fn read_genotype_table(file_path: &Path, labels: &GenotypeLabels) -> Result<WindowTable<GenotypedWindow>, String> {
    let mut reader = tsv_reader(file_path)?;
    let with_probabilities = reader
        .headers()
        .map_err(|e| format!("Failed to read header of '{}': {}", file_path.display(), e))?
        .len()
        >= 9;

    let mut windows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2;
        let record = record.map_err(|e| format!("Failed to read line {} of '{}': {}", line, file_path.display(), e))?;
        let key = WindowKey::parse(field(&record, 0, file_path, line)?)?;
        let start: u64 = parse_number(field(&record, 1, file_path, line)?, "start", file_path, line)?;
        let stop: u64 = parse_number(field(&record, 2, file_path, line)?, "stop", file_path, line)?;
        let ref_ratio: f64 = parse_number(field(&record, 3, file_path, line)?, "ratio", file_path, line)?;
        let alt_ratio: f64 = parse_number(field(&record, 4, file_path, line)?, "ratio", file_path, line)?;

        let (probabilities, label_index) = if with_probabilities {
            let values: Vec<Option<f64>> = (5..8)
                .map(|j| field(&record, j, file_path, line).map(|v| v.trim().parse::<f64>().ok()))
                .collect::<Result<_, _>>()?;
            let probabilities = match values[..] {
                [Some(homo_ref), Some(hetero), Some(homo_alt)] => Some(GenotypeProbabilities { homo_ref, hetero, homo_alt }),
                _ => None,
            };
            (probabilities, 8)
        } else {
            (None, 5)
        };
        let genotype = labels
            .parse(field(&record, label_index, file_path, line)?)
            .map_err(|e| format!("{} at line {} of '{}'", e, line, file_path.display()))?;

        windows.push(GenotypedWindow {
            bounds: WindowBounds::new(&key.chromosome, key.index, start, stop),
            depths: WindowDepths::default(),
            call: GenotypeCall { ref_ratio, alt_ratio, probabilities, genotype },
        });
    }

    WindowTable::from_windows(windows).map_err(|e| format!("Inconsistent window table '{}': {}", file_path.display(), e))
}

/// Write the smoothing audit table
pub fn write_smoothing_trace(file_path: &Path, traces: &[SmoothingTrace]) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    writeln!(writer, "{}", SMOOTHING_HEADER).map_err(|e| format!("Write error: {}", e))?;
    for trace in traces {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            trace.key,
            trace.start,
            trace.stop,
            trace.start_smooth,
            trace.stop_smooth,
            trace.contributors_label()
        )
        .map_err(|e| format!("Write error: {}", e))?;
    }
    finish(writer)?;
    println!("✅ Smoothing trace written to: {}", file_path.display());
    Ok(())
}

// ============================================================================
// CROSSOVER TABLES
// ============================================================================

/// Write a candidate or precise crossover table
pub fn write_candidates(file_path: &Path, candidates: &AnchorMap<Candidate>, labels: &GenotypeLabels) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    writeln!(writer, "{}", CANDIDATE_HEADER).map_err(|e| format!("Write error: {}", e))?;
    for candidate in candidates.values() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            candidate.anchor,
            candidate.window_interval(),
            candidate.co_start,
            candidate.co_stop,
            candidate.span(),
            labels.label(candidate.pre_geno),
            labels.label(candidate.cur_geno)
        )
        .map_err(|e| format!("Write error: {}", e))?;
    }
    finish(writer)?;
    println!("✅ {} crossovers written to: {}", candidates.len(), file_path.display());
    Ok(())
}

/// Load a candidate table written by [`write_candidates`]
pub fn read_candidates(file_path: &Path, labels: &GenotypeLabels) -> Result<AnchorMap<Candidate>, String> {
    let mut reader = tsv_reader(file_path)?;
    let mut candidates = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2;
        let record = record.map_err(|e| format!("Failed to read line {} of '{}': {}", line, file_path.display(), e))?;
        let anchor = AnchorKey::parse(field(&record, 0, file_path, line)?)?;
        let interval = field(&record, 1, file_path, line)?;
        let (start_win, stop_win) = interval
            .split_once(':')
            .ok_or_else(|| format!("Invalid window interval '{}' at line {}", interval, line))?;
        candidates.push(Candidate {
            anchor,
            start_win: parse_number(start_win, "window", file_path, line)?,
            stop_win: parse_number(stop_win, "window", file_path, line)?,
            co_start: parse_number(field(&record, 2, file_path, line)?, "start_co", file_path, line)?,
            co_stop: parse_number(field(&record, 3, file_path, line)?, "stop_co", file_path, line)?,
            pre_geno: labels.parse(field(&record, 5, file_path, line)?)?,
            cur_geno: labels.parse(field(&record, 6, file_path, line)?)?,
        });
    }
    Ok(AnchorMap::from_candidates(candidates))
}

/// Write the border-refined crossover table
pub fn write_refined(file_path: &Path, refined: &[RefinedCo], labels: &GenotypeLabels) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    writeln!(writer, "{}", REFINED_HEADER).map_err(|e| format!("Write error: {}", e))?;
    for co in refined {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            co.anchor,
            co.start,
            co.stop,
            labels.label(co.pre_geno),
            labels.label(co.cur_geno)
        )
        .map_err(|e| format!("Write error: {}", e))?;
    }
    finish(writer)?;
    println!("✅ {} refined crossovers written to: {}", refined.len(), file_path.display());
    Ok(())
}

/// Load a refined crossover table, keeping file order
pub fn read_refined(file_path: &Path, labels: &GenotypeLabels) -> Result<Vec<RefinedCo>, String> {
    let mut reader = tsv_reader(file_path)?;
    let mut refined = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2;
        let record = record.map_err(|e| format!("Failed to read line {} of '{}': {}", line, file_path.display(), e))?;
        refined.push(RefinedCo {
            anchor: AnchorKey::parse(field(&record, 0, file_path, line)?)?,
            start: parse_number(field(&record, 1, file_path, line)?, "start_co", file_path, line)?,
            stop: parse_number(field(&record, 2, file_path, line)?, "stop_co", file_path, line)?,
            pre_geno: labels.parse(field(&record, 3, file_path, line)?)?,
            cur_geno: labels.parse(field(&record, 4, file_path, line)?)?,
        });
    }
    Ok(refined)
}

/// Write the scanner's double-CO records
pub fn write_double_cos(
    file_path: &Path,
    records: &AnchorMap<DoubleCoRecord>,
    labels: &GenotypeLabels,
) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    writeln!(writer, "{}", DOUBLE_CO_HEADER).map_err(|e| format!("Write error: {}", e))?;
    for record in records.values() {
        writeln!(
            writer,
            "{}\t{}\t{}:{}\t{}\t{}\t{}",
            record.anchor,
            record.anchor.chromosome,
            record.start_win,
            record.stop_win,
            labels.label(record.pre_geno),
            labels.label(record.cur_geno),
            record.status
        )
        .map_err(|e| format!("Write error: {}", e))?;
    }
    finish(writer)?;
    println!("✅ Double-CO diagnostics written to: {}", file_path.display());
    Ok(())
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

/// Per-stage counters of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageCounts {
    pub chromosomes: usize,
    pub windows: usize,
    pub na_windows_normalized: Option<usize>,
    pub na_windows_smoothed: usize,
    pub smoothed_table_reused: bool,
    pub candidates: usize,
    pub double_co_records: usize,
    pub proximity_warnings: usize,
    pub precise_candidates: Option<usize>,
    pub precise_double_co_records: Option<usize>,
    pub precision_neighborhood_fallbacks: usize,
    pub precision_unchanged: usize,
    pub refined: usize,
    pub border_fallbacks: usize,
    pub remerged: usize,
    pub merge: MergeStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub version: String,
    pub generated: String,
    pub command_line: String,
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub ingestion: IngestionStats,
    pub stages: StageCounts,
}

impl RunSummary {
    pub fn new(command_line: &str, parameters: BTreeMap<String, serde_json::Value>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            command_line: command_line.to_string(),
            parameters,
            ingestion: IngestionStats::default(),
            stages: StageCounts::default(),
        }
    }
}

pub fn write_run_summary(file_path: &Path, summary: &RunSummary) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    let json = serde_json::to_string_pretty(summary).map_err(|e| format!("Failed to serialize run summary: {}", e))?;
    writeln!(writer, "{}", json).map_err(|e| format!("Write error: {}", e))?;
    finish(writer)?;
    println!("📋 Run summary written to: {}", file_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crossover::DoubleCoStatus;
    use crate::core::genotype::Genotype;
    use std::fs;
    use tempfile::TempDir;

    fn labels() -> GenotypeLabels {
        GenotypeLabels::new("Col", "Ler").unwrap()
    }

    fn windows() -> WindowTable<GenotypedWindow> {
        let calls = [
            (0.95, 0.05, Genotype::HomoRef),
            (0.5, 0.5, Genotype::Hetero),
            (0.0, 0.0, Genotype::Unknown),
        ];
        let windows = calls
            .iter()
            .enumerate()
            .map(|(i, &(r, a, genotype))| GenotypedWindow {
                bounds: WindowBounds::new("Chr1", i + 1, 1 + 50_000 * i as u64, 100_000 + 50_000 * i as u64),
                depths: WindowDepths::default(),
                call: GenotypeCall {
                    ref_ratio: r,
                    alt_ratio: a,
                    probabilities: (genotype != Genotype::Unknown).then_some(GenotypeProbabilities {
                        homo_ref: if genotype == Genotype::HomoRef { 1.0 } else { 0.0 },
                        hetero: if genotype == Genotype::Hetero { 1.0 } else { 0.0 },
                        homo_alt: 0.0,
                    }),
                    genotype,
                },
            })
            .collect();
        WindowTable::from_windows(windows).unwrap()
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(0.0), "0.0");
        assert_eq!(format_ratio(1.0), "1.0");
        assert_eq!(format_ratio(0.123), "0.123");
    }

    #[test]
    fn test_genotype_table_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/offspring_genotype_window_normalized_smoothed_100_kb.txt");
        write_genotype_table(&path, &windows(), &labels(), true).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], GENOTYPE_HEADER_WITH_PROBABILITIES);
        assert_eq!(lines[1], "Chr1_1\t1\t100000\t0.95\t0.05\t1.0\t0.0\t0.0\tCol");
        assert_eq!(lines[2].rsplit('\t').next(), Some("Col/Ler"));
        assert!(lines[3].ends_with("\tNA\tNA\tNA\tNA"));

        let loaded = read_genotype_table(&path, &labels()).unwrap();
        assert_eq!(loaded.len(), 3);
        let genotypes: Vec<Genotype> = loaded.iter().map(|w| w.call.genotype).collect();
        assert_eq!(genotypes, vec![Genotype::HomoRef, Genotype::Hetero, Genotype::Unknown]);
        assert_eq!(loaded.iter().next().unwrap().bounds.stop, 100_000);
    }

    #[test]
    fn test_genotype_table_without_probabilities() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("windows.txt");
        write_genotype_table(&path, &windows(), &labels(), false).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(GENOTYPE_HEADER));
        assert_eq!(content.lines().nth(1), Some("Chr1_1\t1\t100000\t0.95\t0.05\tCol"));
        let loaded = read_genotype_table(&path, &labels()).unwrap();
        assert_eq!(loaded.iter().nth(1).unwrap().call.genotype, Genotype::Hetero);
    }

    #[test]
    fn test_candidate_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("candidateCO.txt");
        let candidates = AnchorMap::from_candidates(vec![Candidate {
            anchor: AnchorKey::between("Chr1", 5, 6),
            start_win: 5,
            stop_win: 6,
            co_start: 250_000,
            co_stop: 300_000,
            pre_geno: Genotype::HomoRef,
            cur_geno: Genotype::Hetero,
        }]);
        write_candidates(&path, &candidates, &labels()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().nth(1), Some("Chr1_5.5\t5:6\t250000\t300000\t50000\tCol\tCol/Ler"));

        let loaded = read_candidates(&path, &labels()).unwrap();
        assert_eq!(loaded.values().next(), candidates.values().next());
    }

    #[test]
    fn test_refined_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("refinedCOs.txt");
        let refined = vec![RefinedCo {
            anchor: AnchorKey::between("Chr2", 12, 13),
            start: 612_000,
            stop: 618_500,
            pre_geno: Genotype::Hetero,
            cur_geno: Genotype::HomoAlt,
        }];
        write_refined(&path, &refined, &labels()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().next(), Some(REFINED_HEADER));
        assert_eq!(content.lines().nth(1), Some("Chr2_12.5\t612000\t618500\tCol/Ler\tLer"));
        assert_eq!(read_refined(&path, &labels()).unwrap(), refined);
    }

    #[test]
    fn test_double_co_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("double_CO_diagnostics.txt");
        let mut records = AnchorMap::new();
        let anchor = AnchorKey::between("Chr3", 7, 8);
        records.insert(
            anchor.clone(),
            DoubleCoRecord {
                anchor,
                start_win: 7,
                stop_win: 8,
                pre_geno: Genotype::HomoRef,
                cur_geno: Genotype::HomoAlt,
                status: DoubleCoStatus::NotSupported,
            },
        );
        write_double_cos(&path, &records, &labels()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().nth(1), Some("Chr3_7.5\tChr3\t7:8\tCol\tLer\tnot_supported"));
    }

    #[test]
    fn test_run_summary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run_summary.json");
        let mut parameters = BTreeMap::new();
        parameters.insert("window_size".to_string(), serde_json::json!(100));
        let mut summary = RunSummary::new("codetect --outdir out", parameters);
        summary.stages.candidates = 4;
        write_run_summary(&path, &summary).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["stages"]["candidates"], 4);
        assert_eq!(value["parameters"]["window_size"], 100);
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    }
}
