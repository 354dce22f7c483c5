// vcf.rs - Parental and offspring VCF ingestion

use super::normalize_chromosome;
use crate::data::snp::{DiploidCall, OffspringSnp, ParentalSnp, SnpCatalog};
use noodles_vcf as vcf;
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Counters collected while reading the VCF inputs
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionStats {
    pub parental_snps: usize,
    pub offspring_records: usize,
    pub informative_snps: usize,
    pub new_snps: usize,
    pub weird_snps: usize,
    pub zero_depth_records: usize,
    pub duplicate_positions: usize,
}

/// Informative offspring SNPs plus the raw lines set aside
#[derive(Debug, Default)]
pub struct OffspringIngestion {
    pub snps: SnpCatalog<OffspringSnp>,
    pub stats: IngestionStats,
    pub new_lines: Vec<String>,
    pub weird_lines: Vec<String>,
}

fn open_vcf(file_path: &Path) -> Result<BufReader<File>, String> {
    let file = File::open(file_path)
        .map_err(|e| format!("Failed to open VCF file '{}': {}", file_path.display(), e))?;
    Ok(BufReader::new(file))
}

/// Index of `key` in the FORMAT column, or `fallback` when absent
fn format_index(format: &str, key: &str, fallback: usize) -> usize {
    format.split(':').position(|f| f == key).unwrap_or(fallback)
}

fn parse_header(text: &str) -> Result<vcf::Header, String> {
    let header: vcf::Header = text.parse().map_err(|e| format!("Invalid VCF header: {}", e))?;
    match header.sample_names().first() {
        Some(sample) => log::debug!("VCF sample column: {}", sample),
        None => return Err("VCF header declares no sample column".to_string()),
    }
    Ok(header)
}

/// Validate the header, then hand every data line to `on_record` with its line number
fn read_vcf<R, F>(reader: R, mut on_record: F) -> Result<vcf::Header, String>
where
    R: BufRead,
    F: FnMut(usize, &str) -> Result<(), String>,
{
    let mut header_text = String::new();
    let mut header: Option<vcf::Header> = None;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;
        if header.is_none() {
            if !line.starts_with('#') {
                return Err(format!("VCF line {} precedes the #CHROM header line", line_num + 1));
            }
            header_text.push_str(&line);
            header_text.push('\n');
            if line.starts_with("#CHROM") {
                header = Some(parse_header(&header_text)?);
            }
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        on_record(line_num + 1, &line)?;
    }

    header.ok_or_else(|| "VCF has no #CHROM header line".to_string())
}

fn split_record(line: &str, line_num: usize) -> Result<Vec<&str>, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 10 {
        return Err(format!(
            "VCF line {} has {} columns, expected at least 10",
            line_num, fields.len()
        ));
    }
    Ok(fields)
}

fn parse_position(value: &str, line_num: usize) -> Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("Invalid position '{}' at VCF line {}", value, line_num))
}

/// Read parental markers from any line source
pub fn read_parental_records<R: BufRead>(reader: R, prefix: &str) -> Result<SnpCatalog<ParentalSnp>, String> {
    let mut catalog = SnpCatalog::new();

    read_vcf(reader, |line_num, line| {
        let fields = split_record(line, line_num)?;
        let gt_index = format_index(fields[8], "GT", 0);
        let call = fields[9].split(':').nth(gt_index).unwrap_or("").to_string();

        catalog.push(ParentalSnp {
            chromosome: normalize_chromosome(fields[0], prefix),
            position: parse_position(fields[1], line_num)?,
            call,
        });
        Ok(())
    })?;

    let duplicates = catalog.finalize();
    if duplicates > 0 {
        log::warn!("{} duplicated parental positions ignored", duplicates);
    }
    Ok(catalog)
}

pub fn load_parental_vcf(file_path: &Path, prefix: &str) -> Result<SnpCatalog<ParentalSnp>, String> {
    println!("📄 Loading parental SNPs: {}", file_path.display());
    let catalog = read_parental_records(open_vcf(file_path)?, prefix)
        .map_err(|e| format!("Failed to read parental VCF '{}': {}", file_path.display(), e))?;
    if catalog.is_empty() {
        return Err(format!("No parental SNPs found in '{}'", file_path.display()));
    }
    println!(
        "✅ Parental SNPs loaded: {} SNPs on {} chromosomes",
        catalog.len(),
        catalog.chromosomes().count()
    );
    Ok(catalog)
}

fn parse_allele_depths(sample: &str, ad_index: usize) -> Option<(u64, u64)> {
    let ad = sample.split(':').nth(ad_index)?;
    let mut depths = ad.split(',');
    let ref_depth = depths.next()?.trim().parse::<u64>().ok()?;
    let alt_depth = depths.next()?.trim().parse::<u64>().ok()?;
    Some((ref_depth, alt_depth))
}

/// Read offspring records, keeping only informative SNPs present in `parental`
pub fn read_offspring_records<R: BufRead>(
    reader: R,
    prefix: &str,
    parental: &SnpCatalog<ParentalSnp>,
) -> Result<OffspringIngestion, String> {
    let mut ingestion = OffspringIngestion::default();

    read_vcf(reader, |line_num, line| {
        let fields = split_record(line, line_num)?;
        ingestion.stats.offspring_records += 1;

        if fields[7].split(';').any(|entry| entry == "DP=0") {
            ingestion.stats.zero_depth_records += 1;
        }

        let chromosome = normalize_chromosome(fields[0], prefix);
        let position = parse_position(fields[1], line_num)?;
        if !parental.contains(&chromosome, position) {
            ingestion.stats.new_snps += 1;
            ingestion.new_lines.push(line.to_string());
            return Ok(());
        }

        let gt_index = format_index(fields[8], "GT", 0);
        let ad_index = format_index(fields[8], "AD", 1);
        let call = fields[9].split(':').nth(gt_index).and_then(DiploidCall::parse);
        let depths = parse_allele_depths(fields[9], ad_index);

        match (call, depths) {
            (Some(call), Some((ref_depth, alt_depth))) => {
                ingestion.snps.push(OffspringSnp {
                    chromosome,
                    position,
                    call,
                    ref_depth,
                    alt_depth,
                });
            }
            _ => {
                ingestion.stats.weird_snps += 1;
                ingestion.weird_lines.push(line.to_string());
            }
        }
        Ok(())
    })?;

    ingestion.stats.duplicate_positions = ingestion.snps.finalize();
    ingestion.stats.informative_snps = ingestion.snps.len();
    ingestion.stats.parental_snps = parental.len();
    Ok(ingestion)
}

pub fn load_offspring_vcf(
    file_path: &Path,
    prefix: &str,
    parental: &SnpCatalog<ParentalSnp>,
) -> Result<OffspringIngestion, String> {
    println!("📄 Loading offspring SNPs: {}", file_path.display());
    let ingestion = read_offspring_records(open_vcf(file_path)?, prefix, parental)
        .map_err(|e| format!("Failed to read offspring VCF '{}': {}", file_path.display(), e))?;
    let stats = &ingestion.stats;
    println!(
        "✅ Offspring SNPs loaded: {} informative of {} records",
        stats.informative_snps, stats.offspring_records
    );
    if stats.new_snps > 0 {
        log::warn!("{} offspring SNPs absent from the parental set", stats.new_snps);
    }
    if stats.weird_snps > 0 {
        log::warn!("{} offspring SNPs with unusable genotype or depth", stats.weird_snps);
    }
    if stats.zero_depth_records > 0 {
        log::info!("{} records with DP=0", stats.zero_depth_records);
    }
    Ok(ingestion)
}

fn write_lines(file_path: &Path, lines: &[String]) -> Result<(), String> {
    let file = File::create(file_path)
        .map_err(|e| format!("Failed to create log file '{}': {}", file_path.display(), e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line).map_err(|e| format!("Write error: {}", e))?;
    }
    writer.flush().map_err(|e| format!("Flush error: {}", e))
}

/// Write `log/new_snps.log` and `log/weird_snps.log` under `outdir`
pub fn write_side_logs(outdir: &Path, ingestion: &OffspringIngestion) -> Result<(), String> {
    let log_dir = outdir.join("log");
    create_dir_all(&log_dir)
        .map_err(|e| format!("Failed to create log directory '{}': {}", log_dir.display(), e))?;
    write_lines(&log_dir.join("new_snps.log"), &ingestion.new_lines)?;
    write_lines(&log_dir.join("weird_snps.log"), &ingestion.weird_lines)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PARENTAL: &str = "##fileformat=VCFv4.2\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tparent\n\
1\t100\t.\tA\tT\t50\tPASS\tDP=30\tGT:AD\t1/1:0,30\n\
1\t200\t.\tC\tG\t50\tPASS\tDP=30\tGT:AD\t1/1:0,30\n\
2\t50\t.\tG\tA\t50\tPASS\tDP=30\tGT:AD\t1/1:0,30\n";

    fn parental() -> SnpCatalog<ParentalSnp> {
        read_parental_records(Cursor::new(PARENTAL), "Chr").unwrap()
    }

    #[test]
    fn test_read_parental() {
        let catalog = parental();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.contains("Chr1", 200));
        assert_eq!(catalog.get("Chr2")[0].call, "1/1");
    }

    #[test]
    fn test_read_offspring_classifies_records() {
        let offspring = "##fileformat=VCFv4.2\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tkid\n\
Chr1\t100\t.\tA\tT\t50\tPASS\tDP=12\tGT:AD:DP\t0/1:5,7:12\n\
Chr1\t150\t.\tA\tT\t50\tPASS\tDP=12\tGT:AD\t0/1:5,7\n\
Chr1\t200\t.\tC\tG\t50\tPASS\tDP=0\tGT:AD\t1/2:0,0\n\
Chr2\t50\t.\tG\tA\t50\tPASS\tDP=9\tAD:GT\t0,9:1|1\n";
        let ingestion = read_offspring_records(Cursor::new(offspring), "Chr", &parental()).unwrap();

        assert_eq!(ingestion.stats.offspring_records, 4);
        assert_eq!(ingestion.stats.informative_snps, 2);
        assert_eq!(ingestion.stats.new_snps, 1);
        assert_eq!(ingestion.stats.weird_snps, 1);
        assert_eq!(ingestion.stats.zero_depth_records, 1);
        assert!(ingestion.new_lines[0].contains("\t150\t"));

        let het = &ingestion.snps.get("Chr1")[0];
        assert_eq!((het.call, het.ref_depth, het.alt_depth), (DiploidCall::Het, 5, 7));
        let alt = &ingestion.snps.get("Chr2")[0];
        assert_eq!((alt.call, alt.alt_depth), (DiploidCall::HomAlt, 9));
    }

    #[test]
    fn test_short_record_is_error() {
        let text = format!("{}Chr1\t300\t.\tA\n", PARENTAL);
        let err = read_parental_records(Cursor::new(text), "Chr").unwrap_err();
        assert!(err.contains("at least 10"));
    }

    #[test]
    fn test_header_is_validated() {
        let err = read_parental_records(Cursor::new("Chr1\t100\t.\tA\tT\t50\tPASS\t.\tGT\t1/1\n"), "Chr").unwrap_err();
        assert!(err.contains("precedes the #CHROM header"));

        let err = read_parental_records(Cursor::new("##fileformat=VCFv4.2\n"), "Chr").unwrap_err();
        assert!(err.contains("no #CHROM header"));

        let no_sample = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        assert!(read_parental_records(Cursor::new(no_sample), "Chr").is_err());

        let no_fileformat = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tparent\n";
        assert!(read_parental_records(Cursor::new(no_fileformat), "Chr").unwrap_err().contains("Invalid VCF header"));
    }

    #[test]
    fn test_side_logs_written() {
        let dir = tempfile::tempdir().unwrap();
        let ingestion = OffspringIngestion {
            new_lines: vec!["a".to_string(), "b".to_string()],
            ..OffspringIngestion::default()
        };
        write_side_logs(dir.path(), &ingestion).unwrap();
        let content = std::fs::read_to_string(dir.path().join("log/new_snps.log")).unwrap();
        assert_eq!(content, "a\nb\n");
        assert!(dir.path().join("log/weird_snps.log").exists());
    }
}
