// tsv.rs - Chromosome length and centromere tables

use super::normalize_chromosome;
use crate::data::genome::{Centromeres, ChromosomeLengths};
use std::path::Path;

fn tab_reader(file_path: &Path) -> Result<csv::Reader<std::fs::File>, String> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_path(file_path)
        .map_err(|e| format!("Failed to open table '{}': {}", file_path.display(), e))
}

fn parse_coordinate(value: &str, what: &str, line: usize, file_path: &Path) -> Result<u64, String> {
    value.trim().parse::<u64>().map_err(|_| {
        format!(
            "Invalid {} '{}' at line {} of '{}'",
            what,
            value,
            line,
            file_path.display()
        )
    })
}

/// Load `chromosome<TAB>length` rows (no header)
pub fn load_chromosome_lengths(file_path: &Path, prefix: &str) -> Result<ChromosomeLengths, String> {
    let mut reader = tab_reader(file_path)?;
    let mut lengths = ChromosomeLengths::new();

    for (line_num, record) in reader.records().enumerate() {
        let record = record.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() < 2 {
            return Err(format!(
                "Line {} of '{}' has {} columns, expected 2",
                line_num + 1,
                file_path.display(),
                record.len()
            ));
        }
        let chromosome = normalize_chromosome(&record[0], prefix);
        let length = parse_coordinate(&record[1], "chromosome length", line_num + 1, file_path)?;
        lengths.insert(&chromosome, length);
    }

    if lengths.is_empty() {
        return Err(format!("No chromosome lengths found in '{}'", file_path.display()));
    }
    println!("✅ Chromosome lengths loaded: {} chromosomes", lengths.len());
    Ok(lengths)
}

/// Load `chromosome<TAB>left<TAB>right` rows; a leading header row is skipped
pub fn load_centromeres(file_path: &Path, prefix: &str) -> Result<Centromeres, String> {
    let mut reader = tab_reader(file_path)?;
    let mut centromeres = Centromeres::new();

    for (line_num, record) in reader.records().enumerate() {
        let record = record.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() != 3 {
            return Err(format!(
                "Line {} of '{}' has {} columns, expected 3 (chromosome, left, right)",
                line_num + 1,
                file_path.display(),
                record.len()
            ));
        }
        if line_num == 0 && record[1].trim().parse::<u64>().is_err() {
            continue;
        }
        let chromosome = normalize_chromosome(&record[0], prefix);
        let left = parse_coordinate(&record[1], "left border", line_num + 1, file_path)?;
        let right = parse_coordinate(&record[2], "right border", line_num + 1, file_path)?;
        if left > right {
            return Err(format!(
                "Centromere of {} has left border {} after right border {}",
                chromosome, left, right
            ));
        }
        centromeres.insert(&chromosome, left, right);
    }

    println!("✅ Centromeres loaded: {} chromosomes", centromeres.len());
    Ok(centromeres)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_lengths_with_prefix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lengths.tsv");
        fs::write(&path, "1\t30427671\nChr2\t19698289\n\n").unwrap();

        let lengths = load_chromosome_lengths(&path, "Chr").unwrap();
        assert_eq!(lengths.chromosomes().collect::<Vec<_>>(), vec!["Chr1", "Chr2"]);
        assert_eq!(lengths.get("Chr1"), Some(30427671));
    }

    #[test]
    fn test_load_lengths_rejects_bad_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lengths.tsv");
        fs::write(&path, "Chr1\tlong\n").unwrap();
        assert!(load_chromosome_lengths(&path, "Chr").is_err());
    }

    #[test]
    fn test_load_centromeres_skips_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cen.tsv");
        fs::write(&path, "chr\tleft\tright\n1\t13700000\t15900000\n").unwrap();

        let centromeres = load_centromeres(&path, "Chr").unwrap();
        assert_eq!(centromeres.len(), 1);
        let cen = centromeres.get("Chr1").unwrap();
        assert_eq!((cen.left, cen.right), (13700000, 15900000));
    }

    #[test]
    fn test_load_centromeres_column_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cen.tsv");
        fs::write(&path, "Chr1\t100\n").unwrap();
        assert!(load_centromeres(&path, "Chr").is_err());
    }
}
