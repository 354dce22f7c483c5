// mod.rs - Input file loaders

pub mod tsv;
pub mod vcf;

pub use tsv::{load_centromeres, load_chromosome_lengths};
pub use vcf::{load_offspring_vcf, load_parental_vcf, IngestionStats, OffspringIngestion};

/// Prepend `prefix` to chromosome names that lack it (`1` -> `Chr1`)
pub fn normalize_chromosome(name: &str, prefix: &str) -> String {
    let name = name.trim();
    if prefix.is_empty() || name.starts_with(prefix) {
        name.to_string()
    } else {
        format!("{}{}", prefix, name)
    }
}
