//! mumstats - Statistics for multi-mapping tag inputs
//!
//! Summarises tags, single- and multi-mappers and single-mapper support for a
//! flat-layout input, or compares two inputs side by side.
use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mumrescue::density::DensityIndex;
use mumrescue::reader::read_records_file;
use mumrescue::record::{RecordLayout, RecordSet};

#[derive(Parser)]
#[clap(
    name = "mumstats",
    about = "Statistics for multi-mapping tag inputs"
)]
struct Args {
    /// First input file (flat layout)
    file1: PathBuf,

    /// Optional second file for comparison
    file2: Option<PathBuf>,

    /// Show map-count histogram and per-chromosome counts
    #[clap(short = 'd', long)]
    detailed: bool,

    /// Skip the first line of each input as a header
    #[clap(long = "has-header")]
    has_header: bool,
}

#[derive(Debug, Default)]
struct InputStats {
    total_records: usize,
    total_tags: usize,
    single_mappers: usize,
    multi_mappers: usize,
    multi_mapper_records: usize,
    support_loci: usize,
    total_support: f64,
    map_count_histogram: BTreeMap<u32, usize>,
    chromosome_records: Vec<(String, usize)>,
}

impl InputStats {
    fn from_records(set: &RecordSet) -> Self {
        let mut stats = InputStats {
            total_records: set.records.len(),
            total_tags: set.num_tags(),
            ..Default::default()
        };

        for indices in set.tags.values() {
            let map_count = set.records[indices[0]].map_count;
            *stats.map_count_histogram.entry(map_count).or_insert(0) += 1;
            if map_count == 1 {
                stats.single_mappers += 1;
            } else {
                stats.multi_mappers += 1;
                stats.multi_mapper_records += indices.len();
            }
        }

        let index = DensityIndex::from_records(&set.records);
        stats.support_loci = index.len();
        stats.total_support = index.total_support();

        let mut per_chrom = vec![0usize; set.registry.len()];
        for record in &set.records {
            per_chrom[record.chrom_id as usize] += 1;
        }
        stats.chromosome_records = set
            .registry
            .names()
            .zip(per_chrom)
            .map(|(name, count)| (name.to_string(), count))
            .collect();

        stats
    }

    fn multi_mapper_fraction(&self) -> f64 {
        if self.total_tags > 0 {
            self.multi_mappers as f64 / self.total_tags as f64
        } else {
            0.0
        }
    }
}

fn load_stats(path: &Path, has_header: bool) -> Result<InputStats> {
    let set = read_records_file(path, RecordLayout::Flat, has_header)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(InputStats::from_records(&set))
}

fn print_stats(path: &str, stats: &InputStats, detailed: bool) {
    println!("\nStatistics for {path}:");
    println!("{}", "=".repeat(60));
    println!(
        "Total records:         {:>12}",
        group_thousands(stats.total_records)
    );
    println!(
        "Total tags:            {:>12}",
        group_thousands(stats.total_tags)
    );
    println!(
        "Single-mapping tags:   {:>12}",
        group_thousands(stats.single_mappers)
    );
    println!(
        "Multi-mapping tags:    {:>12}",
        group_thousands(stats.multi_mappers)
    );
    println!(
        "Multi-mapping records: {:>12}",
        group_thousands(stats.multi_mapper_records)
    );
    println!(
        "Multi-mapping share:   {:>11.1}%",
        stats.multi_mapper_fraction() * 100.0
    );
    println!(
        "Support loci:          {:>12}",
        group_thousands(stats.support_loci)
    );
    println!("Total support:         {:>12.1}", stats.total_support);

    if detailed {
        println!("\nMap-count histogram:");
        println!("{}", "-".repeat(60));
        for (map_count, tags) in &stats.map_count_histogram {
            println!("  {:>8} loci  {:>12} tags", map_count, group_thousands(*tags));
        }

        println!("\nRecords per chromosome:");
        println!("{}", "-".repeat(60));
        for (chrom, count) in &stats.chromosome_records {
            println!("  {:30} {:>12}", chrom, group_thousands(*count));
        }
    }
}

fn compare_stats(file1: &str, file2: &str, stats1: &InputStats, stats2: &InputStats) {
    println!("\nComparison: {file1} vs {file2}");
    println!("{}", "=".repeat(60));

    let rows = [
        ("Records", stats1.total_records, stats2.total_records),
        ("Tags", stats1.total_tags, stats2.total_tags),
        ("Single-mapping tags", stats1.single_mappers, stats2.single_mappers),
        ("Multi-mapping tags", stats1.multi_mappers, stats2.multi_mappers),
        ("Support loci", stats1.support_loci, stats2.support_loci),
    ];
    println!("{:24} {:>14} {:>14} {:>16}", "", file_label(file1), file_label(file2), "Delta");
    for (label, before, after) in rows {
        print_count_delta(label, before, after);
    }

    println!(
        "{:24} {:>13.1}% {:>13.1}% {:>+15.1}%",
        "Multi-mapping share",
        stats1.multi_mapper_fraction() * 100.0,
        stats2.multi_mapper_fraction() * 100.0,
        (stats2.multi_mapper_fraction() - stats1.multi_mapper_fraction()) * 100.0
    );
}

/// Last path component, trimmed to fit a column
fn file_label(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    name.chars().take(14).collect()
}

fn print_count_delta(label: &str, before: usize, after: usize) {
    let delta = after as i64 - before as i64;
    let signed = if delta < 0 {
        format!("-{}", group_thousands(delta.unsigned_abs() as usize))
    } else {
        format!("+{}", group_thousands(delta as usize))
    };
    println!(
        "{:24} {:>14} {:>14} {:>16}",
        label,
        group_thousands(before),
        group_thousands(after),
        signed
    );
}

/// Decimal digits with a comma between each group of three
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    out.push_str(&digits[..head]);
    for (i, chunk) in digits.as_bytes()[head..].chunks(3).enumerate() {
        if head > 0 || i > 0 {
            out.push(',');
        }
        out.extend(chunk.iter().map(|&b| b as char));
    }
    out
}

fn main() -> Result<()> {
    let args = Args::parse();

    let stats1 = load_stats(&args.file1, args.has_header)?;
    let name1 = args.file1.display().to_string();

    if let Some(file2) = args.file2 {
        let stats2 = load_stats(&file2, args.has_header)?;
        compare_stats(&name1, &file2.display().to_string(), &stats1, &stats2);
    } else {
        print_stats(&name1, &stats1, args.detailed);
    }

    Ok(())
}
