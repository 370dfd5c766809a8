use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use env_logger::Env;
use std::io::{self, Write};
use std::path::PathBuf;

use mumrescue::pipeline::{rescue_file, RescueConfig, Variant};

/// Parse a window width; accepts a k/K suffix (1000) but only whole numbers
fn parse_window(s: &str) -> Result<u32, String> {
    if s.is_empty() {
        return Err("Empty string".to_string());
    }

    let (num_part, multiplier) = match s.chars().last() {
        Some('k') | Some('K') => (&s[..s.len() - 1], 1000u64),
        Some(c) if c.is_ascii_alphabetic() => {
            return Err(format!("Unknown suffix '{c}'. Use k/K (1000)"))
        }
        _ => (s, 1u64),
    };

    let base: u64 = num_part
        .parse()
        .map_err(|_| format!("Window must be a whole number, got '{s}'"))?;
    let result = base * multiplier;

    if result == 0 {
        return Err("Window must be at least 1".to_string());
    }
    if result > u32::MAX as u64 {
        return Err(format!("Value {result} too large for u32"));
    }

    Ok(result as u32)
}

/// mumrescue - Rescue multi-mapping tags by weighting their candidate loci
///
/// Each multi-mapping tag's evidence is split across its candidate loci in
/// proportion to the unambiguous support found near each of them.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Weight each multi-mapper by nearby single-mapper expression
    ///
    /// Input columns: id, mapCount, chromosome, start, stop, strand, expression[, flag]
    Flat(FlatArgs),

    /// Collapse tags with identical candidate signatures, then weight groups by nearby groups
    ///
    /// Input columns: id, score, chromosome, start, stop, strand[, qualityFlag]
    Grouped(GroupedArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input records (tab-separated; .gz/.bgz read as bgzip)
    #[clap(value_name = "INPUT")]
    input: PathBuf,

    /// Neighbourhood width in bases (odd, so the window is symmetric)
    #[clap(short = 'w', long = "window", default_value = "51", value_parser = parse_window)]
    window: u32,

    /// Skip the first input line as a header
    #[clap(long = "has-header")]
    has_header: bool,

    /// Write a header line before the output rows
    #[clap(long = "emit-header")]
    emit_header: bool,

    /// Output file (stdout if not specified)
    #[clap(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Number of threads for parallel weighting
    #[clap(short = 't', long = "threads", default_value = "8")]
    threads: usize,

    /// Quiet mode (warnings and errors only)
    #[clap(long = "quiet")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct FlatArgs {
    #[clap(flatten)]
    common: CommonArgs,

    /// Only emit rows on this chromosome
    #[clap(short = 'c', long = "chromosome")]
    chromosome: Option<String>,

    /// Give multi-mappers with no nearby single-mapper support weight 0 instead of 1/mapCount
    #[clap(long = "dispose-no-nearby")]
    dispose_no_nearby: bool,
}

#[derive(Args, Debug)]
struct GroupedArgs {
    #[clap(flatten)]
    common: CommonArgs,

    /// Target chromosome: signatures are built around it and only its rows are emitted
    #[clap(
        short = 'c',
        long = "chromosome",
        required_unless_present = "all_chromosomes",
        conflicts_with = "all_chromosomes"
    )]
    chromosome: Option<String>,

    /// Run once per chromosome in the input and concatenate the results
    #[clap(long = "all-chromosomes")]
    all_chromosomes: bool,
}

fn parse_cli() -> Cli {
    // No arguments at all: usage, success
    if std::env::args_os().len() <= 1 {
        let _ = Cli::command().print_help();
        println!();
        std::process::exit(0);
    }

    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;
            let code = match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    }
}

fn main() -> Result<()> {
    let cli = parse_cli();

    let (common, config, variant) = match cli.command {
        Command::Flat(args) => {
            let config = RescueConfig {
                window: args.common.window,
                target_chromosome: args.chromosome,
                dispose_no_nearby: args.dispose_no_nearby,
                has_header: args.common.has_header,
                emit_header: args.common.emit_header,
            };
            (args.common, config, Variant::Flat)
        }
        Command::Grouped(args) => {
            let config = RescueConfig {
                window: args.common.window,
                target_chromosome: args.chromosome,
                dispose_no_nearby: false,
                has_header: args.common.has_header,
                emit_header: args.common.emit_header,
            };
            let variant = Variant::Grouped {
                all_chromosomes: args.all_chromosomes,
            };
            (args.common, config, variant)
        }
    };

    let default_level = if common.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    // Set up rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(common.threads)
        .build_global()?;

    let output: Box<dyn Write> = if let Some(ref path) = common.output {
        Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?,
        )
    } else {
        Box::new(io::stdout().lock())
    };

    rescue_file(&config, variant, &common.input, output)
        .with_context(|| format!("Rescue of {} failed", common.input.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("51"), Ok(51));
        assert_eq!(parse_window("1k"), Ok(1000));
        assert!(parse_window("").is_err());
        assert!(parse_window("0").is_err());
        assert!(parse_window("5.5").is_err());
        assert!(parse_window("abc").is_err());
        assert!(parse_window("-3").is_err());
        assert!(parse_window("10x").is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
