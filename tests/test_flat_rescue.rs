/// Flat-variant rescue tests through the library entry point
use anyhow::Result;
use pretty_assertions::assert_eq;
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

use mumrescue::error::RescueError;
use mumrescue::pipeline::{rescue_file, RescueConfig, Variant};

use test_utils::*;

const SCENARIO_SUPPORTED: &str = "u1\t1\tchr1\t100\t135\t+\t5\n\
                                  t1\t2\tchr1\t102\t137\t+\t3\n\
                                  t1\t2\tchr2\t500\t535\t+\t3\n";

const SCENARIO_UNSUPPORTED: &str = "t1\t2\tchr1\t102\t137\t+\t3\n\
                                    t1\t2\tchr2\t500\t535\t+\t3\n";

fn run_flat(input: &str, config: &RescueConfig) -> Result<String> {
    let dir = TempDir::new()?;
    let path = write_input(dir.path(), "input.tsv", input);
    let mut out = Vec::new();
    rescue_file(config, Variant::Flat, &path, &mut out)?;
    Ok(String::from_utf8(out)?)
}

fn config(window: u32, dispose: bool) -> RescueConfig {
    RescueConfig {
        window,
        dispose_no_nearby: dispose,
        ..Default::default()
    }
}

#[test]
fn test_unique_support_claims_candidate() -> Result<()> {
    let out = run_flat(SCENARIO_SUPPORTED, &config(10, true))?;
    assert_eq!(
        out,
        "u1\t1\tchr1\t100\t135\t+\t5\t1.000000\t5.000000\n\
         t1\t2\tchr1\t102\t137\t+\t3\t1.000000\t3.000000\n\
         t1\t2\tchr2\t500\t535\t+\t3\t0.000000\t0.000000\n"
    );
    Ok(())
}

#[test]
fn test_no_support_disposed() -> Result<()> {
    let rows = parse_output(&run_flat(SCENARIO_UNSUPPORTED, &config(10, true))?);
    let coefficients: Vec<f64> = rows.iter().map(|r| r.coefficient).collect();
    assert_eq!(coefficients, vec![0.0, 0.0]);
    Ok(())
}

#[test]
fn test_no_support_uniform_fallback() -> Result<()> {
    let rows = parse_output(&run_flat(SCENARIO_UNSUPPORTED, &config(10, false))?);
    let coefficients: Vec<f64> = rows.iter().map(|r| r.coefficient).collect();
    assert_eq!(coefficients, vec![0.5, 0.5]);
    let weights: Vec<f64> = rows.iter().map(|r| r.weight).collect();
    assert_eq!(weights, vec![1.5, 1.5]);
    Ok(())
}

#[test]
fn test_reverse_strand_support_uses_stop() -> Result<()> {
    // Single mapper on '-' at stop 200; candidate on '-' with stop 203
    let input = "u1\t1\tchr1\t165\t200\t-\t2\n\
                 t1\t2\tchr1\t168\t203\tR\t1\n\
                 t1\t2\tchr1\t168\t203\t+\t1\n";
    let rows = parse_output(&run_flat(input, &config(11, true))?);
    assert_eq!(rows[1].coefficient, 1.0);
    assert_eq!(rows[2].coefficient, 0.0);
    Ok(())
}

#[test]
fn test_header_skipped_and_echoed() -> Result<()> {
    let input = format!("name\tmc\tchr\tstart\tstop\tstrand\texpr\n{SCENARIO_SUPPORTED}");
    let cfg = RescueConfig {
        has_header: true,
        emit_header: true,
        ..config(10, true)
    };
    let out = run_flat(&input, &cfg)?;
    let first = out.lines().next().unwrap_or_default();
    assert_eq!(first, "name\tmc\tchr\tstart\tstop\tstrand\texpr\tcoefficient\tweight");
    assert_eq!(out.lines().count(), 4);
    Ok(())
}

#[test]
fn test_target_chromosome_restricts_output() -> Result<()> {
    let cfg = RescueConfig {
        target_chromosome: Some("chr1".to_string()),
        ..config(10, true)
    };
    let rows = parse_output(&run_flat(SCENARIO_SUPPORTED, &cfg)?);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.chromosome() == "chr1"));
    Ok(())
}

#[test]
fn test_weights_sum_per_tag() -> Result<()> {
    let input = generate_flat_input(300, 7);
    for dispose in [true, false] {
        let rows = parse_output(&run_flat(&input, &config(101, dispose))?);
        for (id, sum) in coefficient_sums(&rows) {
            // Six-decimal output: allow rounding of each row
            let ok = (sum - 1.0).abs() < 1e-4 || (dispose && sum.abs() < 1e-9);
            assert!(ok, "tag {id} coefficients sum to {sum} (dispose={dispose})");
        }
    }
    Ok(())
}

#[test]
fn test_rerun_is_byte_identical() -> Result<()> {
    let input = generate_flat_input(500, 11);
    let first = run_flat(&input, &config(51, false))?;
    let second = run_flat(&input, &config(51, false))?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_bgzip_input() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("input.tsv.gz");
    let mut writer = noodles::bgzf::io::Writer::new(File::create(&path)?);
    writer.write_all(SCENARIO_SUPPORTED.as_bytes())?;
    writer.finish()?;

    let mut out = Vec::new();
    rescue_file(&config(10, true), Variant::Flat, &path, &mut out)?;
    let rows = parse_output(&String::from_utf8(out)?);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].coefficient, 1.0);
    Ok(())
}

#[test]
fn test_malformed_strand_is_fatal() -> Result<()> {
    let input = "t1\t2\tchr1\t102\t137\t?\t3\n";
    let err = run_flat(input, &config(10, true)).unwrap_err();
    assert!(err.to_string().contains("line 1"), "got: {err}");
    Ok(())
}

#[test]
fn test_out_of_range_coordinate_is_fatal() {
    let input = "t1\t2\tchr1\t9223372036854775800\t9223372036854775807\t+\t1\n\
                 t1\t2\tchr2\t500\t535\t+\t1\n";
    let err = run_flat(input, &config(51, false)).unwrap_err();
    let malformed = err.downcast_ref::<RescueError>();
    assert!(
        matches!(malformed, Some(RescueError::MalformedRecord { line: 1, .. })),
        "got: {err}"
    );
}

#[test]
fn test_empty_input_produces_no_rows() -> Result<()> {
    let out = run_flat("", &config(10, true))?;
    assert_eq!(out, "");
    Ok(())
}
