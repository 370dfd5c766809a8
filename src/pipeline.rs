use rayon::prelude::*;
use std::io::Write;
use std::path::Path;

use crate::collapse::collapse_groups;
use crate::density::DensityIndex;
use crate::emit::{expand_group, retain_chromosome, RescuedRow, RowWriter};
use crate::error::{RescueError, Result};
use crate::reader::{check_input, read_records_file};
use crate::record::{RecordLayout, RecordSet};
use crate::rescue::{weight_group, weight_tag, GroupLocusIndex, NoSupportPolicy};
use crate::signature::build_signatures;
use crate::window::Window;

/// Rescue configuration
#[derive(Debug, Clone)]
pub struct RescueConfig {
    pub window: u32,                       // -w/--window
    pub target_chromosome: Option<String>, // -c/--chromosome
    pub dispose_no_nearby: bool,           // --dispose-no-nearby (flat only)
    pub has_header: bool,                  // --has-header
    pub emit_header: bool,                 // --emit-header
}

impl Default for RescueConfig {
    fn default() -> Self {
        RescueConfig {
            window: 51,
            target_chromosome: None,
            dispose_no_nearby: false,
            has_header: false,
            emit_header: false,
        }
    }
}

impl RescueConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(RescueError::Configuration(
                "window must be a positive odd integer".to_string(),
            ));
        }
        if self.window % 2 == 0 {
            log::warn!(
                "Window {} is even; the neighbourhood [pos-{}, pos+{}) is not symmetric",
                self.window,
                self.window / 2,
                self.window / 2
            );
        }
        if let Some(chrom) = &self.target_chromosome {
            if chrom.is_empty() {
                return Err(RescueError::Configuration(
                    "target chromosome must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn window(&self) -> Window {
        Window::new(self.window)
    }

    fn policy(&self) -> NoSupportPolicy {
        if self.dispose_no_nearby {
            NoSupportPolicy::Dispose
        } else {
            NoSupportPolicy::Uniform
        }
    }
}

/// Counts gathered during one run, for logging
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RescueSummary {
    pub tags: usize,
    pub single_mappers: usize,
    pub multi_mappers: usize,
    pub ineligible_tags: usize,
    pub groups: usize,
    pub silent_groups: usize,
    pub rows: usize,
}

/// Flat variant: each multi-mapper weighted on its own against single-mapper density
pub struct FlatRescue {
    config: RescueConfig,
}

impl FlatRescue {
    pub fn new(config: RescueConfig) -> Self {
        FlatRescue { config }
    }

    /// Weight every tag, in tag first-appearance order
    pub fn rescue(&self, set: &RecordSet) -> (Vec<RescuedRow>, RescueSummary) {
        let window = self.config.window();
        let policy = self.config.policy();

        let index = DensityIndex::from_records(&set.records);
        log::info!(
            "Density index: {} loci from {} single-mapper records (total support {:.2})",
            index.len(),
            index.num_records(),
            index.total_support()
        );

        let per_tag: Vec<Vec<RescuedRow>> = (0..set.num_tags())
            .into_par_iter()
            .map(|tag_idx| {
                weight_tag(set, tag_idx, &index, &window, policy)
                    .into_iter()
                    .map(RescuedRow::from)
                    .collect()
            })
            .collect();

        let mut summary = RescueSummary {
            tags: set.num_tags(),
            ..Default::default()
        };
        for (_, indices) in &set.tags {
            if set.records[indices[0]].map_count == 1 {
                summary.single_mappers += 1;
            } else {
                summary.multi_mappers += 1;
            }
        }

        let mut rows: Vec<RescuedRow> = per_tag.into_iter().flatten().collect();
        if let Some(target) = &self.config.target_chromosome {
            retain_chromosome(&mut rows, set, target);
        }
        summary.rows = rows.len();

        (rows, summary)
    }
}

/// Grouped variant: tags collapsed by candidate signature, weighted by nearby unique groups
pub struct GroupedRescue {
    config: RescueConfig,
}

impl GroupedRescue {
    pub fn new(config: RescueConfig) -> Self {
        GroupedRescue { config }
    }

    /// Run the grouped pipeline for one target chromosome
    pub fn rescue_chromosome(&self, set: &RecordSet, target: &str) -> (Vec<RescuedRow>, RescueSummary) {
        let window = self.config.window();

        let signatures = build_signatures(set, target, &window);
        let groups = collapse_groups(&signatures);
        let locus_index = GroupLocusIndex::build(set, &signatures, &groups);

        log::info!(
            "{}: {} eligible tags collapsed into {} groups ({} tags dropped as unreachable)",
            target,
            signatures.signatures.len(),
            groups.len(),
            signatures.ineligible
        );

        let per_group: Vec<Option<Vec<RescuedRow>>> = (0..groups.len())
            .into_par_iter()
            .map(|group_idx| {
                weight_group(set, &signatures, &groups, group_idx, &locus_index, &window)
                    .map(|weights| expand_group(&groups[group_idx], &weights, &signatures))
            })
            .collect();

        let mut summary = RescueSummary {
            tags: set.num_tags(),
            ineligible_tags: signatures.ineligible,
            groups: groups.len(),
            ..Default::default()
        };
        for group in &groups {
            let candidates = signatures
                .get(group.representative)
                .map(|s| s.len())
                .unwrap_or(0);
            if candidates == 1 {
                summary.single_mappers += group.size();
            } else {
                summary.multi_mappers += group.size();
            }
        }
        summary.silent_groups = per_group.iter().filter(|rows| rows.is_none()).count();

        let mut rows: Vec<RescuedRow> = per_group.into_iter().flatten().flatten().collect();
        retain_chromosome(&mut rows, set, target);
        summary.rows = rows.len();

        (rows, summary)
    }

    /// Target chromosomes for this run: the configured one, or every chromosome seen
    pub fn targets(&self, set: &RecordSet, all_chromosomes: bool) -> Result<Vec<String>> {
        if all_chromosomes {
            return Ok(set.registry.names().map(|s| s.to_string()).collect());
        }
        match &self.config.target_chromosome {
            Some(chrom) => Ok(vec![chrom.clone()]),
            None => Err(RescueError::Configuration(
                "the grouped variant needs a target chromosome".to_string(),
            )),
        }
    }
}

/// Which rescue variant to run over a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Flat,
    Grouped { all_chromosomes: bool },
}

impl Variant {
    fn layout(&self) -> RecordLayout {
        match self {
            Variant::Flat => RecordLayout::Flat,
            Variant::Grouped { .. } => RecordLayout::Grouped,
        }
    }
}

/// Load `input`, rescue it and write rows to `output`
///
/// Phases never interleave: the whole input is loaded and indexed before any
/// weight is computed, and all weights are computed before any row is written.
pub fn rescue_file<P: AsRef<Path>, W: Write>(
    config: &RescueConfig,
    variant: Variant,
    input: P,
    output: W,
) -> Result<RescueSummary> {
    config.validate()?;
    if variant == (Variant::Grouped { all_chromosomes: false }) && config.target_chromosome.is_none() {
        return Err(RescueError::Configuration(
            "the grouped variant needs a target chromosome or --all-chromosomes".to_string(),
        ));
    }
    check_input(&input)?;

    let set = read_records_file(&input, variant.layout(), config.has_header)?;
    log::info!(
        "Loaded {} records for {} tags on {} chromosomes",
        set.records.len(),
        set.num_tags(),
        set.registry.len()
    );

    let mut writer = RowWriter::new(output);
    if config.emit_header {
        writer.write_header(&set.output_header())?;
    }

    let summary = match variant {
        Variant::Flat => {
            let (rows, summary) = FlatRescue::new(config.clone()).rescue(&set);
            writer.write_rows(&set, &rows)?;
            summary
        }
        Variant::Grouped { all_chromosomes } => {
            let grouped = GroupedRescue::new(config.clone());
            let mut total = RescueSummary {
                tags: set.num_tags(),
                ..Default::default()
            };
            for target in grouped.targets(&set, all_chromosomes)? {
                let (rows, summary) = grouped.rescue_chromosome(&set, &target);
                writer.write_rows(&set, &rows)?;
                total.single_mappers += summary.single_mappers;
                total.multi_mappers += summary.multi_mappers;
                total.ineligible_tags += summary.ineligible_tags;
                total.groups += summary.groups;
                total.silent_groups += summary.silent_groups;
                total.rows += summary.rows;
            }
            total
        }
    };

    let written = writer.finish()?;
    log::info!(
        "Wrote {} rows ({} single-mapping, {} multi-mapping tags)",
        written,
        summary.single_mappers,
        summary.multi_mappers
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::RecordReader;
    use std::io::Cursor;

    fn load(data: &str, layout: RecordLayout) -> RecordSet {
        RecordReader::new(Cursor::new(data.to_string()), layout)
            .read_all()
            .unwrap()
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = RescueConfig {
            window: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RescueError::Configuration(_))));
        assert!(RescueConfig::default().validate().is_ok());
    }

    #[test]
    fn test_flat_rescue_filters_target_chromosome() {
        let set = load(
            "u1\t1\tchr1\t100\t135\t+\t5\n\
             t1\t2\tchr1\t102\t137\t+\t2\n\
             t1\t2\tchr2\t500\t535\t+\t2\n",
            RecordLayout::Flat,
        );
        let config = RescueConfig {
            window: 11,
            target_chromosome: Some("chr2".to_string()),
            ..Default::default()
        };
        let (rows, summary) = FlatRescue::new(config).rescue(&set);
        assert_eq!(rows, vec![RescuedRow { record: 2, coefficient: 0.0 }]);
        assert_eq!(summary.single_mappers, 1);
        assert_eq!(summary.multi_mappers, 1);
        assert_eq!(summary.rows, 1);
    }

    #[test]
    fn test_grouped_targets() {
        let set = load("t1\t1\tchr1\t1\t2\t+\nt2\t1\tchr2\t1\t2\t+\n", RecordLayout::Grouped);
        let grouped = GroupedRescue::new(RescueConfig::default());
        assert!(grouped.targets(&set, false).is_err());
        assert_eq!(grouped.targets(&set, true).unwrap(), vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_grouped_rescue_drops_unreachable_tags() {
        let set = load(
            "t1\t4\tchr1\t100\t135\t+\tSiM\n\
             t2\t4\tchr1\t100\t135\t+\tSiM\n\
             far\t4\tchr2\t100\t135\t+\tSiM\n",
            RecordLayout::Grouped,
        );
        let config = RescueConfig {
            window: 11,
            ..Default::default()
        };
        let (rows, summary) = GroupedRescue::new(config).rescue_chromosome(&set, "chr1");
        assert_eq!(
            rows,
            vec![
                RescuedRow { record: 0, coefficient: 1.0 },
                RescuedRow { record: 1, coefficient: 1.0 },
            ]
        );
        assert_eq!(summary.groups, 1);
        assert_eq!(summary.ineligible_tags, 1);
    }
}
