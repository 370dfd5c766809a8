use indexmap::IndexMap;
use std::fmt;

use crate::chrom_registry::ChromosomeRegistry;
use crate::error::{RescueError, Result};
use crate::locus::{LocusKey, Strand, StrandKey};

/// Quality flag marking a confirmed singleton match
pub const SINGLETON_FLAG: &str = "SiM";

/// Largest accepted start or stop coordinate
pub const MAX_COORDINATE: i64 = u32::MAX as i64;

/// Column layout of the input rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// `id, mapCount, chromosome, start, stop, strand, expression[, flag]`
    Flat,
    /// `id, score, chromosome, start, stop, strand[, qualityFlag]`
    Grouped,
}

impl RecordLayout {
    fn column_range(&self) -> (usize, usize) {
        match self {
            RecordLayout::Flat => (7, 8),
            RecordLayout::Grouped => (6, 7),
        }
    }

    /// Header used when the input did not carry one
    pub fn default_header(&self) -> &'static str {
        match self {
            RecordLayout::Flat => "id\tmap_count\tchromosome\tstart\tstop\tstrand\texpression",
            RecordLayout::Grouped => "id\tscore\tchromosome\tstart\tstop\tstrand",
        }
    }

    /// Name of the optional trailing column
    pub fn flag_column(&self) -> &'static str {
        match self {
            RecordLayout::Flat => "flag",
            RecordLayout::Grouped => "quality_flag",
        }
    }
}

/// One reported alignment of a tag
#[derive(Debug, Clone)]
pub struct Record {
    pub line: usize, // 1-based input line
    pub id: String,
    pub map_count: u32,
    pub chromosome: String,
    pub chrom_id: u32,
    pub start: i64,
    pub stop: i64,
    pub strand: Strand,
    pub score: f64, // expression value (flat) or alignment score (grouped)
    pub flag: Option<String>,
    pub raw: String,
}

/// Identity of a candidate alignment inside a signature: `(chromosome, start, stop, strand)`
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct TupleKey {
    pub chrom_id: u32,
    pub start: i64,
    pub stop: i64,
    pub strand: Strand,
}

impl Record {
    /// Parse one tab-separated row
    pub fn parse(
        layout: RecordLayout,
        raw: &str,
        line: usize,
        registry: &mut ChromosomeRegistry,
    ) -> Result<Record> {
        let fields: Vec<&str> = raw.split('\t').collect();
        let (min_cols, max_cols) = layout.column_range();

        if fields.len() < min_cols || fields.len() > max_cols {
            return Err(RescueError::malformed(
                line,
                format!(
                    "expected {min_cols} or {max_cols} tab-separated columns, found {}",
                    fields.len()
                ),
            ));
        }

        let id = fields[0];
        if id.is_empty() {
            return Err(RescueError::malformed(line, "empty tag id"));
        }

        let (map_count, score) = match layout {
            RecordLayout::Flat => {
                let map_count: u32 = parse_field(fields[1], "map count", line)?;
                if map_count == 0 {
                    return Err(RescueError::malformed(line, "map count must be at least 1"));
                }
                (map_count, parse_field::<f64>(fields[6], "expression value", line)?)
            }
            // Filled in from the number of rows per tag once the input is loaded
            RecordLayout::Grouped => (0, parse_field::<f64>(fields[1], "score", line)?),
        };

        if !score.is_finite() || score < 0.0 {
            return Err(RescueError::malformed(
                line,
                format!("score must be a non-negative number, found '{score}'"),
            ));
        }

        let chromosome = fields[2];
        if chromosome.is_empty() {
            return Err(RescueError::malformed(line, "empty chromosome name"));
        }
        let start: i64 = parse_field(fields[3], "start", line)?;
        let stop: i64 = parse_field(fields[4], "stop", line)?;
        for (name, value) in [("start", start), ("stop", stop)] {
            if !(0..=MAX_COORDINATE).contains(&value) {
                return Err(RescueError::malformed(
                    line,
                    format!("{name} coordinate {value} outside 0..={MAX_COORDINATE}"),
                ));
            }
        }
        let strand: Strand = fields[5]
            .parse()
            .map_err(|reason: String| RescueError::malformed(line, reason))?;

        let flag = fields
            .get(max_cols - 1)
            .filter(|f| !f.is_empty())
            .map(|f| f.to_string());

        Ok(Record {
            line,
            id: id.to_string(),
            map_count,
            chromosome: chromosome.to_string(),
            chrom_id: registry.get_or_assign_id(chromosome),
            start,
            stop,
            strand,
            score,
            flag,
            raw: raw.to_string(),
        })
    }

    /// Locus key of this alignment (start on `+`, stop on `-`)
    pub fn locus(&self) -> LocusKey {
        LocusKey::of_alignment(self.chrom_id, self.strand, self.start, self.stop)
    }

    /// Locus key anchored at `start` regardless of strand
    pub fn start_locus(&self) -> LocusKey {
        LocusKey::new(self.chrom_id, self.strand, self.start)
    }

    pub fn strand_key(&self) -> StrandKey {
        StrandKey {
            chrom_id: self.chrom_id,
            strand: self.strand,
        }
    }

    pub fn tuple_key(&self) -> TupleKey {
        TupleKey {
            chrom_id: self.chrom_id,
            start: self.start,
            stop: self.stop,
            strand: self.strand,
        }
    }

    pub fn is_singleton_confirmed(&self) -> bool {
        self.flag.as_deref() == Some(SINGLETON_FLAG)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn parse_field<T: std::str::FromStr>(value: &str, name: &str, line: usize) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RescueError::malformed(line, format!("invalid {name} '{value}'")))
}

/// All records of one input, indexed by tag in first-appearance order
#[derive(Debug, Clone)]
pub struct RecordSet {
    pub layout: RecordLayout,
    pub header: Option<String>,
    pub records: Vec<Record>,
    /// Tag id -> indices into `records`
    pub tags: IndexMap<String, Vec<usize>>,
    pub registry: ChromosomeRegistry,
}

impl RecordSet {
    pub fn new(layout: RecordLayout, registry: ChromosomeRegistry) -> Self {
        RecordSet {
            layout,
            header: None,
            records: Vec::new(),
            tags: IndexMap::new(),
            registry,
        }
    }

    pub fn push(&mut self, record: Record) {
        let idx = self.records.len();
        self.tags.entry(record.id.clone()).or_default().push(idx);
        self.records.push(record);
    }

    /// Check the per-tag map count invariant (flat) or derive map counts (grouped)
    pub fn finish(&mut self) -> Result<()> {
        for indices in self.tags.values() {
            match self.layout {
                RecordLayout::Flat => {
                    let first = &self.records[indices[0]];
                    if let Some(&bad) = indices
                        .iter()
                        .find(|&&i| self.records[i].map_count != first.map_count)
                    {
                        let rec = &self.records[bad];
                        return Err(RescueError::malformed(
                            rec.line,
                            format!(
                                "tag '{}' has map count {} here but {} at line {}",
                                rec.id, rec.map_count, first.map_count, first.line
                            ),
                        ));
                    }
                }
                RecordLayout::Grouped => {
                    let count = indices.len() as u32;
                    for &i in indices {
                        self.records[i].map_count = count;
                    }
                }
            }
        }
        Ok(())
    }

    /// Records of the tag at position `tag_idx`
    pub fn tag_records(&self, tag_idx: usize) -> impl Iterator<Item = (usize, &Record)> {
        self.tags
            .get_index(tag_idx)
            .map(|(_, indices)| indices.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&i| (i, &self.records[i]))
    }

    pub fn tag_id(&self, tag_idx: usize) -> Option<&str> {
        self.tags.get_index(tag_idx).map(|(id, _)| id.as_str())
    }

    pub fn num_tags(&self) -> usize {
        self.tags.len()
    }

    pub fn chromosome_name(&self, chrom_id: u32) -> &str {
        self.registry.get_name(chrom_id).unwrap_or("")
    }

    /// Header line to write ahead of the output rows
    ///
    /// Without an input header the default names are used, widened by the
    /// optional flag column when the rows carry it.
    pub fn output_header(&self) -> String {
        if let Some(header) = &self.header {
            return format!("{header}\tcoefficient\tweight");
        }
        let (_, max_cols) = self.layout.column_range();
        let with_flag = self
            .records
            .iter()
            .any(|rec| rec.raw.split('\t').count() == max_cols);
        if with_flag {
            format!(
                "{}\t{}\tcoefficient\tweight",
                self.layout.default_header(),
                self.layout.flag_column()
            )
        } else {
            format!("{}\tcoefficient\tweight", self.layout.default_header())
        }
    }
}
