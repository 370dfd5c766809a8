use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use crate::locus::{LocusKey, StrandKey};
use crate::record::Record;

/// Accumulated expression of single-mapping tags, per (chromosome, strand) and coordinate
///
/// Built once from the whole input, then only queried.
#[derive(Debug, Default)]
pub struct DensityIndex {
    strands: HashMap<StrandKey, BTreeMap<i64, f64>>,
    records: usize,
    total: f64,
}

impl DensityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from all records that qualify as unambiguous support
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut index = Self::new();
        for record in records {
            index.record(record);
        }
        index
    }

    /// Add a record's expression at its locus if it maps uniquely with positive expression
    pub fn record(&mut self, record: &Record) {
        if record.map_count != 1 || record.score <= 0.0 {
            return;
        }
        self.add(record.locus(), record.score);
    }

    pub fn add(&mut self, locus: LocusKey, value: f64) {
        *self
            .strands
            .entry(locus.strand_key())
            .or_default()
            .entry(locus.coordinate)
            .or_insert(0.0) += value;
        self.records += 1;
        self.total += value;
    }

    /// Accumulated support at one locus, 0 when absent
    pub fn query(&self, locus: &LocusKey) -> f64 {
        self.strands
            .get(&locus.strand_key())
            .and_then(|coords| coords.get(&locus.coordinate))
            .copied()
            .unwrap_or(0.0)
    }

    /// Populated coordinates inside `range`, ascending
    pub fn range(&self, key: StrandKey, range: Range<i64>) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.strands
            .get(&key)
            .into_iter()
            .flat_map(move |coords| coords.range(range.clone()))
            .map(|(&coord, &value)| (coord, value))
    }

    /// Number of distinct populated loci
    pub fn len(&self) -> usize {
        self.strands.values().map(|coords| coords.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.strands.is_empty()
    }

    /// Number of records that contributed support
    pub fn num_records(&self) -> usize {
        self.records
    }

    pub fn total_support(&self) -> f64 {
        self.total
    }
}
