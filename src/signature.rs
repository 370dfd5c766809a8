use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::record::{RecordSet, TupleKey};
use crate::window::{LocusSet, Window};

/// Sorted set of eligible candidate tuples of one tag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    /// Candidate tuples, sorted by (chromosome name, start, stop, strand)
    pub keys: Vec<TupleKey>,
    /// First record behind each entry of `keys`, used for weighting
    pub records: Vec<usize>,
    /// Every record behind each entry of `keys`, in input order
    pub rows: Vec<Vec<usize>>,
}

impl Signature {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Output of the signature builder, consumed by the group collapser
#[derive(Debug, Default)]
pub struct CandidateSignatures {
    /// Eligible tag index -> signature, in tag first-appearance order
    pub signatures: IndexMap<usize, Signature>,
    /// Candidate tuple -> eligible tags holding a record at that tuple
    pub adjacency: HashMap<TupleKey, Vec<usize>>,
    /// Tags with no eligible record; they take no further part in the run
    pub ineligible: usize,
}

impl CandidateSignatures {
    pub fn get(&self, tag_idx: usize) -> Option<&Signature> {
        self.signatures.get(&tag_idx)
    }
}

/// Compute the reachable-candidate signature of every tag for one target chromosome
///
/// A record is reachable when its start lies within `window` of any start
/// position held by a tag that aligns at least once to `target_chromosome`.
pub fn build_signatures(set: &RecordSet, target_chromosome: &str, window: &Window) -> CandidateSignatures {
    let mut result = CandidateSignatures::default();

    let target_id = match set.registry.get_id(target_chromosome) {
        Some(id) => id,
        None => {
            result.ineligible = set.num_tags();
            return result;
        }
    };

    // Pass 1: tags aligning to the target chromosome
    let target_tags: HashSet<usize> = (0..set.num_tags())
        .filter(|&tag_idx| set.tag_records(tag_idx).any(|(_, rec)| rec.chrom_id == target_id))
        .collect();

    // Pass 2: every start position of those tags, on any chromosome
    let mut current_loci = LocusSet::new();
    for &tag_idx in &target_tags {
        for (_, rec) in set.tag_records(tag_idx) {
            current_loci.insert(rec.start_locus());
        }
    }

    // Pass 3: keep the records near a current locus
    for tag_idx in 0..set.num_tags() {
        let mut signature = Signature::default();
        let mut entries: Vec<(TupleKey, usize)> = Vec::new();

        for (rec_idx, rec) in set.tag_records(tag_idx) {
            if !current_loci.any_within(&rec.start_locus(), window) {
                continue;
            }
            let key = rec.tuple_key();
            entries.push((key, rec_idx));

            let ids = result.adjacency.entry(key).or_default();
            if ids.last() != Some(&tag_idx) {
                ids.push(tag_idx);
            }
        }

        if entries.is_empty() {
            result.ineligible += 1;
            continue;
        }

        // Stable sort, then fold repeated tuples into one signature entry
        entries.sort_by(|a, b| compare_tuples(set, &a.0, &b.0));
        for (key, rec_idx) in entries {
            if signature.keys.last() == Some(&key) {
                if let Some(rows) = signature.rows.last_mut() {
                    rows.push(rec_idx);
                }
                continue;
            }
            signature.keys.push(key);
            signature.records.push(rec_idx);
            signature.rows.push(vec![rec_idx]);
        }
        result.signatures.insert(tag_idx, signature);
    }

    log::debug!(
        "Signatures for {}: {} target tags, {} current loci, {} eligible, {} ineligible",
        target_chromosome,
        target_tags.len(),
        current_loci.len(),
        result.signatures.len(),
        result.ineligible
    );

    result
}

fn compare_tuples(set: &RecordSet, a: &TupleKey, b: &TupleKey) -> Ordering {
    set.chromosome_name(a.chrom_id)
        .cmp(set.chromosome_name(b.chrom_id))
        .then(a.start.cmp(&b.start))
        .then(a.stop.cmp(&b.stop))
        .then(a.strand.cmp(&b.strand))
}
