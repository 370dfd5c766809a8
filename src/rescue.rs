use std::collections::{BTreeMap, HashMap};

use crate::collapse::CanonicalGroup;
use crate::density::DensityIndex;
use crate::locus::StrandKey;
use crate::record::RecordSet;
use crate::signature::CandidateSignatures;
use crate::window::Window;

/// Share of a tag's evidence assigned to one candidate record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateWeight {
    pub record: usize,
    pub coefficient: f64,
}

/// What to do with a multi-mapper that has no nearby single-mapper support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSupportPolicy {
    /// Every candidate gets coefficient 0
    Dispose,
    /// Every candidate gets 1 / mapCount
    Uniform,
}

/// Weight every candidate of one tag against single-mapper density (flat variant)
pub fn weight_tag(
    set: &RecordSet,
    tag_idx: usize,
    index: &DensityIndex,
    window: &Window,
    policy: NoSupportPolicy,
) -> Vec<CandidateWeight> {
    let candidates: Vec<usize> = set.tag_records(tag_idx).map(|(i, _)| i).collect();
    let Some(&first) = candidates.first() else {
        return Vec::new();
    };
    let map_count = set.records[first].map_count;

    if map_count == 1 || candidates.len() == 1 {
        return candidates
            .into_iter()
            .map(|record| CandidateWeight {
                record,
                coefficient: 1.0,
            })
            .collect();
    }

    let nearby: Vec<f64> = candidates
        .iter()
        .map(|&i| window.sum(index, &set.records[i].locus()))
        .collect();
    let total: f64 = nearby.iter().sum();

    candidates
        .into_iter()
        .zip(nearby)
        .map(|(record, here)| {
            let coefficient = if total > 0.0 {
                here / total
            } else {
                match policy {
                    NoSupportPolicy::Dispose => 0.0,
                    NoSupportPolicy::Uniform => 1.0 / map_count as f64,
                }
            };
            CandidateWeight {
                record,
                coefficient,
            }
        })
        .collect()
}

/// Canonical groups present at each start position of their signatures
#[derive(Debug, Default)]
pub struct GroupLocusIndex {
    strands: HashMap<StrandKey, BTreeMap<i64, Vec<usize>>>,
}

impl GroupLocusIndex {
    pub fn build(set: &RecordSet, signatures: &CandidateSignatures, groups: &[CanonicalGroup]) -> Self {
        let mut index = GroupLocusIndex::default();
        for (group_idx, group) in groups.iter().enumerate() {
            let Some(signature) = signatures.get(group.representative) else {
                continue;
            };
            for &rec_idx in &signature.records {
                let locus = set.records[rec_idx].start_locus();
                let present = index
                    .strands
                    .entry(locus.strand_key())
                    .or_default()
                    .entry(locus.coordinate)
                    .or_default();
                if present.last() != Some(&group_idx) {
                    present.push(group_idx);
                }
            }
        }
        index
    }

    /// Groups found inside the window around `coordinate`, one entry per (group, position)
    fn scan<'a>(
        &'a self,
        key: StrandKey,
        coordinate: i64,
        window: &Window,
    ) -> impl Iterator<Item = usize> + 'a {
        let hits = self
            .strands
            .get(&key)
            .map(|coords| window.scan(coords, coordinate));
        hits.into_iter().flatten().flat_map(|(_, groups)| groups.iter().copied())
    }
}

/// Weight every candidate of a canonical group against nearby-group density (grouped variant)
///
/// Returns `None` when the group has a single candidate without a confirmed
/// singleton flag; such groups produce no output.
pub fn weight_group(
    set: &RecordSet,
    signatures: &CandidateSignatures,
    groups: &[CanonicalGroup],
    group_idx: usize,
    locus_index: &GroupLocusIndex,
    window: &Window,
) -> Option<Vec<CandidateWeight>> {
    let group = &groups[group_idx];
    let signature = signatures.get(group.representative)?;

    if signature.len() == 1 {
        let record = signature.records[0];
        if set.records[record].is_singleton_confirmed() {
            return Some(vec![CandidateWeight {
                record,
                coefficient: 1.0,
            }]);
        }
        return None;
    }

    // Hits per candidate window, and occurrences over the union of all windows
    let mut occurrences: HashMap<usize, u32> = HashMap::new();
    let hits: Vec<Vec<usize>> = signature
        .records
        .iter()
        .map(|&rec_idx| {
            let locus = set.records[rec_idx].start_locus();
            let found: Vec<usize> = locus_index
                .scan(locus.strand_key(), locus.coordinate, window)
                .filter(|&other| other != group_idx)
                .collect();
            for &other in &found {
                *occurrences.entry(other).or_insert(0) += 1;
            }
            found
        })
        .collect();

    let unique_size = |other: &usize| -> usize {
        if occurrences.get(other) == Some(&1) {
            groups[*other].size()
        } else {
            0
        }
    };

    let total_unique: usize = occurrences.keys().map(unique_size).sum();

    log::debug!(
        "Group of {} ({} tags): {} candidates, {} nearby groups, unique support {}",
        set.tag_id(group.representative).unwrap_or("?"),
        group.size(),
        signature.len(),
        occurrences.len(),
        total_unique
    );

    let weights = signature
        .records
        .iter()
        .zip(&hits)
        .map(|(&record, found)| {
            let coefficient = if total_unique == 0 {
                0.0
            } else {
                let current_unique: usize = found.iter().map(unique_size).sum();
                current_unique as f64 / total_unique as f64
            };
            CandidateWeight {
                record,
                coefficient,
            }
        })
        .collect();

    Some(weights)
}
