use std::collections::HashSet;

use crate::signature::CandidateSignatures;

/// Tags sharing one candidate signature, processed as a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalGroup {
    /// Tag whose signature defines the group
    pub representative: usize,
    /// Every tag in the group, representative first, in merge order
    pub members: Vec<usize>,
}

impl CanonicalGroup {
    /// Number of original tags this group stands for
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Merge tags with identical sorted signatures into canonical groups
///
/// Representatives are taken in first-appearance order. Only tags listed next to
/// the representative at one of its own tuples are compared; there is no
/// transitive closure beyond that single hop.
pub fn collapse_groups(signatures: &CandidateSignatures) -> Vec<CanonicalGroup> {
    let mut processed: HashSet<usize> = HashSet::with_capacity(signatures.signatures.len());
    let mut groups = Vec::new();

    for (&tag_idx, signature) in &signatures.signatures {
        if processed.contains(&tag_idx) {
            continue;
        }
        processed.insert(tag_idx);
        let mut members = vec![tag_idx];

        for key in &signature.keys {
            let Some(candidates) = signatures.adjacency.get(key) else {
                continue;
            };
            for &candidate in candidates {
                if processed.contains(&candidate) {
                    continue;
                }
                let same = signatures
                    .get(candidate)
                    .map(|other| other.keys == signature.keys)
                    .unwrap_or(false);
                if same {
                    processed.insert(candidate);
                    members.push(candidate);
                }
            }
        }

        groups.push(CanonicalGroup {
            representative: tag_idx,
            members,
        });
    }

    groups
}
