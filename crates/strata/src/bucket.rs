//! Partitioning of classified identifications into per-tier collections.

use crate::ident::{PeptideMatch, ProteinGroup, ProteinHit};
use crate::tier::{Classifier, Tier};
use std::collections::BTreeMap;

/// Everything one tier's FDR pass operates on. Tiers with peptides but no
/// protein groups still get a pass, with an empty group set.
#[derive(Debug, Default)]
pub struct TierBucket {
    pub peptides: Vec<PeptideMatch>,
    pub protein_hits: Vec<ProteinHit>,
    pub groups: Vec<ProteinGroup>,
}

/// Per-tier partition of a full identification set. The tier set is the
/// union over all three record kinds; iteration is ascending by tier.
#[derive(Debug, Default)]
pub struct TierBuckets {
    buckets: BTreeMap<Tier, TierBucket>,
}

impl TierBuckets {
    pub fn partition(
        classifier: &Classifier<'_>,
        peptides: Vec<PeptideMatch>,
        protein_hits: Vec<ProteinHit>,
        groups: &[ProteinGroup],
    ) -> TierBuckets {
        let mut buckets: BTreeMap<Tier, TierBucket> = BTreeMap::new();

        for record in peptides {
            let record = classifier.annotate_peptide(record);
            let tier = record.tier.unwrap_or(Tier::Known(0));
            buckets.entry(tier).or_default().peptides.push(record);
        }

        for hit in protein_hits {
            let hit = classifier.annotate_protein(hit);
            let tier = hit.tier.unwrap_or(Tier::Known(0));
            buckets.entry(tier).or_default().protein_hits.push(hit);
        }

        for group in groups {
            let (tier, filtered) = classifier.split_group(group);
            buckets.entry(tier).or_default().groups.push(filtered);
        }

        TierBuckets { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Tier, &TierBucket)> {
        self.buckets.iter()
    }
}

impl IntoIterator for TierBuckets {
    type Item = (Tier, TierBucket);
    type IntoIter = std::collections::btree_map::IntoIter<Tier, TierBucket>;

    // ascending tier order
    fn into_iter(self) -> Self::IntoIter {
        self.buckets.into_iter()
    }
}
