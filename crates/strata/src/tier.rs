//! Target/decoy and tier classification of identification records.
//!
//! Every accession resolves to a tagged label `{Target, Decoy} x Tier`
//! exactly once; peptide, protein, and group classification all go through
//! the same [`Classifier`] rather than repeating prefix checks per entity.

use crate::fasta::TierMap;
use crate::ident::{Evidence, PeptideMatch, ProteinGroup, ProteinHit};
use serde::{Deserialize, Serialize};

/// Database tier of an accession. The declaration order defines the total
/// order used for evidence competition and bucket merging: contaminants
/// rank below every numbered tier, unmapped accessions above all of them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Contaminant,
    Known(u32),
    Unknown,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Contaminant => write!(f, "contaminant"),
            Tier::Known(n) => write!(f, "{}", n),
            Tier::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDecoy {
    Target,
    Decoy,
}

impl TargetDecoy {
    pub fn is_decoy(&self) -> bool {
        matches!(self, TargetDecoy::Decoy)
    }
}

/// Classification of a single accession
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub target_decoy: TargetDecoy,
    pub tier: Tier,
}

impl Label {
    /// Competition key: targets before decoys, then ascending tier
    fn rank(&self) -> (bool, Tier) {
        (self.target_decoy.is_decoy(), self.tier)
    }
}

pub struct Classifier<'a> {
    decoy_tag: &'a str,
    contaminant_tag: &'a str,
    tiered: bool,
    tiers: &'a TierMap,
}

impl<'a> Classifier<'a> {
    pub fn new(
        decoy_tag: &'a str,
        contaminant_tag: &'a str,
        tiered: bool,
        tiers: &'a TierMap,
    ) -> Classifier<'a> {
        Classifier {
            decoy_tag,
            contaminant_tag,
            tiered,
            tiers,
        }
    }

    pub fn classify(&self, accession: &str) -> Label {
        let decoy = accession.starts_with(self.decoy_tag);
        // a decoy contaminant carries the decoy tag in front of the
        // contaminant tag
        let base = accession.strip_prefix(self.decoy_tag).unwrap_or(accession);
        let contaminant = base.starts_with(self.contaminant_tag);

        let tier = if !self.tiered {
            Tier::Known(0)
        } else if contaminant {
            Tier::Contaminant
        } else {
            match self.tiers.get(accession) {
                Some(n) => Tier::Known(n),
                None => Tier::Unknown,
            }
        };

        Label {
            target_decoy: match decoy {
                true => TargetDecoy::Decoy,
                false => TargetDecoy::Target,
            },
            tier,
        }
    }

    /// Annotate a peptide match, resolving ambiguous multi-protein evidence.
    ///
    /// Each evidence is ranked by `(is_decoy, tier)`; the record's
    /// target/decoy flag and tier are taken from the best-ranked evidence,
    /// and the sorted order permanently replaces the evidence order so that
    /// downstream picked competition sees a canonical ordering.
    pub fn annotate_peptide(&self, mut record: PeptideMatch) -> PeptideMatch {
        let mut ranked: Vec<(Label, Evidence)> = record
            .evidence
            .drain(..)
            .map(|evidence| (self.classify(&evidence.accession), evidence))
            .collect();
        ranked.sort_by_key(|(label, _)| label.rank());

        match ranked.first() {
            Some((label, _)) => {
                record.target_decoy = Some(label.target_decoy);
                record.tier = Some(label.tier);
            }
            None => {
                // no evidence to compete: treat as an unmapped target
                record.target_decoy = Some(TargetDecoy::Target);
                record.tier = Some(match self.tiered {
                    true => Tier::Unknown,
                    false => Tier::Known(0),
                });
            }
        }
        record.evidence = ranked.into_iter().map(|(_, evidence)| evidence).collect();
        record
    }

    /// Annotate a single-accession protein hit - no competition needed
    pub fn annotate_protein(&self, mut hit: ProteinHit) -> ProteinHit {
        let label = self.classify(&hit.accession);
        hit.target_decoy = Some(label.target_decoy);
        hit.tier = Some(label.tier);
        hit
    }

    /// Resolve a protein group's tier and produce a new group filtered to
    /// the accessions sharing it. The group tier is the FIRST accession's
    /// tier in list order, not a minimum or consensus.
    pub fn split_group(&self, group: &ProteinGroup) -> (Tier, ProteinGroup) {
        if !self.tiered {
            return (Tier::Known(0), group.clone());
        }
        let tiers: Vec<Tier> = group
            .accessions
            .iter()
            .map(|accession| self.classify(accession).tier)
            .collect();
        let tier = tiers.first().copied().unwrap_or(Tier::Unknown);
        let accessions = group
            .accessions
            .iter()
            .zip(&tiers)
            .filter(|(_, t)| **t == tier)
            .map(|(accession, _)| accession.clone())
            .collect();
        (
            tier,
            ProteinGroup {
                probability: group.probability,
                accessions,
                q_value: group.q_value,
            },
        )
    }
}
