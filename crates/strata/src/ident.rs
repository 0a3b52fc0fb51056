//! Identification records: scored peptide-spectrum matches, protein hits,
//! and protein groups, plus the run container that carries them together
//! with the search metadata they originated from.

use crate::tier::{TargetDecoy, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identification-run metadata. Exactly one of these headers survives the
/// merge, copied from the first loaded run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunInfo {
    #[serde(default)]
    pub search_engine: String,
    #[serde(default)]
    pub search_engine_version: String,
    #[serde(default)]
    pub score_type: String,
    #[serde(default = "default_higher_score_better")]
    pub higher_score_better: bool,
    #[serde(default)]
    pub primary_ms_run_paths: Vec<String>,
    #[serde(default)]
    pub search_parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub significance_threshold: f64,
}

fn default_higher_score_better() -> bool {
    true
}

impl Default for RunInfo {
    fn default() -> Self {
        Self {
            search_engine: String::new(),
            search_engine_version: String::new(),
            score_type: String::new(),
            higher_score_better: true,
            primary_ms_run_paths: Vec::new(),
            search_parameters: BTreeMap::new(),
            date: String::new(),
            significance_threshold: 0.0,
        }
    }
}

/// One protein a peptide sequence maps to. Evidences live inside their
/// parent match and are re-ordered in place during classification.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub accession: String,
}

impl Evidence {
    pub fn new<S: Into<String>>(accession: S) -> Evidence {
        Evidence {
            accession: accession.into(),
        }
    }
}

/// A scored peptide-to-spectrum match
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeptideMatch {
    pub spectrum_id: String,
    #[serde(default)]
    pub rt: f32,
    #[serde(default)]
    pub expmass: f32,
    #[serde(default)]
    pub charge: u8,
    pub sequence: String,
    /// Sequence with modifications spelled out, when the engine reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_sequence: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_decoy: Option<TargetDecoy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_value: Option<f64>,
}

/// A scored protein-level identification
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProteinHit {
    pub accession: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_decoy: Option<TargetDecoy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_value: Option<f64>,
}

/// A set of indistinguishable protein accessions sharing one group
/// probability. Accessions are ordered and the first one is the group's
/// canonical key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProteinGroup {
    pub probability: f64,
    pub accessions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_value: Option<f64>,
}

impl ProteinGroup {
    pub fn new<S: Into<String>>(probability: f64, accessions: Vec<S>) -> ProteinGroup {
        ProteinGroup {
            probability,
            accessions: accessions.into_iter().map(Into::into).collect(),
            q_value: None,
        }
    }

    /// First accession in list order
    pub fn canonical(&self) -> Option<&str> {
        self.accessions.first().map(String::as_str)
    }
}

/// One identification run: metadata header plus the records loaded from a
/// single input file. Doubles as the merged output container, in which case
/// the header is the single canonical one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdentRun {
    pub run: RunInfo,
    #[serde(default)]
    pub protein_hits: Vec<ProteinHit>,
    #[serde(default)]
    pub groups: Vec<ProteinGroup>,
    #[serde(default)]
    pub indistinguishable: Vec<ProteinGroup>,
    #[serde(default)]
    pub peptides: Vec<PeptideMatch>,
}

/// Standalone protein-group document accompanying the peptide runs
#[derive(Debug, Default, Deserialize)]
pub struct GroupFile {
    #[serde(default)]
    pub groups: Vec<ProteinGroup>,
}
