//! Per-tier FDR execution and the merge back into a single result set.
//!
//! Each tier's pass is independent: a decoy in one tier never competes
//! against a target in another. Buckets share no mutable state, so the
//! passes run in parallel; the merge consumes them in ascending tier order
//! to keep the output byte-stable.

use crate::bucket::{TierBucket, TierBuckets};
use crate::fasta::TierMap;
use crate::fdr;
use crate::ident::{IdentRun, ProteinGroup, RunInfo};
use crate::tier::{Classifier, Tier};
use crate::Error;
use fnv::FnvHashMap;
use log::{info, warn};
use rayon::prelude::*;

/// Engine configuration
#[derive(Clone, Debug)]
pub struct Options {
    pub decoy_tag: String,
    pub contaminant_tag: String,
    /// Partition by database tier instead of running one global pass
    pub tiered: bool,
    /// Apply picked protein/protein-group FDR; disabled means a basic
    /// target-decoy protein FDR without groups
    pub protein_group_fdr: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            decoy_tag: "rev_".into(),
            contaminant_tag: "contam_".into(),
            tiered: false,
            protein_group_fdr: true,
        }
    }
}

/// Run tier-partitioned FDR control over a set of identification runs and
/// merge the per-tier results into one annotated run.
///
/// `group_source` is the protein-group document accompanying the runs;
/// when absent, groups embedded in the runs themselves are used.
pub fn compute_fdr(
    runs: Vec<IdentRun>,
    group_source: Option<Vec<ProteinGroup>>,
    tiers: &TierMap,
    options: &Options,
) -> Result<IdentRun, Error> {
    // the first loaded run is the single source of output metadata
    let reference: RunInfo = match runs.first() {
        Some(run) => run.run.clone(),
        None => {
            return Err(Error::Input(
                "no identification runs were loaded, nothing to copy run metadata from".into(),
            ))
        }
    };
    let higher_score_better = reference.higher_score_better;

    let mut peptides = Vec::new();
    let mut protein_hits = Vec::new();
    let mut embedded_groups = Vec::new();
    for run in runs {
        peptides.extend(run.peptides);
        protein_hits.extend(run.protein_hits);
        embedded_groups.extend(run.groups);
    }
    if peptides.is_empty() && protein_hits.is_empty() {
        return Err(Error::Input(
            "no identifications were loaded from the input runs".into(),
        ));
    }

    let originals: Vec<ProteinGroup> = match options.protein_group_fdr {
        true => group_source.unwrap_or(embedded_groups),
        false => {
            if group_source.is_some() {
                warn!("protein group FDR is disabled, ignoring the provided protein groups");
            }
            Vec::new()
        }
    };

    let classifier = Classifier::new(
        &options.decoy_tag,
        &options.contaminant_tag,
        options.tiered,
        tiers,
    );
    let buckets = TierBuckets::partition(&classifier, peptides, protein_hits, &originals);
    info!("partitioned identifications into {} tier bucket(s)", buckets.len());

    // read-only during the parallel phase
    let lookup: FnvHashMap<&str, &ProteinGroup> = originals
        .iter()
        .filter_map(|group| group.canonical().map(|accession| (accession, group)))
        .collect();

    let mut processed: Vec<(Tier, TierBucket)> = buckets.into_iter().collect();
    processed
        .par_iter_mut()
        .for_each(|(tier, bucket)| apply_tier_fdr(*tier, bucket, options, higher_score_better));

    merge(processed, &lookup, reference)
}

fn apply_tier_fdr(tier: Tier, bucket: &mut TierBucket, options: &Options, higher_score_better: bool) {
    info!(
        "processing tier {}: {} peptide records, {} protein hits, {} protein groups",
        tier,
        bucket.peptides.len(),
        bucket.protein_hits.len(),
        bucket.groups.len()
    );

    let passing = fdr::peptide_q_values(&mut bucket.peptides, higher_score_better);
    info!("-  tier {}: {} peptide records at 1% FDR", tier, passing);

    match options.protein_group_fdr {
        false => {
            fdr::protein_q_values(&mut bucket.protein_hits, higher_score_better);
        }
        true => {
            let passing =
                fdr::picked_protein(&mut bucket.protein_hits, &options.decoy_tag, higher_score_better);
            info!("-  tier {}: {} proteins at 1% FDR", tier, passing);
            fdr::picked_group(&mut bucket.groups, &options.decoy_tag);
        }
    }
}

/// Concatenate the per-tier outputs: peptides and protein hits in ascending
/// tier order (original order within a tier), and tier-refined group
/// statistics copied back onto the original, unfiltered group objects.
fn merge(
    processed: Vec<(Tier, TierBucket)>,
    lookup: &FnvHashMap<&str, &ProteinGroup>,
    reference: RunInfo,
) -> Result<IdentRun, Error> {
    let mut merged = IdentRun {
        run: reference,
        ..Default::default()
    };

    for (tier, bucket) in processed {
        merged.peptides.extend(bucket.peptides);
        merged.protein_hits.extend(bucket.protein_hits);

        for filtered in bucket.groups {
            let canonical = match filtered.canonical() {
                Some(accession) => accession,
                None => {
                    return Err(Error::Lookup(format!(
                        "tier {} produced a protein group with no accessions",
                        tier
                    )))
                }
            };
            match lookup.get(canonical) {
                Some(original) => {
                    let mut updated = (*original).clone();
                    updated.probability = filtered.probability;
                    updated.q_value = filtered.q_value;
                    merged.groups.push(updated.clone());
                    merged.indistinguishable.push(updated);
                }
                None => {
                    return Err(Error::Lookup(format!(
                        "tier-filtered protein group `{}` is missing from the global group lookup",
                        canonical
                    )))
                }
            }
        }
    }

    Ok(merged)
}
