//! Target-decoy q-value estimation and picked-protein competition.
//!
//! Savitski et al., https://pubmed.ncbi.nlm.nih.gov/25987413/
//! The et al., https://doi.org/10.1016/j.mcpro.2022.100437

use crate::ident::{PeptideMatch, ProteinGroup, ProteinHit};
use crate::tier::TargetDecoy;
use fnv::FnvHashMap;
use itertools::Itertools;

/// Scores are always compared best-first internally; engines reporting
/// ascending-better scores (e-values) are flipped on the way in.
fn ranked(score: f64, higher_score_better: bool) -> f64 {
    match higher_score_better {
        true => score,
        false => -score,
    }
}

fn is_decoy(label: &Option<TargetDecoy>) -> bool {
    matches!(label, Some(TargetDecoy::Decoy))
}

struct Row {
    ix: usize,
    decoy: bool,
    score: f64,
}

/// Count-based q-value assignment over a set of scored target/decoy rows.
///
/// Rows are sorted best score first, the running decoy/target ratio gives
/// the FDR estimate, and a reverse cumulative minimum turns it into
/// q-values. Returns per-row q-values (indexed by `Row::ix`) and the number
/// of rows at q <= 0.01.
fn assign_q_values(mut rows: Vec<Row>, n: usize) -> (Vec<f64>, usize) {
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut decoy = 1.0f64;
    let mut target = 0.0f64;
    let mut q = vec![1.0f64; n];
    for row in rows.iter() {
        match row.decoy {
            true => decoy += 1.0,
            false => target += 1.0,
        }
        q[row.ix] = decoy / target;
    }

    // Q-value is the minimum FDR at any given score threshold
    let mut q_min = 1.0f64;
    let mut passing = 0;
    for row in rows.iter().rev() {
        q_min = q_min.min(q[row.ix]);
        q[row.ix] = q_min;
        if q_min <= 0.01 {
            passing += 1;
        }
    }

    (q, passing)
}

/// Assign q-values to every peptide match in place, decoy records included.
/// Record order is left untouched.
pub fn peptide_q_values(peptides: &mut [PeptideMatch], higher_score_better: bool) -> usize {
    let rows = peptides
        .iter()
        .enumerate()
        .map(|(ix, record)| Row {
            ix,
            decoy: is_decoy(&record.target_decoy),
            score: ranked(record.score, higher_score_better),
        })
        .collect();
    let (q, passing) = assign_q_values(rows, peptides.len());
    for (record, q) in peptides.iter_mut().zip(q) {
        record.q_value = Some(q);
    }
    passing
}

/// Basic target-decoy protein FDR, no competition or grouping
pub fn protein_q_values(hits: &mut [ProteinHit], higher_score_better: bool) -> usize {
    let rows = hits
        .iter()
        .enumerate()
        .map(|(ix, hit)| Row {
            ix,
            decoy: is_decoy(&hit.target_decoy),
            score: ranked(hit.score, higher_score_better),
        })
        .collect();
    let (q, passing) = assign_q_values(rows, hits.len());
    for (hit, q) in hits.iter_mut().zip(q) {
        hit.q_value = Some(q);
    }
    passing
}

/// Head-to-head competition between a target entry and its decoy
/// counterpart. Only the better-scoring side survives into the q-value
/// walk.
#[derive(Copy, Clone, Debug)]
struct Competition {
    forward: f64,
    reverse: f64,
}

impl Default for Competition {
    fn default() -> Self {
        Self {
            forward: f64::MIN,
            reverse: f64::MIN,
        }
    }
}

impl Competition {
    fn update(&mut self, decoy: bool, score: f64) {
        match decoy {
            true => self.reverse = self.reverse.max(score),
            false => self.forward = self.forward.max(score),
        }
    }

    fn score(&self) -> f64 {
        self.forward.max(self.reverse)
    }

    fn is_decoy(&self) -> bool {
        self.reverse >= self.forward
    }
}

fn competition_q_values(map: FnvHashMap<String, Competition>) -> FnvHashMap<String, f64> {
    // deterministic row order regardless of hash iteration
    let mut entries: Vec<(String, Competition)> = map.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let rows = entries
        .iter()
        .enumerate()
        .map(|(ix, (_, comp))| Row {
            ix,
            decoy: comp.is_decoy(),
            score: comp.score(),
        })
        .collect();
    let (q, _) = assign_q_values(rows, entries.len());

    entries
        .into_iter()
        .zip(q)
        .map(|((key, _), q)| (key, q))
        .collect()
}

/// Picked-protein FDR over one tier's protein hits.
///
/// Targets and decoys pair up by stripping the decoy tag from the
/// accession; the best score on each side competes and every hit sharing
/// the base accession receives the pair's q-value.
pub fn picked_protein(hits: &mut [ProteinHit], decoy_tag: &str, higher_score_better: bool) -> usize {
    let mut map: FnvHashMap<String, Competition> = FnvHashMap::default();
    for hit in hits.iter() {
        let base = hit.accession.strip_prefix(decoy_tag).unwrap_or(&hit.accession);
        map.entry(base.to_string()).or_default().update(
            is_decoy(&hit.target_decoy),
            ranked(hit.score, higher_score_better),
        );
    }

    let scores = competition_q_values(map);

    let mut passing = 0;
    for hit in hits.iter_mut() {
        let q = {
            let base = hit.accession.strip_prefix(decoy_tag).unwrap_or(&hit.accession);
            scores.get(base).copied()
        };
        if let Some(q) = q {
            hit.q_value = Some(q);
            if q <= 0.01 && !is_decoy(&hit.target_decoy) {
                passing += 1;
            }
        }
    }
    passing
}

/// Picked protein-group FDR over one tier's filtered groups.
///
/// The competition key is the set of member accessions with the decoy tag
/// stripped; a group is a decoy group only when every member is a decoy.
/// Group probabilities are posterior-style, higher is better.
pub fn picked_group(groups: &mut [ProteinGroup], decoy_tag: &str) -> usize {
    let mut map: FnvHashMap<String, Competition> = FnvHashMap::default();
    for group in groups.iter() {
        map.entry(group_key(group, decoy_tag))
            .or_default()
            .update(is_decoy_group(group, decoy_tag), group.probability);
    }

    let scores = competition_q_values(map);

    let mut passing = 0;
    for group in groups.iter_mut() {
        let q = scores.get(&group_key(group, decoy_tag)).copied();
        if let Some(q) = q {
            group.q_value = Some(q);
            if q <= 0.01 && !is_decoy_group(group, decoy_tag) {
                passing += 1;
            }
        }
    }
    passing
}

fn group_key(group: &ProteinGroup, decoy_tag: &str) -> String {
    group
        .accessions
        .iter()
        .map(|accession| accession.strip_prefix(decoy_tag).unwrap_or(accession))
        .sorted()
        .join(";")
}

fn is_decoy_group(group: &ProteinGroup, decoy_tag: &str) -> bool {
    !group.accessions.is_empty()
        && group
            .accessions
            .iter()
            .all(|accession| accession.starts_with(decoy_tag))
}
