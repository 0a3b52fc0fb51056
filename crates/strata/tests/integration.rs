//! End-to-end properties of the tiered FDR engine: tier isolation,
//! ungrouped equivalence, metadata single-sourcing, and contaminant
//! dominance over numbered tiers.

use quickcheck_macros::quickcheck;
use strata_core::fasta::TierMap;
use strata_core::fdr;
use strata_core::ident::{Evidence, IdentRun, PeptideMatch, ProteinGroup, ProteinHit, RunInfo};
use strata_core::merge::{compute_fdr, Options};
use strata_core::tier::{Classifier, TargetDecoy, Tier};

// decoy entries carry the annotations copied from their source headers,
// the way combined target/decoy databases are generated
const FASTA: &str = r#"
>human_1 OS=Homo sapiens PE=1
MSDEREVAEAATGEDASSPPPKTEAASDPQHPAASEGAAAAAASPPLLRCLVLTGFGGYD
>human_2 OS=Homo sapiens PE=1
KVKLQSRPAAPPAPGPGQLTLRLRACGLNFADLMARQGLYDRLPPLPVTPGMEGAGVVIA
>yeast_1 OS=Saccharomyces cerevisiae PE=2
VGEGVSDRKAGDRVMVLNRSGMWQEEVTVPSVQTFLIPEAMTFEEAAALLVNYITAYMVL
>yeast_2 OS=Saccharomyces cerevisiae PE=2
FDFGNLQPGHSVLVHMAAGGVGMAAVQLCRTVENVTVFGTASASKHEALKENGVTHPIDY
>rev_human_1 OS=Homo sapiens PE=1
DYGGFGTLVLCRLLPPSAAAAAAGESAAPHQPDSAATEKPPPSSADEGTAAVEREDSM
>rev_human_2 OS=Homo sapiens PE=1
AIVVGAGEMGPTVPLPPLRDYLGQRAMLDAFNLGCARLRLTLQGPGPAPPAARSQLKVK
>rev_yeast_1 OS=Saccharomyces cerevisiae PE=2
LVMYATIYNVLLAAEEFTMAEPILFTQVSPVTVEEQWMGSRNLVMVRDGAKRDSVGEGV
>rev_yeast_2 OS=Saccharomyces cerevisiae PE=2
YDIPHTVGNEKLAEHKSASATGFVTVNEVTRCLQVAAMGVGGAAMHVLVSHGPQLNGFDF
"#;

fn tier_options() -> Options {
    Options {
        tiered: true,
        ..Options::default()
    }
}

fn pep(spectrum: &str, accession: &str, score: f64) -> PeptideMatch {
    PeptideMatch {
        spectrum_id: spectrum.into(),
        rt: 12.5,
        expmass: 1024.5,
        charge: 2,
        sequence: "LQSRPAAPPAPGPGQLTLR".into(),
        modified_sequence: None,
        score,
        evidence: vec![Evidence::new(accession)],
        target_decoy: None,
        tier: None,
        q_value: None,
    }
}

fn hit(accession: &str, score: f64) -> ProteinHit {
    ProteinHit {
        accession: accession.into(),
        score,
        target_decoy: None,
        tier: None,
        q_value: None,
    }
}

fn run_info(engine: &str) -> RunInfo {
    RunInfo {
        search_engine: engine.into(),
        search_engine_version: "1.0.0".into(),
        score_type: "hyperscore".into(),
        higher_score_better: true,
        primary_ms_run_paths: vec![format!("{}.mzML", engine)],
        date: "2024-05-01".into(),
        significance_threshold: 0.05,
        ..RunInfo::default()
    }
}

/// Ten targets and five decoys in tier 1, three targets and three decoys
/// in tier 2, interleaved by score
fn two_tier_run() -> IdentRun {
    let mut peptides = Vec::new();
    for i in 0..10 {
        peptides.push(pep(
            &format!("t1_target_{}", i),
            if i % 2 == 0 { "human_1" } else { "human_2" },
            100.0 - i as f64,
        ));
    }
    for i in 0..5 {
        peptides.push(pep(
            &format!("t1_decoy_{}", i),
            "rev_human_1",
            97.5 - (2 * i) as f64,
        ));
    }
    for i in 0..3 {
        peptides.push(pep(
            &format!("t2_target_{}", i),
            if i % 2 == 0 { "yeast_1" } else { "yeast_2" },
            99.5 - (3 * i) as f64,
        ));
    }
    for i in 0..3 {
        peptides.push(pep(
            &format!("t2_decoy_{}", i),
            "rev_yeast_1",
            98.5 - (3 * i) as f64,
        ));
    }

    IdentRun {
        run: run_info("engine_a"),
        protein_hits: vec![
            hit("human_1", 50.0),
            hit("human_2", 40.0),
            hit("rev_human_1", 10.0),
            hit("yeast_1", 30.0),
            hit("rev_yeast_1", 35.0),
        ],
        groups: vec![
            ProteinGroup::new(0.99, vec!["human_1", "human_2"]),
            ProteinGroup::new(0.90, vec!["yeast_1"]),
        ],
        indistinguishable: Vec::new(),
        peptides,
    }
}

fn q_by_spectrum(run: &IdentRun) -> Vec<(String, f64)> {
    run.peptides
        .iter()
        .map(|p| (p.spectrum_id.clone(), p.q_value.unwrap()))
        .collect()
}

#[test]
fn tier_isolation() {
    let tiers = TierMap::parse(FASTA);
    let options = tier_options();

    let full = two_tier_run();
    let merged = compute_fdr(vec![full.clone()], None, &tiers, &options).unwrap();

    // the same records split into single-tier runs
    let tier1_only = IdentRun {
        peptides: full
            .peptides
            .iter()
            .filter(|p| p.spectrum_id.starts_with("t1"))
            .cloned()
            .collect(),
        groups: vec![full.groups[0].clone()],
        ..full.clone()
    };
    let tier2_only = IdentRun {
        peptides: full
            .peptides
            .iter()
            .filter(|p| p.spectrum_id.starts_with("t2"))
            .cloned()
            .collect(),
        protein_hits: vec![hit("yeast_1", 30.0), hit("rev_yeast_1", 35.0)],
        groups: vec![full.groups[1].clone()],
        ..full.clone()
    };

    let merged_t1 = compute_fdr(vec![tier1_only], None, &tiers, &options).unwrap();
    let merged_t2 = compute_fdr(vec![tier2_only], None, &tiers, &options).unwrap();

    // q-values computed for tier 1 records are unaffected by tier 2's
    // records, and vice versa
    let mut isolated = q_by_spectrum(&merged_t1);
    isolated.extend(q_by_spectrum(&merged_t2));
    isolated.sort_by(|a, b| a.0.cmp(&b.0));

    let mut joint = q_by_spectrum(&merged);
    joint.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(joint, isolated);
}

#[test]
fn ungrouped_equivalence() {
    let tiers = TierMap::default();
    let options = Options::default();

    let run = two_tier_run();
    let merged = compute_fdr(vec![run.clone()], None, &tiers, &options).unwrap();

    // grouping disabled degenerates to a single pass over the whole input
    let mut expected = run.peptides.clone();
    let classifier = Classifier::new("rev_", "contam_", false, &tiers);
    expected = expected
        .into_iter()
        .map(|p| classifier.annotate_peptide(p))
        .collect();
    fdr::peptide_q_values(&mut expected, true);

    assert_eq!(merged.peptides.len(), expected.len());
    for (got, want) in merged.peptides.iter().zip(&expected) {
        assert_eq!(got.spectrum_id, want.spectrum_id);
        assert_eq!(got.tier, Some(Tier::Known(0)));
        assert_eq!(got.q_value, want.q_value);
    }
}

#[test]
fn metadata_single_sourcing() {
    let tiers = TierMap::parse(FASTA);
    let options = tier_options();

    let first = two_tier_run();
    let mut second = two_tier_run();
    second.run = run_info("engine_b");
    second
        .peptides
        .iter_mut()
        .for_each(|p| p.spectrum_id = format!("b_{}", p.spectrum_id));
    let mut third = two_tier_run();
    third.run = run_info("engine_c");
    third
        .peptides
        .iter_mut()
        .for_each(|p| p.spectrum_id = format!("c_{}", p.spectrum_id));

    let reference = first.run.clone();
    let merged = compute_fdr(vec![first, second, third], None, &tiers, &options).unwrap();

    // exactly one run header, equal to the first loaded record's
    assert_eq!(merged.run, reference);
}

#[test]
fn group_statistics_written_back_to_full_membership() {
    let tiers = TierMap::parse(FASTA);
    let options = tier_options();

    let mut run = two_tier_run();
    // a cross-tier group: first accession resolves tier 1, so yeast_1 is
    // filtered out of the competition but must reappear in the output
    run.groups = vec![ProteinGroup::new(0.97, vec!["human_1", "yeast_1"])];

    let merged = compute_fdr(vec![run], None, &tiers, &options).unwrap();
    assert_eq!(merged.groups.len(), 1);
    assert_eq!(merged.groups[0].accessions, &["human_1", "yeast_1"]);
    assert!(merged.groups[0].q_value.is_some());
    assert_eq!(merged.indistinguishable, merged.groups);
}

#[test]
fn unknown_accessions_share_one_bucket() {
    let tiers = TierMap::parse(FASTA);
    let options = tier_options();

    let mut run = two_tier_run();
    run.peptides.push(pep("novel_1", "not_in_database", 55.0));
    run.peptides.push(pep("novel_2", "also_missing", 54.0));

    let merged = compute_fdr(vec![run], None, &tiers, &options).unwrap();
    let unknown: Vec<&PeptideMatch> = merged
        .peptides
        .iter()
        .filter(|p| p.tier == Some(Tier::Unknown))
        .collect();
    assert_eq!(unknown.len(), 2);
    // unknown-tier records merge after every numbered tier
    let novel_pos = merged
        .peptides
        .iter()
        .position(|p| p.spectrum_id == "novel_1")
        .unwrap();
    assert_eq!(novel_pos, merged.peptides.len() - 2);
}

#[test]
fn peptides_merge_in_tier_order_not_score_order() {
    let tiers = TierMap::parse(FASTA);
    let options = tier_options();

    let run = two_tier_run();
    let merged = compute_fdr(vec![run.clone()], None, &tiers, &options).unwrap();

    // within a tier the original record order survives, even though the
    // tier-2 decoys outscore some tier-1 targets
    let t1: Vec<&str> = merged
        .peptides
        .iter()
        .filter(|p| p.tier == Some(Tier::Known(1)))
        .map(|p| p.spectrum_id.as_str())
        .collect();
    let expected: Vec<&str> = run
        .peptides
        .iter()
        .filter(|p| p.spectrum_id.starts_with("t1"))
        .map(|p| p.spectrum_id.as_str())
        .collect();
    assert_eq!(t1, expected);

    let first_t2 = merged
        .peptides
        .iter()
        .position(|p| p.tier == Some(Tier::Known(2)))
        .unwrap();
    let last_t1 = merged
        .peptides
        .iter()
        .rposition(|p| p.tier == Some(Tier::Known(1)))
        .unwrap();
    assert!(last_t1 < first_t2);
}

#[quickcheck]
fn contaminant_evidence_dominates(tiers_present: Vec<u8>, position: usize) {
    // any peptide with a target contaminant evidence resolves to the
    // contaminant tier no matter what else it maps to
    let tier_map = TierMap::parse(FASTA);
    let classifier = Classifier::new("rev_", "contam_", true, &tier_map);

    let mut evidence: Vec<Evidence> = tiers_present
        .iter()
        .map(|t| {
            Evidence::new(match t % 4 {
                0 => "human_1".to_string(),
                1 => "yeast_1".to_string(),
                2 => "rev_human_1".to_string(),
                _ => format!("unmapped_{}", t),
            })
        })
        .collect();
    let at = position % (evidence.len() + 1);
    evidence.insert(at, Evidence::new("contam_KRT1"));

    let mut record = pep("scan=1", "placeholder", 10.0);
    record.evidence = evidence;
    let record = classifier.annotate_peptide(record);

    assert_eq!(record.tier, Some(Tier::Contaminant));
    assert_eq!(record.target_decoy, Some(TargetDecoy::Target));
}

#[quickcheck]
fn q_values_never_exceed_one_and_track_score_order(scores: Vec<(u16, bool)>) {
    let mut peptides: Vec<PeptideMatch> = scores
        .iter()
        .enumerate()
        .map(|(i, (score, decoy))| {
            let mut p = pep(
                &format!("scan={}", i),
                if *decoy { "rev_human_1" } else { "human_1" },
                *score as f64,
            );
            p.target_decoy = Some(match decoy {
                true => TargetDecoy::Decoy,
                false => TargetDecoy::Target,
            });
            p
        })
        .collect();
    fdr::peptide_q_values(&mut peptides, true);

    for p in &peptides {
        let q = p.q_value.unwrap();
        assert!((0.0..=1.0).contains(&q));
    }
    // q-values are monotone non-increasing in score
    let mut sorted = peptides.clone();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    for pair in sorted.windows(2) {
        assert!(pair[0].q_value.unwrap() <= pair[1].q_value.unwrap());
    }
}
