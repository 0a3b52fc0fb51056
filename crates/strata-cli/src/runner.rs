use super::input::Settings;
use anyhow::Context;
use log::{info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use strata_core::fasta::TierMap;
use strata_core::ident::{GroupFile, IdentRun, ProteinGroup};
use strata_core::merge::{compute_fdr, Options};

pub struct Runner {
    pub settings: Settings,
    tiers: TierMap,
    start: Instant,
}

impl Runner {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let start = Instant::now();
        let tiers = TierMap::resolve(settings.tiered_fdr, settings.database.as_deref())?;
        if settings.tiered_fdr {
            info!(
                "mapped {} accessions to tiers from `{}` in {:#?}",
                tiers.len(),
                settings.database.as_deref().unwrap_or_default(),
                start.elapsed()
            );
        }
        Ok(Self {
            settings,
            tiers,
            start,
        })
    }

    pub fn run(self) -> anyhow::Result<()> {
        let paths = self.collect_pep_files()?;
        info!(
            "found {} peptide identification file(s) in `{}`",
            paths.len(),
            self.settings.pep_dir
        );

        let runs = paths
            .par_iter()
            .map(|path| {
                strata_core::read_json::<_, IdentRun>(path).with_context(|| {
                    format!("Failed to load identification run from `{}`", path.display())
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        info!(
            "loaded {} peptide records and {} protein hits",
            runs.iter().map(|r| r.peptides.len()).sum::<usize>(),
            runs.iter().map(|r| r.protein_hits.len()).sum::<usize>(),
        );

        let groups = self.load_groups()?;

        let options = Options {
            decoy_tag: self.settings.decoy_tag.clone(),
            contaminant_tag: self.settings.contaminant_tag.clone(),
            tiered: self.settings.tiered_fdr,
            protein_group_fdr: self.settings.protein_group_fdr,
        };
        let mut merged = compute_fdr(runs, groups, &self.tiers, &options)?;

        // record how the statistics were produced alongside the search
        // parameters copied from the reference run
        merged
            .run
            .search_parameters
            .insert("strata:version".into(), self.settings.version.clone());
        merged
            .run
            .search_parameters
            .insert("strata:decoy_tag".into(), self.settings.decoy_tag.clone());
        merged.run.search_parameters.insert(
            "strata:contaminant_tag".into(),
            self.settings.contaminant_tag.clone(),
        );
        merged.run.search_parameters.insert(
            "strata:tiered_fdr".into(),
            self.settings.tiered_fdr.to_string(),
        );
        merged.run.search_parameters.insert(
            "strata:protein_group_fdr".into(),
            self.settings.protein_group_fdr.to_string(),
        );

        let path = self.write_merged(&merged)?;
        info!("wrote merged identifications to `{}`", path);
        if self.settings.write_tsv {
            let path = self.write_summary(&merged)?;
            info!("wrote peptide summary to `{}`", path);
        }
        info!("finished in {:#?}", self.start.elapsed());
        Ok(())
    }

    fn load_groups(&self) -> anyhow::Result<Option<Vec<ProteinGroup>>> {
        match (&self.settings.prot_path, self.settings.protein_group_fdr) {
            (Some(path), true) => {
                let file: GroupFile = strata_core::read_json(path)
                    .with_context(|| format!("Failed to load protein groups from `{path}`"))?;
                info!("loaded {} protein groups from `{}`", file.groups.len(), path);
                Ok(Some(file.groups))
            }
            (Some(_), false) => {
                warn!("protein group FDR is disabled, ignoring the provided protein group file");
                Ok(None)
            }
            (None, _) => Ok(None),
        }
    }

    fn collect_pep_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let dir = Path::new(&self.settings.pep_dir);
        let entries = std::fs::read_dir(dir).with_context(|| {
            format!(
                "Failed to read peptide identification directory `{}`",
                self.settings.pep_dir
            )
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| name.ends_with(".pep.json"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(strata_core::Error::Input(format!(
                "no .pep.json files were found in `{}`",
                self.settings.pep_dir
            ))
            .into());
        }
        Ok(paths)
    }
}
