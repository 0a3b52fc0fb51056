use anyhow::{ensure, Context};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Clone)]
/// Actual run settings - may include overrides or default values not set by user
pub struct Settings {
    pub version: String,
    pub pep_dir: String,
    pub prot_path: Option<String>,
    pub output_path: String,
    pub database: Option<String>,
    pub decoy_tag: String,
    pub contaminant_tag: String,
    pub tiered_fdr: bool,
    pub protein_group_fdr: bool,
    pub write_tsv: bool,
}

#[derive(Deserialize)]
/// Input run parameters deserialized from JSON file
pub struct Input {
    pep_dir: Option<String>,
    prot_path: Option<String>,
    output_path: Option<String>,
    database: Option<String>,
    decoy_tag: Option<String>,
    contaminant_tag: Option<String>,
    tiered_fdr: Option<bool>,
    protein_group_fdr: Option<bool>,
    write_tsv: Option<bool>,
}

impl Input {
    pub fn from_arguments(matches: ArgMatches) -> anyhow::Result<Self> {
        let path = matches
            .get_one::<String>("parameters")
            .expect("required parameters");
        let mut input = Input::load(path)
            .with_context(|| format!("Failed to read parameters from `{path}`"))?;

        // Handle JSON configuration overrides
        if let Some(pep_dir) = matches.get_one::<String>("pep_dir") {
            log::trace!("overriding `pep_dir` parameter.");
            input.pep_dir = Some(pep_dir.into());
        }
        if let Some(prot_path) = matches.get_one::<String>("prot_path") {
            log::trace!("overriding `prot_path` parameter.");
            input.prot_path = Some(prot_path.into());
        }
        if let Some(output_path) = matches.get_one::<String>("output_path") {
            log::trace!("overriding `output_path` parameter.");
            input.output_path = Some(output_path.into());
        }
        if let Some(database) = matches.get_one::<String>("database") {
            log::trace!("overriding `database` parameter.");
            input.database = Some(database.into());
        }
        if matches.get_one::<bool>("tiered-fdr").copied().unwrap_or(false) {
            input.tiered_fdr = Some(true);
        }
        if matches
            .get_one::<bool>("no-protein-group-fdr")
            .copied()
            .unwrap_or(false)
        {
            input.protein_group_fdr = Some(false);
        }

        ensure!(
            input.pep_dir.is_some(),
            "`pep_dir` must be set. For more information try '--help'"
        );
        ensure!(
            input.output_path.is_some(),
            "`output_path` must be set. For more information try '--help'"
        );

        Ok(input)
    }

    pub fn load<S: AsRef<str>>(path: S) -> anyhow::Result<Self> {
        strata_core::read_json(path.as_ref()).map_err(anyhow::Error::from)
    }

    pub fn build(self) -> anyhow::Result<Settings> {
        let output_path = self.output_path.expect("`output_path` must be provided!");
        if let Some(parent) = Path::new(&output_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create output directory for `{output_path}`"))?;
            }
        }

        Ok(Settings {
            version: clap::crate_version!().into(),
            pep_dir: self.pep_dir.expect("`pep_dir` must be provided!"),
            prot_path: self.prot_path,
            output_path,
            database: self.database,
            decoy_tag: self.decoy_tag.unwrap_or_else(|| "rev_".into()),
            contaminant_tag: self.contaminant_tag.unwrap_or_else(|| "contam_".into()),
            tiered_fdr: self.tiered_fdr.unwrap_or(false),
            protein_group_fdr: self.protein_group_fdr.unwrap_or(true),
            write_tsv: self.write_tsv.unwrap_or(true),
        })
    }
}
