use rayon::prelude::*;
use strata_core::ident::{IdentRun, PeptideMatch};
use strata_core::tier::TargetDecoy;

use crate::Runner;

impl Runner {
    pub fn write_merged(&self, merged: &IdentRun) -> anyhow::Result<String> {
        let bytes = serde_json::to_vec_pretty(merged)?;
        std::fs::write(&self.settings.output_path, bytes)?;
        Ok(self.settings.output_path.clone())
    }

    fn serialize_peptide(&self, record: &PeptideMatch) -> csv::ByteRecord {
        let proteins = record
            .evidence
            .iter()
            .map(|e| e.accession.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let mut rec = csv::ByteRecord::new();
        rec.push_field(record.sequence.as_bytes());
        rec.push_field(proteins.as_bytes());
        rec.push_field(itoa::Buffer::new().format(record.evidence.len()).as_bytes());
        rec.push_field(record.spectrum_id.as_bytes());
        rec.push_field(ryu::Buffer::new().format(record.rt).as_bytes());
        rec.push_field(ryu::Buffer::new().format(record.expmass).as_bytes());
        rec.push_field(itoa::Buffer::new().format(record.charge).as_bytes());
        rec.push_field(ryu::Buffer::new().format(record.score).as_bytes());
        rec.push_field(
            match record.target_decoy {
                Some(TargetDecoy::Decoy) => "decoy",
                _ => "target",
            }
            .as_bytes(),
        );
        let tier = match record.tier {
            Some(tier) => tier.to_string(),
            None => "-".to_string(),
        };
        rec.push_field(tier.as_bytes());
        rec.push_field(
            ryu::Buffer::new()
                .format(record.q_value.unwrap_or(1.0))
                .as_bytes(),
        );
        rec
    }

    pub fn write_summary(&self, merged: &IdentRun) -> anyhow::Result<String> {
        let path = std::path::Path::new(&self.settings.output_path)
            .with_extension("tsv")
            .to_string_lossy()
            .into_owned();

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(vec![]);

        let headers = csv::ByteRecord::from(vec![
            "peptide",
            "proteins",
            "num_proteins",
            "spectrum",
            "rt",
            "expmass",
            "charge",
            "score",
            "label",
            "tier",
            "q_value",
        ]);

        wtr.write_byte_record(&headers)?;
        for record in merged
            .peptides
            .par_iter()
            .map(|record| self.serialize_peptide(record))
            .collect::<Vec<_>>()
        {
            wtr.write_byte_record(&record)?;
        }

        wtr.flush()?;
        let bytes = wtr.into_inner()?;
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}
