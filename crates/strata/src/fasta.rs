use crate::Error;
use fnv::FnvHashMap;
use std::path::Path;

/// Accession to tier mapping extracted from the `PE=<n>` annotation carried
/// by the headers of a composite FASTA database.
#[derive(Clone, Debug, Default)]
pub struct TierMap {
    map: FnvHashMap<String, u32>,
}

impl TierMap {
    // Parse database headers into a tier map. The accession is the first
    // whitespace-delimited token of the header; entries without a PE= token
    // are left unmapped and resolve to the unknown tier downstream.
    pub fn parse(contents: &str) -> TierMap {
        let mut map = FnvHashMap::default();

        for line in contents.lines() {
            let line = line.trim();
            if let Some(header) = line.strip_prefix('>') {
                let mut tokens = header.split_ascii_whitespace();
                let accession = match tokens.next() {
                    Some(accession) => accession,
                    None => continue,
                };
                let tier = tokens
                    .find_map(|token| token.strip_prefix("PE=").and_then(|v| v.parse::<u32>().ok()));
                if let Some(tier) = tier {
                    map.insert(accession.to_string(), tier);
                }
            }
        }

        TierMap { map }
    }

    /// Build the map required by the requested FDR mode: tiered FDR needs a
    /// database, anything else uses an empty map (every record lands in
    /// tier 0).
    pub fn resolve<P: AsRef<Path>>(tiered: bool, database: Option<P>) -> Result<TierMap, Error> {
        match (tiered, database) {
            (false, _) => Ok(TierMap::default()),
            (true, Some(path)) => crate::read_fasta(path),
            (true, None) => Err(Error::Configuration(
                "a database must be provided when tiered FDR is enabled".into(),
            )),
        }
    }

    pub fn get(&self, accession: &str) -> Option<u32> {
        self.map.get(accession).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const FASTA: &str = r#"
>sp|Q99536|VAT1_HUMAN Synaptic vesicle membrane protein VAT-1 homolog OS=Homo sapiens OX=9606 GN=VAT1 PE=1 SV=2
MSDEREVAEAATGEDASSPPPKTEAASDPQHPAASEGAAAAAASPPLLRCLVLTGFGGYD
KVKLQSRPAAPPAPGPGQLTLRLRACGLNFADLMARQGLYDRLPPLPVTPGMEGAGVVIA
>sp|P12345|NOPE_HUMAN A header without the annotation OS=Homo sapiens
MKVLAAGVVPLLLVLHWKHGAG
>tr|A0A024|A0A024_YEAST Uncharacterized protein OS=Saccharomyces cerevisiae PE=4 SV=1
MSTNPKPQRKTKRNTNRRPQDVKFPGG
>contam_P00761|TRYP_PIG Trypsin OS=Sus scrofa PE=1 SV=1
IVGGYTCGANTVPYQVSLNSGYHFCGGSLINSQWVVSAAHCYKSG
"#;

    #[test]
    fn parse_headers() {
        let tiers = TierMap::parse(FASTA);
        assert_eq!(tiers.len(), 3);
        assert_eq!(tiers.get("sp|Q99536|VAT1_HUMAN"), Some(1));
        assert_eq!(tiers.get("sp|P12345|NOPE_HUMAN"), None);
        assert_eq!(tiers.get("tr|A0A024|A0A024_YEAST"), Some(4));
        assert_eq!(tiers.get("contam_P00761|TRYP_PIG"), Some(1));
    }

    #[test]
    fn sequence_lines_ignored() {
        // sequence text must never be mistaken for a header
        let tiers = TierMap::parse("MSDPE=2VAEAAT\n>acc_1 PE=3\nPEPTIDE");
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers.get("acc_1"), Some(3));
    }

    #[test]
    fn ungrouped_mode_skips_database() {
        let tiers = TierMap::resolve(false, None::<&str>).unwrap();
        assert!(tiers.is_empty());
    }

    #[test]
    fn tiered_mode_requires_database() {
        let err = TierMap::resolve(true, None::<&str>).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
