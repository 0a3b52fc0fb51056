pub mod bucket;
pub mod fasta;
pub mod fdr;
pub mod ident;
pub mod merge;
pub mod tier;

use std::path::Path;

#[derive(Debug)]
pub enum Error {
    /// A requested mode is missing a required companion input
    Configuration(String),
    /// No usable identification data was supplied
    Input(String),
    /// A tier-local record has no counterpart in the global lookup
    Lookup(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {}", msg),
            Self::Input(msg) => write!(f, "input error: {}", msg),
            Self::Lookup(msg) => write!(f, "lookup error: {}", msg),
            Self::Io(e) => e.fmt(f),
            Self::Json(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(residual: std::io::Error) -> Self {
        Self::Io(residual)
    }
}

impl From<serde_json::Error> for Error {
    fn from(residual: serde_json::Error) -> Self {
        Self::Json(residual)
    }
}

pub fn read_json<P, T>(path: P) -> Result<T, Error>
where
    P: AsRef<Path>,
    T: for<'de> serde::Deserialize<'de>,
{
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(Error::Json)
}

/// Read a FASTA database and extract the accession to tier mapping from its
/// headers. Sequence lines are ignored.
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<fasta::TierMap, Error> {
    let contents = std::fs::read_to_string(path)?;
    Ok(fasta::TierMap::parse(&contents))
}
