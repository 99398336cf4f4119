//! Common functionality.

use byte_unit::{Byte, UnitType};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::err::Error;

pub mod io;
pub mod locus;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Helper to print the current memory resident set size via `tracing`.
pub fn trace_rss_now() {
    let rss = procfs::process::Process::myself()
        .and_then(|me| me.stat())
        .map(|stat| stat.rss * procfs::page_size());
    match rss {
        Ok(rss) => tracing::debug!(
            "RSS now: {}",
            Byte::from_u64(rss).get_appropriate_unit(UnitType::Binary)
        ),
        Err(e) => tracing::debug!("could not determine RSS: {}", e),
    }
}

/// Definition of canonical chromosome names.
pub const CHROMS: &[&str] = &[
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y", "MT",
];

/// Select the genome release to use.
#[derive(
    Clone,
    Copy,
    Debug,
    strum::Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum GenomeRelease {
    /// GRCh37 / hg19
    #[strum(serialize = "GRCh37")]
    #[serde(rename = "GRCh37")]
    Grch37,
    /// GRCh38 / hg38
    #[strum(serialize = "GRCh38")]
    #[serde(rename = "GRCh38")]
    Grch38,
}

/// Accepted assembly identifiers: GRC ids and their UCSC build aliases.
pub const ASSEMBLY_MAP: &[(&str, GenomeRelease)] = &[
    ("GRCh38", GenomeRelease::Grch38),
    ("hg38", GenomeRelease::Grch38),
    ("GRCh37", GenomeRelease::Grch37),
    ("hg19", GenomeRelease::Grch37),
];

impl GenomeRelease {
    pub fn name(&self) -> String {
        match self {
            GenomeRelease::Grch37 => String::from("GRCh37"),
            GenomeRelease::Grch38 => String::from("GRCh38"),
        }
    }
}

impl std::str::FromStr for GenomeRelease {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_assembly(s)
    }
}

/// Map a GRC assembly id or UCSC build alias to its genome release.
///
/// Matching is case-insensitive but otherwise exact; patch-level ids such as
/// `GRCh38.p14` are rejected like any other unknown identifier.
pub fn normalize_assembly(raw: &str) -> Result<GenomeRelease, Error> {
    let raw = raw.trim();
    ASSEMBLY_MAP
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(raw))
        .map(|(_, release)| *release)
        .ok_or_else(|| Error::UnsupportedAssembly(raw.to_string()))
}

/// Sum optional counts.
///
/// Returns `None` if every value is `None`, otherwise the sum of the present
/// values (`None` contributes nothing).
pub fn sum_nullables<I>(values: I) -> Option<i64>
where
    I: IntoIterator<Item = Option<i64>>,
{
    values.into_iter().fold(None, |acc, value| match (acc, value) {
        (None, None) => None,
        (acc, value) => Some(acc.unwrap_or_default() + value.unwrap_or_default()),
    })
}

/// The version of `anyvlm-worker` package.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Return the version of the `anyvlm-worker` crate and `x.y.z` in tests.
pub fn worker_version() -> &'static str {
    if cfg!(test) {
        "x.y.z"
    } else {
        VERSION
    }
}
