//! Normalization of query loci.

use std::sync::OnceLock;

use crate::{
    common::{normalize_assembly, GenomeRelease, CHROMS},
    err::Error,
};

/// Normalize a chromosome name.
///
/// The name is upper-cased and a leading `chr` (any case) is stripped.  The
/// remaining token must be one of [`CHROMS`].
pub fn normalize_chromosome(raw: &str) -> Result<String, Error> {
    let upper = raw.to_uppercase();
    let token = upper.strip_prefix("CHR").unwrap_or(&upper);

    if CHROMS.contains(&token) {
        Ok(token.to_string())
    } else {
        Err(Error::InvalidChromosome(raw.to_string()))
    }
}

fn nucleotides_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^[ACGTURYKMSWBDHVN.-]*$").expect("invalid regex in source code")
    })
}

/// Upper-case a nucleotide sequence and check it against the IUPAC alphabet.
pub fn normalize_bases(raw: &str) -> Result<String, Error> {
    let bases = raw.to_uppercase();
    if nucleotides_re().is_match(&bases) {
        Ok(bases)
    } else {
        Err(Error::InvalidNucleotides(raw.to_string()))
    }
}

/// A normalized query locus; only ever used as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicLocus {
    pub assembly: GenomeRelease,
    pub chromosome: String,
    pub position: u64,
    pub reference: String,
    pub alternate: String,
}

impl GenomicLocus {
    /// Validate and normalize the raw query fields.
    pub fn new(
        assembly: &str,
        chromosome: &str,
        position: u64,
        reference: &str,
        alternate: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            assembly: normalize_assembly(assembly)?,
            chromosome: normalize_chromosome(chromosome)?,
            position,
            reference: normalize_bases(reference)?,
            alternate: normalize_bases(alternate)?,
        })
    }

    /// The gnomAD-style expression `{chrom}-{pos}-{ref}-{alt}` submitted to AnyVar.
    pub fn expression(&self) -> String {
        variant_expression(
            &self.chromosome,
            self.position,
            &self.reference,
            &self.alternate,
        )
    }
}

/// Build the `{chrom}-{pos}-{ref}-{alt}` expression from its parts.
pub fn variant_expression(chrom: &str, pos: u64, reference: &str, alternate: &str) -> String {
    format!("{}-{}-{}-{}", chrom, pos, reference, alternate)
}
