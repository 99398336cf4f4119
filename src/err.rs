//! Crate-wide error type and its classification into response classes.

use crate::common::GenomeRelease;

/// Classification of an [`Error`] that decides how callers render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorClass {
    /// Malformed input, raised before any collaborator call.
    Validation,
    /// An expected outcome such as an unregistered variant.
    ExpectedAbsence,
    /// Resolution service or frequency store failed.
    Infrastructure,
    /// Input or stored data violates an invariant.
    DataIntegrity,
}

impl ErrorClass {
    /// Whether errors of this class are reported as server faults.
    pub fn is_server_fault(self) -> bool {
        matches!(self, ErrorClass::Infrastructure | ErrorClass::DataIntegrity)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(
        "Invalid chromosome name {0:?}. Must be a string consisting of either a number between \
         1-22, or one of the values 'X', 'Y', or 'MT'; optionally prefixed with 'chr'."
    )]
    InvalidChromosome(String),
    #[error("Unsupported assembly {0:?}, must be one of: GRCh37, GRCh38, hg19, hg38")]
    UnsupportedAssembly(String),
    #[error("Invalid nucleotide sequence {0:?}")]
    InvalidNucleotides(String),
    #[error("Invalid ResultSet id - ids must be in form '<node_id> <zygosity>', but {reason}")]
    MalformedResultSetId { id: String, reason: String },
    #[error("Variant {assembly} {expression} is not registered in AnyVar")]
    VariantNotRegistered {
        assembly: GenomeRelease,
        expression: String,
    },
    #[error("Unable to establish AnyVar connection: {0}")]
    ResolverUnavailable(#[from] crate::anyvar::Error),
    #[error("Frequency storage unavailable: {0}")]
    StoreUnavailable(#[from] crate::storage::Error),
    #[error(
        "One or more required INFO column is missing at {expression} (present: AC={ac}, AN={an}, \
         AC_Het={ac_het}, AC_Hom={ac_hom}, AC_Hemi={ac_hemi})"
    )]
    MissingRequiredColumns {
        expression: String,
        ac: bool,
        an: bool,
        ac_het: bool,
        ac_hom: bool,
        ac_hemi: bool,
    },
    #[error("locusAlleleCount is 0 for variant {variant_id}, cannot compute focusAlleleFrequency")]
    DivisionByZero { variant_id: String },
    #[error("Building a VLM response from {0} CAF records is not implemented")]
    MultipleRecordsNotImplemented(usize),
    #[error("INFO field {field} has no value for allele {expression}")]
    MissingRequiredValue {
        expression: String,
        field: &'static str,
    },
    #[error("Invalid VCF input: {0}")]
    InvalidVcf(#[source] std::io::Error),
    #[error("Problem reading VCF input: {0}")]
    Io(#[source] std::io::Error),
}

impl From<std::io::Error> for Error {
    /// noodles and flate2 report malformed input as I/O errors of these kinds.
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::InvalidData
            | std::io::ErrorKind::InvalidInput
            | std::io::ErrorKind::UnexpectedEof => Error::InvalidVcf(err),
            _ => Error::Io(err),
        }
    }
}

impl Error {
    /// Return the response class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::InvalidChromosome(_)
            | Error::UnsupportedAssembly(_)
            | Error::InvalidNucleotides(_)
            | Error::MalformedResultSetId { .. } => ErrorClass::Validation,
            Error::VariantNotRegistered { .. } => ErrorClass::ExpectedAbsence,
            Error::ResolverUnavailable(_) | Error::StoreUnavailable(_) | Error::Io(_) => {
                ErrorClass::Infrastructure
            }
            Error::MissingRequiredColumns { .. }
            | Error::MissingRequiredValue { .. }
            | Error::InvalidVcf(_)
            | Error::DivisionByZero { .. }
            | Error::MultipleRecordsNotImplemented(_) => ErrorClass::DataIntegrity,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[rstest::rstest]
    #[case(Error::InvalidChromosome("chr23".into()), ErrorClass::Validation)]
    #[case(Error::UnsupportedAssembly("T2T-CHM13v2.0".into()), ErrorClass::Validation)]
    #[case(
        Error::VariantNotRegistered { assembly: GenomeRelease::Grch38, expression: "Y-1-C-A".into() },
        ErrorClass::ExpectedAbsence
    )]
    #[case(
        Error::ResolverUnavailable(crate::anyvar::Error::Connection("refused".into())),
        ErrorClass::Infrastructure
    )]
    #[case(Error::DivisionByZero { variant_id: "V1".into() }, ErrorClass::DataIntegrity)]
    #[case(Error::MultipleRecordsNotImplemented(2), ErrorClass::DataIntegrity)]
    #[case(
        Error::MissingRequiredValue { expression: "chr1-100-A-T".into(), field: "AC" },
        ErrorClass::DataIntegrity
    )]
    fn error_class(#[case] error: Error, #[case] expected: ErrorClass) {
        assert_eq!(error.class(), expected);
    }

    #[rstest::rstest]
    #[case(std::io::ErrorKind::InvalidData, ErrorClass::DataIntegrity)]
    #[case(std::io::ErrorKind::InvalidInput, ErrorClass::DataIntegrity)]
    #[case(std::io::ErrorKind::UnexpectedEof, ErrorClass::DataIntegrity)]
    #[case(std::io::ErrorKind::NotFound, ErrorClass::Infrastructure)]
    #[case(std::io::ErrorKind::PermissionDenied, ErrorClass::Infrastructure)]
    fn io_error_class(#[case] kind: std::io::ErrorKind, #[case] expected: ErrorClass) {
        let error = Error::from(std::io::Error::new(kind, "boom"));
        assert_eq!(error.class(), expected);
    }

    #[test]
    fn server_fault_classes() {
        assert!(!ErrorClass::Validation.is_server_fault());
        assert!(!ErrorClass::ExpectedAbsence.is_server_fault());
        assert!(ErrorClass::Infrastructure.is_server_fault());
        assert!(ErrorClass::DataIntegrity.is_server_fault());
    }

    #[test]
    fn not_registered_message() {
        let error = Error::VariantNotRegistered {
            assembly: GenomeRelease::Grch38,
            expression: "Y-2781761-C-A".into(),
        };
        assert_eq!(
            error.to_string(),
            "Variant GRCh38 Y-2781761-C-A is not registered in AnyVar"
        );
    }
}
