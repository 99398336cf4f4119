//! Cohort allele frequency (CAF) results and their lookup.

pub mod mapper;
pub mod query;

use crate::anyvar::{Allele, VariantId};

/// The allele that a CAF result describes.
///
/// Freshly loaded results only carry the id; lookups replace it with the
/// allele object already obtained from AnyVar.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FocusAllele {
    Resolved(Allele),
    Unresolved(VariantId),
}

impl FocusAllele {
    /// Return the variant id, regardless of the representation.
    pub fn id(&self) -> VariantId {
        match self {
            FocusAllele::Resolved(allele) => {
                VariantId::new(allele.id.as_deref().unwrap_or_default())
            }
            FocusAllele::Unresolved(id) => id.clone(),
        }
    }
}

/// Per-zygosity breakdown of the focus allele count.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AncillaryResults {
    #[serde(default)]
    pub homozygotes: Option<i64>,
    #[serde(default)]
    pub heterozygotes: Option<i64>,
    #[serde(default)]
    pub hemizygotes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMeasures {
    #[serde(default)]
    pub qc_filters: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StudyGroup {
    pub name: String,
}

/// A VA-Spec `CohortAlleleFrequencyStudyResult`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortAlleleFrequencyResult {
    #[serde(rename = "type", default = "CohortAlleleFrequencyResult::default_type")]
    pub type_: String,
    pub focus_allele: FocusAllele,
    pub focus_allele_count: i64,
    pub locus_allele_count: i64,
    pub focus_allele_frequency: f64,
    #[serde(default)]
    pub quality_measures: Option<QualityMeasures>,
    #[serde(default)]
    pub ancillary_results: Option<AncillaryResults>,
    pub cohort: StudyGroup,
}

impl CohortAlleleFrequencyResult {
    pub const TYPE: &'static str = "CohortAlleleFrequencyStudyResult";

    fn default_type() -> String {
        Self::TYPE.to_string()
    }
}
