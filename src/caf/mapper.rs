//! Conversion between stored rows and CAF results.

use super::{
    AncillaryResults, CohortAlleleFrequencyResult, FocusAllele, QualityMeasures, StudyGroup,
};
use crate::{common::sum_nullables, err::Error, storage::AlleleFrequencyRow};

/// Number of decimal digits kept in `focusAlleleFrequency`.
const FREQUENCY_DIGITS: i32 = 9;

/// Compute `ac / an` rounded to nine decimal digits.
pub fn allele_frequency(ac: i64, an: i64, variant_id: &str) -> Result<f64, Error> {
    if an == 0 {
        return Err(Error::DivisionByZero {
            variant_id: variant_id.to_string(),
        });
    }
    let scale = 10f64.powi(FREQUENCY_DIGITS);
    Ok((ac as f64 / an as f64 * scale).round() / scale)
}

/// Convert a stored row into a CAF result referencing the allele by id.
///
/// The focus allele count is recomputed from the zygosity counts with missing
/// counts contributing zero.
pub fn to_domain(row: &AlleleFrequencyRow) -> Result<CohortAlleleFrequencyResult, Error> {
    let sub_counts = [row.ac_hom, row.ac_het, row.ac_hemi];
    let focus_allele_count = sum_nullables(sub_counts).unwrap_or_default();

    let ancillary_results = sub_counts
        .iter()
        .any(Option::is_some)
        .then(|| AncillaryResults {
            homozygotes: row.ac_hom,
            heterozygotes: row.ac_het,
            hemizygotes: row.ac_hemi,
        });
    let quality_measures = row
        .filters
        .as_ref()
        .filter(|filters| !filters.is_empty())
        .map(|filters| QualityMeasures {
            qc_filters: Some(filters.clone()),
        });

    let focus_allele_frequency =
        allele_frequency(focus_allele_count, row.an, row.variant_id.as_str())?;

    Ok(CohortAlleleFrequencyResult {
        type_: CohortAlleleFrequencyResult::TYPE.to_string(),
        focus_allele: FocusAllele::Unresolved(row.variant_id.clone()),
        focus_allele_count,
        locus_allele_count: row.an,
        focus_allele_frequency,
        quality_measures,
        ancillary_results,
        cohort: StudyGroup {
            name: row.cohort.clone(),
        },
    })
}

/// Convert a CAF result into its stored row.
pub fn to_row(caf: &CohortAlleleFrequencyResult) -> AlleleFrequencyRow {
    let ancillary = caf.ancillary_results.clone().unwrap_or_default();
    AlleleFrequencyRow {
        variant_id: caf.focus_allele.id(),
        cohort: caf.cohort.name.clone(),
        an: caf.locus_allele_count,
        ac: caf.focus_allele_count,
        ac_het: ancillary.heterozygotes,
        ac_hom: ancillary.homozygotes,
        ac_hemi: ancillary.hemizygotes,
        filters: caf
            .quality_measures
            .as_ref()
            .and_then(|measures| measures.qc_filters.clone()),
    }
}
