//! Lookup of CAF results for a locus or an interval.

use indexmap::IndexMap;

use super::{mapper, CohortAlleleFrequencyResult, FocusAllele};
use crate::{
    anyvar::{Allele, VariantId, VariantResolver},
    common::locus::GenomicLocus,
    err::Error,
    storage::FrequencyStore,
};

/// Return the CAF results stored for the variant at `locus`.
///
/// Fails with [`Error::VariantNotRegistered`] if AnyVar does not know the
/// variant.  A registered variant without stored rows yields an empty list.
pub fn get_caf(
    resolver: &dyn VariantResolver,
    store: &dyn FrequencyStore,
    locus: &GenomicLocus,
) -> Result<Vec<CohortAlleleFrequencyResult>, Error> {
    let expression = locus.expression();
    tracing::debug!("resolving {} {}", locus.assembly, &expression);

    let not_registered = || Error::VariantNotRegistered {
        assembly: locus.assembly,
        expression: expression.clone(),
    };
    let allele = resolver
        .resolve_single(&expression, locus.assembly)?
        .ok_or_else(not_registered)?;
    let variant_id = allele.variant_id().ok_or_else(not_registered)?;

    let rows = store.get_by_variant_id(&variant_id)?;
    tracing::debug!("found {} rows for {}", rows.len(), &variant_id);

    rows.iter()
        .map(|row| {
            let mut caf = mapper::to_domain(row)?;
            caf.focus_allele = FocusAllele::Resolved(allele.clone());
            Ok(caf)
        })
        .collect()
}

/// Return the CAF results of all registered variants overlapping the interval.
pub fn search_caf(
    resolver: &dyn VariantResolver,
    store: &dyn FrequencyStore,
    accession: &str,
    start: u64,
    end: u64,
) -> Result<Vec<CohortAlleleFrequencyResult>, Error> {
    let alleles: IndexMap<VariantId, Allele> = resolver
        .search_interval(accession, start, end)?
        .into_iter()
        .filter_map(|allele| allele.variant_id().map(|id| (id, allele)))
        .collect();
    tracing::debug!(
        "{} alleles registered in {}:{}-{}",
        alleles.len(),
        accession,
        start,
        end
    );
    if alleles.is_empty() {
        return Ok(Vec::new());
    }

    let ids = alleles.keys().cloned().collect::<Vec<_>>();
    store
        .get_by_variant_ids(&ids)?
        .iter()
        .map(|row| {
            let mut caf = mapper::to_domain(row)?;
            if let Some(allele) = alleles.get(&row.variant_id) {
                caf.focus_allele = FocusAllele::Resolved(allele.clone());
            }
            Ok(caf)
        })
        .collect()
}
