//! Construction of VLM responses from CAF results.

use strum::IntoEnumIterator;

use super::{
    BeaconHandover, Meta, ResponseField, ResponseSummary, ResultSet, VlmResponse, Zygosity,
};
use crate::{
    anyvar::VariantResolver,
    caf::{query::get_caf, AncillaryResults, CohortAlleleFrequencyResult},
    common::locus::GenomicLocus,
    conf::HandoverConf,
    err::Error,
    storage::FrequencyStore,
};

/// One result set per zygosity, none of them existing.
fn absent_result_sets(node_id: &str) -> Vec<ResultSet> {
    Zygosity::iter()
        .map(|zygosity| ResultSet::new(node_id, zygosity, false, 0))
        .collect()
}

fn result_sets_from_ancillary(node_id: &str, ancillary: &AncillaryResults) -> Vec<ResultSet> {
    Zygosity::iter()
        .map(|zygosity| {
            let count = match zygosity {
                Zygosity::Homozygous => ancillary.homozygotes,
                Zygosity::Heterozygous => ancillary.heterozygotes,
                Zygosity::Hemizygous => ancillary.hemizygotes,
                Zygosity::Unknown => None,
            };
            ResultSet::new(node_id, zygosity, count.is_some(), count.unwrap_or_default())
        })
        .collect()
}

/// Build the VLM response for the CAF results of one variant.
///
/// Without results, or without zygosity breakdown, all four result sets are
/// reported as non-existing.  Merging the results of more than one cohort is
/// not supported.
pub fn build_vlm_response(
    conf: &HandoverConf,
    cafs: &[CohortAlleleFrequencyResult],
) -> Result<VlmResponse, Error> {
    let node_id = conf.handover_type_id();
    let result_sets = match cafs {
        [] => absent_result_sets(node_id),
        [caf] => match &caf.ancillary_results {
            Some(ancillary) => result_sets_from_ancillary(node_id, ancillary),
            None => absent_result_sets(node_id),
        },
        _ => {
            tracing::error!(
                "cannot build VLM response from {} CAF records: {:?}",
                cafs.len(),
                cafs.iter().map(|caf| caf.focus_allele.id()).collect::<Vec<_>>()
            );
            return Err(Error::MultipleRecordsNotImplemented(cafs.len()));
        }
    };

    let response_summary = ResponseSummary {
        exists: result_sets.iter().any(|result_set| result_set.exists),
        num_total_results: result_sets
            .iter()
            .map(|result_set| result_set.results_count)
            .sum(),
    };

    VlmResponse::new(
        vec![BeaconHandover::from(conf)],
        Meta::from(conf),
        response_summary,
        ResponseField { result_sets },
    )
}

/// Look up the variant at `locus` and build its VLM response.
///
/// A variant unknown to AnyVar is reported like one without any results.
pub fn variant_counts(
    conf: &HandoverConf,
    resolver: &dyn VariantResolver,
    store: &dyn FrequencyStore,
    locus: &GenomicLocus,
) -> Result<VlmResponse, Error> {
    let cafs = match get_caf(resolver, store, locus) {
        Ok(cafs) => cafs,
        Err(Error::VariantNotRegistered {
            assembly,
            expression,
        }) => {
            tracing::info!(
                "Variant {} {} is not registered in AnyVar",
                assembly,
                expression
            );
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    build_vlm_response(conf, &cafs)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        anyvar::{fake::FakeResolver, VariantId},
        caf::{mapper, FocusAllele},
        common::GenomeRelease,
        conf::test_conf,
        storage::{fake::MemoryStore, AlleleFrequencyRow},
    };

    fn caf(ancillary: Option<(Option<i64>, Option<i64>, Option<i64>)>) -> CohortAlleleFrequencyResult {
        let (ac_hom, ac_het, ac_hemi) = ancillary.unwrap_or((None, None, None));
        let mut caf = mapper::to_domain(&AlleleFrequencyRow {
            variant_id: VariantId::from("ga4gh:VA.1"),
            cohort: "rare disease".into(),
            an: 6164,
            ac: 1,
            ac_het,
            ac_hom,
            ac_hemi,
            filters: None,
        })
        .unwrap();
        if ancillary.is_some() {
            caf.ancillary_results = Some(AncillaryResults {
                homozygotes: ac_hom,
                heterozygotes: ac_het,
                hemizygotes: ac_hemi,
            });
        }
        caf
    }

    fn counts(response: &VlmResponse) -> Vec<(String, bool, i64)> {
        response
            .result_sets()
            .iter()
            .map(|rs| (rs.id.clone(), rs.exists, rs.results_count))
            .collect()
    }

    #[test]
    fn empty_input() -> Result<(), anyhow::Error> {
        let conf = test_conf::handover();
        let response = build_vlm_response(&conf, &[])?;

        assert_eq!(
            counts(&response),
            vec![
                ("GREGoR-NCH Homozygous".into(), false, 0),
                ("GREGoR-NCH Heterozygous".into(), false, 0),
                ("GREGoR-NCH Hemizygous".into(), false, 0),
                ("GREGoR-NCH Unknown Zygosity".into(), false, 0),
            ]
        );
        assert_eq!(
            response.response_summary(),
            &ResponseSummary {
                exists: false,
                num_total_results: 0
            }
        );

        Ok(())
    }

    #[test]
    fn no_ancillary_results_like_empty() -> Result<(), anyhow::Error> {
        let conf = test_conf::handover();
        let without = caf(None);
        assert_eq!(without.ancillary_results, None);

        assert_eq!(
            build_vlm_response(&conf, &[without])?,
            build_vlm_response(&conf, &[])?
        );

        Ok(())
    }

    #[test]
    fn partial_counts() -> Result<(), anyhow::Error> {
        let conf = test_conf::handover();
        let response = build_vlm_response(&conf, &[caf(Some((Some(3), None, Some(0))))])?;

        assert_eq!(
            counts(&response),
            vec![
                ("GREGoR-NCH Homozygous".into(), true, 3),
                ("GREGoR-NCH Heterozygous".into(), false, 0),
                ("GREGoR-NCH Hemizygous".into(), true, 0),
                ("GREGoR-NCH Unknown Zygosity".into(), false, 0),
            ]
        );
        assert_eq!(
            response.response_summary(),
            &ResponseSummary {
                exists: true,
                num_total_results: 3
            }
        );

        Ok(())
    }

    #[rstest::rstest]
    #[case(2)]
    #[case(3)]
    fn multiple_records(#[case] n: usize) {
        let conf = test_conf::handover();
        let cafs = vec![caf(None); n];

        assert!(matches!(
            build_vlm_response(&conf, &cafs),
            Err(Error::MultipleRecordsNotImplemented(m)) if m == n
        ));
    }

    #[test]
    fn wire_format() -> Result<(), anyhow::Error> {
        let conf = test_conf::handover();
        let mut caf = caf(Some((Some(0), Some(1), Some(0))));
        caf.focus_allele = FocusAllele::Unresolved(VariantId::from("V1"));
        let response = build_vlm_response(&conf, &[caf])?;

        let result_set = |zygosity: &str, exists: bool, count: i64| {
            serde_json::json!({
                "exists": exists,
                "id": format!("GREGoR-NCH {}", zygosity),
                "results": [],
                "resultsCount": count,
                "setType": "genomicVariant",
            })
        };
        assert_eq!(
            serde_json::to_value(&response)?,
            serde_json::json!({
                "beaconHandovers": [{
                    "handoverType": {"id": "GREGoR-NCH", "label": "GREGoR AnyVLM Reference"},
                    "url": "https://variants.gregorconsortium.org/",
                }],
                "meta": {
                    "apiVersion": "v1.0",
                    "beaconId": "org.anyvlm.gregor",
                    "returnedSchemas": [{
                        "entityType": "genomicVariant",
                        "schema": "ga4gh-beacon-variant-v2.0.0",
                    }],
                },
                "responseSummary": {"exists": true, "numTotalResults": 1},
                "response": {
                    "resultSets": [
                        result_set("Homozygous", true, 0),
                        result_set("Heterozygous", true, 1),
                        result_set("Hemizygous", true, 0),
                        result_set("Unknown Zygosity", false, 0),
                    ],
                },
            })
        );

        Ok(())
    }

    fn query_locus() -> GenomicLocus {
        GenomicLocus::new("GRCh38", "chrY", 2781761, "C", "A").unwrap()
    }

    #[test]
    fn variant_counts_end_to_end() -> Result<(), anyhow::Error> {
        let conf = test_conf::handover();
        let resolver = FakeResolver::new();
        resolver.register(GenomeRelease::Grch38, "Y-2781761-C-A", "V1");
        let store = MemoryStore::new();
        store.bulk_insert_skip_conflicts(&[AlleleFrequencyRow {
            variant_id: VariantId::from("V1"),
            cohort: "rare disease".into(),
            an: 6164,
            ac: 1,
            ac_het: Some(1),
            ac_hom: Some(0),
            ac_hemi: Some(0),
            filters: Some(vec!["LowQual".into(), "NO_HQ_GENOTYPES".into()]),
        }])?;

        let response = variant_counts(&conf, &resolver, &store, &query_locus())?;

        assert_eq!(
            counts(&response),
            vec![
                ("GREGoR-NCH Homozygous".into(), true, 0),
                ("GREGoR-NCH Heterozygous".into(), true, 1),
                ("GREGoR-NCH Hemizygous".into(), true, 0),
                ("GREGoR-NCH Unknown Zygosity".into(), false, 0),
            ]
        );
        assert_eq!(response.response_summary().num_total_results, 1);
        assert!(response.response_summary().exists);

        Ok(())
    }

    #[test]
    fn variant_counts_not_registered() -> Result<(), anyhow::Error> {
        let conf = test_conf::handover();
        let resolver = FakeResolver::new();
        let store = MemoryStore::new();

        assert_eq!(
            variant_counts(&conf, &resolver, &store, &query_locus())?,
            build_vlm_response(&conf, &[])?
        );

        Ok(())
    }

    #[test]
    fn variant_counts_resolver_down() {
        let conf = test_conf::handover();
        let resolver = FakeResolver::new();
        resolver.fail();
        let store = MemoryStore::new();

        let res = variant_counts(&conf, &resolver, &store, &query_locus());
        assert!(matches!(res, Err(Error::ResolverUnavailable(_))), "{:?}", res);
    }
}
