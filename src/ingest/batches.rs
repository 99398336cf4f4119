//! Extraction of (expression, allele frequency) batches from VCF records.

use std::io::BufRead;

use noodles::vcf;
use vcf::variant::record_buf::info::field::{value::Array, Value};

use crate::{common::locus::variant_expression, err::Error};

/// Allele frequency annotation of one alternate allele.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AfData {
    pub ac: i64,
    pub an: i64,
    pub ac_het: Option<i64>,
    pub ac_hom: Option<i64>,
    pub ac_hemi: Option<i64>,
    pub filters: Vec<String>,
}

/// Counters of the extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub records: usize,
    pub alleles: usize,
    pub skipped: usize,
}

/// Symbol of a missing or overlapping-deletion allele.
const WILDCARD: char = '*';

/// Read the integer value of a `Number=1` field.
fn scalar(info: &vcf::variant::record_buf::Info, key: &str) -> Option<i64> {
    match info.get(key) {
        Some(Some(Value::Integer(value))) => Some(i64::from(*value)),
        Some(Some(Value::Array(Array::Integer(values)))) => {
            values.first().copied().flatten().map(i64::from)
        }
        _ => None,
    }
}

/// Read the value for allele `idx` of a `Number=A` field.
fn per_allele(info: &vcf::variant::record_buf::Info, key: &str, idx: usize) -> Option<i64> {
    match info.get(key) {
        Some(Some(Value::Array(Array::Integer(values)))) => {
            values.get(idx).copied().flatten().map(i64::from)
        }
        Some(Some(Value::Integer(value))) if idx == 0 => Some(i64::from(*value)),
        _ => None,
    }
}

/// Extract the annotation of the alternate allele `idx` of `record`.
///
/// All five count fields must be declared in INFO. `AC` and `AN` must also
/// carry a value for the allele; the zygosity counts may be missing (`.`).
pub fn extract_af_data(
    record: &vcf::variant::RecordBuf,
    idx: usize,
    expression: &str,
) -> Result<AfData, Error> {
    let info = record.info();
    let has = |key: &str| info.get(key).is_some();
    let (has_ac, has_an) = (has("AC"), has("AN"));
    let (has_ac_het, has_ac_hom, has_ac_hemi) = (has("AC_Het"), has("AC_Hom"), has("AC_Hemi"));
    if !(has_ac && has_an && has_ac_het && has_ac_hom && has_ac_hemi) {
        return Err(Error::MissingRequiredColumns {
            expression: expression.to_string(),
            ac: has_ac,
            an: has_an,
            ac_het: has_ac_het,
            ac_hom: has_ac_hom,
            ac_hemi: has_ac_hemi,
        });
    }

    let missing_value = |field: &'static str| Error::MissingRequiredValue {
        expression: expression.to_string(),
        field,
    };
    Ok(AfData {
        ac: per_allele(info, "AC", idx).ok_or_else(|| missing_value("AC"))?,
        an: scalar(info, "AN").ok_or_else(|| missing_value("AN"))?,
        ac_het: per_allele(info, "AC_Het", idx),
        ac_hom: per_allele(info, "AC_Hom", idx),
        ac_hemi: per_allele(info, "AC_Hemi", idx),
        filters: record.filters().as_ref().iter().cloned().collect(),
    })
}

/// Stream the records of `reader` and hand out batches of at most
/// `batch_size` `(expression, annotation)` pairs to `f`.
///
/// Every alternate allele yields one pair; alleles involving `*` are skipped.
/// Only one batch is held in memory at any time.
pub fn for_each_batch<R, F>(
    reader: &mut vcf::io::Reader<R>,
    header: &vcf::Header,
    batch_size: usize,
    mut f: F,
) -> Result<ExtractStats, Error>
where
    R: BufRead,
    F: FnMut(Vec<(String, AfData)>) -> Result<(), Error>,
{
    let batch_size = batch_size.max(1);
    let mut stats = ExtractStats::default();
    let mut batch = Vec::with_capacity(batch_size);

    for record in reader.records() {
        let record = vcf::variant::RecordBuf::try_from_variant_record(header, &record?)?;
        stats.records += 1;

        let chrom = record.reference_sequence_name();
        let Some(pos) = record.variant_start().map(usize::from) else {
            tracing::info!("Skipping record without position on {}", chrom);
            stats.skipped += record.alternate_bases().as_ref().len();
            continue;
        };
        let reference = record.reference_bases();

        for (idx, alt) in record.alternate_bases().as_ref().iter().enumerate() {
            if reference.contains(WILDCARD) || alt.contains(WILDCARD) {
                tracing::info!(
                    "Skipping missing allele at {}:{} {}>{}",
                    chrom,
                    pos,
                    reference,
                    alt
                );
                stats.skipped += 1;
                continue;
            }
            let expression = variant_expression(chrom, pos as u64, reference, alt);
            let af = extract_af_data(&record, idx, &expression).map_err(|e| {
                tracing::error!("{}", &e);
                e
            })?;
            stats.alleles += 1;
            batch.push((expression, af));

            if batch.len() >= batch_size {
                tracing::debug!("Handing out next batch");
                f(std::mem::replace(&mut batch, Vec::with_capacity(batch_size)))?;
            }
        }
    }
    if !batch.is_empty() {
        f(batch)?;
    }
    tracing::debug!("Expression/AF records exhausted");

    Ok(stats)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn batches_of(
        path: &str,
        batch_size: usize,
    ) -> Result<(Vec<Vec<(String, AfData)>>, ExtractStats), Error> {
        let mut reader = vcf::io::Reader::new(crate::common::io::open_read_maybe_gz(path)?);
        let header = reader.read_header()?;
        let mut batches = Vec::new();
        let stats = for_each_batch(&mut reader, &header, batch_size, |batch| {
            batches.push(batch);
            Ok(())
        })?;
        Ok((batches, stats))
    }

    #[test]
    fn extract_grch38() -> Result<(), anyhow::Error> {
        let (batches, stats) = batches_of("tests/ingest/grch38.vcf", 1000)?;

        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(
            stats,
            ExtractStats {
                records: 5,
                alleles: 5,
                skipped: 1,
            }
        );
        assert_eq!(batch[0].0, "chrY-2781761-C-A");
        assert_eq!(
            batch[0].1,
            AfData {
                ac: 1,
                an: 6164,
                ac_het: Some(1),
                ac_hom: Some(0),
                ac_hemi: Some(0),
                filters: vec!["LowQual".into(), "NO_HQ_GENOTYPES".into()],
            }
        );
        assert_eq!(
            batch.iter().map(|(e, _)| e.as_str()).collect::<Vec<_>>(),
            vec![
                "chrY-2781761-C-A",
                "chr1-100-A-G",
                "chr1-200-T-C",
                "chr1-200-T-TA",
                "chrX-300-G-A",
            ]
        );

        // Multi-allelic record, second allele with missing hemizygote count.
        assert_eq!(batch[3].1.ac, 2);
        assert_eq!(batch[3].1.ac_het, Some(2));
        assert_eq!(batch[3].1.ac_hemi, None);
        assert_eq!(batch[1].1.filters, vec!["PASS".to_string()]);

        Ok(())
    }

    #[rstest::rstest]
    #[case(1, 5)]
    #[case(2, 3)]
    #[case(5, 1)]
    #[case(6, 1)]
    fn batch_sizes(#[case] batch_size: usize, #[case] expected: usize) -> Result<(), anyhow::Error> {
        let (batches, _) = batches_of("tests/ingest/grch38.vcf", batch_size)?;

        assert_eq!(batches.len(), expected);
        assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= batch_size));
        assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), 5);

        Ok(())
    }

    #[test]
    fn missing_info_field() {
        let res = batches_of("tests/ingest/info_field_missing.vcf", 1000);

        assert!(
            matches!(
                &res,
                Err(Error::MissingRequiredColumns {
                    ac: true,
                    an: true,
                    ac_het: true,
                    ac_hom: false,
                    ac_hemi: true,
                    ..
                })
            ),
            "{:?}",
            res
        );
    }

    #[test]
    fn missing_info_value() {
        let res = batches_of("tests/ingest/ac_missing_value.vcf", 1000);

        assert!(
            matches!(
                &res,
                Err(Error::MissingRequiredValue { expression, field: "AC" })
                    if expression == "chr1-100-A-T"
            ),
            "{:?}",
            res
        );
    }
}
