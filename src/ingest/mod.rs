//! Implementation of the `ingest` subcommand.

use std::io::BufRead;

use noodles::vcf;
use thousands::Separable;

use crate::{
    anyvar::{http::HttpAnyVarClient, VariantResolver},
    caf::{
        mapper, AncillaryResults, CohortAlleleFrequencyResult, FocusAllele, QualityMeasures,
        StudyGroup,
    },
    common::{self, GenomeRelease},
    conf::Settings,
    err::Error,
    storage::{rocks::RocksDbStore, FrequencyStore},
};

pub mod batches;

/// Default number of alleles per resolution batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Cohort assigned to ingested rows by default.
pub const DEFAULT_COHORT: &str = "rare disease";

/// Command line arguments for `ingest` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "ingest cohort allele frequencies from VCF", long_about = None)]
pub struct Args {
    /// Path to input VCF file, may be gzip or bgzip compressed.
    #[clap(long)]
    pub path_in: String,
    /// Genome assembly of the input (GRCh37, GRCh38, hg19, hg38).
    #[clap(long)]
    pub assembly: GenomeRelease,
    /// Path to the RocksDB directory; overrides `ANYVLM_STORAGE_PATH`.
    #[clap(long)]
    pub path_db: Option<String>,
    /// AnyVar API root; overrides `ANYVLM_ANYVAR_URI`.
    #[clap(long)]
    pub anyvar_uri: Option<String>,
    /// Number of alleles to resolve per AnyVar batch.
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Name of the cohort the frequencies belong to.
    #[clap(long, default_value = DEFAULT_COHORT)]
    pub cohort: String,
}

/// Counts of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestSummary {
    pub records: usize,
    pub alleles: usize,
    pub skipped: usize,
    pub unresolved: usize,
    pub written: usize,
    pub batches: usize,
}

/// Build the CAF result for one resolved allele.
fn build_caf(
    variant_id: crate::anyvar::VariantId,
    af: batches::AfData,
    cohort: &str,
) -> Result<CohortAlleleFrequencyResult, Error> {
    let focus_allele_frequency = mapper::allele_frequency(af.ac, af.an, variant_id.as_str())?;
    Ok(CohortAlleleFrequencyResult {
        type_: CohortAlleleFrequencyResult::TYPE.to_string(),
        focus_allele: FocusAllele::Unresolved(variant_id),
        focus_allele_count: af.ac,
        locus_allele_count: af.an,
        focus_allele_frequency,
        quality_measures: Some(QualityMeasures {
            qc_filters: Some(af.filters),
        }),
        ancillary_results: Some(AncillaryResults {
            homozygotes: af.ac_hom,
            heterozygotes: af.ac_het,
            hemizygotes: af.ac_hemi,
        }),
        cohort: StudyGroup {
            name: cohort.to_string(),
        },
    })
}

/// Register the variants of a VCF stream and store their frequencies.
///
/// Each batch of up to `batch_size` alleles is resolved with one call to
/// `resolver` and written with at most one call to `store`.  Alleles that
/// cannot be resolved are dropped.
pub fn ingest_vcf<R: BufRead>(
    input: R,
    assembly: GenomeRelease,
    resolver: &dyn VariantResolver,
    store: &dyn FrequencyStore,
    batch_size: usize,
    cohort: &str,
) -> Result<IngestSummary, Error> {
    let mut reader = vcf::io::Reader::new(input);
    let header = reader.read_header()?;

    let mut summary = IngestSummary::default();
    let mut prev = std::time::Instant::now();
    let stats = batches::for_each_batch(&mut reader, &header, batch_size, |batch| {
        summary.batches += 1;
        let (expressions, afs): (Vec<_>, Vec<_>) = batch.into_iter().unzip();
        let ids = resolver.resolve_or_register(&expressions, assembly)?;
        if ids.len() != expressions.len() {
            return Err(crate::anyvar::Error::LengthMismatch {
                expected: expressions.len(),
                actual: ids.len(),
            }
            .into());
        }

        let mut rows = Vec::with_capacity(ids.len());
        for ((id, af), expression) in ids.into_iter().zip(afs).zip(&expressions) {
            let Some(id) = id else {
                tracing::info!("Could not resolve {}, skipping", expression);
                summary.unresolved += 1;
                continue;
            };
            let caf = build_caf(id, af, cohort).map_err(|e| {
                tracing::error!("Cannot ingest {}: {}", expression, &e);
                e
            })?;
            rows.push(mapper::to_row(&caf));
        }
        if !rows.is_empty() {
            summary.written += store.bulk_insert_skip_conflicts(&rows)?;
        }

        if prev.elapsed().as_secs() >= 60 {
            tracing::info!(
                "at {} ({} alleles written)",
                expressions.last().map(String::as_str).unwrap_or_default(),
                summary.written.separate_with_commas()
            );
            prev = std::time::Instant::now();
        }
        Ok(())
    })?;

    summary.records = stats.records;
    summary.alleles = stats.alleles;
    summary.skipped = stats.skipped;
    Ok(summary)
}

/// Main entry point for `ingest` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    common::trace_rss_now();

    let mut settings = Settings::from_env()?;
    settings.apply_overrides(args.path_db.as_deref(), args.anyvar_uri.as_deref());

    let resolver = HttpAnyVarClient::new(&settings.anyvar_uri, settings.anyvar_timeout)
        .map_err(|e| anyhow::anyhow!("could not create AnyVar client: {}", e))?;
    let store = RocksDbStore::open(&settings.storage_path)
        .map_err(|e| anyhow::anyhow!("could not open database {}: {}", &settings.storage_path, e))?;

    tracing::info!("opening input file...");
    let input = common::io::open_read_maybe_gz(&args.path_in)
        .map_err(|e| anyhow::anyhow!("could not open file {} for reading: {}", &args.path_in, e))?;

    let before_ingest = std::time::Instant::now();
    let summary = ingest_vcf(
        input,
        args.assembly,
        &resolver,
        &store,
        args.batch_size,
        &args.cohort,
    )
    .map_err(|e| anyhow::anyhow!("problem ingesting {}: {}", &args.path_in, e))?;
    resolver.close();

    tracing::info!(
        "... ingested {} records ({} alleles, {} skipped, {} unresolved, {} rows written) in {:?}",
        summary.records.separate_with_commas(),
        summary.alleles.separate_with_commas(),
        summary.skipped.separate_with_commas(),
        summary.unresolved.separate_with_commas(),
        summary.written.separate_with_commas(),
        before_ingest.elapsed()
    );
    common::trace_rss_now();

    tracing::info!(
        "All of `ingest` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
