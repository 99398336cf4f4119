//! Implementation of the `query caf` subcommand.

use crate::{
    anyvar::{http::HttpAnyVarClient, VariantResolver},
    common::{self, locus::GenomicLocus},
    conf::HandoverConf,
    storage::rocks::RocksDbStore,
    vlm::build::variant_counts,
};

/// Command line arguments for `query caf` subcommand.
#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about = "print VLM variant counts of one variant",
    long_about = None
)]
pub struct Args {
    /// Genome assembly (GRCh37, GRCh38, hg19, hg38).
    #[clap(long)]
    pub assembly: String,
    /// Chromosome, with or without `chr` prefix.
    #[clap(long)]
    pub chromosome: String,
    /// 1-based position of the variant.
    #[clap(long)]
    pub position: u64,
    /// Reference bases.
    #[clap(long)]
    pub reference: String,
    /// Alternate bases.
    #[clap(long)]
    pub alternate: String,

    #[clap(flatten)]
    pub conn: super::ConnArgs,
}

/// Main entry point for `query caf` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    common::trace_rss_now();

    let handover = HandoverConf::from_env()?;
    let settings = args.conn.settings()?;
    let locus = GenomicLocus::new(
        &args.assembly,
        &args.chromosome,
        args.position,
        &args.reference,
        &args.alternate,
    )?;

    let resolver = HttpAnyVarClient::new(&settings.anyvar_uri, settings.anyvar_timeout)
        .map_err(|e| anyhow::anyhow!("could not create AnyVar client: {}", e))?;
    let store = RocksDbStore::open(&settings.storage_path)
        .map_err(|e| anyhow::anyhow!("could not open database {}: {}", &settings.storage_path, e))?;

    let before_query = std::time::Instant::now();
    let response = variant_counts(&handover, &resolver, &store, &locus)
        .map_err(|e| anyhow::anyhow!("problem querying {}: {}", locus.expression(), e))?;
    tracing::info!("... done querying in {:?}", before_query.elapsed());
    resolver.close();

    super::print_json(&response)
}
