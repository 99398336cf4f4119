//! Implementation of the `query search` subcommand.

use thousands::Separable;

use crate::{
    anyvar::{http::HttpAnyVarClient, VariantResolver},
    caf::query::search_caf,
    common,
    storage::rocks::RocksDbStore,
};

/// Command line arguments for `query search` subcommand.
#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about = "print CAF results of all variants in an interval",
    long_about = None
)]
pub struct Args {
    /// Sequence accession, e.g., `NC_000024.10`.
    #[clap(long)]
    pub accession: String,
    /// Interval start (inter-residue).
    #[clap(long)]
    pub start: u64,
    /// Interval end (inter-residue).
    #[clap(long)]
    pub end: u64,

    #[clap(flatten)]
    pub conn: super::ConnArgs,
}

/// Main entry point for `query search` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    common::trace_rss_now();

    if args.start > args.end {
        anyhow::bail!("start {} is after end {}", args.start, args.end);
    }
    let settings = args.conn.settings()?;
    let resolver = HttpAnyVarClient::new(&settings.anyvar_uri, settings.anyvar_timeout)
        .map_err(|e| anyhow::anyhow!("could not create AnyVar client: {}", e))?;
    let store = RocksDbStore::open(&settings.storage_path)
        .map_err(|e| anyhow::anyhow!("could not open database {}: {}", &settings.storage_path, e))?;

    let cafs = search_caf(&resolver, &store, &args.accession, args.start, args.end).map_err(
        |e| {
            anyhow::anyhow!(
                "problem searching {}:{}-{}: {}",
                &args.accession,
                args.start,
                args.end,
                e
            )
        },
    )?;
    tracing::info!(
        "found {} CAF results",
        cafs.len().separate_with_commas()
    );
    resolver.close();

    super::print_json(&cafs)
}
