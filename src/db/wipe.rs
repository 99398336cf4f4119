//! Implementation of the `db wipe` subcommand.

use crate::{
    common,
    conf::Settings,
    storage::{rocks::RocksDbStore, FrequencyStore},
};

/// Command line arguments for `db wipe` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "remove all stored allele frequencies", long_about = None)]
pub struct Args {
    /// Path to the RocksDB directory; overrides `ANYVLM_STORAGE_PATH`.
    #[clap(long)]
    pub path_db: Option<String>,
}

/// Main entry point for `db wipe` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    common::trace_rss_now();

    let mut settings = Settings::from_env()?;
    settings.apply_overrides(args.path_db.as_deref(), None);

    tracing::info!("Opening database {}...", &settings.storage_path);
    let store = RocksDbStore::open(&settings.storage_path)
        .map_err(|e| anyhow::anyhow!("could not open database {}: {}", &settings.storage_path, e))?;

    let before_wipe = std::time::Instant::now();
    store
        .wipe_all()
        .map_err(|e| anyhow::anyhow!("could not wipe database: {}", e))?;
    tracing::info!("... wiped database in {:?}", before_wipe.elapsed());

    Ok(())
}
