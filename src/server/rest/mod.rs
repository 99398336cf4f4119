//! Code supporting the `server rest` sub command.

use actix_web::web::Data;
use clap::Parser;
use tracing::info;

use crate::{
    anyvar::{http::HttpAnyVarClient, VariantResolver},
    common::trace_rss_now,
    conf::{HandoverConf, Settings},
    storage::{rocks::RocksDbStore, FrequencyStore},
};

pub mod actix_server;
pub mod schema;

/// Shared state of the request handlers.
pub struct WebServerData {
    pub resolver: Box<dyn VariantResolver>,
    pub store: Box<dyn FrequencyStore>,
    pub handover: HandoverConf,
    pub settings: Settings,
}

/// Command line arguments for `server rest` sub command.
#[derive(Parser, Debug)]
#[command(author, version, about = "Run REST API server", long_about = None)]
pub struct Args {
    /// Path to the RocksDB directory; overrides `ANYVLM_STORAGE_PATH`.
    #[arg(long)]
    pub path_db: Option<String>,
    /// AnyVar API root; overrides `ANYVLM_ANYVAR_URI`.
    #[arg(long)]
    pub anyvar_uri: Option<String>,
    /// IP to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    pub listen_host: String,
    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    pub listen_port: u16,
}

/// Main entry point for `server rest` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    info!("args_common = {:?}", &args_common);
    info!("args = {:?}", &args);

    if let Some(level) = args_common.verbose.log_level() {
        match level {
            log::Level::Trace | log::Level::Debug => {
                std::env::set_var("RUST_LOG", "debug");
                env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
            }
            _ => (),
        }
    }

    info!("Loading configuration...");
    let handover = HandoverConf::from_env()?;
    let mut settings = Settings::from_env()?;
    settings.apply_overrides(args.path_db.as_deref(), args.anyvar_uri.as_deref());
    info!("  environment: {}", settings.env);

    // The blocking HTTP client must be created outside of the actix runtime.
    let resolver = HttpAnyVarClient::new(&settings.anyvar_uri, settings.anyvar_timeout)
        .map_err(|e| anyhow::anyhow!("could not create AnyVar client: {}", e))?;
    info!("Opening database {}...", &settings.storage_path);
    let store = RocksDbStore::open(&settings.storage_path)
        .map_err(|e| anyhow::anyhow!("could not open database {}: {}", &settings.storage_path, e))?;

    let data = Data::new(WebServerData {
        resolver: Box::new(resolver),
        store: Box::new(store),
        handover,
        settings,
    });

    trace_rss_now();

    info!("Launching server ...");
    actix_server::main(args, data.clone())?;
    data.resolver.close();

    info!("All done. Have a nice day!");
    Ok(())
}
