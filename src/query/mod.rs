//! Implementation of the `query *` subcommands.

pub mod caf;
pub mod search;

/// Connection options shared by the query subcommands.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConnArgs {
    /// Path to the RocksDB directory; overrides `ANYVLM_STORAGE_PATH`.
    #[clap(long)]
    pub path_db: Option<String>,
    /// AnyVar API root; overrides `ANYVLM_ANYVAR_URI`.
    #[clap(long)]
    pub anyvar_uri: Option<String>,
}

impl ConnArgs {
    /// Read the settings from the environment and apply the overrides.
    pub fn settings(&self) -> Result<crate::conf::Settings, anyhow::Error> {
        let mut settings = crate::conf::Settings::from_env()?;
        settings.apply_overrides(self.path_db.as_deref(), self.anyvar_uri.as_deref());
        Ok(settings)
    }
}

/// Write `value` as pretty-printed JSON to stdout.
fn print_json<T: serde::Serialize>(value: &T) -> Result<(), anyhow::Error> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, value)?;
    std::io::Write::write_all(&mut lock, b"\n")?;
    Ok(())
}
