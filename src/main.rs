//! AnyVLM worker main executable

pub mod anyvar;
pub mod caf;
pub mod common;
pub mod conf;
pub mod db;
pub mod err;
pub mod ingest;
pub mod query;
pub mod server;
pub mod storage;
pub mod vlm;

use clap::{Args, Parser, Subcommand};
use console::{Emoji, Term};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "AnyVLM cohort allele frequencies",
    long_about = "This tool ingests cohort allele frequencies and answers variant-level matching queries"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest allele frequencies from a VCF file.
    Ingest(ingest::Args),
    /// Query-related commands.
    Query(Query),
    /// Database-related commands.
    Db(Db),
    /// Server related commands.
    Server(Server),
}

/// Parsing of "query *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Query {
    /// The sub command to run
    #[command(subcommand)]
    command: QueryCommands,
}

/// Enum supporting the parsing of "query *" sub commands.
#[derive(Debug, Subcommand)]
enum QueryCommands {
    Caf(query::caf::Args),
    Search(query::search::Args),
}

/// Parsing of "db *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Db {
    /// The sub command to run
    #[command(subcommand)]
    command: DbCommands,
}

/// Enum supporting the parsing of "db *" sub commands.
#[derive(Debug, Subcommand)]
enum DbCommands {
    Wipe(db::wipe::Args),
}

/// Parsing of "server *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Server {
    /// The sub command to run
    #[command(subcommand)]
    command: ServerCommands,
}

/// Enum supporting the parsing of "server *" sub commands.
#[derive(Debug, Subcommand)]
enum ServerCommands {
    Rest(server::rest::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    let term = Term::stderr();
    tracing::subscriber::with_default(collector, || {
        match &cli.command {
            Commands::Ingest(args) => {
                ingest::run(&cli.common, args)?;
            }
            Commands::Query(query) => match &query.command {
                QueryCommands::Caf(args) => query::caf::run(&cli.common, args)?,
                QueryCommands::Search(args) => query::search::run(&cli.common, args)?,
            },
            Commands::Db(db) => match &db.command {
                DbCommands::Wipe(args) => {
                    db::wipe::run(&cli.common, args)?;
                }
            },
            Commands::Server(server) => match &server.command {
                ServerCommands::Rest(args) => server::rest::run(&cli.common, args)?,
            },
        }

        Ok::<(), anyhow::Error>(())
    })?;
    term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))?;

    Ok(())
}
