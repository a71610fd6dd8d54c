//! # folio CLI
//!
//! Command-line interface for the folio portfolio site generator.

mod cache;
mod commands;
mod envelope;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "folio.yml", env = "FOLIO_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new folio project
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Build the static site
    Build,

    /// Start development server with rebuild on change
    Dev {
        /// Server port (defaults to server.port from the config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// List the publications of a publication page
    Publications {
        /// Page slug
        slug: String,

        /// Case-insensitive search over title, authors and venue
        #[arg(long, short)]
        query: Option<String>,

        /// Year to show, or "all"
        #[arg(long, default_value = "all")]
        year: String,

        /// Entry type to show (article, inproceedings, ...), or "all"
        #[arg(long = "type", default_value = "all")]
        kind: String,

        /// Print the available year and type options instead of entries
        #[arg(long)]
        options: bool,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Verify site health and emit diagnostics
    Verify {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_project(path.as_deref()),
        Commands::Build => commands::build_site(&cli.config),
        Commands::Dev { port } => commands::dev_server(&cli.config, port).await,
        Commands::Publications {
            slug,
            query,
            year,
            kind,
            options,
            json,
        } => {
            let opts = commands::PublicationsOptions {
                query,
                year,
                kind,
                options,
                json,
            };
            commands::list_publications(&cli.config, &slug, opts)
        }
        Commands::Verify { json } => commands::verify_site(&cli.config, json),
    }
}
