//! storyreel CLI - narrated, captioned vertical videos from text stories

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{
    cmd_check, cmd_generate, cmd_import, cmd_prepare, cmd_process_item, cmd_run, cmd_schedule,
    cmd_select, App,
};

#[derive(Parser)]
#[command(name = "storyreel")]
#[command(about = "Turn text stories into narrated, captioned vertical videos")]
#[command(version)]
struct Cli {
    /// Config file (default: platform config dir/storyreel/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one batch now: select, generate, publish
    Run,

    /// Run batches at the configured daily times until Ctrl-C
    ///
    /// Send SIGUSR1 to trigger an extra batch.
    Schedule,

    /// Show what the next batch would pick, without changing anything
    Select,

    /// Generate one stored item into a file without publishing it
    Generate {
        /// Source id of the item
        id: String,

        /// Where to write the video
        #[arg(short, long, default_value = "storyreel.mp4")]
        output: PathBuf,

        /// Seed for the background window choice
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Process one item in isolation (used by subprocess batches)
    #[command(hide = true)]
    ProcessItem {
        #[arg(long)]
        id: String,
    },

    /// Show the display text, speech text and synthesis chunks for a story
    Prepare {
        /// Story body; read from stdin when omitted
        text: Option<String>,

        /// Title narrated before the body
        #[arg(short, long, default_value = "")]
        title: String,
    },

    /// Load items from a JSON array into the store
    Import {
        /// JSON file with content items
        file: PathBuf,
    },

    /// Check external tools and configured paths
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let app = App::load(cli.config)?;

    match cli.command {
        Commands::Run => cmd_run(&app).await?,
        Commands::Schedule => cmd_schedule(&app).await?,
        Commands::Select => cmd_select(&app).await?,
        Commands::Generate { id, output, seed } => cmd_generate(&app, &id, &output, seed).await?,
        Commands::ProcessItem { id } => {
            if !cmd_process_item(&app, &id).await? {
                std::process::exit(1);
            }
        }
        Commands::Prepare { text, title } => cmd_prepare(&app, text, &title)?,
        Commands::Import { file } => cmd_import(&app, &file).await?,
        Commands::Check => cmd_check(&app).await?,
    }

    Ok(())
}
