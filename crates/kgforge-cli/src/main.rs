//! kgforge CLI
//!
//! Generates synthetic ontologies and knowledge graphs:
//! - `template`: write a filled-in configuration file
//! - `schema`: class hierarchy + relation schema (`class_info.json`,
//!   `relation_info.json`, `schema.<ext>`)
//! - `kg`: a knowledge graph over an existing schema folder (`kg_info.json`,
//!   `kg.json`, `full_graph.<ext>`)
//! - `generate`: both stages in one run

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod output;
mod report;

use commands::RunOptions;
use config::ConfigFormat;

#[derive(Parser)]
#[command(name = "kgforge")]
#[command(
    author,
    version,
    about = "kgforge: synthetic schema and knowledge graph generator"
)]
struct Cli {
    /// Debug-level logging (otherwise `RUST_LOG`, defaulting to `info`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration template with every key at its default.
    Template {
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
        /// Destination directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Generate the class hierarchy and relation schema.
    Schema(RunArgs),

    /// Generate a knowledge graph over an existing schema folder.
    Kg {
        #[command(flatten)]
        run: RunArgs,
        /// Schema folder to use; the most recent one by default
        #[arg(long)]
        schema_name: Option<String>,
    },

    /// Generate a schema and a knowledge graph in one run.
    Generate(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Configuration file (.json, .yaml or .yml)
    #[arg(short, long)]
    config: PathBuf,
    /// Parent directory of the schema folders
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
    /// Seed overriding the configuration's `seed`
    #[arg(long)]
    seed: Option<u64>,
    /// Skip the summary tables
    #[arg(short, long)]
    quiet: bool,
}

impl From<RunArgs> for RunOptions {
    fn from(args: RunArgs) -> Self {
        RunOptions {
            config: args.config,
            output_dir: args.output_dir,
            seed: args.seed,
            quiet: args.quiet,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Template { format, out } => {
            commands::cmd_template(format, &out)?;
        }
        Commands::Schema(run) => {
            commands::cmd_schema(&run.into())?;
        }
        Commands::Kg { run, schema_name } => {
            commands::cmd_kg(&run.into(), schema_name.as_deref())?;
        }
        Commands::Generate(run) => {
            commands::cmd_generate(&run.into())?;
        }
    }
    Ok(())
}
