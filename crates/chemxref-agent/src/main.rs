//! chemxref: DrugBank/ChEMBL cross-referencing and structure similarity.
//! Entry point for the command-line binary.

mod config;
mod io;
mod pipeline;

use std::path::PathBuf;

use chemxref_similarity::MissingPolicy;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "chemxref",
    version,
    about = "Cross-reference drug identifiers and compute structural similarity",
    long_about = None
)]
struct Cli {
    /// Config file. Defaults to $CHEMXREF_CONFIG, then ./chemxref.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill in the missing DrugBank or ChEMBL id of every record.
    Resolve {
        /// JSON array or JSON lines of {"name"?, "id"}.
        #[arg(long)]
        input: PathBuf,

        /// Report path. Stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Resolve ids, fetch SMILES and compute the similarity matrix.
    Run {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: Option<PathBuf>,

        /// Overrides `[similarity] policy` from the config.
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    KeepAndZero,
    DropMissing,
}

impl From<PolicyArg> for MissingPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::KeepAndZero => MissingPolicy::KeepAndZero,
            PolicyArg::DropMissing => MissingPolicy::DropMissing,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so a report on stdout stays clean JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chemxref=debug,info")),
        )
        .init();

    let cli = Cli::parse();
    info!("chemxref {}", env!("CARGO_PKG_VERSION"));

    let mut config = config::Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Resolve { input, output } => {
            let pipeline = Pipeline::from_config(&config)?;
            let mut records = io::read_records(&input)?;
            info!(records = records.len(), input = %input.display(), "Records loaded");

            let batch = pipeline.resolve(&mut records).await;
            let report = io::Report {
                generated_at: chrono::Utc::now(),
                batch,
                records,
                similarity: None,
            };
            io::write_report(&report, output.as_deref())?;
        }
        Command::Run { input, output, policy } => {
            if let Some(policy) = policy {
                config.similarity.policy = policy.into();
            }
            let pipeline = Pipeline::from_config(&config)?;
            let records = io::read_records(&input)?;
            info!(records = records.len(), input = %input.display(), "Records loaded");

            let report = pipeline.run(records).await;
            io::write_report(&report, output.as_deref())?;
        }
    }

    info!("Done");
    Ok(())
}
