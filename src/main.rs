//! # Run Ledger CLI (`rled`)
//!
//! The `rled` binary is the primary interface for Run Ledger. It provides
//! commands for pushing experiment runs to the document store, exporting
//! scalars from event logs, gathering stored object paths, and checking
//! collaborator health.
//!
//! ## Usage
//!
//! ```bash
//! rled --config ./config/rled.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rled push` | Assemble and push one run (config + scalars + metadata) |
//! | `rled export csv\|json` | Export scalars from an event log directory |
//! | `rled paths` | Print stored object paths, comma-joined |
//! | `rled status` | Check document-store and object-store connectivity |
//!
//! ## Examples
//!
//! ```bash
//! # Push a run with its YAML parameters and uploaded log path
//! rled push --name baseline --params params.yaml --logdir ./runs/baseline \
//!     --requirements requirements.txt --s3 s3://experiments/baseline/run-1
//!
//! # Keep only loss-like scalars
//! rled push --name baseline --params params.yaml --logdir ./runs/baseline \
//!     --suffix loss --suffix accuracy
//!
//! # Export unpacked series as JSON (no store access)
//! rled export json --logdir ./runs/baseline --out scalars.json --mode unpack
//!
//! # Build a --logdir_spec for every run of one experiment
//! tensorboard --logdir_spec=$(rled paths --name baseline)
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use run_ledger::{config, export, paths, push, status};

/// Run Ledger CLI — push TensorBoard scalars and workspace metadata to a
/// document store.
///
/// All store-facing commands accept a `--config` flag pointing to a TOML
/// configuration file with document-store credentials and object-store
/// settings.
#[derive(Parser)]
#[command(
    name = "rled",
    about = "Run Ledger — experiment logging from TensorBoard event files to a document store",
    version,
    long_about = "Run Ledger reads TensorBoard scalar event logs and workspace metadata \
    (git remotes, commit, dirty state, dependency lists), assembles them into normalized run \
    and metric documents, and pushes them to a document store with optional object-store \
    path references."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Required for store-facing commands (`push`, `paths`, `status`);
    /// `export` runs against local files only.
    #[arg(long, global = true, default_value = "./config/rled.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Assemble and push one experiment run.
    ///
    /// Reads scalars from the event log directory, loads the experiment
    /// config document, scans the workspace for git and dependency
    /// metadata, and inserts the run and metric documents.
    Push {
        /// Experiment name stored on the run document.
        #[arg(long)]
        name: String,

        /// Experiment config document (.yaml, .yml, or .csv).
        #[arg(long)]
        params: PathBuf,

        /// Directory containing TensorBoard event files.
        #[arg(long)]
        logdir: PathBuf,

        /// Directory scanned for version-control metadata.
        #[arg(long, default_value = ".")]
        git_dir: PathBuf,

        /// Plain-text dependency list to embed in the run document.
        #[arg(long)]
        requirements: Option<PathBuf>,

        /// Keep only scalar tags ending in one of these suffixes
        /// (repeatable; no flag keeps everything).
        #[arg(long = "suffix")]
        suffixes: Vec<String>,

        /// Object-store path reference to attach to the run document.
        #[arg(long)]
        s3: Option<String>,
    },

    /// Export scalars from an event log directory.
    ///
    /// Writes a CSV (aligned value columns) or JSON (strip or unpack
    /// shape) file. Does not touch the store.
    Export {
        /// Output format: `csv` or `json`.
        format: String,

        /// Directory containing TensorBoard event files.
        #[arg(long)]
        logdir: PathBuf,

        /// Output file path.
        #[arg(long)]
        out: PathBuf,

        /// Keep only scalar tags ending in one of these suffixes.
        #[arg(long = "suffix")]
        suffixes: Vec<String>,

        /// Value shape: `strip` (values only) or `unpack` (aligned
        /// steps/timestamps/values arrays; JSON only).
        #[arg(long, default_value = "strip")]
        mode: String,
    },

    /// Print the stored object paths of selected runs, comma-joined.
    ///
    /// The output feeds a multi-run visualization spec
    /// (`tensorboard --logdir_spec=...`).
    Paths {
        /// Restrict to runs of this experiment name.
        #[arg(long)]
        name: Option<String>,
    },

    /// Check document-store and object-store connectivity.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Export reads only local event files; no config needed.
    if let Commands::Export {
        format,
        logdir,
        out,
        suffixes,
        mode,
    } = &cli.command
    {
        export::run_export(logdir, format, out, suffixes, mode)?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Push {
            name,
            params,
            logdir,
            git_dir,
            requirements,
            suffixes,
            s3,
        } => {
            push::run_push(
                &cfg,
                &name,
                &params,
                &logdir,
                &git_dir,
                requirements.as_deref(),
                &suffixes,
                s3,
            )
            .await?;
        }
        Commands::Paths { name } => {
            paths::run_paths(&cfg, name).await?;
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
        Commands::Export { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
