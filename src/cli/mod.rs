//! Command-line parsing for the facade risk pipeline.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and the scoring engine.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::analyzers::AnalyzerKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fra", version, about = "Facade damage risk and repair-cost assessment")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand. Each overrides its environment variable.
#[derive(Debug, Args, Clone, Default)]
pub struct GlobalArgs {
    /// Data directory holding uploads, reconstructions and reports (env: FRA_DATA_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// JSON file overriding the rate and weight tables (env: FRA_TABLES).
    #[arg(long, global = true, value_name = "JSON")]
    pub tables: Option<PathBuf>,

    /// Currency label for cost estimates (env: FRA_CURRENCY).
    #[arg(long, global = true)]
    pub currency: Option<String>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a job from a directory of facade images and run the full pipeline.
    RunJob(RunJobArgs),
    /// Recompute cost estimate, risk summary and report from a job's recorded damages.
    Rescore(JobArgs),
    /// Score a standalone damages JSON file without creating a job.
    Assess(AssessArgs),
    /// List all jobs, newest first.
    ListJobs,
    /// Show details for one job.
    JobStatus(JobArgs),
    /// Show pipeline statistics.
    Stats,
    /// Check that a job's uploaded files are readable images.
    Validate(JobArgs),
    /// Change a job's label (an empty label clears it).
    Rename(RenameArgs),
    /// Delete a job with its outputs and report.
    Delete(JobArgs),
    /// Delete every job in the data directory.
    DeleteAll(DeleteAllArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunJobArgs {
    /// Directory containing facade images (.jpg, .jpeg, .png, .webp, .gif).
    pub image_dir: PathBuf,

    /// Human-readable label for the job.
    #[arg(short = 'l', long)]
    pub label: Option<String>,

    /// Damage analyzer (env: DAMAGE_ANALYZER).
    #[arg(short = 'a', long, value_enum)]
    pub analyzer: Option<AnalyzerKind>,

    /// Also export the cost items to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct JobArgs {
    pub job_id: String,
}

#[derive(Debug, Args, Clone)]
pub struct RenameArgs {
    pub job_id: String,
    pub label: String,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteAllArgs {
    /// Required; there is no undo.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AssessArgs {
    /// Damages JSON: a list of observations or an object with a `damages` field.
    pub damages: PathBuf,

    /// Print `{"cost_estimate": ..., "risk_summary": ...}` as JSON instead of tables.
    #[arg(long)]
    pub json: bool,
}
