//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads settings
//! - initialises logging
//! - dispatches to the job pipeline
//! - prints summaries and writes optional exports

use clap::Parser;
use serde_json::json;

use crate::analyzers::build_analyzer;
use crate::cli::{AssessArgs, Cli, Command, DeleteAllArgs, GlobalArgs, RunJobArgs};
use crate::config::Settings;
use crate::error::AppError;
use crate::io::images::check_job_images;
use crate::io::store::JobStore;

pub mod pipeline;

/// Entry point for the `fra` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = apply_overrides(Settings::from_env()?, &cli.global);
    crate::logging::init(&settings);

    let store = JobStore::new(settings.data_dir.clone());
    match cli.command {
        Command::RunJob(args) => handle_run_job(&settings, &store, args),
        Command::Rescore(args) => handle_rescore(&settings, &store, &args.job_id),
        Command::Assess(args) => handle_assess(&settings, args),
        Command::ListJobs => {
            print!("{}", crate::report::format_job_table(&store.list_jobs()?));
            Ok(())
        }
        Command::JobStatus(args) => {
            let meta = store.load_meta(&args.job_id)?;
            print!("{}", crate::report::format_job_status(&meta));
            Ok(())
        }
        Command::Stats => {
            print!(
                "{}",
                crate::report::format_stats(&store.list_jobs()?, settings.analyzer, store.data_dir())
            );
            Ok(())
        }
        Command::Validate(args) => handle_validate(&store, &args.job_id),
        Command::Rename(args) => {
            let meta = store.rename_job(&args.job_id, &args.label)?;
            println!(
                "Renamed job {} to {}",
                meta.job_id,
                meta.label.as_deref().unwrap_or("(none)")
            );
            Ok(())
        }
        Command::Delete(args) => {
            store.delete_job(&args.job_id)?;
            println!("Deleted job {}", args.job_id);
            Ok(())
        }
        Command::DeleteAll(args) => handle_delete_all(&store, args),
    }
}

pub fn apply_overrides(mut settings: Settings, global: &GlobalArgs) -> Settings {
    if let Some(dir) = &global.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(path) = &global.tables {
        settings.tables_path = Some(path.clone());
    }
    if let Some(currency) = &global.currency {
        settings.currency = currency.clone();
    }
    settings
}

fn handle_run_job(settings: &Settings, store: &JobStore, args: RunJobArgs) -> Result<(), AppError> {
    // Load tables before creating the job so a bad tables file leaves no half-made job behind.
    let engine = settings.engine()?;
    let kind = args.analyzer.unwrap_or(settings.analyzer);
    let analyzer = build_analyzer(kind, settings)?;

    let meta = store.create_job(&args.image_dir, args.label.clone())?;
    eprintln!(
        "Created job {} with {} image(s); analyzer: {}",
        meta.job_id,
        meta.uploaded_files.len(),
        analyzer.name()
    );

    let run = pipeline::run_job(store, &engine, analyzer.as_ref(), &meta.job_id)?;
    println!(
        "{}",
        crate::report::format_run_summary(&run.meta, &run.assessment, Some(&run.report_path))
    );

    if let Some(path) = &args.export_csv {
        crate::io::export::write_cost_csv(path, &run.meta.job_id, &run.assessment.cost)?;
    }
    Ok(())
}

fn handle_rescore(settings: &Settings, store: &JobStore, job_id: &str) -> Result<(), AppError> {
    let engine = settings.engine()?;
    let run = pipeline::rescore_job(store, &engine, job_id)?;
    println!(
        "{}",
        crate::report::format_run_summary(&run.meta, &run.assessment, Some(&run.report_path))
    );
    Ok(())
}

fn handle_assess(settings: &Settings, args: AssessArgs) -> Result<(), AppError> {
    let engine = settings.engine()?;
    let (_, assessment) = pipeline::assess_file(&engine, &args.damages)?;

    if args.json {
        let out = json!({
            "cost_estimate": assessment.cost,
            "risk_summary": assessment.risk,
        });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| AppError::io(format!("Failed to serialize assessment: {e}")))?;
        println!("{text}");
    } else {
        print!("{}", crate::report::format_assessment(&assessment));
    }
    Ok(())
}

fn handle_validate(store: &JobStore, job_id: &str) -> Result<(), AppError> {
    store.load_meta(job_id)?;
    let checks = check_job_images(&store.job_images(job_id)?)?;
    print!("{}", crate::report::format_image_checks(job_id, &checks));
    if checks.iter().all(|c| c.is_ok()) {
        Ok(())
    } else {
        Err(AppError::precondition("One or more uploaded images failed validation."))
    }
}

fn handle_delete_all(store: &JobStore, args: DeleteAllArgs) -> Result<(), AppError> {
    if !args.yes {
        return Err(AppError::usage("Refusing to delete every job without --yes."));
    }
    let count = store.delete_all_jobs()?;
    println!("Deleted {count} job(s)");
    Ok(())
}
