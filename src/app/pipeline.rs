//! Shared job pipeline used by the CLI commands.
//!
//! validate images -> analyze -> damages.json -> (cost estimate || risk summary) -> report -> metadata
//!
//! Keeping this in one place lets `run-job` and `rescore` share the persistence
//! steps while the CLI only deals with presentation.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::analyzers::DamageAnalyzer;
use crate::domain::{
    CostEstimate, DamageInput, DamageObservation, DamageReport, JobArtifact, JobMeta, JobOutputs, JobStatus,
    PIPELINE_VERSION, RiskSummary,
};
use crate::engine::{Assessment, Engine};
use crate::error::AppError;
use crate::io::images::validate_job_images;
use crate::io::store::{JobStore, read_json, write_json};
use crate::report::render_job_report;

/// All computed outputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct JobRun {
    pub meta: JobMeta,
    pub observations: Vec<DamageObservation>,
    pub assessment: Assessment,
    pub report_path: PathBuf,
}

/// Analyze a job's images and produce every artifact.
///
/// Uploads are validated first; a job with unreadable or unrecognized images is
/// rejected untouched. After that, any failure marks the job `failed` (with the
/// error message) before it is returned.
pub fn run_job(
    store: &JobStore,
    engine: &Engine,
    analyzer: &dyn DamageAnalyzer,
    job_id: &str,
) -> Result<JobRun, AppError> {
    store.load_meta(job_id)?;
    validate_job_images(&store.job_images(job_id)?)?;

    store.update_meta(job_id, |meta| {
        meta.status = JobStatus::Processing;
        meta.error = None;
        meta.pipeline_version = Some(PIPELINE_VERSION.to_string());
        meta.analyzer = Some(analyzer.name().to_string());
    })?;

    let result = analyze_and_assess(store, engine, analyzer, job_id);
    if let Err(err) = &result {
        mark_failed(store, job_id, err);
    }
    result
}

/// Recompute cost, risk and report from an existing `damages.json`.
pub fn rescore_job(store: &JobStore, engine: &Engine, job_id: &str) -> Result<JobRun, AppError> {
    store.load_meta(job_id)?;
    let observations = store.load_damages(job_id)?;
    let result = assess_and_persist(store, engine, job_id, observations);
    if let Err(err) = &result {
        mark_failed(store, job_id, err);
    }
    result
}

/// Run the core on a standalone damages file (bare list or `{"damages": [...]}`).
pub fn assess_file(engine: &Engine, path: &Path) -> Result<(Vec<DamageObservation>, Assessment), AppError> {
    if !path.is_file() {
        return Err(AppError::precondition(format!(
            "Damages file not found: {}",
            path.display()
        )));
    }
    let input: DamageInput = read_json(path)?;
    let observations = input.into_observations();
    let assessment = engine.assess(&observations)?;
    Ok((observations, assessment))
}

/// Previously written core outputs of a job.
pub fn load_artifacts(
    store: &JobStore,
    job_id: &str,
) -> Result<(JobArtifact<CostEstimate>, JobArtifact<RiskSummary>), AppError> {
    let cost_path = store.cost_path(job_id);
    let risk_path = store.risk_path(job_id);
    if !cost_path.is_file() || !risk_path.is_file() {
        return Err(AppError::precondition(format!("No assessment recorded for job {job_id}")));
    }
    Ok((read_json(&cost_path)?, read_json(&risk_path)?))
}

fn analyze_and_assess(
    store: &JobStore,
    engine: &Engine,
    analyzer: &dyn DamageAnalyzer,
    job_id: &str,
) -> Result<JobRun, AppError> {
    let images = store.job_images(job_id)?;
    let analysis = analyzer.analyze(&images)?;

    let report = DamageReport {
        job_id: job_id.to_string(),
        generated_at: Utc::now(),
        analyzer: analyzer.name().to_string(),
        source: analysis.source,
        damages: analysis.observations,
    };
    let damages_path = store.write_damages(&report)?;
    store.update_meta(job_id, |meta| meta.outputs.damages = Some(damages_path))?;
    tracing::info!(job_id, findings = report.damages.len(), "damages recorded");

    assess_and_persist(store, engine, job_id, report.damages)
}

fn assess_and_persist(
    store: &JobStore,
    engine: &Engine,
    job_id: &str,
    observations: Vec<DamageObservation>,
) -> Result<JobRun, AppError> {
    let assessment = engine.assess(&observations)?;

    let cost_path = store.cost_path(job_id);
    write_json(
        &cost_path,
        &JobArtifact {
            job_id: job_id.to_string(),
            body: &assessment.cost,
        },
    )?;
    let risk_path = store.risk_path(job_id);
    write_json(
        &risk_path,
        &JobArtifact {
            job_id: job_id.to_string(),
            body: &assessment.risk,
        },
    )?;
    tracing::info!(
        job_id,
        total_cost = assessment.cost.total_cost,
        risk_score = assessment.risk.overall_risk_score,
        grade = assessment.risk.building_health_grade.as_str(),
        "assessment written"
    );

    let meta = store.load_meta(job_id)?;
    let report_path = store.write_report(job_id, &render_job_report(&meta, &observations, &assessment))?;

    let damages_path = store.damages_path(job_id);
    let meta = store.update_meta(job_id, |meta| {
        meta.status = JobStatus::Completed;
        meta.error = None;
        meta.outputs = JobOutputs {
            damages: Some(damages_path),
            cost_estimate: Some(cost_path),
            risk_summary: Some(risk_path),
            report: Some(report_path.clone()),
        };
        meta.overall_risk_score = Some(assessment.risk.overall_risk_score);
        meta.overall_severity_index = Some(assessment.risk.overall_severity_index);
        meta.building_health_grade = Some(assessment.risk.building_health_grade);
        meta.total_cost = Some(assessment.cost.total_cost);
    })?;

    Ok(JobRun {
        meta,
        observations,
        assessment,
        report_path,
    })
}

fn mark_failed(store: &JobStore, job_id: &str, err: &AppError) {
    if let Err(update_err) = store.update_status(job_id, JobStatus::Failed, Some(err.to_string())) {
        tracing::warn!(job_id, %update_err, "could not record job failure");
    }
}
