//! Job bookkeeping: metadata persisted next to the uploaded images, and the
//! `damages.json` record written after analysis.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DamageObservation, HealthGrade};

/// Pipeline revision stamped into job metadata.
pub const PIPELINE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Uploaded => "uploaded",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Paths of the artifacts a job has produced so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOutputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damages: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_estimate: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_summary: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMeta {
    pub job_id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub uploaded_files: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub pipeline_version: Option<String>,
    #[serde(default)]
    pub analyzer: Option<String>,
    #[serde(default)]
    pub outputs: JobOutputs,
    #[serde(default)]
    pub overall_risk_score: Option<f64>,
    #[serde(default)]
    pub overall_severity_index: Option<f64>,
    #[serde(default)]
    pub building_health_grade: Option<HealthGrade>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobMeta {
    pub fn new(job_id: impl Into<String>, label: Option<String>, uploaded_files: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            label,
            status: JobStatus::Uploaded,
            uploaded_files,
            created_at: now,
            updated_at: now,
            pipeline_version: None,
            analyzer: None,
            outputs: JobOutputs::default(),
            overall_risk_score: None,
            overall_severity_index: None,
            building_health_grade: None,
            total_cost: None,
            error: None,
        }
    }
}

/// The persisted analyzer result (`damages.json`).
#[derive(Debug, Clone, Serialize)]
pub struct DamageReport {
    pub job_id: String,
    pub generated_at: DateTime<Utc>,
    pub analyzer: String,
    /// Vision model name or replayed fixture file, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub damages: Vec<DamageObservation>,
}
