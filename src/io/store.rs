//! File-based job store.
//!
//! Layout under the data directory:
//! - `uploads/<job_id>/`: copied images and `job_meta.json`
//! - `reconstructions/<job_id>/`: `damages.json`, `cost_estimate.json`, `risk_summary.json`
//! - `reports/<job_id>.md`
//!
//! Every JSON write goes through a temp file and a rename, so a job's artifacts
//! are replaced whole on recompute.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{DamageInput, DamageObservation, DamageReport, JobMeta, JobStatus};
use crate::error::AppError;

pub const META_FILENAME: &str = "job_meta.json";
pub const DAMAGES_FILENAME: &str = "damages.json";
pub const COST_FILENAME: &str = "cost_estimate.json";
pub const RISK_FILENAME: &str = "risk_summary.json";

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Image files of one job, sorted by name.
#[derive(Debug, Clone)]
pub struct JobImages {
    pub job_id: String,
    pub images: Vec<PathBuf>,
}

impl JobImages {
    pub fn names(&self) -> Vec<String> {
        self.images.iter().filter_map(|p| file_name(p)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct JobStore {
    data_dir: PathBuf,
}

impl JobStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn reconstructions_dir(&self) -> PathBuf {
        self.data_dir.join("reconstructions")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        for dir in [self.uploads_dir(), self.reconstructions_dir(), self.reports_dir()] {
            create_dir(&dir)?;
        }
        Ok(())
    }

    pub fn job_upload_dir(&self, job_id: &str) -> PathBuf {
        self.uploads_dir().join(job_id)
    }

    pub fn job_output_dir(&self, job_id: &str) -> PathBuf {
        self.reconstructions_dir().join(job_id)
    }

    pub fn meta_path(&self, job_id: &str) -> PathBuf {
        self.job_upload_dir(job_id).join(META_FILENAME)
    }

    pub fn damages_path(&self, job_id: &str) -> PathBuf {
        self.job_output_dir(job_id).join(DAMAGES_FILENAME)
    }

    pub fn cost_path(&self, job_id: &str) -> PathBuf {
        self.job_output_dir(job_id).join(COST_FILENAME)
    }

    pub fn risk_path(&self, job_id: &str) -> PathBuf {
        self.job_output_dir(job_id).join(RISK_FILENAME)
    }

    pub fn report_path(&self, job_id: &str) -> PathBuf {
        self.reports_dir().join(format!("{job_id}.md"))
    }

    pub fn job_exists(&self, job_id: &str) -> bool {
        validate_job_id(job_id).is_ok() && self.job_upload_dir(job_id).is_dir()
    }

    /// Create a job by copying every image found in `image_dir`.
    pub fn create_job(&self, image_dir: &Path, label: Option<String>) -> Result<JobMeta, AppError> {
        if !image_dir.is_dir() {
            return Err(AppError::precondition(format!(
                "Image directory not found: {}",
                image_dir.display()
            )));
        }
        let images = list_images(image_dir)?;
        if images.is_empty() {
            return Err(AppError::precondition(format!(
                "No images found in {} (expected {}).",
                image_dir.display(),
                IMAGE_EXTENSIONS.join("/")
            )));
        }

        self.ensure_dirs()?;
        let job_id = new_job_id();
        let job_dir = self.job_upload_dir(&job_id);
        create_dir(&job_dir)?;

        let mut saved = Vec::with_capacity(images.len());
        for image in &images {
            let Some(name) = file_name(image) else { continue };
            fs::copy(image, job_dir.join(&name))
                .map_err(|e| AppError::io(format!("Failed to copy '{}': {e}", image.display())))?;
            saved.push(name);
        }

        let meta = JobMeta::new(job_id, label, saved);
        self.save_meta(&meta)?;
        tracing::info!(job_id = %meta.job_id, files = meta.uploaded_files.len(), "job created");
        Ok(meta)
    }

    pub fn load_meta(&self, job_id: &str) -> Result<JobMeta, AppError> {
        validate_job_id(job_id)?;
        let path = self.meta_path(job_id);
        if !path.is_file() {
            return Err(AppError::precondition(format!("Job not found: {job_id}")));
        }
        read_json(&path)
    }

    pub fn save_meta(&self, meta: &JobMeta) -> Result<(), AppError> {
        validate_job_id(&meta.job_id)?;
        write_json(&self.meta_path(&meta.job_id), meta)
    }

    /// Load, modify and save metadata, bumping `updated_at`.
    pub fn update_meta(&self, job_id: &str, update: impl FnOnce(&mut JobMeta)) -> Result<JobMeta, AppError> {
        let mut meta = self.load_meta(job_id)?;
        update(&mut meta);
        meta.updated_at = Utc::now();
        self.save_meta(&meta)?;
        Ok(meta)
    }

    /// Set the status; any previous error is replaced by `error`.
    pub fn update_status(&self, job_id: &str, status: JobStatus, error: Option<String>) -> Result<JobMeta, AppError> {
        self.update_meta(job_id, |meta| {
            meta.status = status;
            meta.error = error;
        })
    }

    /// All jobs with readable metadata, newest first.
    pub fn list_jobs(&self) -> Result<Vec<JobMeta>, AppError> {
        let dir = self.uploads_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir)
            .map_err(|e| AppError::io(format!("Failed to read '{}': {e}", dir.display())))?;

        let mut jobs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path().join(META_FILENAME);
            if !path.is_file() {
                continue;
            }
            match read_json::<JobMeta>(&path) {
                Ok(meta) => jobs.push(meta),
                Err(err) => tracing::warn!(path = %path.display(), %err, "skipping unreadable job metadata"),
            }
        }
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.job_id.cmp(&b.job_id)));
        Ok(jobs)
    }

    /// Images uploaded for a job, by extension. Contents are checked by
    /// `io::images::validate_job_images`.
    pub fn job_images(&self, job_id: &str) -> Result<JobImages, AppError> {
        validate_job_id(job_id)?;
        let dir = self.job_upload_dir(job_id);
        if !dir.is_dir() {
            return Err(AppError::precondition(format!("No uploads for job {job_id}")));
        }
        Ok(JobImages {
            job_id: job_id.to_string(),
            images: list_images(&dir)?,
        })
    }

    pub fn rename_job(&self, job_id: &str, label: &str) -> Result<JobMeta, AppError> {
        self.require_job(job_id)?;
        let label = label.trim();
        let label = (!label.is_empty()).then(|| label.to_string());
        self.update_meta(job_id, |meta| meta.label = label)
    }

    /// Remove a job's uploads, outputs and report.
    pub fn delete_job(&self, job_id: &str) -> Result<(), AppError> {
        self.require_job(job_id)?;
        remove_dir(&self.job_upload_dir(job_id))?;
        remove_dir(&self.job_output_dir(job_id))?;
        let report = self.report_path(job_id);
        if report.is_file() {
            fs::remove_file(&report)
                .map_err(|e| AppError::io(format!("Failed to remove '{}': {e}", report.display())))?;
        }
        tracing::info!(job_id, "job deleted");
        Ok(())
    }

    /// Delete every job under the uploads directory; returns how many were removed.
    pub fn delete_all_jobs(&self) -> Result<usize, AppError> {
        let dir = self.uploads_dir();
        if !dir.is_dir() {
            return Ok(0);
        }
        let entries = fs::read_dir(&dir)
            .map_err(|e| AppError::io(format!("Failed to read '{}': {e}", dir.display())))?;
        let ids: Vec<String> = entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|id| self.job_exists(id))
            .collect();

        for id in &ids {
            self.delete_job(id)?;
        }
        tracing::info!(count = ids.len(), "all jobs deleted");
        Ok(ids.len())
    }

    fn require_job(&self, job_id: &str) -> Result<(), AppError> {
        validate_job_id(job_id)?;
        if self.job_exists(job_id) {
            Ok(())
        } else {
            Err(AppError::precondition(format!("Job not found: {job_id}")))
        }
    }

    pub fn write_damages(&self, report: &DamageReport) -> Result<PathBuf, AppError> {
        let path = self.damages_path(&report.job_id);
        write_json(&path, report)?;
        Ok(path)
    }

    /// Observations recorded for a job; a missing file is a precondition failure.
    pub fn load_damages(&self, job_id: &str) -> Result<Vec<DamageObservation>, AppError> {
        validate_job_id(job_id)?;
        let path = self.damages_path(job_id);
        if !path.is_file() {
            return Err(AppError::precondition(format!("Damage summary missing for job {job_id}")));
        }
        let input: DamageInput = read_json(&path)?;
        Ok(input.into_observations())
    }

    pub fn write_report(&self, job_id: &str, markdown: &str) -> Result<PathBuf, AppError> {
        let path = self.report_path(job_id);
        write_atomic(&path, markdown.as_bytes())?;
        Ok(path)
    }
}

/// Serialize to pretty JSON and replace `path` atomically.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::io(format!("Failed to serialize '{}': {e}", path.display())))?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open '{}': {e}", path.display())))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::io(format!("Invalid JSON in '{}': {e}", path.display())))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(|e| AppError::io(format!("Failed to write '{}': {e}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|e| AppError::io(format!("Failed to replace '{}': {e}", path.display())))
}

fn create_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| AppError::io(format!("Failed to create '{}': {e}", dir.display())))
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let entries = fs::read_dir(dir).map_err(|e| AppError::io(format!("Failed to read '{}': {e}", dir.display())))?;
    let mut images: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            let ext = p
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .collect();
    images.sort();
    Ok(images)
}

fn remove_dir(dir: &Path) -> Result<(), AppError> {
    if !dir.is_dir() {
        return Ok(());
    }
    fs::remove_dir_all(dir).map_err(|e| AppError::io(format!("Failed to remove '{}': {e}", dir.display())))
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

/// Job ids are used as path components; reject anything that could escape the data dir.
fn validate_job_id(job_id: &str) -> Result<(), AppError> {
    let ok = !job_id.is_empty()
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
    if ok {
        Ok(())
    } else {
        Err(AppError::usage(format!("Invalid job id: {job_id:?}")))
    }
}

/// `<UTC timestamp>-<8 hex>`; sorts chronologically.
fn new_job_id() -> String {
    format!("{}-{:08x}", Utc::now().format("%Y%m%dT%H%M%SZ"), rand::random::<u32>())
}
