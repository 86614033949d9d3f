//! Replays pre-recorded findings from fixture files.
//!
//! Lookup order: `<fixtures>/<job_id>.json`, then `<fixtures>/sample_damages.json`.

use std::path::{Path, PathBuf};

use crate::analyzers::{Analysis, DamageAnalyzer};
use crate::domain::DamageInput;
use crate::error::AppError;
use crate::io::store::{JobImages, read_json};

pub const DEFAULT_FIXTURE: &str = "sample_damages.json";

#[derive(Debug, Clone)]
pub struct ReplayAnalyzer {
    fixtures_dir: PathBuf,
}

impl ReplayAnalyzer {
    pub fn new(fixtures_dir: impl Into<PathBuf>) -> Self {
        Self {
            fixtures_dir: fixtures_dir.into(),
        }
    }

    fn find_fixture(&self, job_id: &str) -> Result<PathBuf, AppError> {
        let exact = self.fixtures_dir.join(format!("{job_id}.json"));
        if exact.is_file() {
            return Ok(exact);
        }
        let fallback = self.fixtures_dir.join(DEFAULT_FIXTURE);
        if fallback.is_file() {
            return Ok(fallback);
        }
        Err(AppError::analysis(format!(
            "No fixture found for job {job_id}. Create {} or {}.",
            fallback.display(),
            exact.display()
        )))
    }
}

impl DamageAnalyzer for ReplayAnalyzer {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn analyze(&self, job: &JobImages) -> Result<Analysis, AppError> {
        let fixture = self.find_fixture(&job.job_id)?;
        let input: DamageInput = read_json(&fixture)
            .map_err(|e| AppError::analysis(format!("Unusable fixture: {e}")))?;
        let mut observations = input.into_observations();

        // Attribute findings to uploaded images round-robin where the fixture is silent.
        let names = job.names();
        if !names.is_empty() {
            for (i, obs) in observations.iter_mut().enumerate() {
                if obs.image.is_none() {
                    obs.image = Some(names[i % names.len()].clone());
                }
            }
        }

        let source = fixture_name(&fixture);
        tracing::info!(
            job_id = %job.job_id,
            fixture = source.as_deref().unwrap_or("?"),
            findings = observations.len(),
            "replayed fixture"
        );
        Ok(Analysis { observations, source })
    }
}

fn fixture_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn job(id: &str) -> JobImages {
        JobImages {
            job_id: id.to_string(),
            images: vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")],
        }
    }

    #[test]
    fn prefers_exact_fixture_then_default() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("job-1.json"), r#"[{"type": "crack"}]"#).unwrap();
        fs::write(
            tmp.path().join(DEFAULT_FIXTURE),
            r#"{"damages": [{"type": "spalling"}, {"type": "foo", "image": "x.png"}, {"type": "moisture"}]}"#,
        )
        .unwrap();
        let analyzer = ReplayAnalyzer::new(tmp.path());

        let exact = analyzer.analyze(&job("job-1")).unwrap();
        assert_eq!(exact.observations.len(), 1);
        assert_eq!(exact.source.as_deref(), Some("job-1.json"));

        let fallback = analyzer.analyze(&job("job-2")).unwrap();
        let images: Vec<_> = fallback.observations.iter().map(|o| o.image.clone().unwrap()).collect();
        assert_eq!(images, ["a.jpg", "x.png", "a.jpg"]);
        assert_eq!(fallback.source.as_deref(), Some(DEFAULT_FIXTURE));
    }

    #[test]
    fn missing_fixture_is_an_analysis_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ReplayAnalyzer::new(tmp.path()).analyze(&job("job-1")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Analysis);
    }

    #[test]
    fn invalid_fixture_json_is_an_analysis_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(DEFAULT_FIXTURE), "{not json").unwrap();
        let err = ReplayAnalyzer::new(tmp.path()).analyze(&job("job-1")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Analysis);
    }
}
