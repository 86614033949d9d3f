//! Damage analyzers: anything that turns a job's images into observations.
//!
//! - `mock`: deterministic synthetic findings (default)
//! - `vision`: OpenAI vision model, one request per image
//! - `replay`: pre-recorded fixture files

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::domain::DamageObservation;
use crate::error::AppError;
use crate::io::store::JobImages;

pub mod mock;
pub mod replay;
pub mod vision;

pub use mock::MockAnalyzer;
pub use replay::ReplayAnalyzer;
pub use vision::VisionAnalyzer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    Mock,
    /// Also accepted as `openai`.
    #[value(alias = "openai")]
    Vision,
    Replay,
}

impl AnalyzerKind {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(AnalyzerKind::Mock),
            "vision" | "openai" => Ok(AnalyzerKind::Vision),
            "replay" => Ok(AnalyzerKind::Replay),
            other => Err(AppError::usage(format!(
                "Unknown analyzer mode: {other}. Valid options: mock, vision, replay."
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalyzerKind::Mock => "mock",
            AnalyzerKind::Vision => "vision",
            AnalyzerKind::Replay => "replay",
        }
    }
}

/// Observations for one job plus where they came from.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub observations: Vec<DamageObservation>,
    /// Model name or fixture file, when the analyzer has one.
    pub source: Option<String>,
}

pub trait DamageAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze(&self, job: &JobImages) -> Result<Analysis, AppError>;
}

/// Pick the analyzer for `kind`.
///
/// `vision` without an API key degrades to `mock` with a warning rather than
/// failing the job.
pub fn build_analyzer(kind: AnalyzerKind, settings: &Settings) -> Result<Box<dyn DamageAnalyzer>, AppError> {
    tracing::info!(mode = kind.as_str(), "selecting damage analyzer");
    match kind {
        AnalyzerKind::Mock => Ok(Box::new(MockAnalyzer::new(None))),
        AnalyzerKind::Replay => Ok(Box::new(ReplayAnalyzer::new(settings.fixtures_dir()))),
        AnalyzerKind::Vision => match &settings.openai_api_key {
            Some(key) => Ok(Box::new(VisionAnalyzer::new(key.clone(), settings.vision_model.clone())?)),
            None => {
                tracing::warn!("vision analyzer requested but OPENAI_API_KEY is not set; falling back to mock");
                Ok(Box::new(MockAnalyzer::new(None)))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modes_and_alias() {
        assert_eq!(AnalyzerKind::parse("MOCK").unwrap(), AnalyzerKind::Mock);
        assert_eq!(AnalyzerKind::parse("openai").unwrap(), AnalyzerKind::Vision);
        assert!(AnalyzerKind::parse("lidar").is_err());
    }

    #[test]
    fn vision_without_key_falls_back_to_mock() {
        let settings = Settings {
            analyzer: AnalyzerKind::Vision,
            openai_api_key: None,
            ..Settings::default()
        };
        let analyzer = build_analyzer(AnalyzerKind::Vision, &settings).unwrap();
        assert_eq!(analyzer.name(), "mock");
    }
}
