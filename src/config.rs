//! Runtime settings from the environment (and `.env`).
//!
//! CLI flags override these after loading; see `app::run`.

use std::path::PathBuf;

use crate::analyzers::AnalyzerKind;
use crate::analyzers::vision::DEFAULT_VISION_MODEL;
use crate::engine::{DEFAULT_CURRENCY, Engine, ScoringTables};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub analyzer: AnalyzerKind,
    pub openai_api_key: Option<String>,
    pub vision_model: String,
    /// Replay fixtures; defaults to `<data_dir>/fixtures/damages`.
    pub fixtures_dir: Option<PathBuf>,
    pub tables_path: Option<PathBuf>,
    pub currency: String,
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            analyzer: AnalyzerKind::Mock,
            openai_api_key: None,
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            fixtures_dir: None,
            tables_path: None,
            currency: DEFAULT_CURRENCY.to_string(),
            log_filter: "warn".to_string(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let analyzer = match get("DAMAGE_ANALYZER") {
            Some(raw) => AnalyzerKind::parse(&raw)?,
            None => defaults.analyzer,
        };

        Ok(Self {
            data_dir: get("FRA_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            analyzer,
            openai_api_key: get("OPENAI_API_KEY"),
            vision_model: get("OPENAI_VISION_MODEL").unwrap_or(defaults.vision_model),
            fixtures_dir: get("FRA_FIXTURES_DIR").map(PathBuf::from),
            tables_path: get("FRA_TABLES").map(PathBuf::from),
            currency: get("FRA_CURRENCY").unwrap_or(defaults.currency),
            log_filter: get("FRA_LOG").unwrap_or(defaults.log_filter),
            log_json: get("FRA_LOG_JSON").is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes")),
        })
    }

    pub fn fixtures_dir(&self) -> PathBuf {
        self.fixtures_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("fixtures").join("damages"))
    }

    pub fn tables(&self) -> Result<ScoringTables, AppError> {
        match &self.tables_path {
            Some(path) => ScoringTables::load(path),
            None => Ok(ScoringTables::default()),
        }
    }

    pub fn engine(&self) -> Result<Engine, AppError> {
        Ok(Engine::new(self.tables()?, self.currency.clone()))
    }
}
