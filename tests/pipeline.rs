use std::fs;
use std::path::Path;

use facade_risk::analyzers::{MockAnalyzer, ReplayAnalyzer};
use facade_risk::app::pipeline::{assess_file, load_artifacts, rescore_job, run_job};
use facade_risk::domain::{HealthGrade, JobStatus};
use facade_risk::engine::Engine;
use facade_risk::error::ErrorKind;
use facade_risk::io::store::JobStore;
use serde_json::Value;

const SCENARIO: &str = r#"{"damages": [
    {"type": "crack", "severity": "medium", "approx_length_m": 1.5},
    {"type": "spalling", "severity": "high", "approx_area_m2": 0.5},
    {"type": "water_damage", "severity": "low", "approx_area_m2": 0.3}
]}"#;

const JPEG: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

fn write_images(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("north.jpg"), JPEG).unwrap();
    fs::write(dir.join("south.png"), PNG).unwrap();
    fs::write(dir.join("notes.txt"), b"ignored").unwrap();
}

fn read_value(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn replay_job_writes_every_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("photos");
    write_images(&images);
    let fixtures = tmp.path().join("fixtures");
    fs::create_dir_all(&fixtures).unwrap();
    fs::write(fixtures.join("sample_damages.json"), SCENARIO).unwrap();

    let store = JobStore::new(tmp.path().join("data"));
    let meta = store.create_job(&images, Some("Block 7".to_string())).unwrap();
    assert_eq!(meta.uploaded_files, ["north.jpg", "south.png"]);

    let run = run_job(&store, &Engine::default(), &ReplayAnalyzer::new(&fixtures), &meta.job_id).unwrap();
    assert_eq!(run.meta.status, JobStatus::Completed);
    assert_eq!(run.meta.total_cost, Some(59.5));
    assert_eq!(run.meta.overall_risk_score, Some(15.8));
    assert_eq!(run.meta.building_health_grade, Some(HealthGrade::A));
    assert_eq!(run.observations[1].image.as_deref(), Some("south.png"));

    let cost = read_value(&store.cost_path(&meta.job_id));
    assert_eq!(cost["job_id"], meta.job_id.as_str());
    assert_eq!(cost["currency"], "USD");
    assert_eq!(cost["total_cost"], 59.5);
    assert_eq!(cost["items"][0]["type"], "crack");
    assert_eq!(cost["items"][0]["unit"], "meter");

    let risk = read_value(&store.risk_path(&meta.job_id));
    assert_eq!(risk["overall_severity_index"], 1.58);
    assert_eq!(risk["overall_risk_score"], 15.8);
    assert_eq!(risk["building_health_grade"], "A");
    assert_eq!(risk["by_type"]["spalling"]["risk_points"], 2.8);
    assert_eq!(risk["total_damage_count"], 3);

    let damages = read_value(&store.damages_path(&meta.job_id));
    assert_eq!(damages["analyzer"], "replay");
    assert_eq!(damages["source"], "sample_damages.json");

    let report = fs::read_to_string(&run.report_path).unwrap();
    assert!(report.contains("- Building: Block 7"));

    let (cost, risk) = load_artifacts(&store, &meta.job_id).unwrap();
    assert_eq!(cost.body.total_cost, 59.5);
    assert_eq!(risk.body.building_health_grade, HealthGrade::A);
}

#[test]
fn mock_job_is_deterministic_per_job() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("photos");
    write_images(&images);
    let store = JobStore::new(tmp.path().join("data"));
    let meta = store.create_job(&images, None).unwrap();
    let engine = Engine::default();

    let first = run_job(&store, &engine, &MockAnalyzer::new(None), &meta.job_id).unwrap();
    let second = run_job(&store, &engine, &MockAnalyzer::new(None), &meta.job_id).unwrap();
    assert!(!first.observations.is_empty());
    assert_eq!(first.assessment, second.assessment);
    assert_eq!(second.meta.analyzer.as_deref(), Some("mock"));
}

#[test]
fn rescore_picks_up_edited_damages() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("photos");
    write_images(&images);
    let fixtures = tmp.path().join("fixtures");
    fs::create_dir_all(&fixtures).unwrap();
    fs::write(fixtures.join("sample_damages.json"), SCENARIO).unwrap();

    let store = JobStore::new(tmp.path().join("data"));
    let meta = store.create_job(&images, None).unwrap();
    let engine = Engine::default();
    run_job(&store, &engine, &ReplayAnalyzer::new(&fixtures), &meta.job_id).unwrap();

    fs::write(
        store.damages_path(&meta.job_id),
        r#"{"damages": [{"type": "corrosion", "severity": "high", "approx_area_m2": 20}]}"#,
    )
    .unwrap();
    let run = rescore_job(&store, &engine, &meta.job_id).unwrap();
    // 4.5 * 1.4 * 20 = 126 points -> index 25.2, capped at 10.
    assert_eq!(run.assessment.risk.overall_severity_index, 10.0);
    assert_eq!(run.assessment.risk.overall_risk_score, 100.0);
    assert_eq!(run.meta.building_health_grade, Some(HealthGrade::D));
    assert_eq!(run.assessment.cost.total_cost, 200.0);
}

#[test]
fn failing_analyzer_marks_the_job_failed() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("photos");
    write_images(&images);
    let store = JobStore::new(tmp.path().join("data"));
    let meta = store.create_job(&images, None).unwrap();

    let missing = tmp.path().join("no-fixtures");
    let err = run_job(&store, &Engine::default(), &ReplayAnalyzer::new(missing), &meta.job_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Analysis);

    let meta = store.load_meta(&meta.job_id).unwrap();
    assert_eq!(meta.status, JobStatus::Failed);
    assert!(meta.error.unwrap().contains("No fixture found"));
}

#[test]
fn rescore_without_damages_is_a_precondition_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let store = JobStore::new(tmp.path());
    let err = rescore_job(&store, &Engine::default(), "20260101T000000Z-deadbeef").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test]
fn assess_file_accepts_bare_lists() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("damages.json");
    fs::write(&path, r#"[{"type": "foo"}]"#).unwrap();

    let (observations, assessment) = assess_file(&Engine::default(), &path).unwrap();
    assert_eq!(observations.len(), 1);
    assert_eq!(assessment.cost.items[0].kind, "foo");
    assert_eq!(assessment.cost.total_cost, 10.0);
    assert_eq!(assessment.risk.by_type["unknown"].risk_points, 2.0);
}

#[test]
fn disguised_image_is_rejected_before_analysis() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("photos");
    fs::create_dir_all(&images).unwrap();
    fs::write(images.join("facade.jpg"), b"\xff\xd8fake").unwrap();
    let store = JobStore::new(tmp.path().join("data"));
    let meta = store.create_job(&images, None).unwrap();

    let err = run_job(&store, &Engine::default(), &MockAnalyzer::new(None), &meta.job_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(err.message().contains("facade.jpg"));

    let meta = store.load_meta(&meta.job_id).unwrap();
    assert_eq!(meta.status, JobStatus::Uploaded);
    assert!(!store.damages_path(&meta.job_id).exists());
}
