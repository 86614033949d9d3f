//! Formatted terminal output.
//!
//! We keep formatting code in one place so the core stays free of
//! presentation concerns and output changes are localized.

use std::path::Path;

use crate::analyzers::AnalyzerKind;
use crate::domain::{JobMeta, JobStatus, PIPELINE_VERSION};
use crate::engine::Assessment;
use crate::io::images::ImageCheck;

/// Headline numbers plus the cost and risk tables for one assessment.
pub fn format_assessment(assessment: &Assessment) -> String {
    let cost = &assessment.cost;
    let risk = &assessment.risk;
    let mut out = String::new();

    out.push_str(&format!(
        "Health Grade:      {} ({})\n",
        risk.building_health_grade,
        risk.building_health_grade.description()
    ));
    out.push_str(&format!("Risk Score:        {:.1}/100\n", risk.overall_risk_score));
    out.push_str(&format!("Severity Index:    {:.2}/10\n", risk.overall_severity_index));
    out.push_str(&format!(
        "Total Cost:        {} {}\n",
        fmt_money(cost.total_cost),
        cost.currency
    ));
    out.push_str(&format!("Damages Found:     {}\n", risk.total_damage_count));

    if !cost.items.is_empty() {
        out.push_str("\nCost estimate:\n");
        out.push_str(&format!(
            "{:<20} {:>6} {:>6} {:>10} {:>12}\n",
            "type", "unit", "count", "quantity", "cost"
        ));
        for item in &cost.items {
            out.push_str(&format!(
                "{:<20} {:>6} {:>6} {:>10.2} {:>12}\n",
                truncate(&item.kind, 20),
                item.unit,
                item.count,
                item.total_quantity,
                fmt_money(item.cost)
            ));
        }
    }

    if !risk.by_type.is_empty() {
        out.push_str("\nRisk by type:\n");
        out.push_str(&format!("{:<20} {:>6} {:>12}\n", "type", "count", "risk_points"));
        for (kind, entry) in &risk.by_type {
            out.push_str(&format!(
                "{:<20} {:>6} {:>12.2}\n",
                truncate(kind, 20),
                entry.count,
                entry.risk_points
            ));
        }
    }

    out
}

/// Summary printed at the end of `run-job` / `rescore`.
pub fn format_run_summary(meta: &JobMeta, assessment: &Assessment, report_path: Option<&Path>) -> String {
    let mut out = String::new();
    out.push_str("=== fra - Facade Risk Assessment ===\n");
    out.push_str(&format!("Job ID:            {}\n", meta.job_id));
    out.push_str(&format!("Label:             {}\n", meta.label.as_deref().unwrap_or("(none)")));
    out.push_str(&format!("Status:            {}\n", meta.status.as_str()));
    if let Some(analyzer) = &meta.analyzer {
        out.push_str(&format!("Analyzer:          {analyzer}\n"));
    }
    out.push_str(&format_assessment(assessment));
    if let Some(path) = report_path {
        out.push_str(&format!("\nReport: {}\n", path.display()));
    }
    out
}

pub fn format_job_table(jobs: &[JobMeta]) -> String {
    if jobs.is_empty() {
        return "No jobs found.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("Found {} job(s):\n\n", jobs.len()));
    out.push_str(&format!(
        "{:<28} {:<12} {:<6} {:<8} {}\n",
        "Job ID", "Status", "Grade", "Score", "Label"
    ));
    out.push_str(&format!("{}\n", "-".repeat(80)));
    for job in jobs {
        out.push_str(&format!(
            "{:<28} {:<12} {:<6} {:<8} {}\n",
            job.job_id,
            job.status.as_str(),
            job.building_health_grade.map(|g| g.as_str()).unwrap_or("-"),
            job.overall_risk_score.map(|s| format!("{s:.1}")).unwrap_or_else(|| "-".to_string()),
            job.label.as_deref().unwrap_or("(unnamed)")
        ));
    }
    out
}

pub fn format_job_status(meta: &JobMeta) -> String {
    let mut out = String::new();
    out.push_str(&format!("Job: {}\n", meta.job_id));
    out.push_str(&format!("{}\n", "-".repeat(60)));
    out.push_str(&format!("Label:              {}\n", meta.label.as_deref().unwrap_or("(none)")));
    out.push_str(&format!("Status:             {}\n", meta.status.as_str()));
    out.push_str(&format!("Created:            {}\n", meta.created_at.to_rfc3339()));
    out.push_str(&format!("Updated:            {}\n", meta.updated_at.to_rfc3339()));
    out.push_str(&format!(
        "Pipeline Version:   {}\n",
        meta.pipeline_version.as_deref().unwrap_or("unknown")
    ));
    out.push_str(&format!("Files:              {}\n", meta.uploaded_files.len()));

    if let Some(grade) = meta.building_health_grade {
        out.push_str("\n--- Analysis Results ---\n");
        out.push_str(&format!("Health Grade:       {grade}\n"));
        if let Some(score) = meta.overall_risk_score {
            out.push_str(&format!("Risk Score:         {score:.1}/100\n"));
        }
        if let Some(index) = meta.overall_severity_index {
            out.push_str(&format!("Severity Index:     {index:.2}/10\n"));
        }
        if let Some(total) = meta.total_cost {
            out.push_str(&format!("Total Cost:         {}\n", fmt_money(total)));
        }
    }

    if let Some(error) = &meta.error {
        out.push_str("\n--- Error ---\n");
        out.push_str(&format!("{error}\n"));
    }

    let outputs = [
        ("damages", &meta.outputs.damages),
        ("cost_estimate", &meta.outputs.cost_estimate),
        ("risk_summary", &meta.outputs.risk_summary),
        ("report", &meta.outputs.report),
    ];
    if outputs.iter().any(|(_, p)| p.is_some()) {
        out.push_str("\n--- Output Files ---\n");
        for (key, path) in outputs {
            if let Some(path) = path {
                out.push_str(&format!("{key}: {}\n", path.display()));
            }
        }
    }
    out
}

pub fn format_stats(jobs: &[JobMeta], analyzer: AnalyzerKind, data_dir: &Path) -> String {
    let count = |status: JobStatus| jobs.iter().filter(|j| j.status == status).count();
    let mut out = String::new();
    out.push_str("Facade Risk Analyzer Statistics\n");
    out.push_str(&format!("{}\n", "-".repeat(40)));
    out.push_str(&format!("Pipeline Version:   {PIPELINE_VERSION}\n"));
    out.push_str(&format!("Analyzer Mode:      {}\n", analyzer.as_str()));
    out.push_str(&format!("Data Directory:     {}\n", data_dir.display()));
    out.push_str("\nJob Statistics:\n");
    out.push_str(&format!("  Total:            {}\n", jobs.len()));
    out.push_str(&format!("  Completed:        {}\n", count(JobStatus::Completed)));
    out.push_str(&format!("  Failed:           {}\n", count(JobStatus::Failed)));
    out.push_str(&format!("  Processing:       {}\n", count(JobStatus::Processing)));
    out.push_str(&format!("  Uploaded:         {}\n", count(JobStatus::Uploaded)));
    out
}

/// One line per uploaded file, as printed by `validate`.
pub fn format_image_checks(job_id: &str, checks: &[ImageCheck]) -> String {
    let mut out = format!("Image validation for job {job_id}:\n");
    for check in checks {
        match (&check.error, check.format) {
            (Some(error), _) => out.push_str(&format!("  [error] {:<30} {error}\n", check.filename)),
            (None, Some(format)) => out.push_str(&format!("  [ok]    {:<30} {}\n", check.filename, format.as_str())),
            (None, None) => out.push_str(&format!("  [ok]    {}\n", check.filename)),
        }
    }
    out
}

/// `1234.5` -> `1,234.50`.
pub fn fmt_money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DamageObservation, Severity};
    use crate::engine::Engine;

    #[test]
    fn money_grouping() {
        assert_eq!(fmt_money(0.0), "0.00");
        assert_eq!(fmt_money(59.5), "59.50");
        assert_eq!(fmt_money(1234.5), "1,234.50");
        assert_eq!(fmt_money(1_234_567.891), "1,234,567.89");
        assert_eq!(fmt_money(-1000.0), "-1,000.00");
    }

    #[test]
    fn assessment_lists_both_tables() {
        let obs = vec![
            DamageObservation::new("crack", Severity::Medium).with_length(1.5),
            DamageObservation::new("foo", Severity::Low),
        ];
        let assessment = Engine::default().assess(&obs).unwrap();
        let text = format_assessment(&assessment);
        assert!(text.contains("Health Grade:      A"));
        assert!(text.contains("Total Cost:        40.00 USD"));
        assert!(text.contains("foo"));
        assert!(text.contains("unknown"));
    }

    #[test]
    fn job_table_handles_empty_and_pending_jobs() {
        assert_eq!(format_job_table(&[]), "No jobs found.\n");
        let meta = JobMeta::new("job-1", None, vec!["a.jpg".to_string()]);
        let table = format_job_table(&[meta]);
        assert!(table.contains("job-1"));
        assert!(table.contains("(unnamed)"));
    }

    #[test]
    fn stats_count_statuses_and_show_data_dir() {
        let mut done = JobMeta::new("job-1", None, Vec::new());
        done.status = JobStatus::Completed;
        let pending = JobMeta::new("job-2", None, Vec::new());
        let text = format_stats(&[done, pending], AnalyzerKind::Replay, Path::new("/srv/fra"));
        assert!(text.contains("Analyzer Mode:      replay"));
        assert!(text.contains("Data Directory:     /srv/fra"));
        assert!(text.contains("  Completed:        1"));
        assert!(text.contains("  Uploaded:         1"));
    }

    #[test]
    fn image_checks_mark_failures() {
        use crate::io::images::ImageFormat;

        let checks = [
            ImageCheck {
                filename: "a.jpg".to_string(),
                format: Some(ImageFormat::Jpeg),
                error: None,
            },
            ImageCheck {
                filename: "b.png".to_string(),
                format: None,
                error: Some("File is empty.".to_string()),
            },
        ];
        let text = format_image_checks("job-1", &checks);
        assert!(text.contains("[ok]    a.jpg"));
        assert!(text.contains("jpeg"));
        assert!(text.contains("[error] b.png"));
        assert!(text.contains("File is empty."));
    }
}
