//! Per-job Markdown report: headline figures, cost and risk tables, findings.

use crate::domain::{DamageObservation, JobMeta};
use crate::engine::Assessment;
use crate::report::format::fmt_money;

pub fn render_job_report(meta: &JobMeta, observations: &[DamageObservation], assessment: &Assessment) -> String {
    let cost = &assessment.cost;
    let risk = &assessment.risk;
    let mut out = String::new();

    out.push_str("# Facade Risk Assessment\n\n");
    out.push_str(&format!("- Job: `{}`\n", meta.job_id));
    if let Some(label) = &meta.label {
        out.push_str(&format!("- Building: {label}\n"));
    }
    if let Some(analyzer) = &meta.analyzer {
        out.push_str(&format!("- Analyzer: {analyzer}\n"));
    }
    out.push_str(&format!("- Images: {}\n", meta.uploaded_files.len()));

    out.push_str("\n## Summary\n\n");
    out.push_str("| Metric | Value |\n| - | - |\n");
    out.push_str(&format!(
        "| Health grade | **{}** ({}) |\n",
        risk.building_health_grade,
        risk.building_health_grade.description()
    ));
    out.push_str(&format!("| Risk score | {:.1} / 100 |\n", risk.overall_risk_score));
    out.push_str(&format!("| Severity index | {:.2} / 10 |\n", risk.overall_severity_index));
    out.push_str(&format!("| Estimated cost | {} {} |\n", fmt_money(cost.total_cost), cost.currency));
    out.push_str(&format!("| Findings | {} |\n", risk.total_damage_count));

    out.push_str("\n## Cost estimate\n\n");
    if cost.items.is_empty() {
        out.push_str("No repair items.\n");
    } else {
        out.push_str("| Type | Unit | Count | Quantity | Cost |\n| - | - | - | - | - |\n");
        for item in &cost.items {
            out.push_str(&format!(
                "| {} | {} | {} | {:.2} | {} |\n",
                escape_cell(&item.kind),
                item.unit,
                item.count,
                item.total_quantity,
                fmt_money(item.cost)
            ));
        }
    }

    out.push_str("\n## Risk by type\n\n");
    if risk.by_type.is_empty() {
        out.push_str("No risk contributions.\n");
    } else {
        out.push_str("| Type | Count | Risk points |\n| - | - | - |\n");
        for (kind, entry) in &risk.by_type {
            out.push_str(&format!("| {} | {} | {:.2} |\n", escape_cell(kind), entry.count, entry.risk_points));
        }
    }

    out.push_str("\n## Findings\n\n");
    if observations.is_empty() {
        out.push_str("No damage detected.\n");
    }
    for (i, obs) in observations.iter().enumerate() {
        out.push_str(&format!(
            "{}. **{}** ({})",
            i + 1,
            obs.kind.as_deref().unwrap_or("unspecified"),
            obs.severity.as_str()
        ));
        if let Some(image) = &obs.image {
            out.push_str(&format!(" on `{image}`"));
        }
        if let Some(description) = &obs.description {
            out.push_str(&format!(": {description}"));
        }
        out.push('\n');
    }

    out
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use crate::engine::Engine;

    #[test]
    fn report_contains_headline_and_findings() {
        let mut crack = DamageObservation::new("crack", Severity::High).with_length(2.0);
        crack.image = Some("north.jpg".to_string());
        crack.description = Some("Diagonal settlement crack".to_string());
        let obs = vec![crack];
        let assessment = Engine::default().assess(&obs).unwrap();
        let meta = JobMeta::new("job-1", Some("Block 7".to_string()), vec!["north.jpg".to_string()]);

        let md = render_job_report(&meta, &obs, &assessment);
        assert!(md.contains("- Building: Block 7"));
        assert!(md.contains("| Estimated cost | 40.00 USD |"));
        assert!(md.contains("1. **crack** (high) on `north.jpg`: Diagonal settlement crack"));
    }

    #[test]
    fn empty_job_report_is_well_formed() {
        let meta = JobMeta::new("job-2", None, Vec::new());
        let md = render_job_report(&meta, &[], &Engine::default().assess(&[]).unwrap());
        assert!(md.contains("No repair items."));
        assert!(md.contains("No damage detected."));
    }
}
