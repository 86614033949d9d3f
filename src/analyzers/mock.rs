//! Synthetic damage findings.
//!
//! Output is a pure function of the job id (or an explicit seed) and the image
//! names, so demos and tests see the same findings on every run.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use serde_json::Value;

use crate::analyzers::{Analysis, DamageAnalyzer};
use crate::domain::{DamageObservation, Severity};
use crate::engine::measure::round_to;
use crate::error::AppError;
use crate::io::store::JobImages;

struct Template {
    kind: &'static str,
    descriptions: &'static [&'static str],
    length_m: Option<(f64, f64)>,
    area_m2: Option<(f64, f64)>,
    /// Weights for low / medium / high.
    severity_weights: [f64; 3],
}

static TEMPLATES: [Template; 5] = [
    Template {
        kind: "crack",
        descriptions: &[
            "Hairline crack running vertically near window frame",
            "Diagonal settlement crack at corner junction",
            "Horizontal crack along mortar line",
            "Structural crack extending from foundation",
            "Surface crack in rendered finish",
        ],
        length_m: Some((0.3, 2.5)),
        area_m2: None,
        severity_weights: [0.4, 0.4, 0.2],
    },
    Template {
        kind: "spalling",
        descriptions: &[
            "Concrete spalling with exposed aggregate",
            "Delamination of render coat",
            "Brick face spalling due to freeze-thaw",
            "Spalled concrete around reinforcement",
        ],
        length_m: None,
        area_m2: Some((0.1, 1.5)),
        severity_weights: [0.2, 0.5, 0.3],
    },
    Template {
        kind: "water_damage",
        descriptions: &[
            "Water staining below window sill",
            "Efflorescence deposits on brickwork",
            "Moisture ingress pattern near parapet",
            "Damp patch indicating rising moisture",
        ],
        length_m: None,
        area_m2: Some((0.2, 2.0)),
        severity_weights: [0.3, 0.5, 0.2],
    },
    Template {
        kind: "discoloration",
        descriptions: &[
            "Algae growth on north-facing wall",
            "Weathering discoloration of paint",
            "Staining from metal corrosion runoff",
            "UV degradation of surface coating",
        ],
        length_m: None,
        area_m2: Some((0.5, 3.0)),
        severity_weights: [0.6, 0.3, 0.1],
    },
    Template {
        kind: "corrosion",
        descriptions: &[
            "Rust staining from embedded steel",
            "Corroded metal fixings",
            "Oxidation of metal cladding elements",
        ],
        length_m: None,
        area_m2: Some((0.05, 0.5)),
        severity_weights: [0.2, 0.4, 0.4],
    },
];

/// Probability of 0, 1, 2, 3 or 4 findings on one image.
const FINDINGS_PER_IMAGE: [f64; 5] = [0.1, 0.3, 0.3, 0.2, 0.1];

const SEVERITIES: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

#[derive(Debug, Clone, Default)]
pub struct MockAnalyzer {
    seed: Option<u64>,
}

impl MockAnalyzer {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    fn seed_for(&self, job_id: &str) -> u64 {
        if let Some(seed) = self.seed {
            return seed;
        }
        let mut hasher = DefaultHasher::new();
        job_id.hash(&mut hasher);
        hasher.finish()
    }
}

impl DamageAnalyzer for MockAnalyzer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn analyze(&self, job: &JobImages) -> Result<Analysis, AppError> {
        let mut rng = StdRng::seed_from_u64(self.seed_for(&job.job_id));
        let names = job.names();

        let mut observations = Vec::new();
        for name in &names {
            observations.extend(findings_for_image(name, &mut rng));
        }

        if observations.is_empty() {
            if let Some(first) = names.first() {
                let mut fallback = DamageObservation::new("crack", Severity::Low).with_length(0.5);
                fallback.description = Some("Minor surface crack detected".to_string());
                fallback.confidence = Some(Value::from(0.75));
                fallback.image = Some(first.clone());
                observations.push(fallback);
            }
        }

        tracing::info!(job_id = %job.job_id, findings = observations.len(), "mock analysis complete");
        Ok(Analysis {
            observations,
            source: None,
        })
    }
}

fn findings_for_image(image: &str, rng: &mut StdRng) -> Vec<DamageObservation> {
    let count = weighted_pick(&FINDINGS_PER_IMAGE, rng);
    let mut used: Vec<&'static str> = Vec::with_capacity(count);
    let mut out = Vec::with_capacity(count);

    for _ in 0..count {
        let available: Vec<&Template> = TEMPLATES.iter().filter(|t| !used.contains(&t.kind)).collect();
        let template = available[rng.gen_range(0..available.len())];
        used.push(template.kind);

        let severity = SEVERITIES[weighted_pick(&template.severity_weights, rng)];
        let mut obs = DamageObservation::new(template.kind, severity);
        obs.description = Some(template.descriptions[rng.gen_range(0..template.descriptions.len())].to_string());
        obs.confidence = Some(Value::from(round_to(rng.gen_range(0.7..=0.95), 2)));
        obs.image = Some(image.to_string());
        if let Some((lo, hi)) = template.length_m {
            obs = obs.with_length(round_to(rng.gen_range(lo..=hi), 2));
        }
        if let Some((lo, hi)) = template.area_m2 {
            obs = obs.with_area(round_to(rng.gen_range(lo..=hi), 2));
        }
        out.push(obs);
    }
    out
}

/// Index drawn proportionally to `weights`.
fn weighted_pick(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().sum();
    let roll: f64 = rng.r#gen::<f64>() * total;
    let mut acc = 0.0;
    for (idx, w) in weights.iter().enumerate() {
        acc += w;
        if roll < acc {
            return idx;
        }
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn job(id: &str, images: &[&str]) -> JobImages {
        JobImages {
            job_id: id.to_string(),
            images: images.iter().map(|n| PathBuf::from("/uploads").join(n)).collect(),
        }
    }

    #[test]
    fn deterministic_per_job() {
        let analyzer = MockAnalyzer::default();
        let images = ["north.jpg", "south.jpg", "east.jpg", "west.jpg"];
        let a = analyzer.analyze(&job("job-a", &images)).unwrap();
        let b = analyzer.analyze(&job("job-a", &images)).unwrap();
        assert_eq!(a.observations, b.observations);
    }

    #[test]
    fn findings_are_well_formed() {
        let analyzer = MockAnalyzer::new(Some(7));
        let names: Vec<String> = (0..30).map(|i| format!("img_{i:02}.jpg")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let analysis = analyzer.analyze(&job("job-b", &refs)).unwrap();

        assert!(!analysis.observations.is_empty());
        for obs in &analysis.observations {
            let kind = obs.kind.as_deref().unwrap();
            assert!(TEMPLATES.iter().any(|t| t.kind == kind));
            assert!(names.contains(obs.image.as_ref().unwrap()));
            let confidence = obs.confidence.as_ref().and_then(Value::as_f64).unwrap();
            assert!((0.7..=0.95).contains(&confidence));
            if kind == "crack" {
                assert!(obs.approx_length_m.is_some());
            } else {
                assert!(obs.approx_area_m2.is_some());
            }
        }

        for name in &names {
            let kinds: Vec<_> = analysis
                .observations
                .iter()
                .filter(|o| o.image.as_ref() == Some(name))
                .map(|o| o.kind.clone())
                .collect();
            let mut deduped = kinds.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(kinds.len(), deduped.len(), "duplicate type on {name}");
        }
    }

    #[test]
    fn no_images_means_no_findings() {
        let analysis = MockAnalyzer::default().analyze(&job("job-c", &[])).unwrap();
        assert!(analysis.observations.is_empty());
    }

    #[test]
    fn weighted_pick_respects_zero_weights() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(weighted_pick(&[0.0, 1.0, 0.0], &mut rng), 1);
        }
    }
}
