//! OpenAI vision-model analyzer.
//!
//! Each image is sent as a base64 data URL with an inspection prompt; the model
//! answers with a JSON object holding a `damages` array. A failed image is
//! logged and skipped so one bad upload does not sink the whole job.

use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::analyzers::{Analysis, DamageAnalyzer};
use crate::domain::{DamageInput, DamageObservation};
use crate::error::AppError;
use crate::io::images::ImageFormat;
use crate::io::store::JobImages;

const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

const PROMPT: &str = r#"You are an expert facade inspector. Analyze the provided building exterior photo and identify all visible damage including:
- Cracks (hairline, structural, settlement)
- Spalling or concrete delamination
- Water damage, moisture stains, or efflorescence
- Discoloration, staining, or missing plaster
- Corrosion or rust staining
- Any other significant facade defects

For each damage found, estimate:
- Approximate length in meters (for linear damage like cracks)
- Approximate affected area in square meters (for surface damage)
- Severity: "low" (cosmetic), "medium" (requires attention), or "high" (urgent repair needed)
- Confidence score from 0.0 to 1.0

Respond with a JSON object containing a "damages" array. Each damage entry must have:
- "type": string (e.g., "crack", "spalling", "water_damage", "discoloration", "corrosion")
- "severity": "low" | "medium" | "high"
- "description": brief description of the damage and location
- "approx_length_m": number (optional, for linear damage)
- "approx_area_m2": number (optional, for surface damage)
- "confidence": number between 0 and 1

If no damage is visible, return {"damages": []}."#;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

pub struct VisionAnalyzer {
    client: Client,
    api_key: String,
    model: String,
}

impl VisionAnalyzer {
    pub fn new(api_key: String, model: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::analysis(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_key, model })
    }

    fn analyze_image(&self, path: &Path) -> Result<Vec<DamageObservation>, AppError> {
        let bytes = fs::read(path)
            .map_err(|e| AppError::io(format!("Failed to read image '{}': {e}", path.display())))?;
        let format = ImageFormat::sniff(&bytes)
            .ok_or_else(|| AppError::analysis(format!("'{}' is not a recognized image", path.display())))?;
        let data_url = format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(bytes));

        let body = json!({
            "model": self.model,
            "temperature": 0.2,
            "max_tokens": 800,
            "response_format": {"type": "json_object"},
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": PROMPT},
                    {"type": "image_url", "image_url": {"url": data_url}},
                ],
            }],
        });

        let response: ChatResponse = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::analysis(format!("Vision API call failed: {e}")))?
            .json()
            .map_err(|e| AppError::analysis(format!("Vision API response format unexpected: {e}")))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::analysis("Vision API response was empty"))?;

        parse_damages(&content)
    }
}

impl DamageAnalyzer for VisionAnalyzer {
    fn name(&self) -> &'static str {
        "vision"
    }

    fn analyze(&self, job: &JobImages) -> Result<Analysis, AppError> {
        if job.images.is_empty() {
            return Err(AppError::precondition(format!(
                "Job {} has no image files to analyze",
                job.job_id
            )));
        }
        tracing::info!(job_id = %job.job_id, model = %self.model, images = job.images.len(), "vision analysis started");

        let mut observations = Vec::new();
        for image in &job.images {
            let name = image.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            match self.analyze_image(image) {
                Ok(found) => {
                    tracing::debug!(image = %name, findings = found.len(), "image analyzed");
                    observations.extend(found.into_iter().map(|mut obs| {
                        obs.image = Some(name.clone());
                        obs
                    }));
                }
                Err(err) => tracing::warn!(image = %name, %err, "image analysis failed; skipping"),
            }
        }

        Ok(Analysis {
            observations,
            source: Some(self.model.clone()),
        })
    }
}

/// Parse the model's JSON answer; either shape of `DamageInput` is accepted.
fn parse_damages(content: &str) -> Result<Vec<DamageObservation>, AppError> {
    let input: DamageInput = serde_json::from_str(content).map_err(|_| {
        let preview: String = content.chars().take(100).collect();
        AppError::analysis(format!("Failed to parse vision response JSON: {preview}..."))
    })?;
    Ok(input.into_observations())
}
