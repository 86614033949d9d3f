//! Image sanity checks run before any analyzer sees a job.
//!
//! Files are identified by their header bytes, not their extension.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;
use crate::io::store::JobImages;

/// Bytes read from each file to identify it.
const HEADER_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormat {
    /// Identify an image from its first bytes.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if header.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if header.len() >= 12 && header.starts_with(b"RIFF") && &header[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }
}

/// Outcome for one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageCheck {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageCheck {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Check one file. I/O problems are reported in the result, not returned.
pub fn check_image(path: &Path) -> ImageCheck {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    match read_header(path) {
        Ok(header) if header.is_empty() => ImageCheck {
            filename,
            format: None,
            error: Some("File is empty.".to_string()),
        },
        Ok(header) => match ImageFormat::sniff(&header) {
            Some(format) => ImageCheck {
                filename,
                format: Some(format),
                error: None,
            },
            None => ImageCheck {
                filename,
                format: None,
                error: Some("Unrecognized image format.".to_string()),
            },
        },
        Err(e) => ImageCheck {
            filename,
            format: None,
            error: Some(e.to_string()),
        },
    }
}

/// Per-file results for a job. A job with no image files is a precondition failure.
pub fn check_job_images(job: &JobImages) -> Result<Vec<ImageCheck>, AppError> {
    if job.images.is_empty() {
        return Err(AppError::precondition(format!("No image files found for job {}.", job.job_id)));
    }
    Ok(job.images.iter().map(|p| check_image(p)).collect())
}

/// Fail unless every image of the job is readable and recognized.
pub fn validate_job_images(job: &JobImages) -> Result<Vec<ImageCheck>, AppError> {
    let checks = check_job_images(job)?;
    let bad: Vec<String> = checks
        .iter()
        .filter_map(|c| c.error.as_ref().map(|e| format!("{}: {e}", c.filename)))
        .collect();
    if !bad.is_empty() {
        return Err(AppError::precondition(format!(
            "One or more uploaded images failed validation ({}).",
            bad.join("; ")
        )));
    }
    Ok(checks)
}

fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    File::open(path)?.take(HEADER_LEN as u64).read_to_end(&mut header)?;
    Ok(header)
}
