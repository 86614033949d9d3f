//! Reporting: terminal summaries and the per-job Markdown report.

pub mod format;
pub mod markdown;

pub use format::*;
pub use markdown::render_job_report;
