//! JSON run reports.
//!
//! Reports are grouped by date, one file per run:
//! `{json_output_dir}/{YYYY-MM-DD}/{HHMMSS}_{query-slug}.json`.

use crate::models::RunReport;
use crate::utils::slugify_title;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Longest query slug used in a report file name.
const MAX_SLUG_CHARS: usize = 60;

/// File name for a report, relative to the date directory.
pub fn report_file_name(report: &RunReport) -> String {
    let time: String = report.local_time.chars().filter(char::is_ascii_digit).collect();
    let slug: String = slugify_title(&report.query)
        .chars()
        .take(MAX_SLUG_CHARS)
        .collect();
    let slug = if slug.is_empty() { "query".to_string() } else { slug };
    format!("{time}_{slug}.json")
}

/// Write `report` under `json_output_dir` and return the path written.
///
/// Creates the date directory if needed.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_report(
    report: &RunReport,
    json_output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    let full_json_dir = json_output_dir.join(&report.local_date);
    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = full_json_dir.join(report_file_name(report));
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename.display(), "Wrote JSON run report");

    Ok(output_json_filename)
}
