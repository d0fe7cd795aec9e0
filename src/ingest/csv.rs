//! CSV parser for the historical campaign dataset.
//!
//! Expected columns (any order, located by header name):
//! `Campaign_ID`, `Company`, `Campaign_Type`, `Target_Audience`,
//! `Channel_Used`, `Clicks`, `Impressions`, `Conversion_Rate`, plus
//! optional `Duration`, `Acquisition_Cost`, `ROI`, `Engagement_Score`,
//! `Location`, `Language`, `Customer_Segment`, `Date`.
//!
//! Dataset quirks handled here so downstream code never sees them:
//! currency columns may carry `$`/`,` decorations and `Duration` may be
//! spelled `"30 days"`.

use crate::types::{CampaignRecord, UNKNOWN_CATEGORY};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Required header names. Ingestion fails fast if any is absent.
const REQUIRED_COLUMNS: [&str; 6] = [
    "Company",
    "Campaign_Type",
    "Target_Audience",
    "Channel_Used",
    "Clicks",
    "Conversion_Rate",
];

/// Ingestion errors.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open dataset {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("dataset {0} is empty (no header row)")]
    EmptyFile(PathBuf),
    #[error("dataset {0} is missing required column '{1}'")]
    MissingColumn(PathBuf, String),
    #[error("dataset {0} contained no usable rows")]
    NoUsableRows(PathBuf),
}

/// Per-load ingestion statistics.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub loaded: usize,
    /// Rows dropped because a numeric field failed to parse.
    pub skipped_malformed: usize,
    /// Rows dropped because conversion rate fell outside [0, 100].
    pub skipped_out_of_range: usize,
}

/// Load historical campaign records from a CSV file.
///
/// Rows with unparseable numeric fields or out-of-range conversion rates
/// are skipped (counted in the report), never clamped.
pub fn load_campaign_csv(path: &Path) -> Result<(Vec<CampaignRecord>, IngestReport), IngestError> {
    let file = File::open(path).map_err(|e| IngestError::Io(path.to_path_buf(), e))?;
    let mut lines = BufReader::new(file).lines();

    let header_line = match lines.next() {
        Some(Ok(line)) => line,
        Some(Err(e)) => return Err(IngestError::Io(path.to_path_buf(), e)),
        None => return Err(IngestError::EmptyFile(path.to_path_buf())),
    };

    let columns = index_columns(&header_line);
    for required in REQUIRED_COLUMNS {
        if !columns.contains_key(required) {
            return Err(IngestError::MissingColumn(
                path.to_path_buf(),
                required.to_string(),
            ));
        }
    }

    let mut records = Vec::new();
    let mut report = IngestReport::default();

    for (line_no, line) in lines.enumerate() {
        let line = line.map_err(|e| IngestError::Io(path.to_path_buf(), e))?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_csv_line(&line);
        match parse_row(&columns, &fields) {
            Ok(record) => {
                if !(0.0..=100.0).contains(&record.conversion_rate) {
                    warn!(
                        row = line_no + 2,
                        rate = record.conversion_rate,
                        "Conversion rate outside [0, 100] — row skipped"
                    );
                    report.skipped_out_of_range += 1;
                    continue;
                }
                records.push(record);
            }
            Err(reason) => {
                warn!(row = line_no + 2, %reason, "Malformed row skipped");
                report.skipped_malformed += 1;
            }
        }
    }

    if records.is_empty() {
        return Err(IngestError::NoUsableRows(path.to_path_buf()));
    }

    report.loaded = records.len();
    info!(
        loaded = report.loaded,
        skipped_malformed = report.skipped_malformed,
        skipped_out_of_range = report.skipped_out_of_range,
        "Historical campaign dataset loaded"
    );
    Ok((records, report))
}

/// Map header names to field positions.
fn index_columns(header: &str) -> HashMap<String, usize> {
    split_csv_line(header)
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect()
}

/// Split one CSV line, honoring double-quoted fields with embedded
/// commas and doubled-quote escapes (`""` -> literal `"`).
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

fn parse_row(
    columns: &HashMap<String, usize>,
    fields: &[String],
) -> Result<CampaignRecord, String> {
    let text = |name: &str| -> String {
        columns
            .get(name)
            .and_then(|&i| fields.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    // Missing categorical values normalize to the sentinel before encoding.
    let categorical = |name: &str| -> String {
        let value = text(name);
        if value.is_empty() {
            UNKNOWN_CATEGORY.to_string()
        } else {
            value
        }
    };

    let clicks = parse_number(&text("Clicks"))
        .ok_or_else(|| format!("unparseable Clicks '{}'", text("Clicks")))?;
    if clicks < 0.0 {
        return Err(format!("negative Clicks {clicks}"));
    }
    let conversion_rate = parse_number(&text("Conversion_Rate"))
        .ok_or_else(|| format!("unparseable Conversion_Rate '{}'", text("Conversion_Rate")))?;

    Ok(CampaignRecord {
        campaign_id: text("Campaign_ID"),
        company: categorical("Company"),
        campaign_type: categorical("Campaign_Type"),
        target_audience: categorical("Target_Audience"),
        channel_used: categorical("Channel_Used"),
        clicks,
        impressions: parse_number(&text("Impressions")).unwrap_or(0.0) as u64,
        conversion_rate,
        duration_days: parse_number(&text("Duration")).unwrap_or(0.0) as u32,
        acquisition_cost: parse_number(&text("Acquisition_Cost")).unwrap_or(0.0),
        roi: parse_number(&text("ROI")).unwrap_or(0.0),
        engagement_score: parse_number(&text("Engagement_Score")).unwrap_or(0.0),
        location: text("Location"),
        language: text("Language"),
        customer_segment: text("Customer_Segment"),
        date: text("Date"),
    })
}

/// Parse a numeric field, tolerating `$` / `,` decorations and trailing
/// unit words (e.g. `"30 days"`).
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%'))
        .collect();
    let numeric = cleaned
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or("");
    numeric.parse::<f64>().ok()
}
