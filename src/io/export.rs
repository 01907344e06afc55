//! Export batch prediction results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! one row per request, probabilities spread over one column per class.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Utc;

use crate::domain::{Outcome, PredictError};
use crate::error::{AppError, EXIT_CONFIG};
use crate::io::batch::BatchRow;
use crate::report::error_class_name;

/// Write per-request results to a CSV file.
pub fn write_results_csv(
    path: &Path,
    rows: &[BatchRow],
    results: &[Result<Outcome, PredictError>],
    classes: &[i64],
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(file, rows, results, classes)
}

pub fn write_results<W: Write>(
    writer: W,
    rows: &[BatchRow],
    results: &[Result<Outcome, PredictError>],
    classes: &[i64],
) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    let scored_at = Utc::now().to_rfc3339();

    let mut header: Vec<String> = ["line", "scored_at", "outcome", "raw_label", "score"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(classes.iter().map(|c| format!("p_{c}")));
    header.extend(["error_class".to_string(), "error".to_string()]);
    out.write_record(&header)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to write export CSV header: {e}")))?;

    for (row, result) in rows.iter().zip(results) {
        let mut record = vec![row.line.to_string(), scored_at.clone()];
        match result {
            Ok(outcome) => {
                record.push(outcome.label.to_string());
                record.push(outcome.raw.label.to_string());
                record.push(format!("{:.6}", outcome.raw.score()));
                record.extend(outcome.raw.probabilities.iter().map(|p| format!("{p:.6}")));
                record.extend([String::new(), String::new()]);
            }
            Err(err) => {
                record.extend([String::new(), String::new(), String::new()]);
                record.extend(classes.iter().map(|_| String::new()));
                record.push(error_class_name(err.class()).to_string());
                record.push(err.to_string());
            }
        }
        out.write_record(&record)
            .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
