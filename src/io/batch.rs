//! Batch input CSV: one prediction request per row, one feature per column.
//!
//! Cells arrive as text; numeric coercion happens during validation. Empty
//! cells are left out of the raw input so they surface as missing features.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::{RawInput, RawValue};
use crate::error::{AppError, EXIT_CONFIG};
use crate::io::dataset::normalize_header_name;

/// One parsed request and the CSV line it came from.
#[derive(Debug, Clone)]
pub struct BatchRow {
    pub line: usize,
    pub input: RawInput,
}

pub fn read_batch_csv(path: &Path) -> Result<Vec<BatchRow>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to open batch CSV '{}': {e}", path.display())))?;
    read_batch(file)
}

pub fn read_batch<R: Read>(reader: R) -> Result<Vec<BatchRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to read batch CSV headers: {e}")))?
        .iter()
        .map(normalize_header_name)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record =
            result.map_err(|e| AppError::new(EXIT_CONFIG, format!("Batch CSV parse error on line {line}: {e}")))?;

        let input = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(name, cell)| (name.clone(), RawValue::Text(cell.to_string())))
            .collect();
        rows.push(BatchRow { line, input });
    }

    Ok(rows)
}
