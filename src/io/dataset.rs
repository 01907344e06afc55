//! Reference dataset ingest.
//!
//! This module turns the cleaned training CSV into typed columns the schema
//! registry can derive feature metadata from.
//!
//! Design goals:
//! - **Declared dtypes win**: categorical columns (and their level order) come
//!   from a dtype manifest, never from sorting observed values
//! - **Dataframe-like inference** for undeclared columns (int, float, else text)
//! - **Separation of concerns**: no schema or model logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::domain::SchemaBuildError;

/// Column dtype, declared in the manifest or inferred from the cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ColumnType {
    Int,
    Float,
    /// Explicit categorical column with its ordered level set.
    Category { levels: Vec<String> },
    Text,
    Bool,
}

impl ColumnType {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Category { .. } => "category",
            ColumnType::Text => "text",
            ColumnType::Bool => "bool",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }
}

/// Declared dtypes keyed by (trimmed) column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DtypeManifest(HashMap<String, ColumnType>);

impl DtypeManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self, SchemaBuildError> {
        let raw: HashMap<String, ColumnType> = serde_json::from_str(text)
            .map_err(|e| SchemaBuildError::Malformed(format!("invalid dtype manifest: {e}")))?;
        Ok(Self(
            raw.into_iter()
                .map(|(name, dtype)| (normalize_header_name(&name), dtype))
                .collect(),
        ))
    }

    pub fn from_json_path(path: &Path) -> Result<Self, SchemaBuildError> {
        let text = std::fs::read_to_string(path).map_err(|e| SchemaBuildError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    pub fn get(&self, name: &str) -> Option<&ColumnType> {
        self.0.get(name)
    }
}

/// One typed column. Missing cells are `None`.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
    cells: Vec<Option<String>>,
}

impl Column {
    /// Present values of a numeric column. Load has already checked that every
    /// present cell of a numeric column parses.
    pub fn numeric_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells
            .iter()
            .flatten()
            .filter_map(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    pub fn present_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Typed reference dataset, columns in file order.
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl ReferenceDataset {
    /// Load a CSV file, applying declared dtypes.
    pub fn from_csv_path(path: &Path, dtypes: &DtypeManifest) -> Result<Self, SchemaBuildError> {
        let file = File::open(path).map_err(|e| SchemaBuildError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_reader(file, dtypes)
    }

    pub fn from_reader<R: Read>(reader: R, dtypes: &DtypeManifest) -> Result<Self, SchemaBuildError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| SchemaBuildError::Malformed(format!("failed to read CSV headers: {e}")))?
            .clone();
        let names: Vec<String> = headers.iter().map(normalize_header_name).collect();

        let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
        let mut n_rows = 0usize;

        for (idx, result) in reader.records().enumerate() {
            // +2: records start after the header, lines are 1-based.
            let line = idx + 2;
            let record = result.map_err(|e| SchemaBuildError::Malformed(format!("line {line}: {e}")))?;
            push_record(&record, &mut raw_columns);
            n_rows += 1;
        }

        if n_rows == 0 {
            return Err(SchemaBuildError::EmptyDataset);
        }

        let columns = names
            .into_iter()
            .zip(raw_columns)
            .map(|(name, cells)| {
                let dtype = match dtypes.get(&name) {
                    Some(declared) => declared.clone(),
                    None => infer_dtype(&cells),
                };
                if dtype.is_numeric() {
                    check_numeric_cells(&name, &dtype, &cells)?;
                }
                let cells = match &dtype {
                    ColumnType::Category { levels } => restrict_to_levels(cells, levels),
                    _ => cells,
                };
                Ok(Column { name, dtype, cells })
            })
            .collect::<Result<Vec<_>, SchemaBuildError>>()?;

        Ok(Self { columns, n_rows })
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
}

fn push_record(record: &StringRecord, raw_columns: &mut [Vec<Option<String>>]) {
    for (idx, column) in raw_columns.iter_mut().enumerate() {
        let cell = record
            .get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        column.push(cell);
    }
}

/// Trim whitespace and a leading UTF-8 BOM from a header name.
pub fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn infer_dtype(cells: &[Option<String>]) -> ColumnType {
    let present: Vec<&str> = cells.iter().flatten().map(String::as_str).collect();
    if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        // All-missing columns read as floats, like a dataframe reader would.
        if present.is_empty() {
            return ColumnType::Float;
        }
        return ColumnType::Int;
    }
    if present.iter().all(|s| s.parse::<f64>().is_ok_and(f64::is_finite)) {
        return ColumnType::Float;
    }
    ColumnType::Text
}

/// Every present cell of a numeric column must parse as a finite value of its dtype.
fn check_numeric_cells(name: &str, dtype: &ColumnType, cells: &[Option<String>]) -> Result<(), SchemaBuildError> {
    for (idx, cell) in cells.iter().enumerate() {
        let Some(cell) = cell else { continue };
        let ok = match dtype {
            ColumnType::Int => cell.parse::<i64>().is_ok(),
            _ => cell.parse::<f64>().is_ok_and(f64::is_finite),
        };
        if !ok {
            return Err(SchemaBuildError::Malformed(format!(
                "line {}, column `{name}`: '{cell}' is not a valid {}",
                idx + 2,
                dtype.name()
            )));
        }
    }
    Ok(())
}

fn restrict_to_levels(cells: Vec<Option<String>>, levels: &[String]) -> Vec<Option<String>> {
    cells
        .into_iter()
        .map(|cell| cell.filter(|v| levels.iter().any(|l| l == v)))
        .collect()
}
