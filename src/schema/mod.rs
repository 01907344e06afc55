//! Canonical feature schema and its derivation from the reference dataset.
//!
//! The schema is built once at startup and shared read-only afterwards. Feature
//! order is the dataset's column order and must equal the model's training
//! order, so nothing here ever sorts or deduplicates through a set.

use std::collections::{HashMap, HashSet};

use crate::domain::{FeatureSpec, NumericDomain, RawInput, SchemaBuildError};
use crate::io::dataset::{ColumnType, ReferenceDataset};

/// Which dataset columns become features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureSelection {
    /// Every column except the target, in file order.
    AllExcept(String),
    /// Exactly these columns, in this order.
    Explicit(Vec<String>),
}

impl Default for FeatureSelection {
    fn default() -> Self {
        FeatureSelection::AllExcept("Target".to_string())
    }
}

/// Ordered feature schema, uniquely keyed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    features: Vec<FeatureSpec>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(features: Vec<FeatureSpec>) -> Result<Self, SchemaBuildError> {
        let mut index = HashMap::with_capacity(features.len());
        for (pos, spec) in features.iter().enumerate() {
            if let Some(levels) = spec.levels() {
                if levels.is_empty() {
                    return Err(SchemaBuildError::NoLevels(spec.name().to_string()));
                }
                if let Some(level) = first_duplicate(levels) {
                    return Err(SchemaBuildError::DuplicateLevel(spec.name().to_string(), level.to_string()));
                }
            }
            if index.insert(spec.name().to_string(), pos).is_some() {
                return Err(SchemaBuildError::DuplicateFeature(spec.name().to_string()));
            }
        }
        Ok(Self { features, index })
    }

    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureSpec> {
        self.position(name).map(|pos| &self.features[pos])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(FeatureSpec::name)
    }

    /// Form defaults: mean for numeric features, first level for categorical.
    pub fn default_input(&self) -> RawInput {
        self.features
            .iter()
            .filter_map(|f| f.default_value().map(|v| (f.name().to_string(), v)))
            .collect()
    }
}

/// First level that repeats an earlier one. Level codes are positions, so the
/// level list has to be a set.
pub(crate) fn first_duplicate(levels: &[String]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(levels.len());
    levels.iter().find(|l| !seen.insert(l.as_str())).map(String::as_str)
}

/// Derive the schema from a typed reference dataset.
pub fn build(dataset: &ReferenceDataset, selection: &FeatureSelection) -> Result<Schema, SchemaBuildError> {
    if dataset.n_rows() == 0 {
        return Err(SchemaBuildError::EmptyDataset);
    }

    let names: Vec<String> = match selection {
        FeatureSelection::AllExcept(target) => {
            if dataset.column(target).is_none() {
                return Err(SchemaBuildError::MissingColumn(target.clone()));
            }
            dataset
                .column_names()
                .filter(|name| name != target)
                .map(str::to_string)
                .collect()
        }
        FeatureSelection::Explicit(names) => names.clone(),
    };

    let mut features = Vec::with_capacity(names.len());
    for name in names {
        let column = dataset
            .column(&name)
            .ok_or_else(|| SchemaBuildError::MissingColumn(name.clone()))?;

        let spec = match &column.dtype {
            ColumnType::Int | ColumnType::Float => {
                let domain = numeric_domain(column.numeric_values())
                    .ok_or_else(|| SchemaBuildError::NoValues(name.clone()))?;
                FeatureSpec::numeric(name, domain)
            }
            ColumnType::Category { levels } => FeatureSpec::categorical(name, levels.clone()),
            other => {
                return Err(SchemaBuildError::UnsupportedFeatureType {
                    name,
                    dtype: other.name().to_string(),
                });
            }
        };
        features.push(spec);
    }

    let schema = Schema::new(features)?;
    log::info!(
        "Derived schema: {} features ({} categorical) from {} rows",
        schema.len(),
        schema.features().iter().filter(|f| f.levels().is_some()).count(),
        dataset.n_rows()
    );
    Ok(schema)
}

fn numeric_domain(values: impl Iterator<Item = f64>) -> Option<NumericDomain> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut n = 0usize;

    for v in values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
        n += 1;
    }

    if n == 0 {
        return None;
    }

    Some(NumericDomain {
        min,
        max,
        mean: sum / n as f64,
    })
}
