//! Encoding of validated records into the model's training-time representation.
//!
//! - columns follow schema order exactly
//! - categorical values become their index in the *model's* level list
//! - numeric values pass through, or get the same transform the training
//!   pipeline applied (declared per feature in the artifact)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{EncodedRecord, EncodingError, FeatureDomain, FeatureValue, ValidatedRecord};
use crate::schema::Schema;

/// Numeric preprocessing replicated from the training pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NumericTransform {
    #[default]
    Identity,
    /// `(x - mean) / scale`
    Standardize { mean: f64, scale: f64 },
    /// `(x - min) / (max - min)`
    MinMax { min: f64, max: f64 },
}

impl NumericTransform {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            NumericTransform::Identity => x,
            NumericTransform::Standardize { mean, scale } => (x - mean) / scale,
            NumericTransform::MinMax { min, max } => (x - min) / (max - min),
        }
    }

    pub fn validate(self) -> Result<(), String> {
        match self {
            NumericTransform::Identity => Ok(()),
            NumericTransform::Standardize { mean, scale } => {
                if mean.is_finite() && scale.is_finite() && scale != 0.0 {
                    Ok(())
                } else {
                    Err(format!("invalid standardize parameters (mean={mean}, scale={scale})"))
                }
            }
            NumericTransform::MinMax { min, max } => {
                if min.is_finite() && max.is_finite() && max != min {
                    Ok(())
                } else {
                    Err(format!("invalid min_max parameters (min={min}, max={max})"))
                }
            }
        }
    }
}

/// Model-side encoding conventions, taken from the artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingEncoding {
    levels: HashMap<String, Vec<String>>,
    transforms: HashMap<String, NumericTransform>,
}

impl TrainingEncoding {
    pub fn new(levels: HashMap<String, Vec<String>>, transforms: HashMap<String, NumericTransform>) -> Self {
        Self { levels, transforms }
    }

    /// Level list the model was trained with, if the artifact declares one.
    pub fn levels(&self, feature: &str) -> Option<&[String]> {
        self.levels.get(feature).map(Vec::as_slice)
    }

    pub fn transform(&self, feature: &str) -> NumericTransform {
        self.transforms.get(feature).copied().unwrap_or_default()
    }
}

/// Encode one record. Features without artifact-declared levels use the schema's
/// declared levels, which is how the reference dataset was encoded for training.
pub fn encode(
    record: &ValidatedRecord,
    schema: &Schema,
    encoding: &TrainingEncoding,
) -> Result<EncodedRecord, EncodingError> {
    if record.len() != schema.len() {
        return Err(EncodingError::ColumnMismatch(record.len().min(schema.len())));
    }

    let mut columns = Vec::with_capacity(schema.len());
    let mut values = Vec::with_capacity(schema.len());

    for (pos, (spec, (name, value))) in schema.features().iter().zip(record.iter()).enumerate() {
        if spec.name() != name {
            return Err(EncodingError::ColumnMismatch(pos));
        }

        let encoded = match (spec.domain(), value) {
            (FeatureDomain::Numeric(_), FeatureValue::Numeric(x)) => encoding.transform(name).apply(*x),
            (FeatureDomain::Categorical { levels }, FeatureValue::Categorical(level)) => {
                let model_levels = encoding.levels(name).unwrap_or(levels.as_slice());
                let code = model_levels
                    .iter()
                    .position(|l| l == level)
                    .ok_or_else(|| EncodingError::UnknownCategoryLevel(name.to_string(), level.clone()))?;
                code as f64
            }
            _ => return Err(EncodingError::ColumnMismatch(pos)),
        };

        columns.push(name.to_string());
        values.push(encoded);
    }

    Ok(EncodedRecord::new(columns, values))
}
