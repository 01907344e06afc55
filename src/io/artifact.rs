//! Read/write model artifact JSON files.
//!
//! The artifact is the portable representation of a trained classifier:
//! - the estimator itself (trees or coefficients)
//! - the training-time encoding (feature order, categorical levels, transforms)
//! - the versioned raw-label -> outcome mapping

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ModelLoadError, OutcomeLabel};
use crate::encode::NumericTransform;
use crate::models::Estimator;
use crate::schema::first_duplicate;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    #[serde(default = "default_taxonomy_version")]
    pub taxonomy_version: String,
    pub n_features: usize,
    /// Training column order, when the exporter recorded it.
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default)]
    pub categorical_levels: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub preprocessing: HashMap<String, NumericTransform>,
    /// Raw class labels in estimator output order.
    pub classes: Vec<i64>,
    /// Raw label -> outcome. Empty means the standard 0/1/2 mapping.
    #[serde(default)]
    pub outcome_labels: BTreeMap<i64, OutcomeLabel>,
    pub estimator: Estimator,
}

fn default_taxonomy_version() -> String {
    "v1".to_string()
}

impl ModelArtifact {
    /// Internal consistency checks that do not need the schema.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedVersion(self.format_version));
        }
        if self.classes.is_empty() {
            return Err(ModelLoadError::InvalidStructure("artifact declares no classes".to_string()));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.n_features {
                return Err(ModelLoadError::InvalidStructure(format!(
                    "feature_names has {} entries but n_features is {}",
                    names.len(),
                    self.n_features
                )));
            }
        }
        for (name, levels) in &self.categorical_levels {
            if levels.is_empty() {
                return Err(ModelLoadError::InvalidStructure(format!(
                    "categorical feature `{name}` declares no levels"
                )));
            }
            if let Some(level) = first_duplicate(levels) {
                return Err(ModelLoadError::InvalidStructure(format!(
                    "categorical feature `{name}` declares level '{level}' more than once"
                )));
            }
        }
        for (name, transform) in &self.preprocessing {
            transform
                .validate()
                .map_err(|e| ModelLoadError::InvalidStructure(format!("`{name}`: {e}")))?;
        }
        self.estimator
            .validate(self.n_features, self.classes.len())
            .map_err(ModelLoadError::InvalidStructure)
    }
}

/// Read and structurally validate a model artifact.
pub fn read_artifact_json(path: &Path) -> Result<ModelArtifact, ModelLoadError> {
    if !path.exists() {
        return Err(ModelLoadError::Missing(path.to_path_buf()));
    }
    let file = File::open(path)
        .map_err(|e| ModelLoadError::Corrupt(format!("failed to open '{}': {e}", path.display())))?;
    let artifact: ModelArtifact =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| ModelLoadError::Corrupt(e.to_string()))?;
    artifact.validate()?;
    Ok(artifact)
}

/// Write a model artifact (pretty-printed).
pub fn write_artifact_json(path: &Path, artifact: &ModelArtifact) -> Result<(), ModelLoadError> {
    let file = File::create(path)
        .map_err(|e| ModelLoadError::Corrupt(format!("failed to create '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, artifact).map_err(|e| ModelLoadError::Corrupt(e.to_string()))
}
