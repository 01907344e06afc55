//! Inference adapter: the one place that talks to the trained estimator.
//!
//! The adapter is built once from the parsed model artifact, checked against the schema,
//! and then only read. `classify` is synchronous and never mutates the model.

use std::panic::{AssertUnwindSafe, catch_unwind};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{EncodedRecord, FeatureImportance, FeatureKind, InferenceError, ModelLoadError, RawOutcome};
use crate::encode::TrainingEncoding;
use crate::io::artifact::ModelArtifact;
use crate::models::{Estimator, argmax};
use crate::schema::Schema;

/// Summary of the loaded model, for status output.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub estimator: String,
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub taxonomy_version: String,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct InferenceAdapter {
    estimator: Estimator,
    classes: Vec<i64>,
    columns: Vec<String>,
    encoding: TrainingEncoding,
    info: ModelInfo,
}

impl InferenceAdapter {
    /// Bind an already-parsed artifact to `schema`, failing on any disagreement in
    /// feature count or order.
    pub fn from_artifact(artifact: ModelArtifact, schema: &Schema) -> Result<Self, ModelLoadError> {
        artifact.validate()?;

        if artifact.n_features != schema.len() {
            return Err(ModelLoadError::FeatureCountMismatch {
                expected: artifact.n_features,
                found: schema.len(),
            });
        }

        if let Some(names) = &artifact.feature_names {
            for (position, (expected, found)) in names.iter().zip(schema.names()).enumerate() {
                if expected != found {
                    return Err(ModelLoadError::FeatureOrderMismatch {
                        position,
                        expected: expected.clone(),
                        found: found.to_string(),
                    });
                }
            }
        }

        check_encoding_targets(&artifact, schema)?;
        warn_on_level_divergence(&artifact, schema);

        let info = ModelInfo {
            estimator: artifact.estimator.display_name().to_string(),
            n_features: artifact.n_features,
            classes: artifact.classes.clone(),
            taxonomy_version: artifact.taxonomy_version.clone(),
            loaded_at: Utc::now(),
        };
        log::info!(
            "Model loaded: {} over {} features, classes {:?}, taxonomy {}",
            info.estimator,
            info.n_features,
            info.classes,
            info.taxonomy_version
        );

        Ok(Self {
            estimator: artifact.estimator,
            classes: artifact.classes,
            columns: schema.names().map(str::to_string).collect(),
            encoding: TrainingEncoding::new(artifact.categorical_levels, artifact.preprocessing),
            info,
        })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Training-time encoding conventions the record encoder must follow.
    pub fn encoding(&self) -> &TrainingEncoding {
        &self.encoding
    }

    /// Run the estimator on one encoded row.
    ///
    /// Estimator errors and panics both come back as `InferenceError`.
    pub fn classify(&self, encoded: &EncodedRecord) -> Result<RawOutcome, InferenceError> {
        if encoded.len() != self.info.n_features {
            return Err(InferenceError(format!(
                "expected {} columns, got {}",
                self.info.n_features,
                encoded.len()
            )));
        }

        let probabilities = catch_unwind(AssertUnwindSafe(|| self.estimator.predict_proba(encoded.values())))
            .map_err(|panic| InferenceError(format!("estimator panicked: {}", panic_message(panic.as_ref()))))??;

        if probabilities.len() != self.classes.len() {
            return Err(InferenceError(format!(
                "estimator returned {} probabilities for {} classes",
                probabilities.len(),
                self.classes.len()
            )));
        }

        let idx = argmax(&probabilities).ok_or_else(|| InferenceError("non-finite class probabilities".to_string()))?;
        Ok(RawOutcome {
            label: self.classes[idx],
            probabilities,
        })
    }

    /// Static per-feature importance ranking, most important first.
    ///
    /// Independent of any request; `None` when the estimator does not expose it.
    pub fn feature_importances(&self) -> Option<Vec<FeatureImportance>> {
        let values = self.estimator.feature_importances()?;
        let mut ranking: Vec<FeatureImportance> = self
            .columns
            .iter()
            .zip(values)
            .map(|(feature, importance)| FeatureImportance {
                feature: feature.clone(),
                importance,
            })
            .collect();
        ranking.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap_or(std::cmp::Ordering::Equal));
        Some(ranking)
    }
}

fn check_encoding_targets(artifact: &ModelArtifact, schema: &Schema) -> Result<(), ModelLoadError> {
    for name in artifact.categorical_levels.keys() {
        match schema.feature(name).map(|f| f.kind()) {
            Some(FeatureKind::Categorical) => {}
            Some(FeatureKind::Numeric) => {
                return Err(ModelLoadError::InvalidStructure(format!(
                    "artifact declares levels for numeric feature `{name}`"
                )));
            }
            None => {
                return Err(ModelLoadError::InvalidStructure(format!(
                    "artifact declares levels for unknown feature `{name}`"
                )));
            }
        }
    }
    for name in artifact.preprocessing.keys() {
        if schema.feature(name).map(|f| f.kind()) != Some(FeatureKind::Numeric) {
            return Err(ModelLoadError::InvalidStructure(format!(
                "artifact declares a numeric transform for non-numeric feature `{name}`"
            )));
        }
    }
    Ok(())
}

/// Level sets that differ are only fatal if a request actually uses a level the
/// model does not know, so they are reported here and enforced by the encoder.
fn warn_on_level_divergence(artifact: &ModelArtifact, schema: &Schema) {
    for spec in schema.features() {
        let (Some(dataset_levels), Some(model_levels)) = (spec.levels(), artifact.categorical_levels.get(spec.name()))
        else {
            continue;
        };
        let unknown: Vec<&str> = dataset_levels
            .iter()
            .filter(|l| !model_levels.contains(l))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            log::warn!(
                "Feature `{}`: dataset levels {:?} are unknown to the model",
                spec.name(),
                unknown
            );
        } else if dataset_levels != model_levels.as_slice() {
            log::warn!("Feature `{}`: dataset and model level order differ", spec.name());
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
