//! Classifier estimators that can appear in a model artifact.
//!
//! Estimators are plain serializable data plus pure evaluation functions so the
//! inference adapter can stay generic over the model family.

pub mod forest;
pub mod linear;

use serde::{Deserialize, Serialize};

use crate::domain::InferenceError;

pub use forest::{DecisionTree, RandomForest, TreeNode};
pub use linear::LogisticModel;

/// Estimator family stored in the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Estimator {
    RandomForest(RandomForest),
    Logistic(LogisticModel),
}

impl Estimator {
    /// Human-readable label for terminal output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Estimator::RandomForest(_) => "random forest",
            Estimator::Logistic(_) => "logistic regression",
        }
    }

    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        match self {
            Estimator::RandomForest(m) => m.validate(n_features, n_classes),
            Estimator::Logistic(m) => m.validate(n_features, n_classes),
        }
    }

    /// Class probabilities for one encoded row, aligned with the artifact's classes.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        match self {
            Estimator::RandomForest(m) => m.predict_proba(row),
            Estimator::Logistic(m) => m.predict_proba(row),
        }
    }

    /// Per-feature importances in column order, when the family exposes them.
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        match self {
            Estimator::RandomForest(m) => m.feature_importances.clone(),
            Estimator::Logistic(m) => Some(m.feature_importances()),
        }
    }
}

/// Index of the largest probability; ties go to the lowest index.
pub fn argmax(probabilities: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &p) in probabilities.iter().enumerate() {
        if !p.is_finite() {
            return None;
        }
        match best {
            Some((_, bp)) if p <= bp => {}
            _ => best = Some((idx, p)),
        }
    }
    best.map(|(idx, _)| idx)
}
