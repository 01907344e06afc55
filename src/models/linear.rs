//! Multinomial logistic regression evaluation.
//!
//! Scores are `W x + b` with one coefficient row per class, turned into
//! probabilities with a softmax. A single coefficient row with two classes is the
//! binary case and uses the logistic sigmoid instead.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::domain::InferenceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Row-major, `n_rows x n_features`.
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LogisticModel {
    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let rows = self.coefficients.len();
        let binary = rows == 1 && n_classes == 2;
        if rows != n_classes && !binary {
            return Err(format!(
                "logistic model has {rows} coefficient rows for {n_classes} classes"
            ));
        }
        if self.intercepts.len() != rows {
            return Err(format!(
                "logistic model has {} intercepts for {rows} coefficient rows",
                self.intercepts.len()
            ));
        }
        if let Some(bad) = self.coefficients.iter().position(|r| r.len() != n_features) {
            return Err(format!(
                "coefficient row {bad} has {} entries, expected {n_features}",
                self.coefficients[bad].len()
            ));
        }
        let all_finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(self.intercepts.iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err("logistic model has non-finite parameters".to_string());
        }
        Ok(())
    }

    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let n_rows = self.coefficients.len();
        let n_features = self.coefficients.first().map_or(0, Vec::len);
        if row.len() != n_features {
            return Err(InferenceError(format!(
                "expected {n_features} columns, got {}",
                row.len()
            )));
        }

        let flat: Vec<f64> = self.coefficients.iter().flatten().copied().collect();
        if flat.len() != n_rows * n_features || self.intercepts.len() != n_rows {
            return Err(InferenceError("ragged coefficient matrix".to_string()));
        }
        let w = DMatrix::from_row_slice(n_rows, n_features, &flat);
        let x = DVector::from_column_slice(row);
        let b = DVector::from_column_slice(&self.intercepts);
        let z = w * x + b;

        let probs = if n_rows == 1 {
            let p1 = sigmoid(z[0]);
            vec![1.0 - p1, p1]
        } else {
            softmax(z.as_slice())
        };

        if probs.iter().any(|p| !p.is_finite()) {
            return Err(InferenceError("non-finite class probabilities".to_string()));
        }
        Ok(probs)
    }

    /// Mean absolute coefficient per feature across classes.
    pub fn feature_importances(&self) -> Vec<f64> {
        let n_features = self.coefficients.first().map_or(0, Vec::len);
        let n_rows = self.coefficients.len().max(1) as f64;
        (0..n_features)
            .map(|j| self.coefficients.iter().map(|r| r[j].abs()).sum::<f64>() / n_rows)
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(z: &[f64]) -> Vec<f64> {
    // Shift by the max so exp() cannot overflow.
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_picks_largest_score() {
        let model = LogisticModel {
            coefficients: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]],
            intercepts: vec![0.0, 0.0, 0.0],
        };
        let p = model.predict_proba(&[3.0, 1.0]).unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[0] > p[1] && p[1] > p[2]);
    }

    #[test]
    fn binary_uses_sigmoid() {
        let model = LogisticModel {
            coefficients: vec![vec![1.0]],
            intercepts: vec![0.0],
        };
        assert!(model.validate(1, 2).is_ok());
        let p = model.predict_proba(&[0.0]).unwrap();
        assert!((p[0] - 0.5).abs() < 1e-12 && (p[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let model = LogisticModel {
            coefficients: vec![vec![1.0, 2.0], vec![1.0]],
            intercepts: vec![0.0, 0.0],
        };
        assert!(model.validate(2, 2).is_err());
        assert!(model.predict_proba(&[1.0]).is_err());
    }

    #[test]
    fn importances_average_absolute_coefficients() {
        let model = LogisticModel {
            coefficients: vec![vec![1.0, -4.0], vec![-3.0, 0.0]],
            intercepts: vec![0.0, 0.0],
        };
        assert_eq!(model.feature_importances(), vec![2.0, 2.0]);
    }
}
