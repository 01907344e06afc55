//! Random-forest classifier evaluation.
//!
//! Trees are stored as flat node arrays (root at index 0). Numeric splits send
//! `x <= threshold` left; categorical splits send the listed level codes left.
//! Each leaf carries a class-probability vector and the forest averages them.

use serde::{Deserialize, Serialize};

use crate::domain::InferenceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum TreeNode {
    Numeric {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Categorical {
        feature: usize,
        left_codes: Vec<u32>,
        left: usize,
        right: usize,
    },
    Leaf {
        probabilities: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
    /// Impurity-based importances recorded at training time, one per feature.
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

impl RandomForest {
    /// Structural checks run once at load time.
    ///
    /// Children must point strictly forward, which rules out cycles and keeps
    /// traversal bounded by the node count.
    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("random forest has no trees".to_string());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {t} has no nodes"));
            }
            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Numeric {
                        feature, left, right, ..
                    }
                    | TreeNode::Categorical {
                        feature, left, right, ..
                    } => {
                        if *feature >= n_features {
                            return Err(format!(
                                "tree {t} node {n} splits on feature {feature} (model has {n_features})"
                            ));
                        }
                        for child in [*left, *right] {
                            if child <= n || child >= tree.nodes.len() {
                                return Err(format!("tree {t} node {n} has invalid child {child}"));
                            }
                        }
                    }
                    TreeNode::Leaf { probabilities } => {
                        if probabilities.len() != n_classes {
                            return Err(format!(
                                "tree {t} leaf {n} has {} probabilities, expected {n_classes}",
                                probabilities.len()
                            ));
                        }
                    }
                }
            }
        }
        if let Some(imp) = &self.feature_importances {
            if imp.len() != n_features {
                return Err(format!(
                    "feature_importances has {} entries, expected {n_features}",
                    imp.len()
                ));
            }
        }
        Ok(())
    }

    /// Average leaf probabilities over all trees.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let mut acc: Vec<f64> = Vec::new();
        for tree in &self.trees {
            let leaf = tree.leaf_for(row)?;
            if acc.is_empty() {
                acc = vec![0.0; leaf.len()];
            }
            for (a, p) in acc.iter_mut().zip(leaf) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        Ok(acc.into_iter().map(|a| a / n).collect())
    }
}

impl DecisionTree {
    fn leaf_for(&self, row: &[f64]) -> Result<&[f64], InferenceError> {
        let mut idx = 0usize;
        loop {
            let node = self
                .nodes
                .get(idx)
                .ok_or_else(|| InferenceError(format!("node index {idx} out of range")))?;
            idx = match node {
                TreeNode::Leaf { probabilities } => return Ok(probabilities),
                TreeNode::Numeric {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = feature_value(row, *feature)?;
                    if x <= *threshold { *left } else { *right }
                }
                TreeNode::Categorical {
                    feature,
                    left_codes,
                    left,
                    right,
                } => {
                    let code = level_code(feature_value(row, *feature)?, *feature)?;
                    if left_codes.contains(&code) { *left } else { *right }
                }
            };
        }
    }
}

fn feature_value(row: &[f64], feature: usize) -> Result<f64, InferenceError> {
    row.get(feature)
        .copied()
        .ok_or_else(|| InferenceError(format!("feature index {feature} out of bounds (len={})", row.len())))
}

fn level_code(value: f64, feature: usize) -> Result<u32, InferenceError> {
    if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Ok(value as u32)
    } else {
        Err(InferenceError(format!(
            "feature {feature} expects a level code, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> RandomForest {
        RandomForest {
            trees: vec![
                DecisionTree {
                    nodes: vec![
                        TreeNode::Numeric {
                            feature: 0,
                            threshold: 20.0,
                            left: 1,
                            right: 2,
                        },
                        TreeNode::Leaf {
                            probabilities: vec![0.0, 0.0, 1.0],
                        },
                        TreeNode::Leaf {
                            probabilities: vec![1.0, 0.0, 0.0],
                        },
                    ],
                },
                DecisionTree {
                    nodes: vec![
                        TreeNode::Categorical {
                            feature: 1,
                            left_codes: vec![0],
                            left: 1,
                            right: 2,
                        },
                        TreeNode::Leaf {
                            probabilities: vec![0.0, 1.0, 0.0],
                        },
                        TreeNode::Leaf {
                            probabilities: vec![1.0, 0.0, 0.0],
                        },
                    ],
                },
            ],
            feature_importances: Some(vec![0.5, 0.5]),
        }
    }

    #[test]
    fn averages_leaf_probabilities() {
        let forest = stump();
        let p = forest.predict_proba(&[19.0, 0.0]).unwrap();
        assert_eq!(p, vec![0.0, 0.5, 0.5]);
        let p = forest.predict_proba(&[25.0, 1.0]).unwrap();
        assert_eq!(p, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn validate_rejects_backward_children() {
        let mut forest = stump();
        forest.trees[0].nodes[0] = TreeNode::Numeric {
            feature: 0,
            threshold: 1.0,
            left: 0,
            right: 2,
        };
        assert!(forest.validate(2, 3).is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_features() {
        assert!(stump().validate(1, 3).is_err());
        assert!(stump().validate(2, 3).is_ok());
        assert!(stump().validate(2, 2).is_err());
    }

    #[test]
    fn fractional_level_code_is_an_inference_error() {
        let err = stump().predict_proba(&[19.0, 0.5]).unwrap_err();
        assert!(err.0.contains("level code"));
    }
}
