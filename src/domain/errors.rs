//! Error taxonomy for the prediction core.
//!
//! Startup errors (`SchemaBuildError`, `ModelLoadError`) abort initialization.
//! Everything else is per request and never touches the shared schema/model.

use std::path::PathBuf;

use thiserror::Error;

/// Reference dataset malformed, absent, or not expressible as a schema.
#[derive(Debug, Error)]
pub enum SchemaBuildError {
    #[error("Failed to read reference dataset '{path}': {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Invalid reference dataset: {0}")]
    Malformed(String),

    #[error("Reference dataset is empty")]
    EmptyDataset,

    #[error("Configured feature column `{0}` is absent from the reference dataset")]
    MissingColumn(String),

    #[error("Feature `{name}` has unsupported column type `{dtype}` (expected numeric or category)")]
    UnsupportedFeatureType { name: String, dtype: String },

    #[error("Numeric feature `{0}` has no present values in the reference dataset")]
    NoValues(String),

    #[error("Categorical feature `{0}` declares no levels")]
    NoLevels(String),

    #[error("Feature `{0}` appears more than once")]
    DuplicateFeature(String),

    #[error("Categorical feature `{0}` declares level '{1}' more than once")]
    DuplicateLevel(String, String),
}

/// Model artifact missing, corrupt, or incompatible with the schema.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Model artifact not found: '{0}'")]
    Missing(PathBuf),

    #[error("Corrupt model artifact: {0}")]
    Corrupt(String),

    #[error("Unsupported model artifact format version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid model structure: {0}")]
    InvalidStructure(String),

    #[error("Model expects {expected} features but the schema derives {found}")]
    FeatureCountMismatch { expected: usize, found: usize },

    #[error("Feature order mismatch at column {position}: model expects `{expected}`, schema has `{found}`")]
    FeatureOrderMismatch {
        position: usize,
        expected: String,
        found: String,
    },
}

/// Any failure while bringing the predictor up. No partial service is offered.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Schema(#[from] SchemaBuildError),

    #[error(transparent)]
    Model(#[from] ModelLoadError),
}

/// Bad user input; the caller should re-prompt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing value for feature `{0}`")]
    MissingFeature(String),

    #[error("Feature `{0}` expects a finite number")]
    TypeMismatch(String),

    #[error("Invalid category for `{0}`: '{1}'")]
    InvalidCategory(String, String),
}

impl ValidationError {
    /// Name of the offending feature.
    pub fn feature(&self) -> &str {
        match self {
            ValidationError::MissingFeature(name)
            | ValidationError::TypeMismatch(name)
            | ValidationError::InvalidCategory(name, _) => name,
        }
    }
}

/// The validated record cannot be expressed in the model's encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("Level '{1}' of `{0}` is unknown to the model")]
    UnknownCategoryLevel(String, String),

    #[error("Record does not match the schema at column {0}")]
    ColumnMismatch(usize),
}

/// Failure inside the estimator call.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Inference failed: {0}")]
pub struct InferenceError(pub String);

/// Raw model output outside the versioned taxonomy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("Model produced label {0}, which the outcome taxonomy does not map")]
    UnknownOutcomeLabel(i64),
}

/// How a per-request failure should be handled by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// User mistake; re-prompt for corrected input.
    InvalidInput,
    /// Schema/model/taxonomy drift; an operator problem, not a user one.
    Drift,
    /// Possibly transient; the caller may retry.
    Inference,
}

/// Any per-request failure of the validate -> encode -> classify pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

impl PredictError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PredictError::Validation(_) => ErrorClass::InvalidInput,
            PredictError::Encoding(_) | PredictError::Classify(_) => ErrorClass::Drift,
            PredictError::Inference(_) => ErrorClass::Inference,
        }
    }

    pub fn is_drift(&self) -> bool {
        self.class() == ErrorClass::Drift
    }
}
