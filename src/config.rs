//! Runtime configuration.
//!
//! Paths to the read-only inputs come from the environment (a `.env` file is
//! honoured); CLI flags override them.

use std::path::PathBuf;

use crate::schema::FeatureSelection;

pub const DEFAULT_DATASET: &str = "cleaned_data_new.csv";
pub const DEFAULT_MODEL: &str = "dropout_model.json";
pub const DEFAULT_TARGET: &str = "Target";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub dataset_path: PathBuf,
    pub dtypes_path: Option<PathBuf>,
    pub model_path: PathBuf,
    pub target: String,
    /// Explicit feature columns; `None` means every column except the target.
    pub features: Option<Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            dtypes_path: None,
            model_path: PathBuf::from(DEFAULT_MODEL),
            target: DEFAULT_TARGET.to_string(),
            features: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            dataset_path: get("DROPOUT_DATASET").map(PathBuf::from).unwrap_or(defaults.dataset_path),
            dtypes_path: get("DROPOUT_DTYPES").map(PathBuf::from),
            model_path: get("DROPOUT_MODEL").map(PathBuf::from).unwrap_or(defaults.model_path),
            target: get("DROPOUT_TARGET").unwrap_or(defaults.target),
            features: get("DROPOUT_FEATURES").map(|list| parse_feature_list(&list)),
        }
    }

    pub fn feature_selection(&self) -> FeatureSelection {
        match &self.features {
            Some(names) => FeatureSelection::Explicit(names.clone()),
            None => FeatureSelection::AllExcept(self.target.clone()),
        }
    }
}

fn parse_feature_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
