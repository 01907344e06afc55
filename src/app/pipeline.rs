//! Shared prediction pipeline used by every front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! raw input -> validate -> encode -> classify -> outcome
//!
//! The schema, model and outcome table are loaded once and only read afterwards,
//! so a `Predictor` can be shared across threads without locking.

use std::path::Path;

use rayon::prelude::*;

use crate::config::AppConfig;
use crate::domain::{ModelLoadError, Outcome, PredictError, RawInput, StartupError};
use crate::encode::encode;
use crate::inference::InferenceAdapter;
use crate::io::artifact::{ModelArtifact, read_artifact_json};
use crate::io::dataset::{DtypeManifest, ReferenceDataset};
use crate::outcome::ResultClassifier;
use crate::schema::{self, Schema};
use crate::validate::validate;

#[derive(Debug, Clone)]
pub struct Predictor {
    schema: Schema,
    adapter: InferenceAdapter,
    classifier: ResultClassifier,
}

impl Predictor {
    /// Build the schema from the reference dataset, then load and bind the model.
    pub fn load(config: &AppConfig) -> Result<Self, StartupError> {
        let dtypes = match &config.dtypes_path {
            Some(path) => DtypeManifest::from_json_path(path)?,
            None => DtypeManifest::new(),
        };
        let dataset = ReferenceDataset::from_csv_path(&config.dataset_path, &dtypes)?;
        let schema = schema::build(&dataset, &config.feature_selection())?;
        let predictor = Self::with_model_path(schema, &config.model_path)?;
        Ok(predictor)
    }

    pub fn with_model_path(schema: Schema, path: &Path) -> Result<Self, ModelLoadError> {
        log::info!("Loading model artifact from: {}", path.display());
        let artifact = read_artifact_json(path)?;
        Self::from_parts(schema, artifact)
    }

    pub fn from_parts(schema: Schema, artifact: ModelArtifact) -> Result<Self, ModelLoadError> {
        let classifier = outcome_table(&artifact);
        let adapter = InferenceAdapter::from_artifact(artifact, &schema)?;
        Ok(Self {
            schema,
            adapter,
            classifier,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn adapter(&self) -> &InferenceAdapter {
        &self.adapter
    }

    pub fn classifier(&self) -> &ResultClassifier {
        &self.classifier
    }

    /// Run one request through the full pipeline.
    pub fn predict(&self, raw: &RawInput) -> Result<Outcome, PredictError> {
        let result = self.run(raw);
        if let Err(err) = &result {
            if err.is_drift() {
                log::warn!("Schema/model drift: {err}");
            } else {
                log::debug!("Prediction rejected: {err}");
            }
        }
        result
    }

    /// Run independent requests in parallel; results keep input order.
    pub fn predict_batch(&self, inputs: &[RawInput]) -> Vec<Result<Outcome, PredictError>> {
        inputs.par_iter().map(|raw| self.predict(raw)).collect()
    }

    fn run(&self, raw: &RawInput) -> Result<Outcome, PredictError> {
        let record = validate(raw, &self.schema)?;
        let encoded = encode(&record, &self.schema, self.adapter.encoding())?;
        let raw_outcome = self.adapter.classify(&encoded)?;
        Ok(self.classifier.classify(raw_outcome)?)
    }
}

fn outcome_table(artifact: &ModelArtifact) -> ResultClassifier {
    let classifier = if artifact.outcome_labels.is_empty() {
        ResultClassifier::standard(artifact.taxonomy_version.clone())
    } else {
        ResultClassifier::new(artifact.taxonomy_version.clone(), artifact.outcome_labels.clone())
    };
    for class in classifier.unmapped(&artifact.classes) {
        log::warn!(
            "Model class {class} has no outcome label in taxonomy {}",
            classifier.version()
        );
    }
    classifier
}
