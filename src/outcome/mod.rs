//! Raw label -> outcome taxonomy mapping.
//!
//! The mapping is declared next to the model artifact and versioned with it. A
//! raw label the table does not cover means the model and taxonomy are out of
//! step, so it is an error rather than a fallback.

use std::collections::BTreeMap;

use crate::domain::{ClassifyError, Outcome, OutcomeLabel, RawOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct ResultClassifier {
    version: String,
    labels: BTreeMap<i64, OutcomeLabel>,
}

impl ResultClassifier {
    pub fn new(version: impl Into<String>, labels: BTreeMap<i64, OutcomeLabel>) -> Self {
        Self {
            version: version.into(),
            labels,
        }
    }

    /// The reference system's mapping: 0 Dropout, 1 Enrolled, 2 Graduate.
    pub fn standard(version: impl Into<String>) -> Self {
        let labels = OutcomeLabel::ALL
            .iter()
            .enumerate()
            .map(|(raw, label)| (raw as i64, *label))
            .collect();
        Self::new(version, labels)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn label_for(&self, raw: i64) -> Option<OutcomeLabel> {
        self.labels.get(&raw).copied()
    }

    /// Raw labels in `classes` that the table does not map.
    pub fn unmapped<'a>(&'a self, classes: &'a [i64]) -> impl Iterator<Item = i64> + 'a {
        classes.iter().copied().filter(|c| !self.labels.contains_key(c))
    }

    pub fn classify(&self, raw: RawOutcome) -> Result<Outcome, ClassifyError> {
        let label = self
            .label_for(raw.label)
            .ok_or(ClassifyError::UnknownOutcomeLabel(raw.label))?;
        Ok(Outcome {
            label,
            raw,
            taxonomy_version: self.version.clone(),
        })
    }
}
