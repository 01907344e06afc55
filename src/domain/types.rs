//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - handed to a presentation layer (forms, tables) as plain data
//! - exported to JSON/CSV
//! - built once at startup and shared read-only across requests

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How a feature is presented to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

impl FeatureKind {
    pub fn display_name(self) -> &'static str {
        match self {
            FeatureKind::Numeric => "numeric",
            FeatureKind::Categorical => "categorical",
        }
    }
}

/// Advisory range of a numeric feature, computed over the reference dataset.
///
/// The bounds seed UI sliders and defaults; they are never enforced on input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericDomain {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Value domain of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum FeatureDomain {
    Numeric(NumericDomain),
    /// Levels in the exact order the dataset declares them.
    Categorical { levels: Vec<String> },
}

/// One feature of the canonical schema. Immutable once derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    name: String,
    domain: FeatureDomain,
}

impl FeatureSpec {
    pub fn numeric(name: impl Into<String>, domain: NumericDomain) -> Self {
        Self {
            name: name.into(),
            domain: FeatureDomain::Numeric(domain),
        }
    }

    pub fn categorical(name: impl Into<String>, levels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            domain: FeatureDomain::Categorical { levels },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FeatureKind {
        match self.domain {
            FeatureDomain::Numeric(_) => FeatureKind::Numeric,
            FeatureDomain::Categorical { .. } => FeatureKind::Categorical,
        }
    }

    pub fn domain(&self) -> &FeatureDomain {
        &self.domain
    }

    /// Declared levels, or `None` for numeric features.
    pub fn levels(&self) -> Option<&[String]> {
        match &self.domain {
            FeatureDomain::Categorical { levels } => Some(levels),
            FeatureDomain::Numeric(_) => None,
        }
    }

    /// Default value for an input form: the mean for numeric features, the first
    /// declared level for categorical ones.
    pub fn default_value(&self) -> Option<RawValue> {
        match &self.domain {
            FeatureDomain::Numeric(d) => Some(RawValue::Number(d.mean)),
            FeatureDomain::Categorical { levels } => levels.first().cloned().map(RawValue::Text),
        }
    }
}

/// A user-supplied scalar, untyped at the boundary.
///
/// Numeric widgets yield numbers, selection widgets yield level strings. CSV
/// cells always arrive as text and are coerced during validation. Any other
/// JSON value (bool, null, array, object) is kept as `Other` so validation can
/// reject it against the feature it was given for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawValue {
    /// Short name of the value's type, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RawValue::Number(_) | RawValue::Other(serde_json::Value::Number(_)) => "number",
            RawValue::Text(_) | RawValue::Other(serde_json::Value::String(_)) => "text",
            RawValue::Other(serde_json::Value::Bool(_)) => "boolean",
            RawValue::Other(serde_json::Value::Null) => "null",
            RawValue::Other(serde_json::Value::Array(_)) => "array",
            RawValue::Other(serde_json::Value::Object(_)) => "object",
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(v) => write!(f, "{v}"),
            RawValue::Text(s) => write!(f, "{s}"),
            RawValue::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// Raw input for one prediction request: feature name -> scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInput(HashMap<String, RawValue>);

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `{"feature": value}` pairs.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Option<RawValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<RawValue> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.0.get(name)
    }

    /// Overlay every entry of `other` on top of `self`.
    pub fn merge(&mut self, other: RawInput) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, RawValue)> for RawInput {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A typed, domain-checked feature value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
}

/// One value per schema feature, in schema order, no missing or extra keys.
///
/// Only the validator constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    entries: Vec<(String, FeatureValue)>,
}

impl ValidatedRecord {
    pub(crate) fn new(entries: Vec<(String, FeatureValue)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single model-ready row: columns in training order, categorical values as
/// level codes in the model's level-index space.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl EncodedRecord {
    pub(crate) fn new(columns: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Domain-level outcome taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeLabel {
    Dropout,
    Enrolled,
    Graduate,
}

impl OutcomeLabel {
    pub const ALL: [OutcomeLabel; 3] = [OutcomeLabel::Dropout, OutcomeLabel::Enrolled, OutcomeLabel::Graduate];

    pub fn display_name(self) -> &'static str {
        match self {
            OutcomeLabel::Dropout => "Dropout",
            OutcomeLabel::Enrolled => "Enrolled",
            OutcomeLabel::Graduate => "Graduate",
        }
    }
}

impl fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Raw estimator output for one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawOutcome {
    /// Raw class label (e.g. 0/1/2).
    pub label: i64,
    /// Class probabilities, aligned with the artifact's `classes`.
    pub probabilities: Vec<f64>,
}

impl RawOutcome {
    /// Probability of the predicted class.
    pub fn score(&self) -> f64 {
        self.probabilities.iter().copied().fold(f64::NAN, f64::max)
    }
}

/// Classified prediction returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub label: OutcomeLabel,
    pub raw: RawOutcome,
    pub taxonomy_version: String,
}

/// One entry of the static feature-importance ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}
