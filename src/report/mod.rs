//! Reporting utilities: batch summaries and formatted terminal output.

pub mod format;

pub use format::*;

use std::collections::BTreeMap;

use crate::domain::{ErrorClass, Outcome, OutcomeLabel, PredictError};

/// Counts over a batch of prediction results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub by_label: BTreeMap<&'static str, usize>,
    pub invalid_input: usize,
    pub drift: usize,
    pub inference: usize,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.invalid_input + self.drift + self.inference
    }
}

pub fn summarize(results: &[Result<Outcome, PredictError>]) -> BatchSummary {
    let mut summary = BatchSummary {
        total: results.len(),
        by_label: OutcomeLabel::ALL.iter().map(|l| (l.display_name(), 0)).collect(),
        ..BatchSummary::default()
    };

    for result in results {
        match result {
            Ok(outcome) => *summary.by_label.entry(outcome.label.display_name()).or_default() += 1,
            Err(err) => match err.class() {
                ErrorClass::InvalidInput => summary.invalid_input += 1,
                ErrorClass::Drift => summary.drift += 1,
                ErrorClass::Inference => summary.inference += 1,
            },
        }
    }

    summary
}

/// Stable machine-readable name for an error class.
pub fn error_class_name(class: ErrorClass) -> &'static str {
    match class {
        ErrorClass::InvalidInput => "invalid_input",
        ErrorClass::Drift => "drift",
        ErrorClass::Inference => "inference",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassifyError, RawOutcome, ValidationError};

    #[test]
    fn summary_counts_labels_and_error_classes() {
        let ok = |label| {
            Ok(Outcome {
                label,
                raw: RawOutcome {
                    label: 0,
                    probabilities: vec![1.0],
                },
                taxonomy_version: "v1".into(),
            })
        };
        let results = vec![
            ok(OutcomeLabel::Dropout),
            ok(OutcomeLabel::Dropout),
            ok(OutcomeLabel::Graduate),
            Err(PredictError::from(ValidationError::MissingFeature("Debtor".into()))),
            Err(PredictError::from(ClassifyError::UnknownOutcomeLabel(5))),
        ];
        let summary = summarize(&results);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.by_label["Dropout"], 2);
        assert_eq!(summary.by_label["Enrolled"], 0);
        assert_eq!(summary.by_label["Graduate"], 1);
        assert_eq!(summary.invalid_input, 1);
        assert_eq!(summary.drift, 1);
        assert_eq!(summary.failed(), 2);
    }
}
