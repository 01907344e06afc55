//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{FeatureDomain, FeatureImportance, Outcome, PredictError};
use crate::inference::ModelInfo;
use crate::io::batch::BatchRow;
use crate::outcome::ResultClassifier;
use crate::report::{BatchSummary, error_class_name};
use crate::schema::Schema;

const BAR_WIDTH: usize = 40;

/// Format the derived schema as a table (one feature per line, in column order).
pub fn format_schema(schema: &Schema) -> String {
    let mut out = String::new();
    let name_w = schema.names().map(str::len).max().unwrap_or(0).max(7);

    out.push_str(&format!("=== Feature schema ({} features) ===\n", schema.len()));
    out.push_str(&format!("{:>3}  {:<name_w$}  {:<11}  {}\n", "#", "feature", "kind", "domain"));

    for (idx, spec) in schema.features().iter().enumerate() {
        let domain = match spec.domain() {
            FeatureDomain::Numeric(d) => format!(
                "[{}, {}] mean={:.3}",
                fmt_num(d.min),
                fmt_num(d.max),
                d.mean
            ),
            FeatureDomain::Categorical { levels } => format!("{{{}}}", levels.join(", ")),
        };
        out.push_str(&format!(
            "{:>3}  {:<name_w$}  {:<11}  {}\n",
            idx,
            spec.name(),
            spec.kind().display_name(),
            domain
        ));
    }

    out
}

/// Format one classified outcome with its class probabilities.
pub fn format_outcome(outcome: &Outcome, classes: &[i64], classifier: &ResultClassifier) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Predicted status: {} (raw label {}, score {:.3}, taxonomy {})\n",
        outcome.label,
        outcome.raw.label,
        outcome.raw.score(),
        outcome.taxonomy_version
    ));
    out.push_str("\nClass probabilities:\n");
    for (class, p) in classes.iter().zip(&outcome.raw.probabilities) {
        let name = classifier
            .label_for(*class)
            .map(|l| l.display_name())
            .unwrap_or("(unmapped)");
        let chosen = if *class == outcome.raw.label { "*" } else { " " };
        out.push_str(&format!("{chosen} {class:>3} {name:<10} {p:>6.3} {}\n", bar(*p, 1.0)));
    }

    out
}

/// Format the top-N feature importances as a horizontal bar chart.
pub fn format_importances(ranking: &[FeatureImportance], top_n: usize) -> String {
    let mut out = String::new();
    let shown = &ranking[..ranking.len().min(top_n)];
    let name_w = shown.iter().map(|f| f.feature.len()).max().unwrap_or(0);
    let max = shown.iter().map(|f| f.importance).fold(0.0, f64::max);

    out.push_str(&format!("Top {} features by importance:\n", shown.len()));
    for (rank, f) in shown.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {:<name_w$}  {:>8.4}  {}\n",
            rank + 1,
            f.feature,
            f.importance,
            bar(f.importance, max)
        ));
    }

    out
}

pub fn format_model_info(info: &ModelInfo) -> String {
    format!(
        "Model: {} | features={} | classes={:?} | taxonomy={} | loaded {}\n",
        info.estimator,
        info.n_features,
        info.classes,
        info.taxonomy_version,
        info.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Format a batch run: per-label counts, then one line per failed row.
pub fn format_batch(summary: &BatchSummary, rows: &[BatchRow], results: &[Result<Outcome, PredictError>]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Scored {} rows: {} ok, {} failed\n",
        summary.total,
        summary.total - summary.failed(),
        summary.failed()
    ));
    for (label, count) in &summary.by_label {
        out.push_str(&format!("  {label:<10} {count}\n"));
    }
    if summary.drift > 0 {
        out.push_str(&format!(
            "\nWARNING: {} rows hit schema/model drift; check the model artifact against the dataset.\n",
            summary.drift
        ));
    }

    let failures: Vec<(usize, &PredictError)> = rows
        .iter()
        .zip(results)
        .filter_map(|(row, r)| r.as_ref().err().map(|e| (row.line, e)))
        .collect();
    if !failures.is_empty() {
        out.push_str("\nRow errors:\n");
        for (line, err) in failures {
            out.push_str(&format!("  line {line:>5} [{}] {err}\n", error_class_name(err.class())));
        }
    }

    out
}

fn bar(value: f64, max: f64) -> String {
    if !(value.is_finite() && max.is_finite()) || max <= 0.0 {
        return String::new();
    }
    let n = ((value / max).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(n)
}

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.3}")
    }
}
