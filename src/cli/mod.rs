//! Command-line parsing for the dropout-risk predictor.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dropout", version, about = "Student dropout-risk predictor")]
pub struct Cli {
    #[command(flatten)]
    pub sources: SourceArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Locations of the read-only inputs. Unset flags fall back to the environment.
#[derive(Debug, Args, Clone, Default)]
pub struct SourceArgs {
    /// Reference dataset CSV (env: DROPOUT_DATASET).
    #[arg(long, global = true, value_name = "CSV")]
    pub dataset: Option<PathBuf>,

    /// Dtype manifest JSON declaring categorical columns (env: DROPOUT_DTYPES).
    #[arg(long, global = true, value_name = "JSON")]
    pub dtypes: Option<PathBuf>,

    /// Model artifact JSON (env: DROPOUT_MODEL).
    #[arg(long, global = true, value_name = "JSON")]
    pub model: Option<PathBuf>,

    /// Target column excluded from the features (env: DROPOUT_TARGET).
    #[arg(long, global = true)]
    pub target: Option<String>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the feature schema derived from the reference dataset.
    Schema(SchemaArgs),
    /// Predict the status of one student.
    ///
    /// Starts from the form defaults (mean / first level), applies `--input`,
    /// then each `--set`.
    Predict(PredictArgs),
    /// Score every row of a CSV file.
    Batch(BatchArgs),
    /// Print the model's static feature-importance ranking.
    Importance(ImportanceArgs),
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// JSON object of feature values.
    #[arg(long, value_name = "JSON")]
    pub input: Option<PathBuf>,

    /// Override one feature, e.g. `--set "Age at enrollment=19"`.
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Do not start from the form defaults; every feature must be supplied.
    #[arg(long)]
    pub no_defaults: bool,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// CSV with one column per feature.
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Export per-row results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImportanceArgs {
    /// Show the top-N features.
    #[arg(long, default_value_t = 15)]
    pub top: usize,

    /// Emit JSON instead of a chart.
    #[arg(long)]
    pub json: bool,
}

/// Parse `NAME=VALUE`. Names may contain spaces; the first `=` splits. Only the
/// name is trimmed, the value is passed through as typed.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
