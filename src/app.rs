//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves configuration (environment + flags)
//! - loads the schema and model once
//! - dispatches to the requested command and prints results

use clap::Parser;

use crate::cli::{BatchArgs, Command, ImportanceArgs, PredictArgs, SchemaArgs, SourceArgs};
use crate::config::AppConfig;
use crate::domain::{RawInput, RawValue};
use crate::error::{AppError, EXIT_CONFIG, EXIT_INVALID_INPUT};

pub mod pipeline;

use pipeline::Predictor;

/// Entry point for the `dropout` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    let config = resolve_config(AppConfig::from_env(), &cli.sources);
    log::debug!("Resolved configuration: {config:?}");

    let predictor = Predictor::load(&config)?;

    match cli.command {
        Command::Schema(args) => handle_schema(&predictor, args),
        Command::Predict(args) => handle_predict(&predictor, args),
        Command::Batch(args) => handle_batch(&predictor, args),
        Command::Importance(args) => handle_importance(&predictor, args),
    }
}

/// Apply CLI overrides on top of the environment configuration.
pub fn resolve_config(mut config: AppConfig, sources: &SourceArgs) -> AppConfig {
    if let Some(path) = &sources.dataset {
        config.dataset_path = path.clone();
    }
    if let Some(path) = &sources.dtypes {
        config.dtypes_path = Some(path.clone());
    }
    if let Some(path) = &sources.model {
        config.model_path = path.clone();
    }
    if let Some(target) = &sources.target {
        config.target = target.clone();
    }
    config
}

fn handle_schema(predictor: &Predictor, args: SchemaArgs) -> Result<(), AppError> {
    let schema = predictor.schema();
    if args.json {
        println!("{}", to_json(&schema.features())?);
    } else {
        print!("{}", crate::report::format_schema(schema));
        print!("{}", crate::report::format_model_info(predictor.adapter().info()));
    }
    Ok(())
}

fn handle_predict(predictor: &Predictor, args: PredictArgs) -> Result<(), AppError> {
    let raw = build_raw_input(predictor, &args)?;
    let outcome = predictor.predict(&raw)?;

    if args.json {
        println!("{}", to_json(&outcome)?);
    } else {
        print!(
            "{}",
            crate::report::format_outcome(
                &outcome,
                &predictor.adapter().info().classes,
                predictor.classifier()
            )
        );
    }
    Ok(())
}

fn handle_batch(predictor: &Predictor, args: BatchArgs) -> Result<(), AppError> {
    let rows = crate::io::batch::read_batch_csv(&args.input)?;
    let inputs: Vec<RawInput> = rows.iter().map(|r| r.input.clone()).collect();
    let results = predictor.predict_batch(&inputs);
    let summary = crate::report::summarize(&results);

    print!("{}", crate::report::format_batch(&summary, &rows, &results));

    if let Some(path) = &args.export {
        crate::io::export::write_results_csv(path, &rows, &results, &predictor.adapter().info().classes)?;
        println!("Results written to {}", path.display());
    }
    Ok(())
}

fn handle_importance(predictor: &Predictor, args: ImportanceArgs) -> Result<(), AppError> {
    let ranking = predictor.adapter().feature_importances().ok_or_else(|| {
        AppError::new(
            EXIT_CONFIG,
            format!(
                "The loaded {} model does not expose feature importances.",
                predictor.adapter().info().estimator
            ),
        )
    })?;

    if args.json {
        println!("{}", to_json(&ranking)?);
    } else {
        print!("{}", crate::report::format_importances(&ranking, args.top));
    }
    Ok(())
}

/// Form defaults, then the JSON input file, then each `--set` override.
fn build_raw_input(predictor: &Predictor, args: &PredictArgs) -> Result<RawInput, AppError> {
    let mut raw = if args.no_defaults {
        RawInput::new()
    } else {
        predictor.schema().default_input()
    };

    if let Some(path) = &args.input {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to read input '{}': {e}", path.display())))?;
        let from_file = RawInput::from_json(&text)
            .map_err(|e| AppError::new(EXIT_INVALID_INPUT, format!("Invalid input JSON: {e}")))?;
        raw.merge(from_file);
    }

    for (name, value) in &args.set {
        if predictor.schema().feature(name).is_none() {
            log::warn!("Ignoring override for unknown feature `{name}`");
        }
        raw.set(name.clone(), RawValue::Text(value.clone()));
    }

    Ok(raw)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to encode JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn flags_override_environment() {
        let env = AppConfig {
            model_path: PathBuf::from("env_model.json"),
            ..AppConfig::default()
        };
        let sources = SourceArgs {
            model: Some(PathBuf::from("flag_model.json")),
            target: Some("Status".to_string()),
            ..SourceArgs::default()
        };
        let config = resolve_config(env, &sources);
        assert_eq!(config.model_path, PathBuf::from("flag_model.json"));
        assert_eq!(config.target, "Status");
        assert_eq!(config.dataset_path, PathBuf::from(crate::config::DEFAULT_DATASET));
    }
}
