//! Raw input validation.
//!
//! Strict on type and category membership, permissive on numeric range: the
//! `[min, max]` domain only seeds UI controls, so out-of-range numbers pass
//! through unchanged. Extra keys in the raw input are ignored.

use crate::domain::{FeatureDomain, FeatureValue, RawInput, RawValue, ValidatedRecord, ValidationError};
use crate::schema::Schema;

/// Turn one raw input into a record with exactly one typed value per feature.
///
/// Features are checked in schema order, so the first failing feature is the
/// one reported.
pub fn validate(raw: &RawInput, schema: &Schema) -> Result<ValidatedRecord, ValidationError> {
    let mut entries = Vec::with_capacity(schema.len());

    for spec in schema.features() {
        let name = spec.name();
        let value = raw
            .get(name)
            .ok_or_else(|| ValidationError::MissingFeature(name.to_string()))?;

        let typed = match spec.domain() {
            FeatureDomain::Numeric(_) => {
                let v = coerce_numeric(value).ok_or_else(|| ValidationError::TypeMismatch(name.to_string()))?;
                FeatureValue::Numeric(v)
            }
            FeatureDomain::Categorical { levels } => {
                let level = match value {
                    RawValue::Text(s) if levels.iter().any(|l| l == s) => s.clone(),
                    RawValue::Text(s) => {
                        return Err(ValidationError::InvalidCategory(name.to_string(), s.clone()));
                    }
                    other => {
                        let given = format!("{other} (given as {}, expected a level name)", other.kind_name());
                        return Err(ValidationError::InvalidCategory(name.to_string(), given));
                    }
                };
                FeatureValue::Categorical(level)
            }
        };

        entries.push((name.to_string(), typed));
    }

    Ok(ValidatedRecord::new(entries))
}

/// Numbers pass as-is; text must parse as a number. Either way it must be finite.
/// Booleans, nulls and containers never coerce.
fn coerce_numeric(value: &RawValue) -> Option<f64> {
    let v = match value {
        RawValue::Number(v) => *v,
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        RawValue::Other(_) => return None,
    };
    v.is_finite().then_some(v)
}
