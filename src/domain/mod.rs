//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - schema metadata (`FeatureSpec`, `FeatureDomain`, `NumericDomain`)
//! - per-request records (`RawInput`, `ValidatedRecord`, `EncodedRecord`)
//! - results (`RawOutcome`, `Outcome`, `OutcomeLabel`)
//! - the error taxonomy (`errors`)

pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
