//! Input/output helpers.
//!
//! - reference dataset CSV + dtype manifest (`dataset`)
//! - model artifact JSON read/write (`artifact`)
//! - batch request CSV ingest (`batch`)
//! - batch result exports (`export`)

pub mod artifact;
pub mod batch;
pub mod dataset;
pub mod export;

pub use artifact::*;
pub use batch::*;
pub use dataset::*;
pub use export::*;
