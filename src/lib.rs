//! `dropout-risk` library crate.
//!
//! The binary (`dropout`) is a thin wrapper around this library so that:
//!
//! - the prediction core is testable without spawning processes
//! - a hosting UI or service can embed `app::pipeline::Predictor` directly
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod encode;
pub mod error;
pub mod inference;
pub mod io;
pub mod models;
pub mod outcome;
pub mod report;
pub mod schema;
pub mod validate;
