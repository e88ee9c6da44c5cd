//! Update Census Library
//!
//! Estimates the number of distinct active installations and client IPs per
//! calendar day from an update-check API access log (one JSON record per
//! line, in timestamp order).
//!
//! A single day's raw traffic undercounts installations that check for
//! updates infrequently, so every observed check is counted as evidence of
//! activity across a sliding window of days centered on its own day. A day
//! is reported once its window can no longer change. Installations that
//! sent no identifier are estimated by extrapolating the identified
//! population's sites-per-IP ratio onto the unidentified IPs.
//!
//! ## Architecture
//!
//! - [`models`] - record, classification, estimate, and report types
//! - [`parser`] - streaming JSON-lines reader and timestamp parsing
//! - [`extractor`] - per-record identifier derivation
//! - [`window`] - day-bucket sets across the sliding validity window
//! - [`ordering`] - timestamp ordering guard with bounded jitter tolerance
//! - [`report`] - closed-day report formatting (text and JSON)
//! - [`analyzer`] - the record-by-record driver tying it all together
//! - [`config`] / [`logging`] - configuration and structured logging
//!
//! ## Main Entry Point
//!
//! ```no_run
//! use update_census::analyzer::{LogAnalyzer, RunOptions};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut analyzer = LogAnalyzer::new(RunOptions::default());
//! analyzer.analyze_file(Path::new("access.log"))?;
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod extractor;
pub mod logging;
pub mod models;
pub mod ordering;
pub mod parser;
pub mod report;
pub mod window;

pub use analyzer::{LogAnalyzer, RunOptions};
pub use models::*;
