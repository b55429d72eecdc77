//! Output generation modules.
//!
//! # Submodules
//!
//! - [`json`]: Writes and reads the pipeline's JSON artifacts (snapshots,
//!   collection summaries, curated analyses)

pub mod json;
