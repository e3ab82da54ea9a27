//! Case files, configuration and table output around `ensquant-core`.

pub mod error;
pub mod case_file;
pub mod config;
pub mod discover;
pub mod output;
pub mod manifest;
pub mod synth;
pub mod cli;

pub use error::{IoError, Result};
pub use case_file::{load_case, load_cases, write_case, INTERPOLATION_METADATA, TIME_COLUMN};
pub use config::{ConfigFile, OutputDecl, RunConfig};
pub use discover::expand_patterns;
pub use output::{format_date, write_table, write_target, write_targets, TableSummary, MISSING_SENTINEL};
pub use manifest::RunManifest;
pub use synth::SynthSpec;
pub use cli::*;
