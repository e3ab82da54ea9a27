//! Ensemble time-series resampling and empirical quantiles.
//!
//! Cases are collected in an [`EnsembleBuilder`], frozen into an
//! [`Ensemble`] together with a shared [`TimeGrid`], and evaluated one grid
//! timestep at a time through a [`SampleCache`].

pub mod error;
pub mod time;
pub mod case;
pub mod grid;
pub mod ensemble;
pub mod cache;
pub mod quantile;
pub mod request;
pub mod table;

// Core types
pub type F = f64;
pub use time::{Time, TimeSpan, SECONDS_PER_DAY};
pub use error::{Error, Result};

// Cases
pub use case::{Case, Interpolation, Series, SummaryCase};

// Grid and ensemble
pub use grid::{TimeGrid, DEFAULT_RESOLUTION};
pub use ensemble::{Ensemble, EnsembleBuilder};
pub use cache::SampleCache;

// Quantiles and output rows
pub use quantile::{check_quantile, empirical_quantile};
pub use request::{OutputTarget, QuantileRequest, KEY_JOIN};
pub use table::{Row, TableEvaluator};
