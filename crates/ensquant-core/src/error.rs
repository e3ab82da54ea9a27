//! Engine errors

use thiserror::Error;

use crate::{Time, F};

/// Engine result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building an ensemble or evaluating quantiles.
///
/// All of them are fatal to a run: nothing in the engine degrades to a
/// partial ensemble.
#[derive(Debug, Error)]
pub enum Error {
    #[error("grid resolution must be at least 2, got {0}")]
    GridResolution(usize),

    #[error("no cases loaded, the ensemble has no time span")]
    NoCases,

    #[error("time span [{start}, {end}] cannot hold a strictly increasing grid")]
    DegenerateSpan { start: Time, end: Time },

    #[error("timestep {index} out of range for a grid of {len} points")]
    TimestepOutOfRange { index: usize, len: usize },

    #[error("malformed key `{0}`: must be of the form SERIES:QUANTILE")]
    MalformedToken(String),

    #[error("failed to interpret `{suffix}` in `{token}` as a quantile")]
    InvalidQuantile { token: String, suffix: String },

    #[error("quantile {0} outside [0, 1)")]
    QuantileOutOfRange(F),

    #[error("empirical quantile of an empty sample")]
    EmptySample,

    #[error("case {case}: unknown series `{key}`")]
    UnknownSeries { case: String, key: String },

    #[error("case {case}: time {time} outside [{start}, {end}]")]
    OutsideSpan { case: String, time: Time, start: Time, end: Time },

    #[error("case {case}: {message}")]
    InvalidCase { case: String, message: String },
}

impl Error {
    pub(crate) fn invalid_case(case: &str, message: impl Into<String>) -> Self {
        Error::InvalidCase {
            case: case.to_string(),
            message: message.into(),
        }
    }
}
