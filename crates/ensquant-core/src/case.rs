use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Time, TimeSpan, F};

/// One simulation run: a valid time span and named scalar series.
///
/// How a series is resampled between its reported times belongs to the
/// implementation; the ensemble only ever asks for a value at a timestamp
/// the case covers.
pub trait Case: Send + Sync {
    /// Identifier of the case, usually its source path.
    fn id(&self) -> &str;

    fn span(&self) -> TimeSpan;

    fn covers(&self, t: Time) -> bool {
        self.span().contains(t)
    }

    /// Value of `key` at simulated time `t`.
    fn sample(&self, key: &str, t: Time) -> Result<F>;
}

/// Resampling rule for a series between two reported times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Straight line between the surrounding reports.
    Linear,
    /// Value of the first report at or after the requested time. Rates are
    /// reported at the end of the interval they apply to.
    Step,
}

/// Variable mnemonic suffixes reported as rates or ratios.
const RATE_SUFFIXES: &[&str] = &[
    "OPR", "WPR", "GPR", "LPR", "WIR", "GIR", "WCT", "GOR", "WGR", "OGR",
];

impl Interpolation {
    /// Default rule for a series key, judged from its variable mnemonic
    /// (the part before the first qualifier).
    pub fn for_key(key: &str) -> Self {
        let mnemonic = key.split(crate::KEY_JOIN).next().unwrap_or(key);
        if RATE_SUFFIXES.iter().any(|suffix| mnemonic.ends_with(suffix)) {
            Interpolation::Step
        } else {
            Interpolation::Linear
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Linear => "linear",
            Interpolation::Step => "step",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(Interpolation::Linear),
            "step" => Some(Interpolation::Step),
            _ => None,
        }
    }
}

/// Values of one series, aligned with the case's report times.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub values: Vec<F>,
    pub interpolation: Interpolation,
}

/// In-memory case: strictly increasing report times plus series sampled at
/// those times.
#[derive(Clone, Debug)]
pub struct SummaryCase {
    id: String,
    times: Vec<Time>,
    series: BTreeMap<String, Series>,
}

impl SummaryCase {
    pub fn new(id: impl Into<String>, times: Vec<Time>) -> Result<Self> {
        let id = id.into();
        if times.is_empty() {
            return Err(Error::invalid_case(&id, "no report times"));
        }
        if let Some(bad) = times.iter().find(|t| !t.is_finite()) {
            return Err(Error::invalid_case(&id, format!("non-finite report time {bad}")));
        }
        if let Some(pair) = times.windows(2).find(|w| w[1] <= w[0]) {
            return Err(Error::invalid_case(
                &id,
                format!("report times not strictly increasing: {} then {}", pair[0], pair[1]),
            ));
        }
        Ok(Self {
            id,
            times,
            series: BTreeMap::new(),
        })
    }

    /// Add a series using the key's default interpolation.
    pub fn with_series(mut self, key: &str, values: Vec<F>) -> Result<Self> {
        self.insert_series(key, values, Interpolation::for_key(key))?;
        Ok(self)
    }

    pub fn insert_series(
        &mut self,
        key: &str,
        values: Vec<F>,
        interpolation: Interpolation,
    ) -> Result<()> {
        if values.len() != self.times.len() {
            return Err(Error::invalid_case(
                &self.id,
                format!(
                    "series `{key}` has {} values for {} report times",
                    values.len(),
                    self.times.len()
                ),
            ));
        }
        self.series.insert(key.to_string(), Series { values, interpolation });
        Ok(())
    }

    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Series in key order.
    pub fn series(&self) -> impl Iterator<Item = (&str, &Series)> {
        self.series.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.series.contains_key(key)
    }
}

impl Case for SummaryCase {
    fn id(&self) -> &str {
        &self.id
    }

    fn span(&self) -> TimeSpan {
        // `new` rejects empty time vectors
        TimeSpan::new(self.times[0], self.times[self.times.len() - 1])
    }

    fn sample(&self, key: &str, t: Time) -> Result<F> {
        let series = self.series.get(key).ok_or_else(|| Error::UnknownSeries {
            case: self.id.clone(),
            key: key.to_string(),
        })?;

        let span = self.span();
        if !span.contains(t) {
            return Err(Error::OutsideSpan {
                case: self.id.clone(),
                time: t,
                start: span.start,
                end: span.end,
            });
        }

        // First report at or after t; exists because t <= end.
        let hi = self.times.partition_point(|&x| x < t);
        if self.times[hi] == t || hi == 0 {
            return Ok(series.values[hi]);
        }

        match series.interpolation {
            Interpolation::Step => Ok(series.values[hi]),
            Interpolation::Linear => {
                let lo = hi - 1;
                let (t0, t1) = (self.times[lo], self.times[hi]);
                let (v0, v1) = (series.values[lo], series.values[hi]);
                let w = (t - t0) / (t1 - t0);
                Ok(v0 + w * (v1 - v0))
            }
        }
    }
}
