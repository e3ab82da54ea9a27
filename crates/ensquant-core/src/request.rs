use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::quantile::check_quantile;
use crate::{Error, Result, F};

/// Separator between a series mnemonic, its qualifiers and the quantile.
pub const KEY_JOIN: char = ':';

/// One output column: a series key and the quantile to report for it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuantileRequest {
    token: String,
    series_key: String,
    quantile: F,
}

impl QuantileRequest {
    /// Parse `SERIES(:QUALIFIER)*:QUANTILE`; the quantile is always the
    /// last field.
    pub fn parse(token: &str) -> Result<Self> {
        let (series_key, suffix) = token
            .rsplit_once(KEY_JOIN)
            .filter(|(series, _)| !series.is_empty())
            .ok_or_else(|| Error::MalformedToken(token.to_string()))?;

        let quantile: F = suffix.trim().parse().map_err(|_| Error::InvalidQuantile {
            token: token.to_string(),
            suffix: suffix.to_string(),
        })?;

        Ok(Self {
            token: token.to_string(),
            series_key: series_key.to_string(),
            quantile: check_quantile(quantile)?,
        })
    }

    /// The token as written, used as the column label.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn series_key(&self) -> &str {
        &self.series_key
    }

    pub fn quantile(&self) -> F {
        self.quantile
    }
}

impl FromStr for QuantileRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A destination and the columns to write there, in declaration order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutputTarget {
    pub destination: PathBuf,
    pub requests: Vec<QuantileRequest>,
}

impl OutputTarget {
    pub fn parse<I, S>(destination: impl Into<PathBuf>, tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let requests = tokens
            .into_iter()
            .map(|token| QuantileRequest::parse(token.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            destination: destination.into(),
            requests,
        })
    }

    /// Column labels in declaration order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.requests.iter().map(|r| r.token())
    }
}
