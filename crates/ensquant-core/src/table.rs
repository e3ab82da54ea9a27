use crate::{Ensemble, OutputTarget, QuantileRequest, Result, SampleCache, Time, F};

/// One evaluated grid timestep of an output target.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub index: usize,
    pub time: Time,
    /// Days since the ensemble start.
    pub days: F,
    /// One cell per request; `None` where no case covers the timestep.
    pub values: Vec<Option<F>>,
}

impl Row {
    pub fn missing(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Drives the ensemble and quantile evaluation row by row for one target.
pub struct TableEvaluator<'e> {
    ensemble: &'e Ensemble,
    requests: &'e [QuantileRequest],
    cache: SampleCache<'e>,
}

impl<'e> TableEvaluator<'e> {
    pub fn new(ensemble: &'e Ensemble, target: &'e OutputTarget) -> Self {
        Self::for_requests(ensemble, &target.requests)
    }

    pub fn for_requests(ensemble: &'e Ensemble, requests: &'e [QuantileRequest]) -> Self {
        Self {
            ensemble,
            requests,
            cache: SampleCache::new(ensemble),
        }
    }

    /// Number of rows, one per grid point.
    pub fn len(&self) -> usize {
        self.ensemble.grid().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn evaluate_row(&mut self, index: usize) -> Result<Row> {
        self.cache.advance(index)?;
        let grid = self.ensemble.grid();
        let values = self
            .requests
            .iter()
            .map(|request| self.cache.quantile(request.series_key(), request.quantile()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Row {
            index,
            time: grid.time_at(index)?,
            days: grid.days_at(index)?,
            values,
        })
    }

    /// Rows in grid order, stopping at the first error.
    pub fn evaluate_all(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(self.len());
        for index in 0..self.len() {
            rows.push(self.evaluate_row(index)?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnsembleBuilder, SummaryCase, SECONDS_PER_DAY};

    #[test]
    fn test_rows_follow_grid_and_request_order() {
        let day = SECONDS_PER_DAY;
        let mut builder = EnsembleBuilder::new();
        for (id, scale) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            builder.add_case(
                SummaryCase::new(id, vec![0.0, 10.0 * day])
                    .and_then(|c| c.with_series("FOPT", vec![0.0, 100.0 * scale]))
                    .and_then(|c| c.with_series("FWPT", vec![scale, scale]))
                    .unwrap(),
            );
        }
        let ensemble = builder.build(3).unwrap();
        let target = OutputTarget::parse("t", ["FWPT:0.5", "FOPT:0.0", "FOPT:0.5"]).unwrap();

        let rows = TableEvaluator::new(&ensemble, &target).evaluate_all().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].days, 5.0);
        assert_eq!(rows[2].values, vec![Some(2.0), Some(100.0), Some(200.0)]);
        assert!(rows.iter().all(|r| r.values.len() == 3 && r.missing() == 0));
    }
}
