use tracing::debug;

use crate::{Case, Error, Result, TimeGrid, TimeSpan, F};

/// Cases collected before the grid exists.
#[derive(Default)]
pub struct EnsembleBuilder {
    cases: Vec<Box<dyn Case>>,
}

impl EnsembleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cases: Vec::with_capacity(capacity),
        }
    }

    /// Append a case; insertion order is kept as case order.
    pub fn add_case(&mut self, case: impl Case + 'static) {
        self.cases.push(Box::new(case));
    }

    pub fn add_boxed(&mut self, case: Box<dyn Case>) {
        self.cases.push(case);
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Union of all case spans, `None` without cases.
    pub fn span(&self) -> Option<TimeSpan> {
        self.cases
            .iter()
            .map(|case| case.span())
            .reduce(TimeSpan::union)
    }

    /// Freeze the case list and lay a grid of `resolution` points over it.
    pub fn build(self, resolution: usize) -> Result<Ensemble> {
        if resolution < 2 {
            return Err(Error::GridResolution(resolution));
        }
        let span = self.span().ok_or(Error::NoCases)?;
        let grid = TimeGrid::build(span, resolution)?;
        debug!(
            cases = self.cases.len(),
            points = grid.len(),
            start = span.start,
            end = span.end,
            "built time grid"
        );
        Ok(Ensemble {
            cases: self.cases,
            grid,
        })
    }
}

impl Extend<Box<dyn Case>> for EnsembleBuilder {
    fn extend<T: IntoIterator<Item = Box<dyn Case>>>(&mut self, iter: T) {
        self.cases.extend(iter);
    }
}

/// Immutable set of cases plus the grid they are compared on.
///
/// Safe to share between threads: all evaluation state lives in
/// per-worker [`SampleCache`](crate::SampleCache)s.
pub struct Ensemble {
    cases: Vec<Box<dyn Case>>,
    grid: TimeGrid,
}

impl Ensemble {
    pub fn cases(&self) -> impl Iterator<Item = &dyn Case> {
        self.cases.iter().map(|case| case.as_ref())
    }

    pub fn n_cases(&self) -> usize {
        self.cases.len()
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn span(&self) -> TimeSpan {
        self.grid.span()
    }

    /// Number of cases covering grid point `index`.
    pub fn coverage(&self, index: usize) -> Result<usize> {
        let t = self.grid.time_at(index)?;
        Ok(self.cases.iter().filter(|case| case.covers(t)).count())
    }

    /// Grid indices no case covers.
    pub fn uncovered_steps(&self) -> Vec<usize> {
        self.grid
            .points()
            .iter()
            .enumerate()
            .filter(|&(_, &t)| !self.cases.iter().any(|case| case.covers(t)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Values of `key` at grid point `index` from every covering case, in
    /// case order.
    pub fn sample_at(&self, key: &str, index: usize) -> Result<Vec<F>> {
        let mut values = Vec::with_capacity(self.cases.len());
        self.sample_into(key, index, &mut values)?;
        Ok(values)
    }

    /// Like [`sample_at`](Self::sample_at), appending into `out`.
    pub fn sample_into(&self, key: &str, index: usize, out: &mut Vec<F>) -> Result<()> {
        let t = self.grid.time_at(index)?;
        for case in self.cases.iter().filter(|case| case.covers(t)) {
            out.push(case.sample(key, t)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SummaryCase;

    fn flat(id: &str, start: f64, end: f64, value: f64) -> SummaryCase {
        SummaryCase::new(id, vec![start, end])
            .and_then(|c| c.with_series("FOPT", vec![value, value]))
            .unwrap()
    }

    #[test]
    fn test_empty_builder_fails() {
        let builder = EnsembleBuilder::new();
        assert!(builder.span().is_none());
        assert!(matches!(builder.build(10), Err(Error::NoCases)));
    }

    #[test]
    fn test_resolution_checked_before_span() {
        let builder = EnsembleBuilder::new();
        assert!(matches!(builder.build(1), Err(Error::GridResolution(1))));
    }

    #[test]
    fn test_span_is_fold_over_cases() {
        let mut builder = EnsembleBuilder::new();
        builder.add_case(flat("b", 20.0, 100.0, 3.0));
        builder.add_case(flat("a", 0.0, 80.0, 2.0));
        assert_eq!(builder.span(), Some(TimeSpan::new(0.0, 100.0)));
        let ensemble = builder.build(3).unwrap();
        assert_eq!(ensemble.n_cases(), 2);
        assert_eq!(ensemble.grid().points(), &[0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_sample_at_respects_coverage() {
        let mut builder = EnsembleBuilder::new();
        builder.add_case(flat("one", 0.0, 100.0, 1.0));
        builder.add_case(flat("two", 0.0, 70.0, 2.0));
        builder.add_case(flat("three", 20.0, 100.0, 3.0));
        let ensemble = builder.build(5).unwrap();

        assert_eq!(ensemble.sample_at("FOPT", 0).unwrap(), vec![1.0, 2.0]);
        assert_eq!(ensemble.sample_at("FOPT", 1).unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(ensemble.sample_at("FOPT", 3).unwrap(), vec![1.0, 3.0]);
        assert_eq!(ensemble.coverage(3).unwrap(), 2);
        assert!(ensemble.uncovered_steps().is_empty());
        assert!(ensemble.sample_at("FOPT", 5).is_err());
        assert!(matches!(
            ensemble.sample_at("FWPT", 2),
            Err(Error::UnknownSeries { .. })
        ));
    }

    #[test]
    fn test_gap_between_cases_is_uncovered() {
        let mut builder = EnsembleBuilder::new();
        builder.add_case(flat("early", 0.0, 10.0, 1.0));
        builder.add_case(flat("late", 90.0, 100.0, 1.0));
        let ensemble = builder.build(11).unwrap();
        assert_eq!(ensemble.uncovered_steps(), (2..9).collect::<Vec<_>>());
        assert!(ensemble.sample_at("FOPT", 5).unwrap().is_empty());
    }
}
