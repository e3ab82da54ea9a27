use crate::{Error, Result, Time, TimeSpan, F};

/// Grid resolution used when the configuration does not set one.
pub const DEFAULT_RESOLUTION: usize = 50;

/// Shared, evenly spaced sample timestamps covering an ensemble's span.
///
/// `points[0]` is the span start and `points[n - 1]` the span end, exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeGrid {
    points: Vec<Time>,
    span: TimeSpan,
}

impl TimeGrid {
    /// Build `n` evenly spaced points over `span`.
    pub fn build(span: TimeSpan, n: usize) -> Result<Self> {
        if n < 2 {
            return Err(Error::GridResolution(n));
        }
        if !(span.start < span.end) {
            return Err(Error::DegenerateSpan {
                start: span.start,
                end: span.end,
            });
        }

        let last = n - 1;
        let duration = span.duration();
        let points: Vec<Time> = (0..n)
            .map(|i| {
                if i == last {
                    span.end
                } else {
                    span.start + i as F * duration / last as F
                }
            })
            .collect();

        // Spans too short for the float resolution at this magnitude collapse.
        if points.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::DegenerateSpan {
                start: span.start,
                end: span.end,
            });
        }

        Ok(Self { points, span })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Time] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<Time> {
        self.points.get(index).copied()
    }

    pub fn span(&self) -> TimeSpan {
        self.span
    }

    /// Timestamp at `index`, or an error naming the grid size.
    pub fn time_at(&self, index: usize) -> Result<Time> {
        self.get(index).ok_or(Error::TimestepOutOfRange {
            index,
            len: self.points.len(),
        })
    }

    /// Elapsed days between the grid start and the point at `index`.
    pub fn days_at(&self, index: usize) -> Result<F> {
        Ok(self.span.days_since_start(self.time_at(index)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_endpoints_and_spacing() {
        let grid = TimeGrid::build(TimeSpan::new(0.0, 100.0), 5).unwrap();
        assert_eq!(grid.points(), &[0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(grid.days_at(4).unwrap(), 100.0 / 86_400.0);
    }

    #[test]
    fn test_grid_properties_over_resolutions() {
        let span = TimeSpan::new(1.2e9, 1.2e9 + 3.0e8 + 0.37);
        for n in 2..300 {
            let grid = TimeGrid::build(span, n).unwrap();
            assert_eq!(grid.len(), n);
            assert_eq!(grid.points()[0], span.start);
            assert_eq!(grid.points()[n - 1], span.end);
            assert!(grid.points().windows(2).all(|w| w[0] < w[1]), "n = {n}");
        }
    }

    #[test]
    fn test_rejects_small_resolution() {
        let span = TimeSpan::new(0.0, 1.0);
        assert!(matches!(TimeGrid::build(span, 0), Err(Error::GridResolution(0))));
        assert!(matches!(TimeGrid::build(span, 1), Err(Error::GridResolution(1))));
    }

    #[test]
    fn test_rejects_degenerate_span() {
        let span = TimeSpan { start: 5.0, end: 5.0 };
        assert!(matches!(TimeGrid::build(span, 2), Err(Error::DegenerateSpan { .. })));
    }

    #[test]
    fn test_index_out_of_range() {
        let grid = TimeGrid::build(TimeSpan::new(0.0, 1.0), 2).unwrap();
        assert!(matches!(
            grid.time_at(2),
            Err(Error::TimestepOutOfRange { index: 2, len: 2 })
        ));
    }
}
