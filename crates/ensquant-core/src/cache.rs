use std::collections::HashMap;

use crate::quantile::{check_quantile, quantile_of_sorted};
use crate::{Ensemble, Result, F};

#[derive(Default)]
struct Slot {
    /// Timestep the values were sampled for; `None` while unfilled.
    step: Option<usize>,
    values: Vec<F>,
}

/// Ensemble samples for one grid timestep, keyed by series key.
///
/// A key requested several times at the same timestep (with different
/// quantiles) is sampled from the cases once. Every slot is stamped with
/// the timestep it was filled for and refilled in place when the cache has
/// moved on, so buffers are reused across rows while values never are.
/// Each concurrent worker owns its own cache.
pub struct SampleCache<'e> {
    ensemble: &'e Ensemble,
    step: usize,
    slots: HashMap<String, Slot>,
}

impl<'e> SampleCache<'e> {
    /// Cache positioned at grid point 0.
    pub fn new(ensemble: &'e Ensemble) -> Self {
        Self {
            ensemble,
            step: 0,
            slots: HashMap::new(),
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Move to grid point `index`, invalidating every slot.
    pub fn advance(&mut self, index: usize) -> Result<()> {
        self.ensemble.grid().time_at(index)?;
        self.step = index;
        Ok(())
    }

    /// Samples of `key` at the current timestep, ascending.
    pub fn samples(&mut self, key: &str) -> Result<&[F]> {
        let step = self.step;
        let slot = self.slots.entry(key.to_string()).or_default();
        if slot.step != Some(step) {
            slot.step = None;
            slot.values.clear();
            self.ensemble.sample_into(key, step, &mut slot.values)?;
            slot.values.sort_by(F::total_cmp);
            slot.step = Some(step);
        }
        Ok(&slot.values)
    }

    /// Empirical quantile of `key` at the current timestep, `None` when no
    /// case covers it.
    pub fn quantile(&mut self, key: &str, q: F) -> Result<Option<F>> {
        let q = check_quantile(q)?;
        let sorted = self.samples(key)?;
        if sorted.is_empty() {
            return Ok(None);
        }
        Ok(Some(quantile_of_sorted(sorted, q)))
    }

    /// Number of distinct keys with a slot.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Case, EnsembleBuilder, Error, SummaryCase, Time, TimeSpan};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Case returning `t + offset` and counting its samples.
    struct Counting {
        offset: F,
        calls: Arc<AtomicUsize>,
    }

    impl Case for Counting {
        fn id(&self) -> &str {
            "counting"
        }

        fn span(&self) -> TimeSpan {
            TimeSpan::new(0.0, 10.0)
        }

        fn sample(&self, key: &str, t: Time) -> crate::Result<F> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match key {
                "FOPT" | "FWPT" => Ok(t + self.offset),
                _ => Err(Error::UnknownSeries {
                    case: "counting".into(),
                    key: key.into(),
                }),
            }
        }
    }

    fn counting_ensemble(calls: &Arc<AtomicUsize>) -> Ensemble {
        let mut builder = EnsembleBuilder::new();
        for offset in [2.0, 0.0, 1.0] {
            builder.add_case(Counting {
                offset,
                calls: Arc::clone(calls),
            });
        }
        builder.build(3).unwrap()
    }

    #[test]
    fn test_key_sampled_once_per_step() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ensemble = counting_ensemble(&calls);
        let mut cache = SampleCache::new(&ensemble);

        assert_eq!(cache.quantile("FOPT", 0.0).unwrap(), Some(0.0));
        assert_eq!(cache.quantile("FOPT", 0.5).unwrap(), Some(1.0));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cache.quantile("FWPT", 0.5).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_values_do_not_cross_steps() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ensemble = counting_ensemble(&calls);
        let mut cache = SampleCache::new(&ensemble);

        assert_eq!(cache.samples("FOPT").unwrap(), &[0.0, 1.0, 2.0]);
        cache.advance(1).unwrap();
        assert_eq!(cache.samples("FOPT").unwrap(), &[5.0, 6.0, 7.0]);
        cache.advance(2).unwrap();
        assert_eq!(cache.samples("FOPT").unwrap(), &[10.0, 11.0, 12.0]);
        assert_eq!(calls.load(Ordering::SeqCst), 9);
        assert!(cache.advance(3).is_err());
        assert_eq!(cache.step(), 2);
    }

    #[test]
    fn test_failed_fill_is_not_reused() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ensemble = counting_ensemble(&calls);
        let mut cache = SampleCache::new(&ensemble);
        assert!(cache.samples("GOPT").is_err());
        assert!(cache.samples("GOPT").is_err());
        assert!(cache.quantile("FOPT", 1.5).is_err());
    }

    #[test]
    fn test_uncovered_step_has_no_quantile() {
        let mut builder = EnsembleBuilder::new();
        builder.add_case(
            SummaryCase::new("early", vec![0.0, 10.0])
                .and_then(|c| c.with_series("FOPT", vec![1.0, 2.0]))
                .unwrap(),
        );
        builder.add_case(
            SummaryCase::new("late", vec![90.0, 100.0])
                .and_then(|c| c.with_series("FOPT", vec![3.0, 4.0]))
                .unwrap(),
        );
        let ensemble = builder.build(3).unwrap();
        let mut cache = SampleCache::new(&ensemble);
        cache.advance(1).unwrap();
        assert_eq!(cache.quantile("FOPT", 0.5).unwrap(), None);
    }
}
