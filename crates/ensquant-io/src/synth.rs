use std::path::{Path, PathBuf};

use ensquant_core::{Interpolation, SummaryCase, Time, F, SECONDS_PER_DAY};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::case_file::write_case;
use crate::Result;

/// Synthetic ensemble of decline-curve production runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynthSpec {
    pub cases: usize,
    /// Report steps of the longest case.
    pub steps: usize,
    pub report_days: F,
    /// First report time of the ensemble, seconds since the epoch.
    pub start: Time,
    pub seed: u64,
}

impl SynthSpec {
    pub fn new(cases: usize, steps: usize, seed: u64) -> Self {
        Self {
            cases,
            steps: steps.max(4),
            report_days: 30.0,
            // 2020-01-01T00:00:00Z
            start: 1_577_836_800.0,
            seed,
        }
    }

    /// Independent generator per case; the same seed and case id always
    /// give the same run.
    fn rng_for(&self, case_id: usize) -> ChaCha20Rng {
        let seed = self.seed.wrapping_add((case_id as u64).wrapping_mul(0x9e3779b97f4a7c15));
        ChaCha20Rng::seed_from_u64(seed)
    }

    /// Generate run `case_id`: staggered start and end, exponential oil
    /// decline with lognormal noise, logistic water breakthrough.
    pub fn generate_case(&self, case_id: usize) -> Result<SummaryCase> {
        let mut rng = self.rng_for(case_id);
        let stagger = self.steps / 5;
        let first = rng.gen_range(0..=stagger);
        let last = self.steps - rng.gen_range(0..=stagger);
        let report = self.report_days * SECONDS_PER_DAY;

        let q0: F = rng.gen_range(800.0..1200.0);
        let decline: F = rng.gen_range(0.001..0.004);
        let breakthrough: F = rng.gen_range(0.3..0.7_f64) * self.steps as F * self.report_days;
        let noise_scale = 0.05;

        let mut times = Vec::with_capacity(last - first + 1);
        let mut fopr = Vec::with_capacity(times.capacity());
        let mut fopt = Vec::with_capacity(times.capacity());
        let mut wwct = Vec::with_capacity(times.capacity());
        let mut cumulative = 0.0;

        for step in first..=last {
            let days = step as F * self.report_days;
            let z: F = StandardNormal.sample(&mut rng);
            let rate = if step == first {
                0.0
            } else {
                q0 * (-decline * days).exp() * (noise_scale * z).exp()
            };
            cumulative += rate * self.report_days;

            times.push(self.start + step as F * report);
            fopr.push(rate);
            fopt.push(cumulative);
            wwct.push(1.0 / (1.0 + (-(days - breakthrough) / 120.0).exp()));
        }

        let mut case = SummaryCase::new(format!("SYNTH_{case_id:04}"), times)?;
        case.insert_series("FOPR", fopr, Interpolation::Step)?;
        case.insert_series("FOPT", fopt, Interpolation::Linear)?;
        case.insert_series("WWCT:OP_1", wwct, Interpolation::Step)?;
        Ok(case)
    }

    /// Write every case as `<dir>/SYNTH_<id>.parquet`, in parallel.
    pub fn write_ensemble(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let paths = (0..self.cases)
            .into_par_iter()
            .map(|case_id| -> Result<PathBuf> {
                let case = self.generate_case(case_id)?;
                let path = dir.join(format!("SYNTH_{case_id:04}.parquet"));
                write_case(&path, &case)?;
                Ok(path)
            })
            .collect::<Result<Vec<_>>>()?;
        info!("Wrote {} synthetic cases to {}", paths.len(), dir.display());
        Ok(paths)
    }
}
