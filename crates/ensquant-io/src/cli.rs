use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ensquant_core::EnsembleBuilder;
use tracing::{info, warn};

use crate::{expand_patterns, load_cases, write_targets, RunConfig, RunManifest, SynthSpec, TableSummary};

#[derive(Parser)]
#[command(name = "ensquant")]
#[command(about = "Quantiles of summary vectors across an ensemble of simulation cases")]
#[command(long_about = "Loads an ensemble of simulation summary cases, resamples them onto a \
shared time grid and writes empirical quantiles of the requested vectors per grid point.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute quantile tables from a configuration file
    Run(RunArgs),
    /// Write a synthetic ensemble of Parquet cases
    Synth(SynthArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Configuration file (keyword format, or JSON with a .json extension)
    pub config: PathBuf,

    /// Number of grid points, overrides NUM_INTERP
    #[arg(long)]
    pub num_interp: Option<usize>,

    /// Write <output>.manifest.json next to every table
    #[arg(long)]
    pub manifest: bool,

    /// Worker threads for loading and output (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,
}

#[derive(Args, Clone, Debug)]
pub struct SynthArgs {
    /// Number of cases
    #[arg(long, default_value = "20")]
    pub cases: usize,

    /// Report steps of the longest case
    #[arg(long, default_value = "60")]
    pub steps: usize,

    /// Days between reports
    #[arg(long, default_value = "30")]
    pub report_days: f64,

    /// Random seed
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Output directory
    #[arg(long)]
    pub out: PathBuf,
}

/// Load the ensemble described by `args.config` and write every output
/// table. Any error aborts the run.
pub fn run_quantile_command(args: &RunArgs) -> anyhow::Result<Vec<TableSummary>> {
    let config = RunConfig::load(&args.config, args.num_interp)
        .with_context(|| format!("reading configuration {}", args.config.display()))?;

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = args.threads {
        pool = pool.num_threads(threads);
    }
    let pool = pool.build()?;

    pool.install(|| -> anyhow::Result<Vec<TableSummary>> {
        let paths = expand_patterns(&config.case_patterns)?;
        let cases = load_cases(&paths)?;

        let mut builder = EnsembleBuilder::with_capacity(cases.len());
        for case in cases {
            builder.add_case(case);
        }
        let ensemble = builder.build(config.resolution)?;
        info!(
            "Ensemble of {} cases on a grid of {} points",
            ensemble.n_cases(),
            ensemble.grid().len()
        );

        let uncovered = ensemble.uncovered_steps();
        if !uncovered.is_empty() {
            warn!(
                "{} of {} grid points are covered by no case; their quantiles are written as {}",
                uncovered.len(),
                ensemble.grid().len(),
                crate::MISSING_SENTINEL
            );
        }
        if config.targets.is_empty() {
            warn!("no OUTPUT declared, nothing to write");
        }

        let summaries = write_targets(&ensemble, &config.targets)?;

        if args.manifest {
            let run_id = RunManifest::new_run_id();
            for (target, summary) in config.targets.iter().zip(&summaries) {
                let manifest = RunManifest::new(&run_id, &ensemble, target, summary);
                manifest.save_to_file(&RunManifest::path_for(&target.destination))?;
            }
        }

        Ok(summaries)
    })
}

/// Generate a synthetic ensemble into `args.out`.
pub fn run_synth_command(args: &SynthArgs) -> anyhow::Result<Vec<PathBuf>> {
    let mut spec = SynthSpec::new(args.cases, args.steps, args.seed);
    spec.report_days = args.report_days;
    let paths = spec
        .write_ensemble(&args.out)
        .with_context(|| format!("writing synthetic cases to {}", args.out.display()))?;
    Ok(paths)
}
