use clap::Parser;
use ensquant_io::cli::{run_quantile_command, run_synth_command, Cli, Commands};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ensquant=info,ensquant_io=info,ensquant_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run_quantile_command(&args).map(|summaries| {
            info!("Wrote {} output tables", summaries.len());
        }),
        Commands::Synth(args) => run_synth_command(&args).map(|paths| {
            info!("Wrote {} cases", paths.len());
        }),
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}
