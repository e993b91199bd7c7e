mod input;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use marketmix_core::{DirStore, generate_markets_package, generate_timeseries_package};

use crate::input::{load_config, load_database, load_timeseries};
use crate::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "marketmix")]
#[command(about = "Generate correlated Dirichlet samples for implicit LCA markets")]
struct Args {
    /// Run configuration (YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// Exchange database snapshot (YAML)
    #[arg(short, long)]
    database: PathBuf,

    /// Historical observations to fit market marginals from (YAML)
    #[arg(short, long)]
    timeseries: Option<PathBuf>,

    /// Directory holding cached packages
    #[arg(short, long, default_value = "cache")]
    store: PathBuf,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured number of samples
    #[arg(short, long)]
    num_samples: Option<usize>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level)?;

    let mut config = load_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(num_samples) = args.num_samples {
        config.num_samples = num_samples;
    }

    let database = load_database(&args.database)?;
    let store = DirStore::new(args.store.clone());

    let package = match &args.timeseries {
        Some(path) => {
            let series = load_timeseries(path)?;
            generate_timeseries_package(&store, &database, &series, &config)?
        }
        None => generate_markets_package(&store, &database, &config)?,
    };

    let path = store.path(&config.package_key().file_name());
    println!(
        "{}: {} indices x {} samples",
        path.display(),
        package.indices.len(),
        package.num_samples
    );
    Ok(())
}
