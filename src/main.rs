use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use ic3scraper::{
    config::Config,
    fetch::HttpSource,
    pipeline::{Pipeline, RunSummary},
    plan::{IterationPlan, RangeRequest},
    staging::UnitKey,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "ic3scraper")]
#[command(about = "Harvest per-state report tables into parquet")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(long, default_value = "ic3scraper.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, stage and transform a range of periods × regions
    Run {
        /// Periods, e.g. `2016-2022` or `2019,2021` (default: all)
        #[arg(long)]
        periods: Option<String>,
        /// Region identifiers, e.g. `1-57` or `5,9` (default: all)
        #[arg(long)]
        regions: Option<String>,
    },
    /// Transform tables left in staging by an interrupted run
    Resume,
    /// List staged and final tables of one unit
    Inspect {
        #[arg(long)]
        period: u32,
        /// Region storage name, e.g. `New_York`
        #[arg(long)]
        region: String,
    },
}

fn report(summary: &RunSummary) -> Result<()> {
    for (unit, err) in &summary.failed {
        error!("{}: {}", unit, err);
    }
    if !summary.is_success() {
        bail!(
            "{} unit(s) failed, {} succeeded",
            summary.failed.len(),
            summary.succeeded.len()
        );
    }
    info!(units = summary.succeeded.len(), "all done");
    Ok(())
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ic3scraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) config ───────────────────────────────────────────────────
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    info!(
        staging = %config.staging_dir.display(),
        output = %config.output_dir.display(),
        "startup"
    );

    let source = HttpSource::new(config.base_url.clone(), config.request_timeout())?;
    let pipeline = Pipeline::from_config(source, &config)?;

    match cli.command {
        // ─── 3) plan & run ───────────────────────────────────────────
        Command::Run { periods, regions } => {
            let periods = periods
                .unwrap_or_else(|| format!("{}-{}", config.periods.min, config.periods.max));
            let regions = regions
                .unwrap_or_else(|| format!("{}-{}", config.regions.min, config.regions.max));
            let request = RangeRequest::parse(&periods, &regions, config.periods, config.regions)?;
            let plan = IterationPlan::select(&request);
            info!(units = plan.len(), "plan: {:?}", plan);
            report(&pipeline.run(&plan))
        }

        Command::Resume => report(&pipeline.resume()?),

        Command::Inspect { period, region } => {
            let key = UnitKey { period, region };
            let transformer = pipeline.transformer();
            for table in transformer.staging().list(&key)? {
                println!("staged  {}", table);
            }
            for table in transformer.store().list(&key)? {
                println!("final   {}  {}", table, transformer.store().path(&key, &table)?.display());
            }
            Ok(())
        }
    }
}
