//! Backtest CLI
//!
//! Usage:
//!   backtest sma <data.json> [--short-window 5 --long-window 20]
//!   backtest sma --synthetic 10000 --seed 7
//!   backtest quote <data.json> --instrument THE
//!   backtest verify <data.json>
//!
//! Latencies come from `--config <file>` and may be overridden with
//! `--execution-latency` / `--market-data-latency`. Logging follows `RUST_LOG`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use simulation::bots::{ReferenceQuoter, ReferenceQuoterConfig, SmaCrossover, SmaCrossoverConfig};
use simulation::export::{build_export, filled_orders_json, write_to_file};
use simulation::loader::MarketDataFile;
use simulation::replay::verify_determinism;
use simulation::synthetic::{SyntheticTape, TapeConfig};
use simulation::{Simulation, SimulationConfig, Strategy};
use types::ids::InstrumentId;

#[derive(Parser)]
#[command(name = "backtest")]
#[command(about = "Deterministic latency-aware backtester", version = simulation::VERSION)]
struct Cli {
    #[command(flatten)]
    latency: LatencyArgs,

    /// Write the full run export (summary, filled orders, journal) to this file
    #[arg(long, global = true)]
    export: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LatencyArgs {
    /// JSON file with `execution_latency` and `market_data_latency`
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    execution_latency: Option<i64>,

    #[arg(long, global = true)]
    market_data_latency: Option<i64>,
}

#[derive(Args, Clone)]
struct DataArgs {
    /// JSON market-data file
    data: Option<PathBuf>,

    /// Generate this many synthetic trades instead of reading a file
    #[arg(long, conflicts_with = "data")]
    synthetic: Option<usize>,

    /// Seed for the synthetic tape
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args, Clone)]
struct SmaArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Instrument to trade (synthetic tapes use SYN)
    #[arg(long, default_value = "SYN")]
    instrument: String,

    #[arg(long, default_value_t = 5)]
    short_window: usize,

    #[arg(long, default_value_t = 20)]
    long_window: usize,

    #[arg(long, default_value_t = 1.0)]
    quantity: f64,

    #[arg(long, default_value_t = 5)]
    max_position: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the SMA crossover bot
    Sma(SmaArgs),
    /// Run the reference quoter
    Quote {
        /// JSON market-data file
        data: PathBuf,

        #[arg(long, default_value = "THE")]
        instrument: String,

        /// Custom-update key of the reference feed
        #[arg(long, default_value = "TTF_midprice")]
        reference_key: String,

        /// Custom-update key of the quoted instrument's feed
        #[arg(long, default_value = "THE_midprice")]
        quoted_key: String,
    },
    /// Run the SMA crossover bot twice and compare the journals
    Verify(SmaArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli.latency)?;

    match cli.command {
        Commands::Sma(args) => {
            let data = load_data(&args.data)?;
            let simulation = Simulation::new(config, SmaCrossover::new(sma_config(&args)))?;
            run_and_report(simulation, data, cli.export)
        }
        Commands::Quote {
            data,
            instrument,
            reference_key,
            quoted_key,
        } => {
            let data = MarketDataFile::from_path(&data)?;
            let quoter = ReferenceQuoter::new(ReferenceQuoterConfig {
                instrument: InstrumentId::new(instrument),
                reference_key,
                quoted_key,
                ..ReferenceQuoterConfig::default()
            });
            run_and_report(Simulation::new(config, quoter)?, data, cli.export)
        }
        Commands::Verify(args) => {
            let data = load_data(&args.data)?;
            let validation = verify_determinism(|| {
                let mut simulation = Simulation::new(config, SmaCrossover::new(sma_config(&args)))?;
                data.clone().load_into(&mut simulation);
                Ok(simulation)
            })?;

            println!("{}", serde_json::to_string_pretty(&validation)?);
            if !validation.matches {
                bail!("runs diverged at journal entry {:?}", validation.divergence_index);
            }
            Ok(())
        }
    }
}

/// File config first, then command-line overrides, then validation
fn resolve_config(args: &LatencyArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(latency) = args.execution_latency {
        config.execution_latency = latency;
    }
    if let Some(latency) = args.market_data_latency {
        config.market_data_latency = latency;
    }
    config.validate()?;
    Ok(config)
}

fn load_data(args: &DataArgs) -> Result<MarketDataFile> {
    match (&args.data, args.synthetic) {
        (Some(path), _) => MarketDataFile::from_path(path).with_context(|| format!("loading {}", path.display())),
        (None, Some(count)) => {
            let config = TapeConfig::default();
            let key = config.instrument.to_string();
            let trades = SyntheticTape::new(config, args.seed).generate(count);
            let mut data = MarketDataFile::default();
            data.trades.insert(key, trades);
            Ok(data)
        }
        (None, None) => bail!("pass a market-data file or --synthetic <count>"),
    }
}

fn sma_config(args: &SmaArgs) -> SmaCrossoverConfig {
    SmaCrossoverConfig {
        instrument: InstrumentId::new(args.instrument.clone()),
        short_window: args.short_window,
        long_window: args.long_window,
        order_quantity: args.quantity,
        max_position: Decimal::from(args.max_position),
    }
}

fn run_and_report<S: Strategy>(
    mut simulation: Simulation<S>,
    data: MarketDataFile,
    export: Option<PathBuf>,
) -> Result<()> {
    data.load_into(&mut simulation);
    let summary = simulation.run()?;

    println!("{}", filled_orders_json(&simulation.filled_orders())?);
    println!("digest: {}", summary.digest);

    if let Some(path) = export {
        write_to_file(&build_export(&simulation, &summary, true), &path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
