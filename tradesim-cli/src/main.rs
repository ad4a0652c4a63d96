//! TradeSim CLI: run backtests, size positions, check run files.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML run file, print the report, save artifacts
//! - `size`: position size for an entry/stop pair under the risk limits
//! - `validate-config`: parse and validate a run file without running it
//! - `report`: re-render the report of a saved run

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tradesim_core::domain::{OrderRequest, OrderSide, OrderType};
use tradesim_core::risk::RiskManager;
use tradesim_runner::{
    load_artifacts, render_report, render_summary, run_from_file, save_artifacts, RunFile,
};

#[derive(Parser)]
#[command(name = "tradesim", about = "TradeSim: risk-bounded trade simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML run file.
    Run {
        /// Path to the run file. Defaults are used for every missing section.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CSV candles, overriding `[data] path`.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Symbol, overriding `[data] symbol`.
        #[arg(long)]
        symbol: Option<String>,

        /// Generate this many synthetic candles instead of reading a CSV.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the report without writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Position size that risks a fixed fraction of the balance to the stop.
    Size {
        #[arg(long)]
        entry: Decimal,

        #[arg(long)]
        stop: Decimal,

        #[arg(long)]
        balance: Decimal,

        /// Run file whose `[risk]` section supplies the limits.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Parse and validate a run file.
    ValidateConfig {
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the report for a saved artifact directory.
    Report {
        /// Directory written by `run` (contains result.json).
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            symbol,
            synthetic,
            output_dir,
            no_save,
        } => run_backtest_cmd(config, data, symbol, synthetic, &output_dir, no_save),
        Commands::Size {
            entry,
            stop,
            balance,
            config,
        } => run_size(entry, stop, balance, config),
        Commands::ValidateConfig { config } => run_validate(&config),
        Commands::Report { dir } => {
            let result = load_artifacts(&dir)?;
            print!("{}", render_report(&result));
            Ok(())
        }
    }
}

fn load_run_file(path: Option<&Path>) -> Result<RunFile> {
    match path {
        Some(p) => RunFile::from_file(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(RunFile::default()),
    }
}

fn run_backtest_cmd(
    config_path: Option<PathBuf>,
    data: Option<PathBuf>,
    symbol: Option<String>,
    synthetic: Option<usize>,
    output_dir: &Path,
    no_save: bool,
) -> Result<()> {
    if data.is_some() && synthetic.is_some() {
        bail!("--data and --synthetic are mutually exclusive");
    }

    let mut file = load_run_file(config_path.as_deref())?;
    if let Some(path) = data {
        file.data.path = Some(path);
        file.data.synthetic_candles = None;
    }
    if let Some(n) = synthetic {
        file.data.path = None;
        file.data.synthetic_candles = Some(n);
    }
    if let Some(sym) = symbol {
        file.data.symbol = sym;
    }

    let result = run_from_file(&file)?;

    print!("{}", render_report(&result));
    println!("{}", render_summary(&result));

    if !no_save {
        let run_dir = save_artifacts(&result, output_dir)?;
        info!("artifacts written to {}", run_dir.display());
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_size(entry: Decimal, stop: Decimal, balance: Decimal, config: Option<PathBuf>) -> Result<()> {
    let file = load_run_file(config.as_deref())?;
    let risk = RiskManager::new(file.risk, balance)?;

    let amount = risk.calculate_position_size(entry, stop, balance);
    if amount.is_zero() {
        bail!("stop equals entry; no position size can be derived");
    }
    let side = if stop < entry {
        OrderSide::Buy
    } else {
        OrderSide::Sell
    };
    let request = OrderRequest {
        symbol: file.data.symbol,
        side,
        order_type: OrderType::Market,
        price: entry,
        amount,
        stop_loss: Some(stop),
        take_profit: None,
    };

    println!("side:     {side}");
    println!("amount:   {}", amount.round_dp(8));
    println!("notional: {}", request.notional().round_dp(2));
    println!(
        "at risk:  {}",
        (amount * (entry - stop).abs()).round_dp(2)
    );
    match risk.validate_order(&request, 0) {
        Ok(()) => println!("order:    accepted"),
        Err(e) => println!("order:    rejected ({e})"),
    }
    Ok(())
}

fn run_validate(path: &Path) -> Result<()> {
    let file = RunFile::from_file(path)?;
    file.validate()?;
    println!("{}: ok", path.display());
    println!(
        "  capital {} | commission {} | slippage {}",
        file.backtest.initial_capital, file.backtest.commission_rate, file.backtest.slippage_rate
    );
    println!(
        "  ema {}/{} rsi {} | stop {} | target {}",
        file.ema.fast_period,
        file.ema.slow_period,
        file.ema.rsi_period,
        file.strategy.stop_loss_pct,
        file.strategy.take_profit_pct
    );
    match (&file.data.path, file.data.synthetic_candles) {
        (Some(p), _) => println!("  data {} ({})", p.display(), file.data.symbol),
        (None, Some(n)) => println!("  data {n} synthetic candles ({})", file.data.symbol),
        (None, None) => {}
    }
    Ok(())
}
