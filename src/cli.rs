//! Command-line interface.
//!
//! Four subcommands: `backtest` runs a strategy over stored history and
//! writes a report, `live` polls for new bars and trades against the paper
//! broker, `validate` checks a config file, `info` shows what data is on
//! disk. Status lines go to stderr; stdout carries only data (`info`
//! output), so runs stay pipeable.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_execution_adapter::PaperExecutionAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::bar::{align_pair, align_pair_with_implied, PairSeries};
use crate::domain::config_validation::{
    parse_optional_date, validate_backtest_config, validate_common_config, validate_live_config,
};
use crate::domain::error::PairtraderError;
use crate::domain::live::{LiveConfig, LiveDriver, TickAction, TickReport};
use crate::domain::metrics::Summary;
use crate::domain::strategy::{PairStrategy, RsiThresholdParams, VrpAdaptiveParams, ZScoreParams};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser)]
#[command(name = "pairtrader", about = "Two-leg pair trading backtester", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a backtest over stored history and write a report
    Backtest {
        /// Path to the INI config file
        #[arg(short, long)]
        config: PathBuf,
        /// Report directory, overriding [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Poll for new bars and trade them against the paper broker
    Live {
        /// Path to the INI config file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Check a config file without running anything
    Validate {
        /// Path to the INI config file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the stored date range for the configured symbols
    Info {
        /// Path to the INI config file
        #[arg(short, long)]
        config: PathBuf,
        /// Inspect one symbol instead of the configured pair
        #[arg(short, long)]
        symbol: Option<String>,
        /// Inspect every symbol in the data directory
        #[arg(short, long, conflicts_with = "symbol")]
        all: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest { config, output } => run_backtest(&config, output.as_deref()),
        Command::Live { config } => run_live(&config),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol, all } => run_info(&config, symbol.as_deref(), all),
    }
}

fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    match FileConfigAdapter::from_file(path) {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!("error: {e}");
            Err((&e).into())
        }
    }
}

fn data_dir(config: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(config.get_string("data", "dir").unwrap_or_default())
}

fn require_key(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, PairtraderError> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PairtraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

/// The configured instruments.
#[derive(Debug, Clone)]
pub struct PairSymbols {
    pub symbol_a: String,
    pub symbol_b: String,
    pub implied_vol_symbol: Option<String>,
}

pub fn build_pair(config: &dyn ConfigPort) -> Result<PairSymbols, PairtraderError> {
    Ok(PairSymbols {
        symbol_a: require_key(config, "pair", "symbol_a")?,
        symbol_b: require_key(config, "pair", "symbol_b")?,
        implied_vol_symbol: config
            .get_string("pair", "implied_vol_symbol")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

/// Build the configured strategy, with per-kind defaults for every
/// parameter except the kind itself.
pub fn build_strategy(config: &dyn ConfigPort) -> Result<PairStrategy, PairtraderError> {
    let kind = require_key(config, "strategy", "kind")?;
    match kind.as_str() {
        "rsi_threshold" => {
            let rsi_period = config.get_int("strategy", "rsi_period", 14).max(0) as usize;
            let entry_high = config.get_double("strategy", "entry_high", 65.0);
            let exit_level = config.get_double("strategy", "exit_level", 50.0);
            let position_size = config.get_double("strategy", "position_size", 0.9);
            let stop = config.get_double("strategy", "stop_loss_pct", 0.0);
            let params = RsiThresholdParams::new(
                rsi_period,
                entry_high,
                exit_level,
                position_size,
                (stop > 0.0).then_some(stop),
            )?;
            Ok(PairStrategy::RsiThreshold(params))
        }
        "zscore" => {
            let lookback = config.get_int("strategy", "lookback", 60).max(0) as usize;
            let entry_z = config.get_double("strategy", "entry_z", 2.0);
            let exit_z = config.get_double("strategy", "exit_z", 0.5);
            let position_size = config.get_double("strategy", "position_size", 0.9);
            let params = ZScoreParams::new(lookback, entry_z, exit_z, position_size)?;
            Ok(PairStrategy::ZScore(params))
        }
        "vrp_adaptive" => {
            let rsi_period = config.get_int("strategy", "rsi_period", 14).max(0) as usize;
            let entry_threshold = config.get_double("strategy", "entry_threshold", 70.0);
            let exit_threshold = config.get_double("strategy", "exit_threshold", 50.0);
            let position_size = config.get_double("strategy", "position_size", 0.9);
            let panic_threshold = config.get_double("strategy", "panic_threshold", -1.5);
            let vol_window = config.get_int("strategy", "vol_window", 21).max(0) as usize;
            let zscore_window = config.get_int("strategy", "zscore_window", 63).max(0) as usize;
            let params = VrpAdaptiveParams::new(
                rsi_period,
                entry_threshold,
                exit_threshold,
                position_size,
                panic_threshold,
                vol_window,
                zscore_window,
            )?;
            Ok(PairStrategy::VrpAdaptive(params))
        }
        other => Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "kind".to_string(),
            reason: format!("unknown kind {}", other),
        }),
    }
}

pub fn build_run_config(config: &dyn ConfigPort) -> Result<BacktestConfig, PairtraderError> {
    Ok(BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", 100_000.0),
        start_date: parse_optional_date(config, "start_date")?,
        end_date: parse_optional_date(config, "end_date")?,
    })
}

/// Fetch and align both legs, plus the implied volatility series when one
/// is configured.
pub fn load_pair_series(
    data: &dyn DataPort,
    pair: &PairSymbols,
    run_config: &BacktestConfig,
) -> Result<PairSeries, PairtraderError> {
    let bars_a = data.fetch_history(&pair.symbol_a, run_config.start_date, run_config.end_date)?;
    let bars_b = data.fetch_history(&pair.symbol_b, run_config.start_date, run_config.end_date)?;
    match &pair.implied_vol_symbol {
        Some(symbol) => {
            let implied = data.fetch_history(symbol, run_config.start_date, run_config.end_date)?;
            Ok(align_pair_with_implied(&bars_a, &bars_b, &implied))
        }
        None => Ok(PairSeries::new(align_pair(&bars_a, &bars_b))),
    }
}

/// The newest `lookback` bars of each configured series, aligned.
pub fn fetch_window(
    data: &dyn DataPort,
    pair: &PairSymbols,
    lookback: usize,
) -> Result<PairSeries, PairtraderError> {
    let bars_a = data.fetch_recent(&pair.symbol_a, lookback)?;
    let bars_b = data.fetch_recent(&pair.symbol_b, lookback)?;
    match &pair.implied_vol_symbol {
        Some(symbol) => {
            let implied = data.fetch_recent(symbol, lookback)?;
            Ok(align_pair_with_implied(&bars_a, &bars_b, &implied))
        }
        None => Ok(PairSeries::new(align_pair(&bars_a, &bars_b))),
    }
}

fn run_backtest(config_path: &Path, output: Option<&Path>) -> ExitCode {
    // Stage 1: configuration.
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    if let Err(e) = validate_common_config(&config).and_then(|_| validate_backtest_config(&config))
    {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let pair = match build_pair(&config) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let strategy = match build_strategy(&config) {
        Ok(strategy) => strategy,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let run_config = match build_run_config(&config) {
        Ok(run_config) => run_config,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: data.
    let dir = data_dir(&config);
    eprintln!("Loading data from {}...", dir.display());
    let data = CsvAdapter::new(dir);
    let series = match load_pair_series(&data, &pair, &run_config) {
        Ok(series) => series,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!(
        "Aligned {} bars for {} / {}",
        series.len(),
        pair.symbol_a,
        pair.symbol_b
    );

    // Stage 3: run.
    eprintln!("Running {} backtest...", strategy.name());
    let result = match backtest_engine::run_backtest(&strategy, &series, &run_config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    print_summary(&result.summary, strategy.name());

    // Stage 4: report.
    let output_dir = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(
            config
                .get_string("report", "output_dir")
                .unwrap_or_else(|| "reports".to_string()),
        ),
    };
    match CsvReportAdapter::new().write(&result, &strategy, &output_dir) {
        Ok(()) => {
            eprintln!();
            eprintln!("Report written to: {}", output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn print_summary(summary: &Summary, strategy_name: &str) {
    eprintln!();
    eprintln!("=== Backtest Results ===");
    eprintln!("Strategy:        {}", strategy_name);
    eprintln!("Initial Capital: {:.2}", summary.initial_capital);
    eprintln!("Final Value:     {:.2}", summary.final_value);
    eprintln!("Total PnL:       {:.2}", summary.total_pnl);
    eprintln!("Return:          {:.2}%", summary.return_pct);
    eprintln!("Trades:          {}", summary.trade_count);
    eprintln!("Stop Losses:     {}", summary.stop_loss_count);
    eprintln!("Panic Exits:     {}", summary.panic_exit_count);
    match summary.avg_pnl_per_trade {
        Some(avg) => eprintln!("Avg PnL/Trade:   {:.2}", avg),
        None => eprintln!("Avg PnL/Trade:   n/a"),
    }
    match summary.sharpe_ratio {
        Some(sharpe) => eprintln!("Sharpe Ratio:    {:.2}", sharpe),
        None => eprintln!("Sharpe Ratio:    n/a"),
    }
}

fn run_live(config_path: &Path) -> ExitCode {
    // Stage 1: configuration.
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    if let Err(e) = validate_common_config(&config).and_then(|_| validate_live_config(&config)) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let pair = match build_pair(&config) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let strategy = match build_strategy(&config) {
        Ok(strategy) => strategy,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    // The lookback must cover the strategy's warmup or every tick would
    // skip on insufficient data.
    let live_config = LiveConfig {
        poll_interval_secs: config.get_int("live", "poll_interval_secs", 300).max(1) as u64,
        lookback_bars: (config.get_int("live", "lookback_bars", 100).max(0) as usize)
            .max(strategy.min_history()),
    };

    // Stage 2: adapters.
    let data = CsvAdapter::new(data_dir(&config));
    let initial_cash = config.get_double("backtest", "initial_capital", 100_000.0);
    let execution = PaperExecutionAdapter::new(initial_cash);
    let mut driver = LiveDriver::new(strategy, &pair.symbol_a, &pair.symbol_b);

    // Stage 3: shutdown hook.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst)) {
            eprintln!("error: failed to install Ctrl-C handler: {e}");
            return ExitCode::FAILURE;
        }
    }

    // Stage 4: poll loop.
    eprintln!(
        "Polling {} / {} every {}s over the last {} bars. Ctrl-C to flatten and exit.",
        pair.symbol_a, pair.symbol_b, live_config.poll_interval_secs, live_config.lookback_bars
    );
    while !shutdown.load(Ordering::SeqCst) {
        match fetch_window(&data, &pair, live_config.lookback_bars) {
            Ok(series) => {
                if let Some(last) = series.bars.last() {
                    execution.set_price(&pair.symbol_a, last.price_a);
                    execution.set_price(&pair.symbol_b, last.price_b);
                }
                let report = driver.tick(&series, &execution);
                print_tick(&report);
            }
            Err(e) => eprintln!("warning: {e}, holding until next poll"),
        }
        sleep_until_next_poll(&shutdown, live_config.poll_interval_secs);
    }

    // Stage 5: flatten.
    eprintln!("Shutting down: flattening positions");
    if let Err(e) = driver.flatten(&execution) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Final cash: {:.2}", execution.cash());
    ExitCode::SUCCESS
}

fn print_tick(report: &TickReport) {
    let indicator = match report.indicator {
        Some(value) => format!("{:.2}", value),
        None => "n/a".to_string(),
    };
    let action = match &report.action {
        TickAction::Hold => "hold".to_string(),
        TickAction::Enter {
            target,
            qty_a,
            qty_b,
        } => format!("enter {} ({} / {})", target, qty_a, qty_b),
        TickAction::Exit { kind } => format!("exit ({})", kind),
        TickAction::Skipped { reason } => format!("skipped: {}", reason),
    };
    eprintln!(
        "[{}] {} indicator={} {}",
        report.timestamp.format("%Y-%m-%d %H:%M:%S"),
        report.position,
        indicator,
        action
    );
}

/// Sleep in one-second slices so Ctrl-C is honored mid-interval.
fn sleep_until_next_poll(shutdown: &AtomicBool, interval_secs: u64) {
    for _ in 0..interval_secs {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }
        std::thread::sleep(Duration::from_secs(1));
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}

/// Structural checks plus a full strategy and run-config build, so a
/// passing validate means backtest and live will get past configuration.
fn validate_all(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    validate_common_config(config)?;
    validate_backtest_config(config)?;
    validate_live_config(config)?;
    build_pair(config)?;
    build_strategy(config)?;
    build_run_config(config)?;
    Ok(())
}

/// Symbols `info` should inspect: an explicit override, everything in the
/// data directory, or the configured pair.
pub fn info_symbols(
    data: &dyn DataPort,
    config: &dyn ConfigPort,
    symbol: Option<&str>,
    all: bool,
) -> Result<Vec<String>, PairtraderError> {
    if let Some(symbol) = symbol {
        return Ok(vec![symbol.to_string()]);
    }
    if all {
        return data.list_symbols();
    }
    let pair = build_pair(config)?;
    let mut symbols = vec![pair.symbol_a, pair.symbol_b];
    symbols.extend(pair.implied_vol_symbol);
    Ok(symbols)
}

fn run_info(config_path: &Path, symbol: Option<&str>, all: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    if let Err(e) = validate_common_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let data = CsvAdapter::new(data_dir(&config));

    let symbols = match info_symbols(&data, &config, symbol, all) {
        Ok(symbols) => symbols,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir(&config).display());
        return ExitCode::SUCCESS;
    }

    let mut failed = false;
    for symbol in &symbols {
        match data.data_range(symbol) {
            Ok(Some((first, last, count))) => println!(
                "{}: {} bars, {} to {}",
                symbol,
                count,
                first.format("%Y-%m-%d %H:%M:%S"),
                last.format("%Y-%m-%d %H:%M:%S")
            ),
            Ok(None) => println!("{}: no data", symbol),
            Err(e) => {
                eprintln!("error: {}: {}", symbol, e);
                failed = true;
            }
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
