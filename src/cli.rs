//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::env_overrides::EnvOverrides;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_venue::PaperVenue;
use crate::adapters::trade_log::{CsvTradeLog, TracingTradeLog};
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{validate_backtest_config, validate_strategy_params};
use crate::domain::decision::TradingCore;
use crate::domain::error::TraderError;
use crate::domain::execution::CostModel;
use crate::domain::params::StrategyParams;
use crate::domain::portfolio::EquityPoint;
use crate::monitor::{MONITOR_SECTION, MonitorConfig, Supervisor};
use crate::ports::config_port::{ConfigPort, OverridePort};
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::trade_log_port::TradeLogPort;

#[derive(Parser, Debug)]
#[command(name = "trendtrader", about = "Trend-following backtester and paper monitor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one symbol over a CSV bar file
    Backtest(BacktestArgs),
    /// Paper-trade the configured pairs until Ctrl-C
    Monitor {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(long)]
        trades_out: Option<PathBuf>,
    },
    /// Resolve and validate the configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct BacktestArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(short, long)]
    pub data_dir: PathBuf,
    #[arg(long)]
    pub symbol: String,
    #[arg(long)]
    pub timeframe: String,
    /// Most recent bars to use; overrides [backtest] candles
    #[arg(long)]
    pub candles: Option<usize>,
    #[arg(long)]
    pub equity_out: Option<PathBuf>,
    #[arg(long)]
    pub trades_out: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest(args) => backtest(&args).map(|_| ()),
        Command::Monitor {
            config,
            data_dir,
            trades_out,
        } => run_monitor(&config, &data_dir, trades_out.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TraderError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Resolves strategy parameters and validates them.
pub fn resolve_params(
    config: &dyn ConfigPort,
    overrides: &dyn OverridePort,
) -> Result<StrategyParams, TraderError> {
    let params = StrategyParams::resolve(config, overrides)?;
    validate_strategy_params(&params)?;
    Ok(params)
}

/// `equity_<SYMBOL>_<TF>.csv` in the working directory.
pub fn default_equity_path(symbol: &str, timeframe: &str) -> PathBuf {
    let file_symbol: String = symbol.chars().filter(|c| *c != '/').collect();
    PathBuf::from(format!(
        "equity_{}_{}.csv",
        file_symbol.to_uppercase(),
        timeframe
    ))
}

pub fn write_equity_csv(path: &Path, curve: &[EquityPoint]) -> Result<(), TraderError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for point in curve {
        writer.serialize(point).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_error(e: csv::Error) -> TraderError {
    TraderError::Io(std::io::Error::other(e))
}

/// Runs the full backtest pipeline: config, bars, loop, report files.
pub fn backtest(args: &BacktestArgs) -> Result<BacktestResult, TraderError> {
    let adapter = load_config(&args.config)?;
    let params = resolve_params(&adapter, &EnvOverrides::new())?;

    let mut config = BacktestConfig::from_config(&adapter)?;
    if let Some(candles) = args.candles {
        config.candles = candles;
    }
    validate_backtest_config(&config)?;

    let data = CsvAdapter::new(args.data_dir.clone());
    let bars = data.load(&args.symbol, &args.timeframe, config.candles)?;
    eprintln!(
        "Loaded {} bars for {} {}",
        bars.len(),
        args.symbol,
        args.timeframe
    );

    let result =
        backtest_engine::run_backtest(&args.symbol, &args.timeframe, &bars, &params, &config)?;
    print_summary(&result);

    let equity_path = args
        .equity_out
        .clone()
        .unwrap_or_else(|| default_equity_path(&args.symbol, &args.timeframe));
    write_equity_csv(&equity_path, &result.equity_curve)?;
    eprintln!("Equity curve written to {}", equity_path.display());

    if let Some(path) = &args.trades_out {
        let log = CsvTradeLog::create(path)?;
        for event in &result.trades {
            log.record(event)?;
        }
        eprintln!("{} trades written to {}", result.trades.len(), path.display());
    }

    Ok(result)
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== {} {} ===", result.symbol, result.timeframe);
    eprintln!("  Initial equity:   {:.2}", m.initial_equity);
    eprintln!("  Final equity:     {:.2}", m.final_equity);
    eprintln!("  Total return:     {:.2}%", m.total_return * 100.0);
    eprintln!("  Max drawdown:     {:.2}%", m.max_drawdown * 100.0);
    eprintln!("  Sharpe ratio:     {:.4}", m.sharpe_ratio);
    eprintln!("  CAGR:             {:.2}%", m.cagr * 100.0);
    eprintln!(
        "  Fills: {}, closed positions: {}, win rate: {:.1}%",
        m.fills,
        m.closed_positions,
        m.win_rate * 100.0
    );
}

/// The monitor needs more bars per fetch than the indicator warm-up.
fn check_bar_limit(monitor: &MonitorConfig, params: &StrategyParams) -> Result<(), TraderError> {
    let warmup = params.warmup();
    if monitor.settings.bar_limit <= warmup {
        return Err(TraderError::ConfigInvalid {
            section: MONITOR_SECTION.to_string(),
            key: "bar_limit".to_string(),
            reason: format!("bar_limit must exceed the indicator warm-up of {warmup} bars"),
        });
    }
    Ok(())
}

fn run_monitor(
    config_path: &Path,
    data_dir: &Path,
    trades_out: Option<&Path>,
) -> Result<(), TraderError> {
    let adapter = load_config(config_path)?;
    let params = resolve_params(&adapter, &EnvOverrides::new())?;
    let backtest_config = BacktestConfig::from_config(&adapter)?;
    validate_backtest_config(&backtest_config)?;
    let monitor_config = MonitorConfig::from_config(&adapter)?;
    check_bar_limit(&monitor_config, &params)?;

    if monitor_config.pairs.is_empty() {
        return Err(TraderError::ConfigMissing {
            section: MONITOR_SECTION.to_string(),
            key: "pairs".to_string(),
        });
    }

    let log: Arc<dyn TradeLogPort> = match trades_out {
        Some(path) => Arc::new(CsvTradeLog::create(path)?),
        None => Arc::new(TracingTradeLog),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(monitor_until_interrupted(
        params,
        backtest_config.costs,
        monitor_config,
        data_dir.to_path_buf(),
        log,
    ))
}

async fn monitor_until_interrupted(
    params: StrategyParams,
    costs: CostModel,
    config: MonitorConfig,
    data_dir: PathBuf,
    log: Arc<dyn TradeLogPort>,
) -> Result<(), TraderError> {
    let data: Arc<dyn MarketDataPort> = Arc::new(CsvAdapter::new(data_dir));
    let venue = Arc::new(PaperVenue::new(Arc::clone(&data), costs, config.lot_step));
    let mut supervisor = Supervisor::new(
        TradingCore::new(params),
        data,
        venue,
        log,
        config.settings,
    );

    let started = supervisor.start(&config.pairs);
    eprintln!("Monitoring {started} pair(s) in paper mode, press Ctrl-C to stop");

    let interrupted = tokio::signal::ctrl_c().await;
    eprintln!("Stopping monitors");
    supervisor.stop_all().await;
    interrupted?;
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TraderError> {
    let adapter = load_config(config_path)?;
    let params = resolve_params(&adapter, &EnvOverrides::new())?;
    let backtest_config = BacktestConfig::from_config(&adapter)?;
    validate_backtest_config(&backtest_config)?;
    let monitor_config = MonitorConfig::from_config(&adapter)?;
    if !monitor_config.pairs.is_empty() {
        check_bar_limit(&monitor_config, &params)?;
    }

    eprintln!("Config validated successfully");
    print_params(&params);

    eprintln!("\nBacktest:");
    eprintln!("  initial_capital:    {}", backtest_config.initial_capital);
    eprintln!("  commission:         {}", backtest_config.costs.commission_rate);
    eprintln!("  slippage:           {}", backtest_config.costs.slippage_rate);
    eprintln!("  candles:            {}", backtest_config.candles);

    eprintln!("\nMonitor pairs:");
    if monitor_config.pairs.is_empty() {
        eprintln!("  (none)");
    }
    for pair in &monitor_config.pairs {
        eprintln!("  {pair}");
    }
    Ok(())
}

fn print_params(p: &StrategyParams) {
    eprintln!("\nStrategy parameters (warm-up {} bars):", p.warmup());
    eprintln!("  ema_fast:           {}", p.ema_fast);
    eprintln!("  ema_slow:           {}", p.ema_slow);
    eprintln!("  ema_trend:          {}", p.ema_trend);
    eprintln!("  rsi_len:            {}", p.rsi_len);
    eprintln!("  rsi_entry_long:     {}", p.rsi_entry_long);
    eprintln!("  rsi_entry_short:    {}", p.rsi_entry_short);
    eprintln!("  adx_len:            {}", p.adx_len);
    eprintln!("  adx_threshold:      {}", p.adx_threshold);
    eprintln!("  atr_len:            {}", p.atr_len);
    eprintln!("  atr_mult_stop:      {}", p.atr_mult_stop);
    eprintln!("  atr_mult_trail:     {}", p.atr_mult_trail);
    eprintln!("  vol_len:            {}", p.vol_len);
    eprintln!("  vol_mult:           {}", p.vol_mult);
    eprintln!("  partial_tp_ratio:   {}", p.partial_tp_ratio);
    eprintln!("  tp_rr:              {}", p.tp_rr);
    eprintln!("  max_risk_per_trade: {}", p.max_risk_per_trade);
    eprintln!("  min_order_usdt:     {}", p.min_order_usdt);
}
