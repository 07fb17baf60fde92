//! VolatilityLab CLI: list strategies, run a backtest headlessly, show config.
//!
//! Commands:
//! - `strategies`: print one carousel page of the strategy catalog
//! - `run`: submit a backtest through the workflow controller and wait for it
//! - `config`: print the effective configuration as TOML

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use vlab_core::catalog::RemoteCatalog;
use vlab_core::config::CatalogSource;
use vlab_core::format::{format_number, format_percentage, format_ratio};
use vlab_core::{
    export, BacktestConfiguration, BacktestResult, ConfigPatch, HttpBacktestClient,
    PaginationCursor, StaticCatalog, Step, StrategyCatalog, SubmitOutcome, VlabConfig,
    WorkflowController, WorkflowState,
};

const LOG_ENV: &str = "VLAB_LOG";

#[derive(Parser)]
#[command(name = "vlab", about = "VolatilityLab CLI: backtest strategies against the remote service")]
struct Cli {
    /// Path to a TOML config file. Defaults to <config_dir>/vlab/config.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one page of the strategy catalog.
    Strategies {
        /// Fetch the list from the backtest service instead of the built-in table.
        #[arg(long, default_value_t = false)]
        remote: bool,

        /// Page number, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Run one backtest and print the result.
    Run {
        /// Strategy id (see `vlab strategies`).
        #[arg(long)]
        strategy: String,

        /// Ticker symbol, e.g. AAPL.
        #[arg(long)]
        symbol: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Print the result as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write the equity curve as CSV to this path.
        #[arg(long)]
        equity_csv: Option<PathBuf>,

        /// Give up waiting after this many seconds.
        #[arg(long, default_value_t = 120)]
        wait_secs: u64,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = VlabConfig::load(cli.config.as_deref()).context("load configuration")?;

    match cli.command {
        Commands::Strategies { remote, page } => run_strategies(&config, remote, page),
        Commands::Run {
            strategy,
            symbol,
            start,
            end,
            json,
            equity_csv,
            wait_secs,
        } => run_backtest_cmd(
            &config,
            &strategy,
            &symbol,
            &start,
            &end,
            json,
            equity_csv.as_deref(),
            Duration::from_secs(wait_secs),
        ),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn build_catalog(
    config: &VlabConfig,
    client: &Arc<HttpBacktestClient>,
    remote: bool,
) -> Arc<dyn StrategyCatalog> {
    if remote {
        Arc::new(RemoteCatalog::new(client.clone(), StaticCatalog::builtin()))
    } else {
        debug!(source = ?config.catalog.source, "using built-in strategy table");
        Arc::new(StaticCatalog::builtin())
    }
}

fn run_strategies(config: &VlabConfig, remote: bool, page: usize) -> Result<()> {
    if page == 0 {
        bail!("--page starts at 1");
    }
    let client = Arc::new(HttpBacktestClient::new(&config.api)?);
    let catalog = build_catalog(config, &client, remote);
    let strategies = catalog
        .load()
        .with_context(|| format!("load strategies from {} catalog", catalog.name()))?;

    let mut cursor = PaginationCursor::new(strategies, config.carousel.page_size);
    for _ in 1..page {
        cursor.next();
    }
    let window = cursor.window();
    if window.page_index + 1 != page {
        bail!(
            "page {page} out of range: the catalog has {} page(s)",
            window.page_count()
        );
    }

    println!(
        "Strategies: page {} of {} ({} total)",
        window.page_index + 1,
        window.page_count(),
        window.total_items
    );
    println!();
    for strategy in cursor.current_page() {
        println!("{:<16} {}", strategy.id, strategy.name);
        for bullet in &strategy.bullet_points {
            println!("{:<16}   • {bullet}", "");
        }
        if let Some(description) = &strategy.description {
            println!("{:<16}   {description}", "");
        }
    }
    Ok(())
}

fn parse_date(flag: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("--{flag} must be YYYY-MM-DD, got '{value}'"))
}

#[allow(clippy::too_many_arguments)]
fn run_backtest_cmd(
    config: &VlabConfig,
    strategy_id: &str,
    symbol: &str,
    start: &str,
    end: &str,
    json: bool,
    equity_csv: Option<&Path>,
    wait: Duration,
) -> Result<()> {
    let start_date = parse_date("start", start)?;
    let end_date = parse_date("end", end)?;

    let client = Arc::new(HttpBacktestClient::new(&config.api)?);
    let remote = config.catalog.source == CatalogSource::Remote;
    let catalog = build_catalog(config, &client, remote);
    let mut controller =
        WorkflowController::new(catalog, client).context("spawn backtest worker")?;
    let deadline = Instant::now() + wait;

    if remote {
        controller.refresh_strategies();
        while controller.catalog_revision() == 0 && controller.catalog_error().is_none() {
            if !wait_until(&mut controller, deadline) {
                bail!("timed out loading the strategy list");
            }
        }
    }

    if !controller.select_strategy_by_id(strategy_id) {
        let ids: Vec<&str> = controller.strategies().iter().map(|s| s.id.as_str()).collect();
        bail!("unknown strategy '{strategy_id}'. Valid: {}", ids.join(", "));
    }
    controller.update_config(
        ConfigPatch::new()
            .symbol(symbol)
            .start_date(start_date)
            .end_date(end_date),
    );

    match controller.submit() {
        SubmitOutcome::Dispatched(ticket) => {
            info!(ticket = ticket.0, strategy = strategy_id, "backtest submitted")
        }
        SubmitOutcome::NotReady(issue) => bail!("configuration not ready: {}", issue.hint()),
        SubmitOutcome::WorkerUnavailable => bail!("backtest worker is not running"),
        SubmitOutcome::InFlight | SubmitOutcome::WrongStep => {
            bail!("controller refused the submission")
        }
    }

    while controller.state().step() == Step::Submitting {
        if !wait_until(&mut controller, deadline) {
            bail!("timed out after {}s waiting for the backtest", wait.as_secs());
        }
    }

    let outcome = match controller.state() {
        WorkflowState::Results { config, result, .. } => {
            if let Some(path) = equity_csv {
                export::write_equity_csv(result, path)
                    .with_context(|| format!("write equity curve to {}", path.display()))?;
                info!(path = %path.display(), "equity curve written");
            }
            if json {
                println!("{}", export::export_json(result)?);
            } else {
                print_summary(config, result);
            }
            Ok(())
        }
        WorkflowState::Failed { message, .. } => Err(message.clone()),
        other => Err(format!("backtest ended in step {}", other.step().label())),
    };

    controller.shutdown();
    if let Err(message) = outcome {
        eprintln!("Backtest failed: {message}");
        std::process::exit(1);
    }
    Ok(())
}

/// Wait for one worker response, bounded by `deadline`. False once it passes.
fn wait_until(controller: &mut WorkflowController, deadline: Instant) -> bool {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return false;
    }
    controller.wait(remaining)
}

fn print_summary(config: &BacktestConfiguration, result: &BacktestResult) {
    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {}", result.strategy_display_name);
    println!("Symbol:         {}", result.symbol);
    println!("Period:         {} to {}", config.start_date, config.end_date);
    println!("Points:         {}", result.equity_curve.len());
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {}", format_percentage(result.total_return, 2));
    println!("Sharpe Ratio:   {}", format_ratio(result.sharpe_ratio));
    println!("Max Drawdown:   {}", format_percentage(result.max_drawdown, 2));
    println!("Final Equity:   {}", format_number(result.final_equity(), 2));
    println!();
}
