//! SizeLab CLI: convert, plan, and replay commands.
//!
//! Commands:
//! - `convert`: size a trade from any one of margin, cost, quantity, or 1R
//! - `plan`: suggest a size that risks a fixed share of the portfolio
//! - `stop`: the stop loss implied by a known 1R and quantity
//! - `replay`: run a scripted editing session on a virtual clock

mod replay;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sizelab_core::format::format_value;
use sizelab_core::plan::{self, DEFAULT_LEVERAGE_CAP};
use sizelab_core::{
    formula, MetricField, PositionMetrics, PositionType, Precision, SessionConfig, TradeParameters,
};

use crate::replay::{ReplayEvent, ReplayReport, ReplayScript};

#[derive(Parser)]
#[command(name = "sizelab", about = "SizeLab CLI: leveraged position sizing")]
struct Cli {
    /// Session config (TOML). Controls debounce and display precision.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of a table.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct TradeArgs {
    /// Entry price.
    #[arg(long)]
    entry: f64,

    /// Stop-loss price.
    #[arg(long)]
    stop: f64,

    /// Leverage multiplier (e.g. 10 for 10x).
    #[arg(long, default_value_t = 1.0)]
    leverage: f64,

    /// Position direction: long or short.
    #[arg(long, default_value = "long")]
    side: PositionType,
}

impl TradeArgs {
    fn parameters(self) -> TradeParameters {
        TradeParameters::new(self.entry, self.stop, self.leverage, self.side)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute all four metrics from one of them.
    Convert {
        /// Field the value belongs to: margin, cost, quantity, or 1r.
        #[arg(long)]
        from: MetricField,

        /// Value of that field.
        #[arg(long)]
        value: f64,

        #[command(flatten)]
        trade: TradeArgs,
    },
    /// Suggest a size that risks `r-percent` of the portfolio.
    Plan {
        /// Portfolio value in account currency.
        #[arg(long)]
        portfolio: f64,

        /// Risk per trade as a fraction (0.01 = 1%).
        #[arg(long, default_value_t = 0.01)]
        r_percent: f64,

        /// Upper bound for the suggested maximum leverage.
        #[arg(long, default_value_t = DEFAULT_LEVERAGE_CAP)]
        leverage_cap: u32,

        /// Realized PnL to express in multiples of the suggested 1R.
        #[arg(long)]
        pnl: Option<f64>,

        #[command(flatten)]
        trade: TradeArgs,
    },
    /// Derive the stop loss from a known 1R and quantity.
    Stop {
        #[arg(long)]
        entry: f64,

        /// Amount at risk in account currency.
        #[arg(long)]
        one_r: f64,

        #[arg(long)]
        quantity: f64,

        #[arg(long, default_value = "long")]
        side: PositionType,
    },
    /// Replay a scripted editing session (TOML) and print what the host observes.
    Replay {
        /// Path to the script file.
        #[arg(long)]
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert { from, value, trade } => {
            run_convert(from, value, trade, &config, cli.json)
        }
        Commands::Plan { portfolio, r_percent, leverage_cap, pnl, trade } => {
            let opts = PlanOptions { portfolio, r_percent, leverage_cap, pnl };
            run_plan(&opts, trade, &config, cli.json)
        }
        Commands::Stop { entry, one_r, quantity, side } => {
            run_stop(entry, one_r, quantity, side, cli.json)
        }
        Commands::Replay { script } => run_replay(&script, &config, cli.json),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("SIZELAB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SessionConfig::default()),
    }
}

fn run_convert(
    from: MetricField,
    value: f64,
    trade: TradeArgs,
    config: &SessionConfig,
    json: bool,
) -> Result<()> {
    let params = trade.parameters();
    let metrics = formula::convert(from, value, &params)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print_params(&params);
        print_metrics(&metrics, &config.precision(), Some(from));
    }
    Ok(())
}

struct PlanOptions {
    portfolio: f64,
    r_percent: f64,
    leverage_cap: u32,
    pnl: Option<f64>,
}

#[derive(Serialize)]
struct PlanOutput {
    risk_budget: f64,
    max_leverage: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pnl_in_r: Option<f64>,
    metrics: PositionMetrics,
}

fn run_plan(opts: &PlanOptions, trade: TradeArgs, config: &SessionConfig, json: bool) -> Result<()> {
    let params = trade.parameters();
    let metrics = plan::suggest_metrics(opts.portfolio, opts.r_percent, &params)?;
    let output = PlanOutput {
        risk_budget: metrics.one_r,
        max_leverage: plan::max_leverage_for_stop(&params, opts.leverage_cap),
        pnl_in_r: opts.pnl.and_then(|pnl| plan::pnl_in_r(pnl, metrics.one_r)),
        metrics,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_params(&params);
        println!(
            "Risk budget: {:.2} ({:.2}% of {:.2})",
            output.risk_budget,
            opts.r_percent * 100.0,
            opts.portfolio
        );
        println!(
            "Max leverage for a {:.2}% stop: {}x",
            params.stop_distance_pct() * 100.0,
            output.max_leverage
        );
        if params.leverage > output.max_leverage as f64 {
            println!("Warning: {}x leverage exceeds the stop-distance limit", params.leverage);
        }
        if let Some(r) = output.pnl_in_r {
            println!("PnL: {r:+.2}R");
        }
        print_metrics(&output.metrics, &config.precision(), Some(MetricField::OneR));
    }
    Ok(())
}

fn run_stop(entry: f64, one_r: f64, quantity: f64, side: PositionType, json: bool) -> Result<()> {
    let Some(stop) = plan::estimate_stop_loss(entry, one_r, quantity, side) else {
        bail!("no positive stop for these inputs (entry, 1R and quantity must be positive)");
    };
    if json {
        println!("{}", serde_json::json!({ "stop_loss": stop }));
    } else {
        println!("{side} entry {entry}: stop at {stop} ({} per unit)", one_r / quantity);
    }
    Ok(())
}

fn run_replay(path: &Path, config: &SessionConfig, json: bool) -> Result<()> {
    let script = ReplayScript::from_file(path)?;
    let report = replay::run(&script, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &config.precision());
    }
    Ok(())
}

fn print_params(params: &TradeParameters) {
    println!(
        "{} entry {} stop {} leverage {}x (risk/unit {})",
        params.position_type,
        params.entry_price,
        params.stop_loss,
        params.leverage,
        params.risk_per_unit()
    );
}

fn print_metrics(metrics: &PositionMetrics, precision: &Precision, source: Option<MetricField>) {
    for field in MetricField::ALL {
        let marker = if Some(field) == source { "*" } else { " " };
        println!(
            "{marker} {:>10}: {:>20}",
            field.label(),
            format_value(field, metrics.get(field), precision)
        );
    }
}

fn print_report(report: &ReplayReport, precision: &Precision) {
    if let Some(label) = &report.label {
        println!("Session: {label}");
    }
    for event in &report.events {
        match event {
            ReplayEvent::Committed { at_ms, field, metrics } => {
                println!("[{at_ms:>6}ms] commit from {field}");
                print_metrics(metrics, precision, Some(*field));
            }
            ReplayEvent::Skipped { at_ms, field, reason } => {
                println!("[{at_ms:>6}ms] skipped {field}: {reason}");
            }
            ReplayEvent::EditRejected { at_ms, field, reason } => {
                println!("[{at_ms:>6}ms] edit to {field} rejected: {reason}");
            }
            ReplayEvent::PushDeferred { at_ms, kind } => {
                println!("[{at_ms:>6}ms] {kind} push deferred (edit in flight)");
            }
            ReplayEvent::TornDown { at_ms, cancelled_pending } => {
                let note = if *cancelled_pending { ", pending commit cancelled" } else { "" };
                println!("[{at_ms:>6}ms] session torn down{note}");
            }
        }
    }
    println!("Commits: {}", report.commits);
    match report.final_state {
        Some(state) => println!("Final state: {state:?}"),
        None => println!("Final state: torn down"),
    }
    for field in MetricField::ALL {
        if let Some(text) = report.final_display.get(field.label()) {
            println!("  {:>10}: {text}", field.label());
        }
    }
}
