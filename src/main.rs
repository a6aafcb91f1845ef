//! Command line front end: one-shot scans and a live prewarm monitor.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use trade_route_scanner::{
    DashState, MonitorConfig, RefreshController, RouteFilter, RouteSort, ScanApiClient, ScanMode,
    ScanParams,
};

#[derive(Debug, Parser)]
#[command(name = "trade-route-scanner", version, about = "Scan trade routes and watch the cache prewarm job")]
struct Cli {
    /// Base URL of the scan service; defaults to the local dev server.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one scan and print the ranked routes.
    Scan {
        /// Start system for the scan.
        #[arg(long)]
        start: Option<String>,

        /// Available capital in ISK.
        #[arg(long)]
        budget: Option<f64>,

        /// Longest route to consider, in jumps.
        #[arg(long)]
        max_jumps: Option<u32>,

        /// Lowest acceptable security status along the route.
        #[arg(long)]
        min_security: Option<f64>,

        /// Minimum margin percentage.
        #[arg(long)]
        min_margin: Option<f64>,

        /// Commodities sampled per scan.
        #[arg(long)]
        sample_size: Option<u32>,

        /// Order book pages fetched per commodity.
        #[arg(long)]
        order_pages: Option<u32>,

        /// Sourcing lists to request.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Most routes to return.
        #[arg(long)]
        limit: Option<u32>,

        /// Upstream worker budget in seconds.
        #[arg(long)]
        max_runtime: Option<u64>,

        /// Sort column for the printed table.
        #[arg(long, value_enum, default_value_t = SortArg::Score)]
        sort: SortArg,

        /// Sort ascending instead of best-first.
        #[arg(long, default_value_t = false)]
        ascending: bool,

        /// Hide routes below this total profit.
        #[arg(long)]
        min_profit: Option<f64>,
    },

    /// Poll the prewarm job, once or continuously on the refresh interval.
    Monitor {
        /// Systems to watch, comma separated; defaults to the major hubs.
        #[arg(long, value_delimiter = ',')]
        systems: Vec<String>,

        /// Poll once and exit instead of watching.
        #[arg(long, default_value_t = false)]
        once: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Instant,
    List,
    Both,
}

impl From<ModeArg> for ScanMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Instant => ScanMode::Instant,
            ModeArg::List => ScanMode::List,
            ModeArg::Both => ScanMode::Both,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Score,
    Profit,
    Jumps,
}

impl From<SortArg> for RouteSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Score => RouteSort::Score,
            SortArg::Profit => RouteSort::Profit,
            SortArg::Jumps => RouteSort::Jumps,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trade_route_scanner=debug,info")),
        )
        .init();

    let cli = Cli::parse();

    let client = match cli.base_url.as_deref() {
        Some(base) => ScanApiClient::with_base_url(base),
        None => ScanApiClient::new(),
    };
    let client = match client {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(%err, "could not build the API client");
            return ExitCode::FAILURE;
        }
    };
    let ctrl = Arc::new(RefreshController::new(Arc::new(client)));

    match cli.cmd {
        Command::Scan {
            start,
            budget,
            max_jumps,
            min_security,
            min_margin,
            sample_size,
            order_pages,
            mode,
            limit,
            max_runtime,
            sort,
            ascending,
            min_profit,
        } => {
            let mut params = ScanParams::default();
            if let Some(v) = start {
                params.start_system = v;
            }
            if let Some(v) = budget {
                params.budget = v;
            }
            if let Some(v) = max_jumps {
                params.max_jumps = v;
            }
            if let Some(v) = min_security {
                params.min_security = v;
            }
            if let Some(v) = min_margin {
                params.min_margin_pct = v;
            }
            if let Some(v) = sample_size {
                params.sample_size = v;
            }
            if let Some(v) = order_pages {
                params.order_pages = v;
            }
            if let Some(v) = mode {
                params.mode = v.into();
            }
            if let Some(v) = limit {
                params.limit = v;
            }
            if let Some(v) = max_runtime {
                params.max_runtime_secs = v;
            }

            ctrl.trigger_scan(&params).await;

            let filter = RouteFilter {
                min_profit,
                ..RouteFilter::default()
            };
            print_routes(&ctrl.snapshot().await, &filter, sort.into(), !ascending);
        }

        Command::Monitor { systems, once } => {
            let systems = if systems.is_empty() {
                MonitorConfig::default().systems
            } else {
                systems
            };

            if once {
                ctrl.poll_status(&systems).await;
                print_monitor(&ctrl.snapshot().await);
            } else {
                let mut changes = ctrl.subscribe();
                ctrl.enable_auto_refresh(systems);
                loop {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            tracing::info!("shutting down");
                            break;
                        }
                        changed = changes.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            print_monitor(&ctrl.snapshot().await);
                        }
                    }
                }
                ctrl.disable_auto_refresh();
            }
        }
    }

    ExitCode::SUCCESS
}

fn print_routes(state: &DashState, filter: &RouteFilter, sort: RouteSort, descending: bool) {
    let routes = state.visible_routes(filter, sort, descending);
    println!(
        "source: {}   sorted by: {}   {} route(s)",
        state.source.label(),
        sort.label(),
        routes.len()
    );
    println!(
        "{:<28} {:>5} {:>9} {:>9} {:>9} {:>5} {:<8} {:>5} {:>6}  CARGO",
        "ROUTE", "JUMPS", "PROFIT", "P/JUMP", "SCORE", "ETA", "SEC", "RISK", "DEMAND"
    );
    for route in &routes {
        println!(
            "{:<28} {:>5} {:>9} {:>9} {:>9} {:>4}m {:<8} {:>5.2} {:>5}%  {}",
            format!("{} -> {}", route.from, route.to),
            route.jumps,
            format_isk(route.profit),
            format_isk(route.profit_per_jump()),
            format_isk(route.score()),
            route.eta_minutes(),
            route.security.label(),
            route.risk,
            route.demand,
            route.primary_commodity(),
        );
    }
}

fn print_monitor(state: &DashState) {
    let monitor = &state.monitor;
    let now = OffsetDateTime::now_utc();

    if let Some(summary) = &monitor.summary {
        println!(
            "cache: {} fresh / {} stale / {} missing of {}",
            summary.fresh, summary.stale, summary.missing, summary.total
        );
        if let Some(next) = summary.next_expiry_at {
            println!("next expiry: {}", fmt_time(next));
        }
    }
    if let Some(run) = monitor.last_run_time() {
        println!("last run: {}", fmt_time(run));
    }

    for entry in &monitor.entries {
        println!(
            "{:<16} {:<8} {}",
            entry.display_name(),
            entry.status.label(),
            entry.age_string(now).unwrap_or_else(|| "-".into())
        );
    }
    println!();
}

fn fmt_time(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

fn format_isk(value: f64) -> String {
    let rounded = value.round() as i64;
    if rounded.abs() >= 1_000_000 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if rounded.abs() >= 1_000 {
        format!("{:.0}k", value / 1_000.0)
    } else {
        format!("{rounded}")
    }
}
