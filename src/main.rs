use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info};
use martingale_ladder::config::exchange::load_exchange_config;
use martingale_ladder::config::{load_config, print_field_help};
use martingale_ladder::constants::{DEFAULT_SESSION_FILE, DEFAULT_SYMBOL};
use martingale_ladder::engine::{EntryEdit, LadderForm, SettingsEdit};
use martingale_ladder::format::parse_numeric;
use martingale_ladder::logging::ladder_audit::LadderAuditLogger;
use martingale_ladder::payload::{build_backtest_request, build_bot_request, BacktestPeriod};
use martingale_ladder::price::PriceFeed;
use martingale_ladder::session::FileSessionStore;
use martingale_ladder::ui::console::ConsoleRenderer;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportKind {
    /// Bot-creation body (amounts include leverage)
    Bot,
    /// Backtest body (amounts exclude leverage)
    Backtest,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Martingale Ladder Planner", long_about = None)]
struct Args {
    /// Load settings from a TOML file instead of the session
    #[arg(short, long)]
    config: Option<String>,

    /// Instrument to restore or start (default BTCUSDT)
    #[arg(long)]
    symbol: Option<String>,

    #[arg(short, long)]
    list_fields: bool,

    #[arg(long)]
    create: bool,

    /// Apply a settings edit, e.g. --set entry_count=6 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    edits: Vec<String>,

    /// Manual mode: set the amount of one step, e.g. --entry-amount 2=400
    #[arg(long = "entry-amount", value_name = "STEP=VALUE")]
    entry_amounts: Vec<String>,

    /// Manual mode: set the price of one step, e.g. --entry-price 2=97.5
    #[arg(long = "entry-price", value_name = "STEP=VALUE")]
    entry_prices: Vec<String>,

    /// Live price to seed the first entry price with
    #[arg(long)]
    price: Option<f64>,

    /// Session file (default: LADDER_SESSION_FILE or .ladder_session.json)
    #[arg(long)]
    session: Option<String>,

    /// Print a request body as JSON
    #[arg(long, value_enum)]
    export: Option<ExportKind>,

    /// Backtest window: 1m, 3m, 6m or 1y
    #[arg(long, default_value = "3m")]
    period: BacktestPeriod,

    /// Reset the form after exporting a bot request
    #[arg(long)]
    reset: bool,
}

/// Quote supplied on the command line, valid for any symbol.
struct FixedPriceFeed(f64);

impl PriceFeed for FixedPriceFeed {
    fn last_price(&self, _symbol: &str) -> Result<f64> {
        Ok(self.0)
    }
}

fn parse_step_value(raw: &str) -> Result<(u32, f64)> {
    let (step, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected STEP=VALUE, got '{}'", raw))?;
    let step: u32 = step
        .trim()
        .parse()
        .with_context(|| format!("Invalid step in '{}'", raw))?;
    Ok((step, parse_numeric(value)))
}

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

fn main() -> Result<()> {
    // ---------------------------------------------------------
    // 1. Setup Logging (Tracing)
    // ---------------------------------------------------------
    let file_appender = tracing_appender::rolling::daily("logs", "application.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Console Layer (Env Filter)
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into())
                .add_directive("martingale_ladder=info".parse()?),
        );

    // File Layer (Simple Text)
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_target(false)
        .with_filter(tracing_subscriber::EnvFilter::new(
            "info,martingale_ladder=debug",
        ));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    let args = Args::parse();

    if args.list_fields {
        print_field_help();
        return Ok(());
    }

    let fixed_feed = args.price.map(FixedPriceFeed);
    let feed: Option<&dyn PriceFeed> = fixed_feed.as_ref().map(|f| f as &dyn PriceFeed);

    if args.create {
        if let Err(e) = martingale_ladder::config::creator::create_config(feed) {
            error!("Error creating config: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    // ---------------------------------------------------------
    // 2. Restore Form State
    // ---------------------------------------------------------
    let session_path = args
        .session
        .clone()
        .or_else(|| env::var("LADDER_SESSION_FILE").ok())
        .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string());
    let store = FileSessionStore::open(&session_path);
    info!("Using session file: {}", store.path().display());

    let mut form = match &args.config {
        Some(path) => {
            info!("Loading config from: {}", path);
            LadderForm::new(load_config(path)?, store)
        }
        None => {
            let symbol = args.symbol.as_deref().unwrap_or(DEFAULT_SYMBOL);
            let mut form = LadderForm::restore(store, feed, symbol);
            if feed.is_some() {
                form.refresh_price(feed);
            }
            form
        }
    };

    // ---------------------------------------------------------
    // 3. Apply Edits
    // ---------------------------------------------------------
    for raw in &args.edits {
        let edit = SettingsEdit::parse_assignment(raw)?;
        info!("Applying {:?}", edit);
        form.apply(edit);
    }

    for raw in &args.entry_prices {
        let (step, price) = parse_step_value(raw)?;
        form.edit_entry(
            step,
            EntryEdit {
                price: Some(price),
                amount: None,
            },
        );
    }

    for raw in &args.entry_amounts {
        let (step, amount) = parse_step_value(raw)?;
        form.edit_entry(
            step,
            EntryEdit {
                price: None,
                amount: Some(amount),
            },
        );
    }

    ConsoleRenderer::render(form.state());

    // ---------------------------------------------------------
    // 4. Export Request Bodies
    // ---------------------------------------------------------
    let Some(kind) = args.export else {
        return Ok(());
    };

    if let Err(e) = form.settings().validate() {
        error!("Settings are not ready for submission: {}", e);
        std::process::exit(1);
    }

    let audit_logger = match LadderAuditLogger::new("logs") {
        Ok(l) => Some(l),
        Err(e) => {
            error!("Failed to initialize Ladder Audit Logger: {}", e);
            None
        }
    };

    match kind {
        ExportKind::Bot => {
            let exchange_config = load_exchange_config();
            let request = build_bot_request(form.state(), &exchange_config);
            println!("{}", serde_json::to_string_pretty(&request)?);
            if let Some(logger) = &audit_logger {
                logger.log_bot_request(&request);
            }
            info!(
                "Bot request {} prepared for {} on {}",
                request.metadata.client_request_id,
                request.basic.symbol,
                exchange_config.exchange
            );
            if args.reset {
                form.reset_after_submit(feed);
            }
        }
        ExportKind::Backtest => {
            let request = build_backtest_request(form.state(), args.period);
            println!("{}", serde_json::to_string_pretty(&request)?);
            if let Some(logger) = &audit_logger {
                logger.log_backtest_request(&request);
            }
            info!(
                "Backtest request prepared for {} over {}",
                request.basic.symbol, args.period
            );
        }
    }

    Ok(())
}
