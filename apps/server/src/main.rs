//! PriceBell - periodic price digest bot
//!
//! Fetches tracked pair prices on a fixed cadence and sends each Telegram
//! subscriber a digest of the pairs they picked.

mod config;

use clap::Parser;
use config::{bot_token, AppConfig};
use pricebell_alerts::{CommandHandler, Registry, TelegramBot};
use pricebell_engine::{BroadcastDispatcher, Scheduler};
use pricebell_feeds::{OrderBookConfig, OrderBookSource};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Name of the recurring digest job.
const BROADCAST_JOB: &str = "broadcast";
/// Name of the one-shot digest sent shortly after startup.
const WARMUP_JOB: &str = "warmup";

/// PriceBell CLI
#[derive(Parser, Debug)]
#[command(name = "pricebell")]
#[command(about = "Periodic price digest Telegram bot", long_about = None)]
struct Args {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Seconds between digests
    #[arg(short, long)]
    interval_secs: Option<u64>,

    /// Seconds after startup before the first digest
    #[arg(long)]
    initial_delay_secs: Option<u64>,

    /// Order-book API root URL
    #[arg(long)]
    order_book_url: Option<String>,

    /// Ignore commands from group chats
    #[arg(long, default_value_t = false)]
    deny_groups: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Apply command-line overrides on top of file configuration.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(secs) = self.interval_secs {
            config.broadcast.interval_secs = secs;
        }
        if let Some(secs) = self.initial_delay_secs {
            config.broadcast.initial_delay_secs = secs;
        }
        if let Some(url) = &self.order_book_url {
            config.source.base_url = url.clone();
        }
        if self.deny_groups {
            config.telegram.allow_groups = false;
        }
    }
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let token = bot_token()?;
    let pairs = Arc::new(config.pair_table()?);

    info!("🚀 PriceBell starting...");
    info!("  Pairs: {}", pairs.ids().map(|id| id.as_str()).collect::<Vec<_>>().join(", "));
    info!("  Interval: {}s", config.broadcast.interval_secs);
    info!("  Initial delay: {}s", config.broadcast.initial_delay_secs);
    info!("  Order book: {}", config.source.base_url);
    info!("  Groups allowed: {}", config.telegram.allow_groups);

    let registry = Arc::new(Registry::new(Arc::clone(&pairs)));
    let source = Arc::new(OrderBookSource::new(OrderBookConfig::from(&config.source))?);

    let handler = CommandHandler::new(
        Arc::clone(&registry),
        config.telegram.access_policy(),
        config.broadcast.interval(),
    );
    let bot = Arc::new(TelegramBot::new(
        &token,
        handler,
        config.telegram.send_timeout(),
    ));

    let dispatcher = Arc::new(BroadcastDispatcher::new(
        pairs,
        registry,
        source,
        bot.clone(),
    ));

    let scheduler = Scheduler::new();
    scheduler.schedule_once(
        WARMUP_JOB,
        config.broadcast.initial_delay(),
        Arc::clone(&dispatcher).into_task(),
    );
    scheduler.schedule_recurring(
        BROADCAST_JOB,
        config.broadcast.interval(),
        dispatcher.into_task(),
    )?;

    let mut bot_handle = tokio::spawn(bot.run());

    info!("Press Ctrl+C to stop...");
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for Ctrl+C");
            }
            warn!("Shutdown signal received");
        }
        _ = &mut bot_handle => {
            warn!("Telegram command loop exited");
        }
    }

    scheduler.shutdown();
    bot_handle.abort();

    info!("👋 PriceBell stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Startup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "pricebell",
            "--interval-secs",
            "60",
            "--order-book-url",
            "http://localhost:8080",
            "--deny-groups",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.broadcast.interval_secs, 60);
        assert_eq!(config.broadcast.initial_delay_secs, 5);
        assert_eq!(config.source.base_url, "http://localhost:8080");
        assert!(!config.telegram.allow_groups);
    }

    #[test]
    fn test_args_defaults_leave_config() {
        let args = Args::parse_from(["pricebell"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.broadcast.interval_secs, 1800);
        assert!(config.telegram.allow_groups);
        assert_eq!(args.log_level, "info");
    }
}
