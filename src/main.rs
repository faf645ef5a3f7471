use atlas::adapters::TelegramNotifier;
use atlas::alert::{AlertCheckStep, LogNotifier, Notifier};
use atlas::config::AppConfig;
use atlas::error::{AtlasError, Result};
use atlas::fetch::{
    BtcLockedFetcher, FetchStep, FlyoverFetcher, PowpegFetcher, RouteHealthFetcher,
};
use atlas::pipeline::{Scheduler, Step};
use atlas::report::ReportStep;
use atlas::store::SnapshotStore;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "atlas", about = "Rootstock bridge monitoring pipeline")]
struct Cli {
    /// Configuration directory
    #[arg(short, long, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitoring loop (default)
    Run,
    /// Run a single cycle and exit
    Once,
    /// Print the latest report
    Report,
    /// Evaluate alert rules against the latest report and exit
    CheckAlerts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)?;
    init_logging(&config);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Invalid configuration: {e}");
        }
        return Err(AtlasError::Internal(format!(
            "{} configuration error(s)",
            errors.len()
        )));
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_loop(&config).await,
        Commands::Once => run_once(&config).await,
        Commands::Report => print_report(&config),
        Commands::CheckAlerts => check_alerts(&config).await,
    }
}

async fn run_loop(config: &AppConfig) -> Result<()> {
    let scheduler = build_scheduler(config)?;
    info!(
        interval_secs = scheduler.interval().as_secs(),
        data_dir = %config.storage.data_dir.display(),
        "monitoring loop starting"
    );

    tokio::select! {
        _ = scheduler.run() => {}
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting");
        }
    }
    Ok(())
}

async fn run_once(config: &AppConfig) -> Result<()> {
    let scheduler = build_scheduler(config)?;
    let cycle = scheduler.run_cycle(1).await;
    if cycle.failed() > 0 {
        return Err(AtlasError::Internal(format!(
            "{} of {} steps failed",
            cycle.failed(),
            cycle.outcomes.len()
        )));
    }
    Ok(())
}

fn print_report(config: &AppConfig) -> Result<()> {
    let store = SnapshotStore::new(&config.storage.data_dir);
    match store.read_report()? {
        Some(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        None => Err(AtlasError::Unavailable(
            "no report generated yet".to_string(),
        )),
    }
}

async fn check_alerts(config: &AppConfig) -> Result<()> {
    let store = SnapshotStore::new(&config.storage.data_dir);
    let step = AlertCheckStep::new(store, &config.alerts.rules_path, build_notifier());
    step.execute().await
}

fn build_scheduler(config: &AppConfig) -> Result<Scheduler> {
    let store = SnapshotStore::new(&config.storage.data_dir);
    let timeout = Duration::from_secs(config.sources.fetch_timeout_secs);
    let sources = &config.sources;

    // Fixed order: route health reads the flyover snapshot written earlier
    // in the same cycle, and alerts evaluate the report just generated
    let steps: Vec<Box<dyn Step>> = vec![
        Box::new(FetchStep::new(
            Box::new(FlyoverFetcher::new(&sources.flyover, timeout)?),
            store.clone(),
            timeout,
        )),
        Box::new(FetchStep::new(
            Box::new(PowpegFetcher::new(&sources.powpeg, timeout)?),
            store.clone(),
            timeout,
        )),
        Box::new(FetchStep::new(
            Box::new(BtcLockedFetcher::new(&sources.btc_locked, timeout)?),
            store.clone(),
            timeout,
        )),
        Box::new(FetchStep::new(
            Box::new(RouteHealthFetcher::new(
                &sources.route_health,
                store.clone(),
                timeout,
            )?),
            store.clone(),
            timeout,
        )),
        Box::new(ReportStep::new(store.clone())),
        Box::new(AlertCheckStep::new(
            store,
            &config.alerts.rules_path,
            build_notifier(),
        )),
    ];

    Ok(Scheduler::new(
        steps,
        Duration::from_secs(config.scheduler.interval_secs),
    ))
}

fn build_notifier() -> Arc<dyn Notifier> {
    match TelegramNotifier::from_env() {
        Some(telegram) => Arc::new(telegram),
        None => {
            info!("No Telegram credentials, notifications go to the log only");
            Arc::new(LogNotifier)
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},atlas=debug", config.logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
