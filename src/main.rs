use anyhow::{Context, Result};
use armsnap::azure::client::ArmClient;
use armsnap::azure::http::format_arm_error;
use armsnap::config::Config;
use armsnap::snapshot::{CollectError, Collector, DirectorySink, SnapshotSink, StdoutSink};
use armsnap::TriggerEvent;
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Snapshot an Azure resource group for each Event Grid event
#[derive(Parser, Debug)]
#[command(name = "armsnap", version, about, long_about = None)]
struct Args {
    /// File holding one Event Grid event or an array of them (stdin if omitted)
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// Directory to write snapshot documents to (stdout if omitted)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Config file (defaults to <config dir>/armsnap/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subscription to read resources from
    #[arg(long)]
    subscription_id: Option<String>,

    /// Directory tenant of the service principal
    #[arg(long)]
    tenant_id: Option<String>,

    /// Service principal application id
    #[arg(long)]
    client_id: Option<String>,

    /// Resource Manager endpoint (for sovereign clouds)
    #[arg(long)]
    management_endpoint: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Log file (defaults to <config dir>/armsnap/armsnap.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<PathBuf>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(level_filter) = level.as_filter() else {
        return Ok(None);
    };

    let log_path = log_file.unwrap_or_else(get_log_path);

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // RUST_LOG, when set, refines the level chosen on the command line
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("armsnap started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("armsnap").join("armsnap.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".armsnap").join("armsnap.log");
    }
    PathBuf::from("armsnap.log")
}

fn load_config(args: &Args) -> Result<Config> {
    let file = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let flags = Config {
        tenant_id: args.tenant_id.clone(),
        client_id: args.client_id.clone(),
        client_secret: None,
        subscription_id: args.subscription_id.clone(),
        management_endpoint: args.management_endpoint.clone(),
        authority_host: None,
    };

    Ok(file.merge(Config::from_env()).merge(flags))
}

fn read_events(path: Option<&PathBuf>) -> Result<Vec<TriggerEvent>> {
    let input = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read events from {:?}", path))?,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read events from stdin")?;
            input
        }
    };

    TriggerEvent::parse_batch(&input)
}

fn describe(err: &CollectError) -> String {
    match err {
        CollectError::InitializationFailed(cause)
        | CollectError::EnumerationFailed { cause, .. }
        | CollectError::FetchFailed { cause, .. } => {
            format!("{} ({})", err, format_arm_error(cause))
        }
        _ => err.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.clone())?;

    let settings = load_config(&args)?.resolve()?;
    tracing::info!(
        "Using subscription: {}, endpoint: {}",
        settings.subscription_id,
        settings.management_endpoint
    );

    let events = read_events(args.event.as_ref())?;
    tracing::info!("Received {} events", events.len());

    let client = Arc::new(ArmClient::new(&settings)?);
    let sink: Arc<dyn SnapshotSink> = match &args.output_dir {
        Some(dir) => Arc::new(DirectorySink::new(dir)),
        None => Arc::new(StdoutSink),
    };
    let collector = Collector::with_api(client, sink);

    let total = events.len();
    let mut failed = 0;

    for event in events {
        let event_id = event.id.clone();
        match collector.run(event).await {
            Ok(snapshot_id) => {
                tracing::info!("Event {} -> snapshot {}", event_id, snapshot_id);
            }
            Err(err) => {
                failed += 1;
                tracing::error!("Event {} failed [{}]: {}", event_id, err.kind(), err);
                eprintln!("Event {}: {}", event_id, describe(&err));
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} events failed", failed, total);
    }

    Ok(())
}
