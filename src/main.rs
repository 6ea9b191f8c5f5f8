use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fieldform::client::{format_api_error, ApiClient};
use fieldform::config::Config;
use fieldform::{Provider, ResourceError, ResourceHandler, ResourceState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Drive provider resources from the command line
#[derive(Parser, Debug)]
#[command(name = "fieldform", version, about, long_about = None)]
struct Args {
    /// Base URL of the remote API
    #[arg(long)]
    api_url: Option<String>,

    /// Account scoping every request
    #[arg(short, long)]
    account: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List resource kinds
    Kinds,
    /// Print the schema of one kind, or of every kind
    Schema { kind: Option<String> },
    /// Check a state document against the kind's schema
    Validate { kind: String, file: PathBuf },
    /// Refresh a state document from the remote API
    Read { kind: String, file: PathBuf },
    /// Create the resource described by a state document
    Create { kind: String, file: PathBuf },
    /// Apply configuration changes to an existing resource
    Update { kind: String, file: PathBuf },
    /// Delete the resource referenced by a state document
    Delete { kind: String, file: PathBuf },
    /// Adopt an existing remote resource by id
    Import { kind: String, id: String },
    /// Persist connection defaults
    Configure {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
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
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("fieldform started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("fieldform").join("fieldform.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".fieldform").join("fieldform.log");
    }
    PathBuf::from("fieldform.log")
}

/// Load a state document; `.yaml`/`.yml` files are parsed as YAML
fn load_state(path: &Path) -> Result<ResourceState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state document {:?}", path))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let state = if is_yaml {
        serde_yaml::from_str(&content).context("Failed to parse YAML state document")?
    } else {
        serde_json::from_str(&content).context("Failed to parse JSON state document")?
    };
    Ok(state)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn describe(error: &ResourceError) -> String {
    match error {
        ResourceError::Remote(inner) => format_api_error(inner),
        other => other.to_string(),
    }
}

fn lookup(provider: &Provider, kind: &str) -> Result<Arc<dyn ResourceHandler>> {
    match provider.resource(kind) {
        Some(resource) => Ok(resource),
        None => bail!(
            "Unknown resource kind '{}'. Available: {}",
            kind,
            provider.kinds().join(", ")
        ),
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();

    if let Command::Configure {
        token,
        timeout_secs,
    } = &args.command
    {
        if let Some(url) = &args.api_url {
            config.api_url = Some(url.clone());
        }
        if let Some(account) = &args.account {
            config.account = Some(account.clone());
        }
        if token.is_some() {
            config.token = token.clone();
        }
        if timeout_secs.is_some() {
            config.timeout_secs = *timeout_secs;
        }
        config.save()?;
        tracing::info!("Saved configuration to {:?}", Config::config_path());
        return Ok(());
    }

    let settings = config.api_settings(args.api_url.as_deref(), args.account.as_deref())?;
    tracing::debug!("Using API at {}", settings.base_url);
    let client = ApiClient::new(&settings)?;
    let provider = Provider::new(client)?;

    let outcome = match args.command {
        Command::Kinds => {
            for kind in provider.kinds() {
                println!("{}", kind);
            }
            return Ok(());
        },
        Command::Schema { kind: None } => return print_json(&provider.schema()),
        Command::Schema { kind: Some(kind) } => {
            return print_json(&lookup(&provider, &kind)?.schema());
        },
        Command::Validate { kind, file } => {
            let state = load_state(&file)?;
            lookup(&provider, &kind)?.validate(&state).map(|_| state)
        },
        Command::Read { kind, file } => {
            let mut state = load_state(&file)?;
            lookup(&provider, &kind)?.read(&mut state).await.map(|_| state)
        },
        Command::Create { kind, file } => {
            let mut state = load_state(&file)?;
            lookup(&provider, &kind)?.create(&mut state).await.map(|_| state)
        },
        Command::Update { kind, file } => {
            let mut state = load_state(&file)?;
            lookup(&provider, &kind)?.update(&mut state).await.map(|_| state)
        },
        Command::Delete { kind, file } => {
            let mut state = load_state(&file)?;
            lookup(&provider, &kind)?.delete(&mut state).await.map(|_| state)
        },
        Command::Import { kind, id } => {
            let mut state = ResourceState::new();
            lookup(&provider, &kind)?
                .import(&id, &mut state)
                .await
                .map(|_| state)
        },
        Command::Configure { .. } => return Ok(()),
    };

    match outcome {
        Ok(state) => print_json(&state),
        Err(e) => {
            tracing::error!("{}", e);
            bail!("{}", describe(&e))
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}
