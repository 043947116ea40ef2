mod config_commands;

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    talapker_auto_reply::{EngineSettings, ReplyEngine},
    talapker_config::{TalapkerConfig, validate},
    talapker_providers::{ContentApiClient, NlpApiClient},
    talapker_service_traits::Advisor,
    talapker_sessions::{ConversationStore, InMemoryConversationStore},
    talapker_telegram::start_polling,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "talapker", about = "Talapker: admissions assistant bot for Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ./talapker.toml, then ~/.config/talapker/).
    #[arg(long, global = true, env = "TALAPKER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default when no subcommand is provided).
    Run,
    /// Validate the configuration and report errors/warnings.
    CheckConfig,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Explicit `--config` must load; otherwise fall back to discovery.
fn load_config(cli: &Cli) -> anyhow::Result<(Option<PathBuf>, TalapkerConfig)> {
    match &cli.config {
        Some(path) => {
            let mut config = talapker_config::load_config(path)
                .with_context(|| format!("loading {}", path.display()))?;
            talapker_config::apply_env_overrides(&mut config);
            Ok((Some(path.clone()), config))
        },
        None => {
            let path = talapker_config::resolve_config_path(None).ok();
            Ok((path, talapker_config::discover_and_load()))
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    let (config_path, config) = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Run) => run(config).await,
        Some(Commands::CheckConfig) => config_commands::check(config_path.as_deref(), &config),
    }
}

async fn run(config: TalapkerConfig) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "talapker starting");

    let report = validate(&config);
    for d in &report.diagnostics {
        warn!(path = d.path, severity = %d.severity, "{}", d.message);
    }
    if report.has_errors() {
        anyhow::bail!("invalid configuration; run `talapker check-config` for details");
    }

    let store = Arc::new(InMemoryConversationStore::new());
    let content = Arc::new(ContentApiClient::from_config(&config.content_api)?);
    let advisor = NlpApiClient::from_config(&config.advisor)?.map(|c| Arc::new(c) as Arc<dyn Advisor>);
    if advisor.is_none() {
        warn!("advisor not configured, free text gets the fallback reply");
    }

    let engine = Arc::new(ReplyEngine::new(
        Arc::clone(&store) as Arc<dyn ConversationStore>,
        content,
        advisor,
        EngineSettings::from(&config.routing),
    )?);

    let handle = start_polling(&config.telegram, engine)
        .await
        .context("starting telegram polling")?;
    let cancel = handle.cancel_token();

    let sweeper = config.routing.idle_ttl().map(|ttl| {
        tokio::spawn(sweep_idle(
            Arc::clone(&store) as Arc<dyn ConversationStore>,
            ttl,
            config.routing.sweep_interval(),
            cancel.clone(),
        ))
    });

    tokio::select! {
        () = shutdown_signal() => {
            info!("shutdown requested, draining conversations");
            handle.stop().await;
        },
        () = cancel.cancelled() => {
            handle.join().await;
        },
    }

    cancel.cancel();
    if let Some(sweeper) = sweeper
        && let Err(e) = sweeper.await
    {
        error!(error = %e, "idle sweep task failed");
    }

    info!("talapker stopped");
    Ok(())
}

async fn sweep_idle(
    store: Arc<dyn ConversationStore>,
    ttl: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let evicted = store.evict_idle(ttl).await;
                if evicted > 0 {
                    info!(evicted, remaining = store.len(), "evicted idle conversations");
                } else {
                    debug!(remaining = store.len(), "idle sweep found nothing");
                }
            },
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
