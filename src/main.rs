use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use phonepad::config::AppConfig;
use phonepad::controller::{InputRouter, RouterHandle};
use phonepad::mapping::{KeySink, LogKeySink};
use phonepad::server::onboarding::{public_host, OnboardingData};
use phonepad::server::{TransportSettings, WebSocketServer};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Turns phones into gamepads for games running on this machine
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Config file, defaults to the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log key commands instead of pressing host keys
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_config(&args).await?;
    let config = loaded.config;
    let level = config.log_level();
    setup(*level.as_ref().unwrap_or(&Level::INFO))?;

    if loaded.created {
        info!("Wrote default config to {}", loaded.path.display());
    }
    info!("Loaded config from {}", loaded.path.display());
    if let Err(e) = level {
        warn!("{}, using info", e);
    }
    info!("Starting phonepad with {:?}", config);

    // Onboarding-Daten einmalig beim Start erzeugen
    let host = public_host(config.public_host.as_deref());
    let onboarding = OnboardingData::for_host_or_plain(&host, config.port);
    info!("Players join at {}", onboarding.join_url);

    let router = RouterHandle::new(InputRouter::new(key_sink(args.dry_run), onboarding));

    let shutdown = CancellationToken::new();
    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received"),
            Err(e) => error!("Unable to listen for Ctrl-C: {}", e),
        }
        ctrl_c_token.cancel();
    });

    let server = WebSocketServer::create(TransportSettings::from(&config), router, shutdown)
        .bind()
        .await
        .map_err(|e| eyre!("Failed to start server: {}", e))?;
    server.run_until_shutdown().await?;

    info!("phonepad stopped");
    Ok(())
}

/// Config plus what happened while loading it, logged once the subscriber is up
struct LoadedConfig {
    config: AppConfig,
    path: PathBuf,
    created: bool,
}

async fn load_config(args: &Args) -> Result<LoadedConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()?,
    };
    // Stelle sicher, dass eine Standardkonfiguration existiert
    let created = AppConfig::ensure_default_config(&path).await?;
    let mut config = AppConfig::load(&path).await?;

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    Ok(LoadedConfig {
        config,
        path,
        created,
    })
}

#[cfg(feature = "host-keys")]
fn key_sink(dry_run: bool) -> Box<dyn KeySink> {
    if dry_run {
        Box::new(LogKeySink)
    } else {
        Box::new(phonepad::mapping::RdevKeySink)
    }
}

#[cfg(not(feature = "host-keys"))]
fn key_sink(dry_run: bool) -> Box<dyn KeySink> {
    if !dry_run {
        warn!("Built without host-keys, key commands are only logged");
    }
    Box::new(LogKeySink)
}

fn setup(level: Level) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env(level);
    Ok(())
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
