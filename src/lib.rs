pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use tokio::signal;
use tower_sessions::ExpiredDeletion;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use services::Provisioned;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Init)) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists, leaving it untouched.");
        }
        return Ok(());
    }

    let config = Config::load()?;
    let prometheus_handle = init_observability(&config)?;

    match cli.command {
        None | Some(Commands::Serve) => run_server(config, prometheus_handle).await,
        Some(Commands::CreateAdmin { username, password }) => {
            cli::cmd_create_admin(&config, &username, &password).await
        }
        Some(Commands::Seed) => cli::cmd_seed(&config).await,
        Some(Commands::Init) => Ok(()),
    }
}

fn init_observability(
    config: &Config,
) -> anyhow::Result<Option<metrics_exporter_prometheus::PrometheusHandle>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json_logs = config.observability.json_logs;
    let text_layer = (!json_logs).then(|| tracing_subscriber::fmt::layer());
    let json_layer = json_logs.then(|| tracing_subscriber::fmt::layer().json());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;
        let env = if config.security.mode.is_development() {
            "development"
        } else {
            "production"
        };

        let (layer, task) = tracing_loki::builder()
            .label("app", "collegecms")?
            .extra_field("env", env)?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    Ok(prometheus_handle)
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    config.validate()?;

    info!("collegecms v{} starting...", env!("CARGO_PKG_VERSION"));
    if config.security.mode.is_development() {
        warn!("Running in development mode: the bootstrap admin login is enabled");
    }

    let api_state = api::create_app_state_from_config(config.clone(), prometheus_handle).await?;

    if let Some(admin) = &config.security.initial_admin {
        match api_state
            .auth_service()
            .ensure_admin(&admin.username, &admin.password)
            .await
        {
            Ok(Provisioned::Created) => info!(username = %admin.username, "Initial admin created"),
            Ok(Provisioned::AlreadyPresent) => {}
            Err(e) => error!(username = %admin.username, error = %e, "Failed to provision initial admin"),
        }
    }

    if config.general.seed_demo_content {
        services::seed_demo_content(api_state.store()).await?;
    }

    let cleanup_interval = Duration::from_secs(config.server.session_cleanup_interval_seconds.max(1));
    let session_cleanup = tokio::spawn(
        api_state
            .session_store
            .clone()
            .continuously_delete_expired(cleanup_interval),
    );

    let port = config.server.port;
    let app = api::router(api_state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Web server running at http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    session_cleanup.abort();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
