pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod scheduler;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use db::{NewAdmin, Store};
use scheduler::Maintenance;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.clone(), value.clone())?;
        }
        let (layer, task) = builder
            .extra_field("env", config.general.environment.clone())?
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

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("serve" | "-s" | "--serve") => run_server(config, prometheus_handle).await,

        Some("create-superadmin") => {
            if args.len() < 5 {
                println!("Usage: tanggapin create-superadmin <username> <name> <password>");
                return Ok(());
            }
            cmd_create_superadmin(&config, &args[2], &args[3], &args[4]).await
        }

        Some("purge-sessions") => cmd_purge_sessions(&config).await,

        Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }

        Some(other) => {
            println!("Unknown command: {}", other);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Tanggapin - Admin and session service");
    println!("Authentication backend for the village service dashboard");
    println!();
    println!("USAGE:");
    println!("  tanggapin [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("  serve                 Run the API server (default)");
    println!("  create-superadmin <username> <name> <password>");
    println!("                        Create an additional superadmin account");
    println!("  purge-sessions        Delete expired session rows and exit");
    println!("  help                  Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml, or set TANGGAPIN_TOKEN_SECRET /");
    println!("  TANGGAPIN_INTERNAL_API_KEY / TANGGAPIN_DATABASE_PATH.");
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Tanggapin v{} starting...", env!("CARGO_PKG_VERSION"));

    let shared = Arc::new(SharedState::new(config.clone()).await?);

    let maintenance_scheduler = if config.scheduler.enabled {
        let maintenance = Maintenance::new(
            shared.store.clone(),
            shared.rate_limiter.clone(),
            config.clone(),
        );
        Some(maintenance.start().await?)
    } else {
        None
    };

    let app_state = api::create_app_state(shared, prometheus_handle);
    let app = api::router(app_state).await;

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    server_handle.abort();
    if let Some(mut sched) = maintenance_scheduler {
        let _ = sched.shutdown().await;
    }
    info!("Server stopped");

    Ok(())
}

async fn cmd_create_superadmin(
    config: &Config,
    username: &str,
    name: &str,
    password: &str,
) -> anyhow::Result<()> {
    if username.trim().is_empty() {
        anyhow::bail!("Username must not be blank");
    }
    if username.trim().contains(char::is_whitespace) {
        anyhow::bail!("Username must not contain whitespace");
    }
    if password.len() < 8 {
        anyhow::bail!("Password must be at least 8 characters");
    }

    let store = Store::new(&config.general.database_path).await?;

    if store.get_admin_by_username(username.trim()).await?.is_some() {
        anyhow::bail!("Username already taken: {}", username.trim());
    }

    let admin = store
        .create_admin(
            NewAdmin {
                username: username.trim().to_string(),
                name: name.trim().to_string(),
                password: password.to_string(),
                role: "superadmin".to_string(),
                village_id: None,
            },
            &config.security,
        )
        .await?;

    println!("✓ Created superadmin '{}' (ID: {})", admin.username, admin.id);
    Ok(())
}

async fn cmd_purge_sessions(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let now = chrono::Utc::now().to_rfc3339();
    let purged = store.purge_expired_sessions(&now).await?;
    println!("✓ Purged {} expired sessions", purged);
    Ok(())
}
