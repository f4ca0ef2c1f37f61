use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use codedrop_cache::{AdmissionCache, RedisAdmissionCache};
use codedrop_metadata::{MetadataStore, PostgresMetadataStore};
use codedrop_server::api::{self, AppState};
use codedrop_server::config::CodedropConfig;
use codedrop_server::reclaimer::Reclaimer;
use codedrop_server::service::DropService;
use codedrop_store::{ObjectStore, S3ObjectStore};

/// CodeDrop HTTP server.
#[derive(Parser, Debug)]
#[command(name = "codedrop-server", about = "Ephemeral encrypted file handoff server")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "codedrop.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber from RUST_LOG or default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does
    // not exist; environment variables override connection settings either
    // way.
    let mut config: CodedropConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(
            path = %cli.config,
            "config file not found, using defaults"
        );
        toml::from_str("")?
    };
    config.apply_env()?;

    // Connect the backends. Failure here is fatal: a server that cannot
    // reach its database or cache has nothing useful to serve.
    let metadata: Arc<dyn MetadataStore> =
        Arc::new(PostgresMetadataStore::new(&config.database.to_postgres_config()).await?);

    let admission_cache = RedisAdmissionCache::new(&config.redis.to_redis_config())?;
    admission_cache.ping().await?;
    let admission: Arc<dyn AdmissionCache> = Arc::new(admission_cache);

    let objects: Arc<dyn ObjectStore> =
        Arc::new(S3ObjectStore::new(config.storage.to_s3_config()).await);

    let service = Arc::new(DropService::new(
        Arc::clone(&metadata),
        Arc::clone(&objects),
        admission,
    ));

    // Start the reclaimer on its own task.
    let (mut reclaimer, reclaimer_shutdown) = Reclaimer::new(
        config.reclaimer.to_reclaimer_config(),
        Arc::clone(&metadata),
        Arc::clone(&objects),
    );
    let reclaimer_handle = tokio::spawn(async move {
        reclaimer.run().await;
    });

    let app = api::router(AppState { service });

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "codedrop-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the reclaimer before exiting.
    let _ = reclaimer_shutdown.send(()).await;
    let _ = reclaimer_handle.await;

    info!("codedrop-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
