//! Clinic gateway entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clinic_gateway::api::{create_router, AppState};
use clinic_gateway::config::Config;
use clinic_gateway::directory::{MysqlStore, Store};
use clinic_gateway::error::GatewayError;
use clinic_gateway::metrics;
use clinic_gateway::utils::shutdown_signal;

/// Read-only HTTP gateway over the patients and providers tables.
#[derive(Parser, Debug)]
#[command(name = "clinic-gateway")]
#[command(about = "Serve patient and provider listings from MySQL as JSON")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Connect to the database, ping it, and disconnect.
    CheckDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("clinic_gateway=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::CheckDb) => cmd_check_db().await,
        None => cmd_serve(args.port).await,
    }
}

/// Load and validate configuration, applying a port override.
fn load_config(port_override: Option<u16>) -> Result<Config, GatewayError> {
    let mut config = Config::load()?;

    if let Some(port) = port_override {
        config.port = port;
    }

    config.validate().map_err(GatewayError::InvalidConfig)?;
    Ok(config)
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CLINIC GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match load_config(None) {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration check failed"));
        }
    };

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Database: {}", config.db_location());
    println!(
        "  Password: {}",
        if config.db_password.is_empty() { "not set" } else { "set" }
    );
    println!("  HTTP Port: {}", config.port);
    match config.metrics_port {
        Some(port) => println!("  Metrics Port: {}", port),
        None => println!("  Metrics Port: disabled"),
    }
    match config.group_concat_max_len {
        Some(len) => println!("  group_concat_max_len: {}", len),
        None => println!("  group_concat_max_len: server default"),
    }
    println!(
        "  Degraded Start: {}",
        if config.allow_degraded_start { "Allowed" } else { "Fatal" }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Connect to the database, ping it, and disconnect.
async fn cmd_check_db() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CLINIC GATEWAY - DATABASE CHECK");
    println!("======================================================================");

    let config = load_config(None)?;
    println!("Database: {}", config.db_location());

    print!("\n1. Connecting... ");
    let store = match MysqlStore::connect(&config).await {
        Ok(store) => {
            println!("OK");
            store
        }
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
            return Err(GatewayError::from(e).into());
        }
    };

    print!("\n2. Pinging... ");
    match store.ping().await {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
        }
    }

    print!("\n3. Disconnecting... ");
    match store.close().await {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
        }
    }

    println!("\n======================================================================");
    println!("DATABASE CHECK COMPLETED");
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let config = load_config(port_override).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize metrics
    if let Some(metrics_port) = config.metrics_port {
        metrics::install_exporter(metrics_port)?;
    }
    metrics::init_metrics();

    // Connect once; the connection lives until shutdown
    let store = match MysqlStore::connect(&config).await {
        Ok(store) => store,
        Err(e) if config.allow_degraded_start => {
            error!("Database connection error: {}", e);
            warn!("ALLOW_DEGRADED_START is set, serving without a database connection");
            MysqlStore::degraded(&e)
        }
        Err(e) => {
            error!("Database connection error: {}", e);
            return Err(GatewayError::from(e).into());
        }
    };
    let store = Arc::new(store);

    let app_state = AppState::new(store.clone());

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.map_err(GatewayError::from)?;
    info!("Server is running on port {}", config.port);

    let router = create_router(app_state);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("HTTP server stopped");

    // Release the connection whether or not serving failed
    if let Err(e) = store.close().await {
        warn!("Failed to close database connection: {}", e);
    }

    served.map_err(GatewayError::from)?;
    Ok(())
}
