// shopping-cart-service - version 0.1.0
// In-memory cart service with Prometheus request and cart metrics
use anyhow::Context;
use clap::Parser;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, Level};

use shopping_cart_service::{
    app,
    config::{load_config, validate_effective_config, Config},
    observer::CartObserver,
    traffic, AppState,
};

mod cli;
mod commands;

use cli::{Args, Commands, ConfigFormat, LogLevel};

/// -------------------------------------------------------------------
/// CONFIGURATION MANAGEMENT
/// -------------------------------------------------------------------

/// Resolves configuration from CLI args, config file, and defaults.
/// Precedence: CLI (if provided) > config file > default.
fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // Override with CLI args
    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(secs) = args.collect_interval {
        config.collect_interval_secs = Some(secs);
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.no_latency {
        config.simulate_latency = Some(false);
    }
    if args.no_traffic {
        config.simulate_traffic = Some(false);
    }

    config.log_level = Some(format!("{:?}", args.log_level).to_lowercase());

    Ok(config)
}

/// Shows configuration in requested format
fn show_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<()> {
    println!("{}", commands::config::render_config(config, format)?);
    Ok(())
}

/// Initializes tracing logging subsystem with configured log level
fn setup_logging(args: &Args) -> anyhow::Result<()> {
    let log_level = match args.log_level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(log_level) = log_level else {
        return Ok(());
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Logging initialized with level: {:?}", args.log_level);
    Ok(())
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// -------------------------------------------------------------------
/// MAIN APPLICATION ENTRY POINT
/// -------------------------------------------------------------------
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("Configuration is valid");
            return Ok(());
        }

        return show_config(&config, &args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Config {
                output,
                format,
                commented,
            } => commands::command_config(output.clone(), format.clone(), *commented),
        };
    }

    // Setup logging subsystem first so config loading is logged
    setup_logging(&args)?;

    // Load configuration for main server mode
    let config = resolve_config(&args)?;

    // Validate config before starting the service
    if let Err(e) = validate_effective_config(&config) {
        error!("Configuration invalid: {}", e);
        std::process::exit(1);
    }

    info!("Starting {}", config.service_name());

    // Create shared application state (registry, metrics, empty store)
    let state = AppState::new(config.clone()).context("Failed to register metrics")?;

    // Initial observation so the gauges are populated before the first scrape
    let observer = Arc::new(CartObserver::new(state.store.clone(), &state.metrics));
    observer.observe();
    let observer_task = observer.spawn(config.collect_interval());

    let app = app::router(state.clone());

    let traffic_task = config.traffic_enabled().then(|| {
        info!(
            "Traffic simulation starts in {}s",
            config.traffic_start_delay().as_secs()
        );
        traffic::spawn(app.clone(), config.traffic_start_delay())
    });

    // Configure HTTP server and start listening
    let bind_ip: IpAddr = config
        .bind_addr()
        .parse()
        .context("Invalid bind address")?;
    let addr = SocketAddr::new(bind_ip, config.port());
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("{} listening on http://{}", config.service_name(), addr);
    info!("Metrics available at http://{}/metrics", addr);
    if config.health_enabled() {
        info!("Health check at http://{}/health", addr);
    }

    // Start HTTP server with graceful shutdown capability
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    // Cleanup: cancel background tasks before exit
    observer_task.abort();
    let _ = observer_task.await;
    if let Some(task) = traffic_task {
        task.abort();
        let _ = task.await;
    }

    info!("{} stopped gracefully", config.service_name());
    Ok(())
}
