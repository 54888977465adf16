//! Command-line driver for the Rendezvous Room matchmaking core
//!
//! Loads and validates configuration, initializes logging and can run a
//! simulated burst of auto-matchmake requests against an in-process manager.

use anyhow::Result;
use clap::Parser;
use rendezvous_room::config::AppConfig;
use rendezvous_room::gathering::{GatheringManager, StandardMatchmakeRules};
use rendezvous_room::notification::{ChannelNotificationDispatcher, InMemoryConnectionDirectory};
use rendezvous_room::types::{AnyGathering, Gathering, MatchmakeSession, Requester};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Rendezvous Room - gathering matchmaking core
#[derive(Parser)]
#[command(
    name = "rendezvous-room",
    version,
    about = "Session matchmaking core: gathering registry, search and auto-matchmake",
    long_about = "Rendezvous Room keeps a registry of game gatherings, matches clients into \
                 them by template or search criteria, creates gatherings when nothing fits \
                 and notifies owners when participants join."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit")]
    dry_run: bool,

    /// Number of simulated connections
    #[arg(
        long,
        value_name = "COUNT",
        default_value_t = 10,
        help = "Number of connections to auto-matchmake in the simulation"
    )]
    connections: u32,

    /// Capacity of the simulated gathering template
    #[arg(
        long,
        value_name = "COUNT",
        default_value_t = 4,
        help = "Maximum participants of the simulated gathering template"
    )]
    max_participants: u16,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Rendezvous Room v{}", rendezvous_room::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   Max participants limit: {}",
        config.matchmaking.max_participants_limit
    );
    info!(
        "   Notify owner on join: {}",
        config.matchmaking.notify_owner_on_join
    );
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    rendezvous_room::config::validate_config(&config)?;
    Ok(config)
}

/// Push simulated connections through the manager and print a JSON summary
async fn run_simulation(config: &AppConfig, connections: u32, max_participants: u16) -> Result<()> {
    let dispatcher = Arc::new(ChannelNotificationDispatcher::new(
        config.matchmaking.notification_queue_depth,
    ));
    let directory = Arc::new(InMemoryConnectionDirectory::new());

    let manager = GatheringManager::builder()
        .rules(Arc::new(StandardMatchmakeRules::new()))
        .dispatcher(dispatcher.clone())
        .directory(directory.clone())
        .settings(config.matchmaking.clone())
        .build()?;

    let template = AnyGathering::MatchmakeSession(MatchmakeSession {
        gathering: Gathering {
            maximum_participants: max_participants,
            ..Default::default()
        },
        open_participation: true,
        ..Default::default()
    });

    let mut receivers = Vec::new();
    for connection_id in 1..=connections {
        let requester = Requester::new(connection_id, connection_id + 1000);
        directory.register(requester.pid, connection_id);
        receivers.push(dispatcher.register(connection_id)?);

        if let Err(e) = manager
            .auto_matchmake(requester, template.clone(), "joined")
            .await
        {
            warn!("Connection {} failed to matchmake: {}", connection_id, e);
        }
    }

    let mut notifications = 0usize;
    for receiver in receivers.iter_mut() {
        while receiver.try_recv().is_ok() {
            notifications += 1;
        }
    }

    let stats = manager.get_stats().await?;
    let summary = json!({
        "connections": connections,
        "gatherings": manager.session_count().await?,
        "gatherings_created": stats.gatherings_created,
        "participants_joined": stats.participants_joined,
        "matchmake_failures": stats.matchmake_failures,
        "notifications_delivered": notifications,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        info!("Dry run completed - exiting");
        return Ok(());
    }

    if let Err(e) = run_simulation(&config, args.connections, args.max_participants).await {
        error!("Simulation failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
