//! uptrail - HTTP availability monitor.

use uptrail::config::{read_targets, MonitorConfig};
use uptrail::monitor::Registry;
use uptrail::scheduler::{ReportManager, Scheduler};
use uptrail::web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("uptrail=info".parse()?))
        .init();

    // Load configuration
    let mut cfg = MonitorConfig::load()?;

    if cfg.targets.is_empty() {
        println!("Please enter the websites to monitor with their check interval (in milliseconds).");
        println!("Example:\n  www.google.com 800\n  github.com 1000");
        println!("Press Enter on an empty line once complete.");

        cfg.targets = tokio::task::spawn_blocking(|| read_targets(std::io::stdin().lock())).await?;
    }

    if cfg.targets.is_empty() {
        tracing::warn!("No targets to monitor, exiting");
        return Ok(());
    }

    // Register targets
    let registry = Arc::new(Registry::new(cfg.aggregator_config()));
    for target in &cfg.targets {
        registry.register(target.clone());
    }
    tracing::info!("Monitoring {} targets", registry.len());

    // Start probing
    let scheduler = Arc::new(Scheduler::new(registry.clone(), cfg.probe_config())?);
    scheduler.start().await;

    // Start reports
    let reporter = ReportManager::new(registry.clone());
    reporter.start();

    // Start web server
    if cfg.http_port != 0 {
        let server = Server::new(cfg.http_port, scheduler.clone());
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                tracing::error!("Web server failed: {}", e);
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    reporter.stop();
    scheduler.stop().await;

    Ok(())
}
