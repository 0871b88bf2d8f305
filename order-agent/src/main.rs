use anyhow::Context;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use order_agent::{Config, Orchestrator, cleanup_old_logs, init_logger, production_services, shell};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and configuration
    dotenv::dotenv().ok();
    let config = Config::from_env().context("loading configuration")?;

    // 2. Logging (the guard flushes the file log on exit)
    let log_dir = config.log_dir.as_deref().map(Path::new);
    let _log_guard = init_logger(&config.log_level, config.log_json, log_dir)?;
    if let Some(dir) = log_dir
        && let Err(e) = cleanup_old_logs(dir, config.log_retention_days)
    {
        tracing::warn!(error = %e, "Log cleanup failed");
    }

    tracing::info!(
        printer = %format!("{}:{}", config.printer_host, config.printer_port),
        backend = %config.base_url,
        "Order agent starting"
    );

    // 3. Collaborators and orchestrator
    let services = production_services(&config)?;
    let orchestrator = Orchestrator::new(config, services);
    orchestrator.start().await;

    // 4. Console, status watcher and Ctrl-C
    let shutdown = CancellationToken::new();
    let watcher =
        shell::spawn_status_watcher(orchestrator.clone(), Duration::from_secs(1), shutdown.clone());

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, shutting down");
                signal_token.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Ctrl-C handler unavailable"),
        }
    });

    println!("{}", shell::HELP);
    shell::run(&orchestrator, shell::spawn_stdin_reader(), shutdown.clone()).await;

    // 5. Graceful stop
    shutdown.cancel();
    orchestrator.stop().await;
    if let Err(e) = watcher.await {
        tracing::warn!(error = %e, "Status watcher failed");
    }

    tracing::info!("Order agent exited");
    Ok(())
}
