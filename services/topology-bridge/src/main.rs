//! strata topology bridge
//!
//! Runs the reconciliation loop that mirrors cluster nodes into the
//! scheduler's resource topology and binds unplaced workloads.
//!
//! ## Startup
//!
//! 1. Parse configuration from flags and environment
//! 2. Create the coordinator resource in a fresh catalog
//! 3. Connect the scheduler (remote if configured, otherwise in-process)
//! 4. Run the loop until SIGINT/SIGTERM

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use strata_bridge::config::{Config, LogFormat};
use strata_bridge::inventory::HttpInventoryClient;
use strata_bridge::{
    LocalScheduler, ReconcileContext, Reconciler, RemoteScheduler, SchedulerFacade,
};
use strata_id::RandomIdGenerator;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    info!("Starting strata topology bridge");
    info!(
        inventory_url = %config.inventory_url,
        scheduler_url = config.scheduler_url.as_deref().unwrap_or("local"),
        poll_interval_secs = config.poll_interval_secs,
        placement = ?config.placement,
        "Configuration loaded"
    );

    if let Some(uri) = &config.listen_uri {
        warn!(listen_uri = %uri, "listen URI is accepted but unused; nothing is served");
    }

    let context = ReconcileContext::bootstrap(Arc::new(RandomIdGenerator))
        .context("failed to create coordinator resource")?;
    let root = context
        .root()
        .map(|status| status.topology_node().clone())
        .context("coordinator missing from catalog")?;
    info!(root_id = %root.id(), "Coordinator resource created");

    let scheduler: Arc<dyn SchedulerFacade> = match &config.scheduler_url {
        Some(url) => Arc::new(
            RemoteScheduler::connect(url.as_str(), config.request_timeout(), &root)
                .await
                .with_context(|| format!("failed to connect to scheduler at {url}"))?,
        ),
        None => Arc::new(LocalScheduler::new(root)),
    };
    info!(scheduler = scheduler.name(), "Scheduler instantiated");

    let inventory = Arc::new(
        HttpInventoryClient::from_config(&config).context("failed to build inventory client")?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut reconciler = Reconciler::new(context, inventory, scheduler, config.reconciler_config())
        .with_placement(config.placement.build());
    let mut reconciler_handle = tokio::spawn(async move {
        reconciler.run(shutdown_rx).await;
    });

    let finished = tokio::select! {
        _ = shutdown_signal() => {
            info!("Received shutdown signal");
            false
        }
        result = &mut reconciler_handle => {
            if let Err(e) = result {
                error!(error = %e, "Reconciler task panicked");
                anyhow::bail!("reconciler task failed: {e}");
            }
            info!("Reconciler exited");
            true
        }
    };

    let _ = shutdown_tx.send(true);

    if !finished {
        info!("Waiting for reconciler to stop...");
        if let Err(e) = reconciler_handle.await {
            error!(error = %e, "Reconciler task panicked");
            anyhow::bail!("reconciler task failed: {e}");
        }
    }

    info!("Topology bridge shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
