use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tracing::{info, warn};

use gatekeeper::broker::Broker;
use gatekeeper::compositor::wayland::WaylandCompositor;
use gatekeeper::compositor::CompositorBinding;
use gatekeeper::config::{self, Config};
use gatekeeper::error::ResultExt;
use gatekeeper::prompt::HeadlessPrompt;
use gatekeeper::{dbus, logging, service, stdin_commands};

/// Global shortcuts portal backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Accept JSONL console commands on stdin (list, updateShortcut, closeSession)
    #[arg(long = "show-shortcuts")]
    show_shortcuts: bool,

    /// Configuration file (default: $XDG_CONFIG_HOME/gatekeeper/config.json)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug-level logging unless RUST_LOG is set
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    // The filter lives in the config, so the first read happens unobserved
    let log_filter = config::load_config_from(&config_path).log_filter;
    let _guard = logging::init(log_filter.as_deref(), cli.verbose);
    let config = config::load_config_from(&config_path);
    info!(
        config = %config_path.display(),
        log = %logging::log_path().display(),
        bus_name = %config.bus_name,
        "Gatekeeper starting"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    let local = LocalSet::new();
    local.block_on(&runtime, serve(cli, config))
}

async fn serve(cli: Cli, config: Config) -> anyhow::Result<()> {
    let (activation_tx, activation_rx) = mpsc::unbounded_channel();
    let compositor = match WaylandCompositor::connect(activation_tx) {
        Ok((compositor, pump)) => {
            tokio::task::spawn_local(async move {
                pump.run().await.log_err();
                warn!("Wayland event pump stopped, activations will no longer arrive");
            });
            compositor
        }
        Err(e) => {
            warn!(error = %e, "No compositor connection, shortcuts cannot be bound");
            WaylandCompositor::disconnected()
        }
    };
    if !compositor.capabilities_ready() {
        warn!("Input trigger capabilities unavailable, BindShortcuts will fail");
    }

    let (request_tx, request_rx) = async_channel::bounded(100);
    let conn = dbus::connect(&config.object_path, request_tx.clone())
        .await
        .context("failed to connect to the session bus")?;

    let broker = Rc::new(Broker::new(
        Rc::new(compositor),
        Box::new(dbus::DbusNotifier::new(conn.clone(), config.object_path.clone())),
        Box::new(HeadlessPrompt::new(config.prompt, config.fallback_trigger.clone())),
    ));

    dbus::request_name(&conn, &config.bus_name)
        .await
        .with_context(|| format!("failed to acquire {}", config.bus_name))?;

    tokio::task::spawn_local(async move {
        if let Err(e) = dbus::watch_clients(conn, request_tx).await {
            warn!(error = %e, "Client watcher stopped");
        }
    });

    let console = cli.show_shortcuts.then(stdin_commands::start_stdin_listener);

    tokio::select! {
        _ = service::run(broker.clone(), request_rx, console, activation_rx) => {}
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Interrupted, shutting down"),
                Err(e) => warn!(error = %e, "Failed to listen for ctrl-c"),
            }
            broker.shutdown();
            // Let the spawned Closed signals go out
            tokio::task::yield_now().await;
        }
    }

    info!("Gatekeeper stopped");
    Ok(())
}
