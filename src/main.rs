//! guide-daemon: Background daemon for the voice-driven product tour guide
//!
//! This daemon sits behind the host UI's help panel and provides:
//! - Utterance segmentation from streaming recognition results
//! - Layered intent resolution (commands, navigation help, FAQ)
//! - Remote assistant fallback with recent conversation context
//! - Preempting speech output requests
//! - IPC server for the host UI
//!
//! The host owns the actual speech engines; the daemon drives them through
//! guide events and receives their results over IPC.

mod assistant;
mod capture;
mod config;
mod events;
mod guide;
mod intent;
mod ipc;
mod lifecycle;
mod memory;
mod speech;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::assistant::AssistantClient;
use crate::config::Config;
use crate::events::GuideEvent;
use crate::guide::{
    GuideController, HostCapabilities, HostRecognizer, HostSynthesizer, OpenSignal,
};
use crate::ipc::{GuideLink, Server};
use crate::lifecycle::ShutdownSignal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        rules_version = intent::rules::RULES_VERSION,
        "guide-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        assistant_url = %config.assistant_url,
        silence_ms = config.silence_window.as_millis() as u64,
        "configuration loaded"
    );

    let mut shutdown = ShutdownSignal::register()?;

    // Create channels for inter-component communication
    // IPC server, timers, remote calls -> guide controller
    let (input_tx, input_rx) = mpsc::channel(64);
    // Guide controller -> IPC subscribers (and the host speech engines)
    let (event_tx, _event_rx) = broadcast::channel::<GuideEvent>(256);

    let open_signal = OpenSignal::new();
    let capabilities = HostCapabilities::default();

    let assistant = AssistantClient::new(&config.assistant_url, config.remote_timeout)?;
    let mut controller = GuideController::new(
        &config,
        Box::new(HostRecognizer::new(event_tx.clone(), capabilities.clone())),
        Box::new(HostSynthesizer::new(event_tx.clone())),
        assistant,
        input_tx.clone(),
        event_tx.clone(),
    );

    let server = Server::new(
        &config.socket_path,
        GuideLink {
            input_tx,
            events: event_tx.clone(),
            open_signal: open_signal.clone(),
            capabilities,
        },
    )?;

    // Subscribe to guide events for the IPC status snapshot
    let mut status_event_rx = event_tx.subscribe();

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the guide controller (processes host input, timers, replies)
        _ = controller.run(input_rx, &open_signal) => {
            info!("guide controller exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Keep the status snapshot in sync with guide events
        _ = async {
            loop {
                match status_event_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "guide event");
                        server.apply_event(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "guide event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("guide event handler exited");
        }

        // Wait for shutdown signal
        signal = shutdown.wait() => {
            info!(signal, "shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    controller.teardown();
    server.shutdown().await;

    info!(state = %controller.state(), "guide-daemon stopped");

    Ok(())
}
