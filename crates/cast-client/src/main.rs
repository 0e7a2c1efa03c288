//! Just Pete cast client entry point.
//!
//! Wires the receiver registry, the transport, the session loop, and the UI
//! bridge together, then runs until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()                  -- ~/.config/justpete/config.toml
//!  └─ RegistryDiscovery              -- live receiver registry
//!  └─ SimulatedReceiver              -- stands in for the casting SDK
//!  └─ spawn_session(controller)      -- the session loop
//!  └─ presentation loop              -- logs what the UI would show
//! ```
//!
//! The binary has no widgets of its own.  It plays one receiver coming
//! online and logs every presentation event, which is enough to drive the
//! whole flow from the bridge commands.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cast_client::application::ports::{CastTransport, DeviceDiscovery};
use cast_client::application::session_controller::SessionController;
use cast_client::infrastructure::{
    discovery::RegistryDiscovery,
    runtime::{session_queue, spawn_session},
    storage::config::{load_config, AppConfig},
    transport::simulated::SimulatedReceiver,
    ui_bridge::{self, BridgePresenter, CastAppState, PresentationEvent},
};
use cast_core::Device;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The config may name a log level, so read it before logging starts.
    let (config, config_error) = match load_config() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialise structured logging.  RUST_LOG wins over the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.client.log_level)),
        )
        .init();

    info!("{} cast client starting", config.client.title);
    if let Some(e) = config_error {
        warn!("using default configuration: {e}");
    }

    // ── Ports ─────────────────────────────────────────────────────────────────
    let (events, inbox) = session_queue();
    let discovery = Arc::new(RegistryDiscovery::new(Arc::new(events.clone())));
    // In production: replace SimulatedReceiver with the platform SDK binding.
    let receiver = Arc::new(SimulatedReceiver::new(
        config.client.title.clone(),
        Arc::new(events),
    ));
    let (presenter, mut presented) = BridgePresenter::new();

    // ── Session loop ──────────────────────────────────────────────────────────
    let controller = SessionController::new(
        config.cast.session_settings(),
        Arc::clone(&discovery) as Arc<dyn DeviceDiscovery>,
        receiver as Arc<dyn CastTransport>,
        Arc::new(presenter),
    );
    let (handle, session_task) = spawn_session(controller, inbox);
    let app_state = CastAppState::new(config.client.title.clone(), handle);

    // ── Presentation loop ─────────────────────────────────────────────────────
    let presentation_task = tokio::spawn(async move {
        while let Some(event) = presented.recv().await {
            match event {
                PresentationEvent::Render { affordances } => info!(
                    "cast button {}, prompt {}, join {}, guess {}",
                    affordances.cast_button,
                    affordances.prompt_cast_enabled,
                    affordances.join_enabled,
                    affordances.guess_enabled
                ),
                PresentationEvent::ChooseDevice { title, devices } => {
                    let names: Vec<_> = devices.iter().map(|d| d.name.as_str()).collect();
                    info!("{title}: {}", names.join(", "));
                }
                PresentationEvent::ConfirmDisconnect { title } => {
                    info!("{title}: disconnect?");
                }
                other => info!("{other:?}"),
            }
        }
    });

    discovery.device_came_online(Device::new("simulated-receiver", "Simulated Receiver"));

    let status = ui_bridge::get_session_status(Arc::clone(&app_state)).await;
    if let Some(status) = status.data {
        info!("ready: cast button {}", status.affordances.cast_button);
    }

    // ── Ctrl-C ────────────────────────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    // Dropping the last handle stops the loop, which releases the receiver.
    drop(app_state);
    session_task.await?;
    presentation_task.abort();

    info!("{} cast client stopped", config.client.title);
    Ok(())
}
