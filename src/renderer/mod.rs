//! Renderer process: connects back to the host and runs the hub

mod hub;

use hub::Hub;

use anyhow::{Context, Result};
use signal_hook::consts::SIGINT;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

use crate::config::ConfigStore;
use crate::ipc::{HostSignal, RendererSignal, SignalConnection};

pub fn run_renderer(socket: &Path) -> Result<()> {
    // Ctrl+C in a terminal reaches the whole process group; the host turns it
    // into a quit request, so the renderer must survive long enough to save.
    signal_hook::flag::register(SIGINT, Arc::new(AtomicBool::new(false)))
        .context("Failed to install SIGINT handler")?;

    let mut conn = SignalConnection::connect_to(socket)?;
    info!(socket = %socket.display(), "Renderer connected to host");
    conn.send(&RendererSignal::RendererStarted)?;

    let Some(user_data_path) = wait_for_globals(&mut conn)? else {
        return Ok(());
    };
    info!(user_data_path = %user_data_path.display(), "Received renderer globals");

    let mut config = ConfigStore::in_dir(&user_data_path);
    config.load();
    let mut hub = Hub::new(config);

    for signal in hub.startup() {
        conn.send(&signal)?;
    }
    conn.send(&RendererSignal::RendererReady)?;

    loop {
        let signal: HostSignal = match conn.recv() {
            Ok(signal) => signal,
            Err(e) => {
                warn!(error = ?e, "Host connection closed, exiting without saving");
                return Ok(());
            }
        };

        let step = hub.handle(signal);
        for out in &step.outgoing {
            conn.send(out)?;
        }
        if step.finished {
            info!("Renderer exiting");
            return Ok(());
        }
    }
}

/// Block until `renderer_globals` arrives.
///
/// Returns `None` if the host asked us to quit first; `terminate` has already
/// been sent in that case.
fn wait_for_globals(conn: &mut SignalConnection) -> Result<Option<PathBuf>> {
    loop {
        match conn.recv::<HostSignal>().context("Host closed before sending globals")? {
            HostSignal::RendererGlobals { user_data_path } => return Ok(Some(user_data_path)),
            HostSignal::Quit => {
                info!("Quit requested before startup finished");
                conn.send(&RendererSignal::Terminate)?;
                return Ok(None);
            }
            other => warn!(signal = ?other, "Ignoring signal received before globals"),
        }
    }
}

