//! Background threads feeding the host's UI loop

use anyhow::{Context, Result, anyhow};
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use super::controller::RendererLink;
use crate::ipc::{HostSignal, RendererSignal, SignalConnection, SignalServer};

/// Events delivered to the UI thread
#[derive(Debug)]
pub enum HostEvent {
    Renderer(RendererSignal),
    /// OS asked the process to stop (SIGINT, SIGTERM, SIGHUP)
    CloseRequested,
    RendererDisconnected,
}

/// Write half of the renderer connection, filled in once it connects
#[derive(Clone, Default)]
pub struct SocketLink {
    conn: Arc<Mutex<Option<SignalConnection>>>,
}

impl RendererLink for SocketLink {
    fn send(&mut self, signal: HostSignal) -> Result<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("IPC connection lock poisoned"))?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| anyhow!("Renderer not connected"))?;
        conn.send(&signal)
    }
}

/// Accept the renderer's connection and forward its signals to the UI thread
pub fn spawn_signal_listener(
    server: SignalServer,
    link: SocketLink,
    events: Sender<HostEvent>,
    ctx: egui::Context,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = run_listener(&server, &link, &events, &ctx) {
            error!(error = ?e, "IPC listener thread crashed");
        }
    })
}

fn run_listener(
    server: &SignalServer,
    link: &SocketLink,
    events: &Sender<HostEvent>,
    ctx: &egui::Context,
) -> Result<()> {
    info!(socket = ?server.path(), "Waiting for renderer to connect");
    let mut reader = server.accept()?;
    let writer = reader.try_clone()?;
    *link
        .conn
        .lock()
        .map_err(|_| anyhow!("IPC connection lock poisoned"))? = Some(writer);
    info!("Renderer connected");

    loop {
        match reader.recv::<RendererSignal>() {
            Ok(signal) => {
                debug!(signal = ?signal, "Received renderer signal");
                if events.send(HostEvent::Renderer(signal)).is_err() {
                    warn!("UI loop gone, stopping IPC listener");
                    return Ok(());
                }
                ctx.request_repaint();
            }
            Err(e) => {
                warn!(error = ?e, "Renderer connection closed");
                let _ = events.send(HostEvent::RendererDisconnected);
                ctx.request_repaint();
                return Ok(());
            }
        }
    }
}

/// Turn termination signals into close requests so the renderer gets to save
pub fn spawn_close_signal_forwarder(
    events: Sender<HostEvent>,
    ctx: egui::Context,
) -> Result<JoinHandle<()>> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("Failed to register signal handlers")?;

    Ok(thread::spawn(move || {
        for signal in signals.forever() {
            info!(signal, "Received termination signal, requesting close");
            if events.send(HostEvent::CloseRequested).is_err() {
                break;
            }
            ctx.request_repaint();
        }
    }))
}
