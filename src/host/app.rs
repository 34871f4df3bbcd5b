//! Host window implemented with egui/eframe

use std::path::Path;
use std::process::{Child, Command};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{error, info, warn};

use super::HostOptions;
use super::controller::{HostController, NativeWindow};
use super::listener::{self, HostEvent, SocketLink};
use crate::config::ConfigStore;
use crate::constants::{self, timing};
use crate::ipc::{self, SignalServer};
use crate::menu::{MenuNode, MenuPath};

/// [`NativeWindow`] backed by viewport commands
struct ViewportWindow {
    ctx: egui::Context,
    shown: bool,
    frames: u64,
}

impl ViewportWindow {
    fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            shown: false,
            frames: 0,
        }
    }

    /// Run once per frame. eframe makes the root viewport visible after the
    /// first painted frame, so until `show` is called the window is hidden
    /// again on every later frame.
    fn hold_hidden(&mut self) {
        self.frames += 1;
        if self.shown {
            return;
        }
        if self.frames == 1 {
            // Make sure a second frame runs to undo eframe's first-frame show
            self.ctx.request_repaint();
        } else {
            self.ctx.send_viewport_cmd(egui::ViewportCommand::Visible(false));
        }
    }
}

impl NativeWindow for ViewportWindow {
    fn show(&mut self) {
        self.shown = true;
        self.ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
    }

    fn focus(&mut self) {
        self.ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
    }

    fn maximize(&mut self) {
        self.ctx.send_viewport_cmd(egui::ViewportCommand::Maximized(true));
    }

    fn close(&mut self) {
        self.ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn reveal(&mut self, path: &Path) {
        if let Err(e) = open::that(path) {
            error!(path = %path.display(), error = ?e, "Failed to open folder");
        }
    }
}

struct HostApp {
    controller: HostController<ViewportWindow, SocketLink>,
    events: Receiver<HostEvent>,
    renderer: Option<Child>,
    renderer_connected: bool,
    last_maximized: Option<bool>,
}

impl HostApp {
    fn new(cc: &CreationContext<'_>, options: HostOptions, config: ConfigStore) -> Result<Self> {
        info!("Initializing host window");
        let ctx = cc.egui_ctx.clone();

        let server = SignalServer::bind_to(ipc::default_socket_path(std::process::id())?)?;
        let renderer = spawn_renderer(server.path())?;
        info!(pid = renderer.id(), "Started renderer process");

        let (tx, rx) = mpsc::channel();
        let link = SocketLink::default();
        listener::spawn_signal_listener(server, link.clone(), tx.clone(), ctx.clone());
        if let Err(e) = listener::spawn_close_signal_forwarder(tx, ctx.clone()) {
            warn!(error = ?e, "Termination signals will not go through the close handshake");
        }

        let controller = HostController::new(
            ViewportWindow::new(ctx),
            link,
            config,
            options.user_data_path,
            options.dev_mode,
            Instant::now(),
        );

        Ok(Self {
            controller,
            events: rx,
            renderer: Some(renderer),
            renderer_connected: true,
            last_maximized: None,
        })
    }

    fn drain_events(&mut self, ctx: &egui::Context, now: Instant) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                HostEvent::Renderer(signal) => self.controller.handle_signal(signal),
                HostEvent::CloseRequested => self.request_close(ctx, now),
                HostEvent::RendererDisconnected => self.renderer_connected = false,
            }
        }
    }

    fn request_close(&mut self, ctx: &egui::Context, now: Instant) {
        if self.controller.on_close_requested(now) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn track_maximized(&mut self, ctx: &egui::Context) {
        let Some(maximized) = ctx.input(|i| i.viewport().maximized) else {
            return;
        };
        if self.last_maximized.is_some_and(|last| last != maximized) {
            self.controller.on_maximized_changed(maximized);
        }
        self.last_maximized = Some(maximized);
    }

    fn menu_bar(&mut self, ctx: &egui::Context, now: Instant) {
        let mut clicked = None;
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                menu_items(ui, self.controller.menu().root(), &MenuPath::default(), &mut clicked);
            });
        });
        if let Some(path) = clicked {
            self.controller.activate_menu(&path, now);
        }
    }

    fn alert_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.controller.current_alert().map(str::to_string) else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(constants::app::TITLE)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(&message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.controller.dismiss_alert();
        }
    }
}

fn menu_items(ui: &mut egui::Ui, nodes: &[MenuNode], prefix: &MenuPath, clicked: &mut Option<MenuPath>) {
    for node in nodes {
        if node.is_separator() {
            ui.separator();
            continue;
        }
        let path = prefix.child(node.label());
        if let Some(children) = node.children() {
            ui.menu_button(node.label(), |ui| menu_items(ui, children, &path, clicked));
        } else if let Some(checked) = node.checked() {
            let mut value = checked;
            if ui.checkbox(&mut value, node.label()).clicked() {
                *clicked = Some(path);
                ui.close();
            }
        } else if ui.button(node.label()).clicked() {
            *clicked = Some(path);
            ui.close();
        }
    }
}

impl eframe::App for HostApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.drain_events(ctx, now);

        if ctx.input(|i| i.viewport().close_requested()) && !self.controller.on_close_requested(now) {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
        }
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::Q)) {
            self.request_close(ctx, now);
        }
        self.track_maximized(ctx);

        self.menu_bar(ctx, now);
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(constants::app::TITLE);
            ui.label(if !self.renderer_connected {
                "Renderer disconnected"
            } else if self.controller.is_ready() {
                "Renderer ready"
            } else {
                "Waiting for renderer..."
            });
        });
        self.alert_modal(ctx);

        self.controller.tick(now);
        if let Some(wait) = self.controller.next_wakeup(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
        self.controller.window_mut().hold_hidden();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(child) = self.renderer.take() {
            reap_renderer(child);
        }
        info!("Host exiting");
    }
}

fn spawn_renderer(socket: &Path) -> Result<Child> {
    let exe_path = std::env::current_exe().context("Failed to resolve executable path")?;
    Command::new(exe_path)
        .arg("--renderer")
        .arg("--socket")
        .arg(socket)
        .spawn()
        .context("Failed to spawn renderer process")
}

/// Wait for the renderer to exit on its own, then SIGTERM, then SIGKILL
fn reap_renderer(mut child: Child) {
    let grace = Duration::from_millis(timing::CHILD_REAP_MS);
    if wait_for_exit(&mut child, grace) {
        return;
    }

    warn!(pid = child.id(), "Renderer still running, sending SIGTERM");
    if let Err(e) = kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM) {
        warn!(error = %e, "Failed to signal renderer");
    }
    if wait_for_exit(&mut child, grace) {
        return;
    }

    error!(pid = child.id(), "Renderer ignored SIGTERM, killing it");
    let _ = child.kill();
    if let Err(e) = child.wait() {
        error!(error = ?e, "Failed to wait for renderer exit");
    }
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                info!(exit = ?status.code(), "Renderer exited");
                return true;
            }
            Ok(None) if Instant::now() < deadline => std::thread::sleep(Duration::from_millis(20)),
            Ok(None) => return false,
            Err(e) => {
                error!(error = ?e, "Failed to query renderer status");
                return false;
            }
        }
    }
}

pub fn run_host(options: HostOptions) -> Result<()> {
    let mut config = ConfigStore::in_dir(&options.user_data_path);
    config.load();

    let native_options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.width() as f32, config.height() as f32])
            .with_min_inner_size([constants::window::MIN_WIDTH, constants::window::MIN_HEIGHT])
            .with_title(constants::app::TITLE)
            .with_visible(false),
        ..Default::default()
    };

    eframe::run_native(
        constants::app::TITLE,
        native_options,
        Box::new(move |cc| Ok(Box::new(HostApp::new(cc, options, config)?))),
    )
    .map_err(|err| anyhow!("Failed to launch host window: {err}"))
}
