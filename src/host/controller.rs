//! Host-side owner of the window, the menu and the shutdown state
//!
//! Every renderer signal and every native window event goes through
//! [`HostController`]. It is the only code that changes menu check states or
//! moves the close handshake forward.

use anyhow::Result;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::readiness::ReadyGate;
use super::shutdown::{CloseRequest, ShutdownCoordinator, ShutdownState};
use crate::config::ConfigStore;
use crate::constants::{self, timing};
use crate::ipc::{HostSignal, RendererSignal};
use crate::menu::{MenuCommand, MenuPath, MenuTree, template};

/// Operations the controller needs from the native window
pub trait NativeWindow {
    fn show(&mut self);
    fn focus(&mut self);
    fn maximize(&mut self);
    /// Actually close the window (the close gate will let it through)
    fn close(&mut self);
    /// Open a folder in the system file manager
    fn reveal(&mut self, path: &Path);
}

/// Outbound half of the renderer connection
pub trait RendererLink {
    fn send(&mut self, signal: HostSignal) -> Result<()>;
}

pub struct HostController<W, L> {
    window: W,
    link: L,
    menu: MenuTree,
    shutdown: ShutdownCoordinator,
    ready: ReadyGate,
    config: ConfigStore,
    user_data_path: PathBuf,
    alerts: VecDeque<String>,
}

impl<W: NativeWindow, L: RendererLink> HostController<W, L> {
    pub fn new(
        window: W,
        link: L,
        config: ConfigStore,
        user_data_path: PathBuf,
        dev_mode: bool,
        now: Instant,
    ) -> Self {
        let mut menu = template::app_menu(config.foo(), config.bar());
        menu.install();

        Self {
            window,
            link,
            menu,
            shutdown: ShutdownCoordinator::new(Duration::from_millis(timing::QUIT_TIMEOUT_MS)),
            ready: ReadyGate::new(now, dev_mode, Duration::from_millis(timing::READY_GRACE_MS)),
            config,
            user_data_path,
            alerts: VecDeque::new(),
        }
    }

    pub fn menu(&self) -> &MenuTree {
        &self.menu
    }

    pub fn shutdown_state(&self) -> ShutdownState {
        self.shutdown.state()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    /// Oldest alert still waiting to be dismissed
    pub fn current_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }

    pub fn alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(message = %message, "Alert");
        self.alerts.push_back(message);
    }

    pub fn handle_signal(&mut self, signal: RendererSignal) {
        debug!(signal = ?signal, "Renderer signal");
        match signal {
            RendererSignal::RendererStarted => {
                if self.ready.on_started() {
                    let user_data_path = self.user_data_path.clone();
                    self.send(HostSignal::RendererGlobals { user_data_path });
                }
            }
            RendererSignal::RendererReady => {
                if self.ready.on_ready() {
                    if self.config.maxed() {
                        self.window.maximize();
                    }
                    self.window.show();
                    self.window.focus();
                }
            }
            RendererSignal::Terminate => {
                if self.shutdown.on_terminate() {
                    self.window.close();
                }
            }
            RendererSignal::Alert(message) => self.alert(message),
            RendererSignal::SetChecks(path) => {
                if let Err(e) = self.menu.set_checked_group(&path) {
                    error!(error = %e, "set_checks failed");
                }
            }
            RendererSignal::SetCheckTrue(path) => self.set_one_check(&path, true),
            RendererSignal::SetCheckFalse(path) => self.set_one_check(&path, false),
            RendererSignal::VerifyMenuPath(path) => self.verify_menu_path(&path),
        }
    }

    fn set_one_check(&mut self, path: &MenuPath, desired: bool) {
        if let Err(e) = self.menu.set_single_checked(path, desired) {
            error!(error = %e, desired, "set_check failed");
        }
    }

    /// Check a path the renderer intends to use; a bad path becomes an alert
    pub fn verify_menu_path(&mut self, path: &MenuPath) {
        if !self.menu.is_installed() {
            return;
        }
        if let Err(e) = self.menu.resolve(path) {
            warn!(error = %e, "Menu path failed verification");
            self.alert(format!("Failed to verify menupath: {path}"));
        }
    }

    /// Native close request. Returns true if the window may close.
    pub fn on_close_requested(&mut self, now: Instant) -> bool {
        match self.shutdown.on_close_requested(now) {
            CloseRequest::SendQuit => {
                self.send(HostSignal::Quit);
                false
            }
            CloseRequest::Pending => false,
            CloseRequest::Allow => true,
        }
    }

    /// Fire any timers that are due
    pub fn tick(&mut self, now: Instant) {
        if self.shutdown.poll(now) {
            self.window.close();
        }
        if self.ready.poll(now) {
            self.window.show();
            self.window.focus();
        }
    }

    /// How long until the next timer needs a `tick`
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        match (self.shutdown.time_remaining(now), self.ready.time_remaining(now)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Window maximized or restored by the user
    pub fn on_maximized_changed(&mut self, maxed: bool) {
        let mut values = serde_json::Map::new();
        values.insert("maxed".to_string(), maxed.into());
        self.send(HostSignal::Set(values));
    }

    /// A menu item was clicked
    pub fn activate_menu(&mut self, path: &MenuPath, now: Instant) {
        let command = match self.menu.activate(path) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(e) => {
                error!(error = %e, "Clicked menu item did not resolve");
                return;
            }
        };

        match command {
            MenuCommand::About => self.alert(format!(
                "{} ({})",
                constants::app::TITLE,
                env!("CARGO_PKG_VERSION")
            )),
            MenuCommand::Toggle(key) => self.send(HostSignal::Toggle(key.to_string())),
            MenuCommand::SetInt(key, value) => {
                let mut values = serde_json::Map::new();
                values.insert(key.to_string(), value.into());
                self.send(HostSignal::Set(values));
            }
            MenuCommand::RevealConfig => {
                let folder = self
                    .config
                    .path()
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.user_data_path.clone());
                self.window.reveal(&folder);
            }
            MenuCommand::Quit => {
                if self.on_close_requested(now) {
                    self.window.close();
                }
            }
        }
    }

    fn send(&mut self, signal: HostSignal) {
        if let Err(e) = self.link.send(signal) {
            warn!(error = ?e, "Failed to send signal to renderer");
        }
    }

    #[cfg(test)]
    fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    #[cfg(test)]
    fn link(&self) -> &L {
        &self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::Resolved;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Show,
        Focus,
        Maximize,
        Close,
        Reveal(PathBuf),
    }

    #[derive(Default)]
    struct RecordingWindow {
        calls: Vec<Call>,
    }

    impl RecordingWindow {
        fn count(&self, call: &Call) -> usize {
            self.calls.iter().filter(|c| *c == call).count()
        }
    }

    impl NativeWindow for RecordingWindow {
        fn show(&mut self) {
            self.calls.push(Call::Show);
        }
        fn focus(&mut self) {
            self.calls.push(Call::Focus);
        }
        fn maximize(&mut self) {
            self.calls.push(Call::Maximize);
        }
        fn close(&mut self) {
            self.calls.push(Call::Close);
        }
        fn reveal(&mut self, path: &Path) {
            self.calls.push(Call::Reveal(path.to_path_buf()));
        }
    }

    #[derive(Default)]
    struct RecordingLink {
        sent: Vec<HostSignal>,
    }

    impl RecordingLink {
        fn quits(&self) -> usize {
            self.sent.iter().filter(|s| **s == HostSignal::Quit).count()
        }
    }

    impl RendererLink for RecordingLink {
        fn send(&mut self, signal: HostSignal) -> Result<()> {
            self.sent.push(signal);
            Ok(())
        }
    }

    struct DisconnectedLink;

    impl RendererLink for DisconnectedLink {
        fn send(&mut self, _signal: HostSignal) -> Result<()> {
            anyhow::bail!("renderer not connected")
        }
    }

    fn controller_with(
        config_json: Option<&str>,
        dev_mode: bool,
        now: Instant,
    ) -> (tempfile::TempDir, HostController<RecordingWindow, RecordingLink>) {
        let dir = tempfile::tempdir().unwrap();
        if let Some(contents) = config_json {
            std::fs::write(dir.path().join(constants::config::FILENAME), contents).unwrap();
        }
        let mut config = ConfigStore::in_dir(dir.path());
        config.load();
        let controller = HostController::new(
            RecordingWindow::default(),
            RecordingLink::default(),
            config,
            dir.path().to_path_buf(),
            dev_mode,
            now,
        );
        (dir, controller)
    }

    fn path(segments: serde_json::Value) -> MenuPath {
        serde_json::from_value(segments).unwrap()
    }

    fn checked(controller: &HostController<RecordingWindow, RecordingLink>, p: serde_json::Value) -> Option<bool> {
        match controller.menu().resolve(&path(p)).unwrap() {
            Resolved::Item(item) => item.checked(),
            Resolved::Items(_) => panic!("expected item"),
        }
    }

    #[test]
    fn test_rapid_close_requests_then_terminate_close_once() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);

        for _ in 0..3 {
            assert!(!c.on_close_requested(now));
        }
        assert_eq!(c.link().quits(), 1);
        assert_eq!(c.window().count(&Call::Close), 0);

        c.handle_signal(RendererSignal::Terminate);
        assert_eq!(c.window().count(&Call::Close), 1);

        // The close now passes the gate, and the cancelled timer never fires
        assert!(c.on_close_requested(now));
        c.tick(now + Duration::from_millis(timing::QUIT_TIMEOUT_MS + 1));
        assert_eq!(c.window().count(&Call::Close), 1);
        assert_eq!(c.link().quits(), 1);
    }

    #[test]
    fn test_unresponsive_renderer_forced_close_once() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);

        for _ in 0..3 {
            c.on_close_requested(now);
        }
        c.tick(now + Duration::from_millis(timing::QUIT_TIMEOUT_MS - 1));
        assert_eq!(c.window().count(&Call::Close), 0);

        c.tick(now + Duration::from_millis(timing::QUIT_TIMEOUT_MS));
        assert_eq!(c.window().count(&Call::Close), 1);
        assert_eq!(c.shutdown_state(), ShutdownState::Terminated);

        // Late terminate is a no-op
        c.handle_signal(RendererSignal::Terminate);
        assert_eq!(c.window().count(&Call::Close), 1);
    }

    #[test]
    fn test_close_proceeds_when_quit_cannot_be_sent() {
        let now = Instant::now();
        let dir = tempfile::tempdir().unwrap();
        let mut config = ConfigStore::in_dir(dir.path());
        config.load();
        let mut c = HostController::new(
            RecordingWindow::default(),
            DisconnectedLink,
            config,
            dir.path().to_path_buf(),
            false,
            now,
        );
        assert!(!c.on_close_requested(now));
        c.tick(now + Duration::from_millis(timing::QUIT_TIMEOUT_MS));
        assert_eq!(c.window().count(&Call::Close), 1);
    }

    #[test]
    fn test_started_sends_globals_once() {
        let now = Instant::now();
        let (dir, mut c) = controller_with(None, false, now);
        c.handle_signal(RendererSignal::RendererStarted);
        c.handle_signal(RendererSignal::RendererStarted);
        assert_eq!(
            c.link().sent,
            vec![HostSignal::RendererGlobals {
                user_data_path: dir.path().to_path_buf()
            }]
        );
    }

    #[test]
    fn test_ready_shows_window_and_maximizes_from_config() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(Some(r#"{"maxed": true}"#), false, now);
        assert!(c.window().calls.is_empty());

        c.handle_signal(RendererSignal::RendererReady);
        assert_eq!(c.window().calls, vec![Call::Maximize, Call::Show, Call::Focus]);

        c.handle_signal(RendererSignal::RendererReady);
        assert_eq!(c.window().calls.len(), 3);
    }

    #[test]
    fn test_dev_mode_shows_window_without_ready() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, true, now);
        c.tick(now + Duration::from_millis(timing::READY_GRACE_MS));
        assert_eq!(c.window().calls, vec![Call::Show, Call::Focus]);
    }

    #[test]
    fn test_window_stays_hidden_without_ready_in_release_mode() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);
        c.tick(now + Duration::from_secs(60));
        assert!(c.window().calls.is_empty());
    }

    #[test]
    fn test_verify_invalid_path_alerts_once() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);
        c.handle_signal(RendererSignal::VerifyMenuPath(path(json!(["nonexistent"]))));
        assert_eq!(
            c.current_alert(),
            Some(r#"Failed to verify menupath: ["nonexistent"]"#)
        );
        c.dismiss_alert();
        assert_eq!(c.current_alert(), None);
    }

    #[test]
    fn test_verify_valid_path_is_silent() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);
        c.handle_signal(RendererSignal::VerifyMenuPath(path(json!(["APP", "bar", 2]))));
        assert_eq!(c.current_alert(), None);
    }

    #[test]
    fn test_set_checks_from_renderer() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);
        c.handle_signal(RendererSignal::SetChecks(path(json!(["app", "bar", 2]))));
        assert_eq!(checked(&c, json!(["app", "bar", "1"])), Some(false));
        assert_eq!(checked(&c, json!(["app", "bar", "2"])), Some(true));

        c.handle_signal(RendererSignal::SetCheckFalse(path(json!(["App", "Foo"]))));
        assert_eq!(checked(&c, json!(["app", "foo"])), Some(false));
        c.handle_signal(RendererSignal::SetCheckTrue(path(json!(["App", "Foo"]))));
        assert_eq!(checked(&c, json!(["app", "foo"])), Some(true));
    }

    #[test]
    fn test_bad_set_checks_path_is_logged_not_fatal() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);
        c.handle_signal(RendererSignal::SetChecks(path(json!(["app", "nope", 1]))));
        assert_eq!(checked(&c, json!(["app", "bar", "1"])), Some(true));
    }

    #[test]
    fn test_renderer_alert_is_queued() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);
        c.handle_signal(RendererSignal::Alert("first".to_string()));
        c.handle_signal(RendererSignal::Alert("second".to_string()));
        assert_eq!(c.current_alert(), Some("first"));
        c.dismiss_alert();
        assert_eq!(c.current_alert(), Some("second"));
    }

    #[test]
    fn test_menu_clicks_send_config_changes() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);
        c.activate_menu(&path(json!(["App", "Foo"])), now);
        c.activate_menu(&path(json!(["App", "Bar", "2"])), now);

        let mut expected_set = serde_json::Map::new();
        expected_set.insert("bar".to_string(), json!(2));
        assert_eq!(
            c.link().sent,
            vec![
                HostSignal::Toggle("foo".to_string()),
                HostSignal::Set(expected_set)
            ]
        );
        // Native checkbox behavior: the clicked item flips itself
        assert_eq!(checked(&c, json!(["app", "foo"])), Some(false));
        assert_eq!(checked(&c, json!(["app", "bar", "2"])), Some(true));
    }

    #[test]
    fn test_quit_menu_item_starts_handshake() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);
        c.activate_menu(&path(json!(["app", "quit"])), now);
        assert_eq!(c.link().quits(), 1);
        assert_eq!(c.shutdown_state(), ShutdownState::QuitSignaled);
        assert_eq!(c.window().count(&Call::Close), 0);
    }

    #[test]
    fn test_reveal_opens_user_data_folder() {
        let now = Instant::now();
        let (dir, mut c) = controller_with(None, false, now);
        c.activate_menu(&path(json!(["app", "show config.json"])), now);
        assert_eq!(c.window().calls, vec![Call::Reveal(dir.path().to_path_buf())]);
    }

    #[test]
    fn test_about_alerts_version() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);
        c.activate_menu(&path(json!(["app", "about"])), now);
        assert!(c.current_alert().is_some_and(|a| a.contains(env!("CARGO_PKG_VERSION"))));
    }

    #[test]
    fn test_maximize_forwarded_to_renderer() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, false, now);
        c.on_maximized_changed(true);
        let mut expected = serde_json::Map::new();
        expected.insert("maxed".to_string(), json!(true));
        assert_eq!(c.link().sent, vec![HostSignal::Set(expected)]);
    }

    #[test]
    fn test_next_wakeup_tracks_nearest_timer() {
        let now = Instant::now();
        let (_dir, mut c) = controller_with(None, true, now);
        assert_eq!(
            c.next_wakeup(now),
            Some(Duration::from_millis(timing::READY_GRACE_MS))
        );
        c.handle_signal(RendererSignal::RendererReady);
        assert_eq!(c.next_wakeup(now), None);
        c.on_close_requested(now);
        assert_eq!(
            c.next_wakeup(now),
            Some(Duration::from_millis(timing::QUIT_TIMEOUT_MS))
        );
    }
}
