//! Startup handshake that decides when the host window becomes visible

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tracks `renderer_started` / `renderer_ready`.
///
/// The window stays hidden until the renderer reports ready. In development
/// mode a grace timer shows it anyway so a broken renderer is still visible.
#[derive(Debug)]
pub struct ReadyGate {
    started: bool,
    ready: bool,
    fallback_deadline: Option<Instant>,
}

impl ReadyGate {
    pub fn new(now: Instant, dev_mode: bool, grace: Duration) -> Self {
        Self {
            started: false,
            ready: false,
            fallback_deadline: dev_mode.then(|| now + grace),
        }
    }

    /// Returns true the first time, when globals should be sent
    pub fn on_started(&mut self) -> bool {
        if self.started {
            debug!("Ignoring repeated renderer_started");
            return false;
        }
        self.started = true;
        true
    }

    /// Returns true the first time, when the window should be shown
    pub fn on_ready(&mut self) -> bool {
        if self.ready {
            debug!("Ignoring repeated renderer_ready");
            return false;
        }
        self.ready = true;
        self.fallback_deadline = None;
        info!("Renderer ready");
        true
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Returns true once if the dev-mode grace period ran out before ready
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.fallback_deadline {
            Some(deadline) if now >= deadline => {
                self.fallback_deadline = None;
                warn!("Never received renderer_ready, showing window anyway");
                true
            }
            _ => false,
        }
    }

    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.fallback_deadline
            .map(|d| d.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_millis(1000);

    #[test]
    fn test_started_and_ready_are_honored_once() {
        let mut gate = ReadyGate::new(Instant::now(), false, GRACE);
        assert!(gate.on_started());
        assert!(!gate.on_started());
        assert!(gate.on_ready());
        assert!(!gate.on_ready());
        assert!(gate.is_ready());
    }

    #[test]
    fn test_dev_fallback_fires_once_without_ready() {
        let now = Instant::now();
        let mut gate = ReadyGate::new(now, true, GRACE);
        assert!(!gate.poll(now + GRACE / 2));
        assert!(gate.poll(now + GRACE));
        assert!(!gate.poll(now + GRACE * 2));
    }

    #[test]
    fn test_ready_disarms_fallback() {
        let now = Instant::now();
        let mut gate = ReadyGate::new(now, true, GRACE);
        gate.on_ready();
        assert!(!gate.poll(now + GRACE));
        assert_eq!(gate.time_remaining(now), None);
    }

    #[test]
    fn test_no_fallback_outside_dev_mode() {
        let now = Instant::now();
        let mut gate = ReadyGate::new(now, false, GRACE);
        assert!(!gate.poll(now + GRACE * 10));
    }
}
