//! Close handshake between the host window and the renderer
//!
//! A native close request never closes the window by itself. The first one
//! asks the renderer to quit and arms a timer; the window only closes once the
//! renderer answers with `terminate` or the timer runs out.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Idle,
    QuitSignaled,
    Terminated,
}

/// What the host should do with a native close request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseRequest {
    /// Veto the close and send `quit` to the renderer
    SendQuit,
    /// Veto the close; a `quit` is already outstanding
    Pending,
    /// Let the window close
    Allow,
}

#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: ShutdownState,
    timeout: Duration,
    /// Armed when `quit` is sent, cleared on any transition to Terminated
    deadline: Option<Instant>,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: ShutdownState::Idle,
            timeout,
            deadline: None,
        }
    }

    pub fn state(&self) -> ShutdownState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == ShutdownState::Terminated
    }

    pub fn on_close_requested(&mut self, now: Instant) -> CloseRequest {
        match self.state {
            ShutdownState::Idle => {
                self.state = ShutdownState::QuitSignaled;
                self.deadline = Some(now + self.timeout);
                info!(timeout_ms = self.timeout.as_millis() as u64, "Close requested, asking renderer to quit");
                CloseRequest::SendQuit
            }
            ShutdownState::QuitSignaled => {
                debug!("Close requested again while waiting for renderer");
                CloseRequest::Pending
            }
            ShutdownState::Terminated => CloseRequest::Allow,
        }
    }

    /// Renderer sent `terminate`. Returns true if the window should close now.
    pub fn on_terminate(&mut self) -> bool {
        if self.state == ShutdownState::Terminated {
            debug!("Ignoring terminate: window already closing");
            return false;
        }
        if self.deadline.take().is_some() {
            debug!("Cancelled quit timeout");
        }
        info!(from = ?self.state, "Renderer terminated, closing window");
        self.state = ShutdownState::Terminated;
        true
    }

    /// Check the quit timer. Returns true if it just forced the close.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                if self.state == ShutdownState::QuitSignaled {
                    warn!("Renderer seems unresponsive, quitting anyway");
                    self.state = ShutdownState::Terminated;
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    /// Time left before the quit timer fires, if armed
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}
