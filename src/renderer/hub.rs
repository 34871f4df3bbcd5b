//! Application logic running in the renderer process
//!
//! The hub owns the renderer's copy of the config and keeps the host's menu
//! checks in step with it. It never touches the menu directly; everything goes
//! out as [`RendererSignal`]s.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::constants;
use crate::ipc::{HostSignal, RendererSignal};
use crate::menu::MenuPath;

fn foo_path() -> MenuPath {
    MenuPath::from(vec!["App", "Foo"])
}

fn bar_path() -> MenuPath {
    MenuPath::from(vec!["App", "Bar"])
}

/// Signals to send after handling one host signal
#[derive(Debug, Default, PartialEq)]
pub struct HubStep {
    pub outgoing: Vec<RendererSignal>,
    /// The hub has shut down; the renderer should exit
    pub finished: bool,
}

pub struct Hub {
    config: ConfigStore,
}

impl Hub {
    pub fn new(config: ConfigStore) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Signals sent once before `renderer_ready`
    pub fn startup(&self) -> Vec<RendererSignal> {
        let mut out = Vec::new();
        if self.config.error().is_some() {
            out.push(RendererSignal::Alert(
                constants::config::LOAD_FAILED_ALERT.to_string(),
            ));
        }
        out.push(RendererSignal::VerifyMenuPath(foo_path()));
        out.push(RendererSignal::VerifyMenuPath(bar_path()));
        out.extend(self.sync_checks());
        out
    }

    pub fn handle(&mut self, signal: HostSignal) -> HubStep {
        match signal {
            HostSignal::RendererGlobals { .. } => {
                warn!("Ignoring repeated renderer_globals");
                HubStep::default()
            }
            HostSignal::Set(values) => {
                for (key, value) in values {
                    debug!(key = %key, value = %value, "Config set");
                    self.config.set(key, value);
                }
                HubStep {
                    outgoing: self.sync_checks(),
                    finished: false,
                }
            }
            HostSignal::Toggle(key) => {
                let Some(current) = self.config.get(&key).and_then(Value::as_bool) else {
                    warn!(key = %key, "Cannot toggle non-boolean config key");
                    return HubStep::default();
                };
                self.config.set(key, !current);
                HubStep {
                    outgoing: self.sync_checks(),
                    finished: false,
                }
            }
            HostSignal::Quit => HubStep {
                outgoing: self.quit(),
                finished: true,
            },
        }
    }

    /// Shutdown routine run on `quit`
    pub fn quit(&mut self) -> Vec<RendererSignal> {
        info!("Hub shutting down");
        self.config.save();
        vec![RendererSignal::Terminate]
    }

    fn sync_checks(&self) -> Vec<RendererSignal> {
        let foo = if self.config.foo() {
            RendererSignal::SetCheckTrue(foo_path())
        } else {
            RendererSignal::SetCheckFalse(foo_path())
        };
        vec![foo, RendererSignal::SetChecks(bar_path().child(self.config.bar()))]
    }
}
