//! IPC signal types for host ↔ renderer communication

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::menu::MenuPath;

/// Signals sent from the renderer process to the host
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "signal", content = "payload", rename_all = "snake_case")]
pub enum RendererSignal {
    /// Renderer is connected and wants its globals
    RendererStarted,

    /// Renderer has loaded its config and hub; the window may be shown
    RendererReady,

    /// Renderer finished its shutdown routine; the window may close
    Terminate,

    /// Show a modal message
    Alert(String),

    /// Radio-select within a checkbox group: (group..., target)
    SetChecks(MenuPath),

    SetCheckTrue(MenuPath),

    SetCheckFalse(MenuPath),

    /// Validate a path, alerting instead of failing if it doesn't resolve
    #[serde(rename = "verify_menupath")]
    VerifyMenuPath(MenuPath),
}

/// Signals sent from the host to the renderer process
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "signal", content = "payload", rename_all = "snake_case")]
pub enum HostSignal {
    /// Answer to `renderer_started`
    RendererGlobals { user_data_path: PathBuf },

    /// Ask the renderer to shut down and reply with `terminate`
    Quit,

    /// Assign config keys (menu clicks, maximize/unmaximize)
    Set(Map<String, Value>),

    /// Flip a boolean config key
    Toggle(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names_match_signal_catalog() {
        let verify = RendererSignal::VerifyMenuPath(MenuPath::from(vec!["App", "Bar"]));
        assert_eq!(
            serde_json::to_value(&verify).unwrap(),
            json!({"signal": "verify_menupath", "payload": ["App", "Bar"]})
        );
        assert_eq!(
            serde_json::to_value(RendererSignal::SetCheckTrue(MenuPath::default())).unwrap(),
            json!({"signal": "set_check_true", "payload": []})
        );
        assert_eq!(
            serde_json::to_value(HostSignal::Quit).unwrap(),
            json!({"signal": "quit"})
        );
    }

    #[test]
    fn test_renderer_globals_payload() {
        let parsed: HostSignal = serde_json::from_value(json!({
            "signal": "renderer_globals",
            "payload": {"user_data_path": "/tmp/data"}
        }))
        .unwrap();
        assert_eq!(
            parsed,
            HostSignal::RendererGlobals {
                user_data_path: PathBuf::from("/tmp/data")
            }
        );
    }

    #[test]
    fn test_set_checks_accepts_mixed_segments() {
        let parsed: RendererSignal =
            serde_json::from_str(r#"{"signal":"set_checks","payload":["App","Bar",2]}"#).unwrap();
        let RendererSignal::SetChecks(path) = parsed else {
            panic!("wrong variant");
        };
        assert_eq!(path.segments(), vec!["app", "bar", "2"]);
    }
}
