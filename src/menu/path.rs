//! Menu paths as sent over IPC by the renderer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Ordered sequence of labels naming a menu item or a submenu's item list.
///
/// Segments are kept as the raw JSON values the renderer sent and only
/// normalized for comparison, so `2` and `"2"` name the same label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuPath(Vec<Value>);

impl MenuPath {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Normalized (stringified, lower-cased) segments
    pub fn segments(&self) -> Vec<String> {
        self.0.iter().map(normalize_segment).collect()
    }

    /// Split into the parent path and the normalized last segment
    pub fn split_last(&self) -> Option<(MenuPath, String)> {
        let (last, parent) = self.0.split_last()?;
        Some((MenuPath(parent.to_vec()), normalize_segment(last)))
    }

    /// New path with one more segment appended
    pub fn child(&self, segment: impl Into<Value>) -> MenuPath {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        MenuPath(segments)
    }
}

impl<T: Into<Value>> From<Vec<T>> for MenuPath {
    fn from(segments: Vec<T>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for MenuPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// Compare form of a label or path segment
pub fn normalize_label(label: &str) -> String {
    label.to_lowercase()
}

fn normalize_segment(segment: &Value) -> String {
    match segment {
        Value::String(s) => normalize_label(s),
        other => normalize_label(&other.to_string()),
    }
}
