//! Application menu tree with label-path lookup
//!
//! The host owns the only [`MenuTree`]. The renderer never sees it directly;
//! it names items by [`MenuPath`] and the host resolves those paths here.

mod path;
pub mod template;

pub use path::{MenuPath, normalize_label};

use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MenuError {
    #[error("invalid menu path: {path}")]
    NotFound { path: String },
}

impl MenuError {
    fn not_found(path: &MenuPath) -> Self {
        MenuError::NotFound {
            path: path.to_string(),
        }
    }
}

/// What activating a menu item asks the host to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    About,
    /// Flip a boolean config key in the renderer
    Toggle(&'static str),
    /// Assign an integer config key in the renderer
    SetInt(&'static str, i64),
    RevealConfig,
    Quit,
}

#[derive(Debug, Clone)]
pub struct MenuNode {
    label: String,
    /// `Some` only for checkable items
    checked: Option<bool>,
    submenu: Option<MenuLevel>,
    command: Option<MenuCommand>,
    separator: bool,
}

impl MenuNode {
    pub fn item(label: impl Into<String>, command: MenuCommand) -> Self {
        Self {
            label: label.into(),
            checked: None,
            submenu: None,
            command: Some(command),
            separator: false,
        }
    }

    pub fn checkbox(label: impl Into<String>, checked: bool, command: MenuCommand) -> Self {
        Self {
            checked: Some(checked),
            ..Self::item(label, command)
        }
    }

    pub fn submenu(label: impl Into<String>, items: Vec<MenuNode>) -> Self {
        Self {
            label: label.into(),
            checked: None,
            submenu: Some(MenuLevel::new(items)),
            command: None,
            separator: false,
        }
    }

    pub fn separator() -> Self {
        Self {
            label: String::new(),
            checked: None,
            submenu: None,
            command: None,
            separator: true,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn checked(&self) -> Option<bool> {
        self.checked
    }

    pub fn is_separator(&self) -> bool {
        self.separator
    }

    pub fn command(&self) -> Option<MenuCommand> {
        self.command
    }

    /// Child items, if this node opens a submenu
    pub fn children(&self) -> Option<&[MenuNode]> {
        self.submenu.as_ref().map(MenuLevel::items)
    }
}

/// One list of sibling items plus a lookup from normalized label to position
#[derive(Debug, Clone)]
pub struct MenuLevel {
    items: Vec<MenuNode>,
    index: HashMap<String, usize>,
}

impl MenuLevel {
    pub fn new(items: Vec<MenuNode>) -> Self {
        let mut index = HashMap::new();
        for (pos, item) in items.iter().enumerate() {
            if item.separator {
                continue;
            }
            // First item wins when two labels collide
            index.entry(normalize_label(&item.label)).or_insert(pos);
        }
        Self { items, index }
    }

    pub fn items(&self) -> &[MenuNode] {
        &self.items
    }

    fn position(&self, normalized: &str) -> Option<usize> {
        self.index.get(normalized).copied()
    }
}

/// Result of resolving a path: a whole submenu, or one leaf item
#[derive(Debug)]
pub enum Resolved<'a> {
    Items(&'a [MenuNode]),
    Item(&'a MenuNode),
}

enum ResolvedMut<'a> {
    Items(&'a mut [MenuNode]),
    Item(&'a mut MenuNode),
}

#[derive(Debug, Clone)]
pub struct MenuTree {
    root: MenuLevel,
    installed: bool,
}

impl MenuTree {
    pub fn new(items: Vec<MenuNode>) -> Self {
        Self {
            root: MenuLevel::new(items),
            installed: false,
        }
    }

    /// Mark the tree as the active application menu.
    ///
    /// Check-state changes requested before this are ignored.
    pub fn install(&mut self) {
        self.installed = true;
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn root(&self) -> &[MenuNode] {
        self.root.items()
    }

    /// Resolve a path to a submenu's item list or a single item.
    ///
    /// An empty path is the root list. A path that continues past a leaf
    /// item is not found.
    pub fn resolve(&self, path: &MenuPath) -> Result<Resolved<'_>, MenuError> {
        walk(&self.root, &path.segments()).ok_or_else(|| MenuError::not_found(path))
    }

    fn resolve_mut(&mut self, path: &MenuPath) -> Result<ResolvedMut<'_>, MenuError> {
        walk_mut(&mut self.root, &path.segments()).ok_or_else(|| MenuError::not_found(path))
    }

    /// Radio-select within a checkbox group.
    ///
    /// `path` is the group's path followed by the label to check. Every other
    /// checkable sibling is unchecked; plain items are left alone.
    pub fn set_checked_group(&mut self, path: &MenuPath) -> Result<(), MenuError> {
        if !self.installed {
            return Ok(());
        }
        if path.is_empty() {
            warn!("set_checked_group called with an empty path");
            return Ok(());
        }
        let Some((group, target)) = path.split_last() else {
            return Ok(());
        };

        match self.resolve_mut(&group)? {
            ResolvedMut::Items(items) => {
                for item in items.iter_mut().filter(|item| item.checked.is_some()) {
                    item.checked = Some(normalize_label(&item.label) == target);
                }
                debug!(group = %group, target = %target, "Updated checkbox group");
            }
            ResolvedMut::Item(item) => {
                warn!(path = %group, label = %item.label, "Checkbox group path names a single item");
            }
        }
        Ok(())
    }

    /// Set one checkbox. Items that aren't checkable are ignored.
    pub fn set_single_checked(&mut self, path: &MenuPath, desired: bool) -> Result<(), MenuError> {
        if !self.installed {
            return Ok(());
        }
        if let ResolvedMut::Item(item) = self.resolve_mut(path)? {
            if item.checked.is_some() {
                item.checked = Some(desired);
            }
        }
        Ok(())
    }

    /// Activate a leaf item the way a click would.
    ///
    /// Checkable items flip their own state first. Returns the item's
    /// command, or `None` for submenus and inert items.
    pub fn activate(&mut self, path: &MenuPath) -> Result<Option<MenuCommand>, MenuError> {
        match self.resolve_mut(path)? {
            ResolvedMut::Item(item) => {
                if let Some(checked) = item.checked {
                    item.checked = Some(!checked);
                }
                Ok(item.command)
            }
            ResolvedMut::Items(_) => Ok(None),
        }
    }
}

fn walk<'a>(level: &'a MenuLevel, segments: &[String]) -> Option<Resolved<'a>> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(Resolved::Items(level.items()));
    };
    let node = &level.items[level.position(first)?];
    match &node.submenu {
        Some(submenu) => walk(submenu, rest),
        None if rest.is_empty() => Some(Resolved::Item(node)),
        None => None,
    }
}

fn walk_mut<'a>(level: &'a mut MenuLevel, segments: &[String]) -> Option<ResolvedMut<'a>> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(ResolvedMut::Items(&mut level.items));
    };
    let pos = level.position(first)?;
    let node = &mut level.items[pos];
    if node.submenu.is_some() {
        walk_mut(node.submenu.as_mut()?, rest)
    } else if rest.is_empty() {
        Some(ResolvedMut::Item(node))
    } else {
        None
    }
}
