//! The application menu, built once at startup from the host's config

use super::{MenuCommand, MenuNode, MenuTree};
use crate::constants;

/// Build the App menu with check states taken from `foo` and `bar`
pub fn app_menu(foo: bool, bar: i64) -> MenuTree {
    MenuTree::new(vec![MenuNode::submenu(
        "App",
        vec![
            MenuNode::item("About", MenuCommand::About),
            MenuNode::separator(),
            MenuNode::checkbox("Foo", foo, MenuCommand::Toggle("foo")),
            MenuNode::submenu(
                "Bar",
                vec![
                    MenuNode::checkbox("1", bar == 1, MenuCommand::SetInt("bar", 1)),
                    MenuNode::checkbox("2", bar == 2, MenuCommand::SetInt("bar", 2)),
                ],
            ),
            MenuNode::separator(),
            MenuNode::item(
                format!("Show {}", constants::config::FILENAME),
                MenuCommand::RevealConfig,
            ),
            MenuNode::separator(),
            MenuNode::item("Quit", MenuCommand::Quit),
        ],
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{MenuPath, Resolved};

    #[test]
    fn test_initial_checks_follow_config() {
        let tree = app_menu(false, 2);
        let Resolved::Item(foo) = tree.resolve(&MenuPath::from(vec!["app", "foo"])).unwrap() else {
            panic!("foo should be an item");
        };
        assert_eq!(foo.checked(), Some(false));

        let Resolved::Items(bar) = tree.resolve(&MenuPath::from(vec!["app", "bar"])).unwrap() else {
            panic!("bar should be a submenu");
        };
        let checks: Vec<_> = bar.iter().map(|i| i.checked()).collect();
        assert_eq!(checks, vec![Some(false), Some(true)]);
    }

    #[test]
    fn test_reveal_item_names_config_file() {
        let tree = app_menu(true, 1);
        let item = tree.resolve(&MenuPath::from(vec!["App", "show config.json"]));
        assert!(matches!(
            item,
            Ok(Resolved::Item(node)) if node.command() == Some(MenuCommand::RevealConfig)
        ));
    }
}
