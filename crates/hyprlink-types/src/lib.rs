//! Shared types for HyprLink components.
//!
//! This crate provides the data model used across hyprlink-core, hyprlink-rpc
//! and hyprlink-daemon: the UI description pushed to devices, the module tree
//! it is built from, the action map derived from it, and trusted devices.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Placeholder substituted with the request value in action command templates.
pub const VALUE_PLACEHOLDER: &str = "{v}";

/// Deserialize a Vec that may be null or missing (both become empty vec)
fn deserialize_null_as_empty_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// Complete UI description sent to devices.
///
/// Immutable once built. A configuration reload replaces it wholesale, and
/// `hash` is the only thing clients compare to decide whether their cached
/// copy is stale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiDescription {
    pub hostname: String,

    /// Content hash; omitted while the digest itself is being computed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,

    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub profiles: Vec<Tab>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub css: String,
}

impl UiDescription {
    /// Visit every module of every tab, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Module)) {
        for tab in &self.profiles {
            walk(&tab.modules, visit);
        }
    }

    /// Number of modules in the whole tree.
    #[must_use]
    pub fn module_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }
}

/// One UI screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub modules: Vec<Module>,
}

/// A node of the declarative module tree.
///
/// Display attributes are always present; what the node can *do* lives in
/// [`Capabilities`]. Children may carry capabilities of their own at any depth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,

    #[serde(flatten)]
    pub capabilities: Capabilities,

    #[serde(
        default,
        deserialize_with = "deserialize_null_as_empty_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<Module>,
}

impl Module {
    /// Data-source command, if this module is pollable.
    #[must_use]
    pub fn poll_command(&self) -> Option<&str> {
        self.capabilities
            .source
            .as_deref()
            .filter(|cmd| !cmd.trim().is_empty())
    }

    /// Action command template, if this module is actionable.
    #[must_use]
    pub fn action_template(&self) -> Option<&str> {
        self.capabilities
            .action
            .as_deref()
            .filter(|cmd| !cmd.is_empty())
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Optional behaviour attached to a [`Module`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Shell command polled every tick; its output becomes the module value.
    ///
    /// Host-only: read from config files but never written back out, so
    /// devices do not learn which commands the desktop runs.
    #[serde(default, skip_serializing)]
    pub source: Option<String>,

    /// Shell command template run when the device triggers this module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Depth-first walk over a module forest.
///
/// Every node is visited before its children, siblings in order.
pub fn walk<'a>(modules: &'a [Module], visit: &mut impl FnMut(&'a Module)) {
    for module in modules {
        visit(module);
        walk(&module.children, visit);
    }
}

/// Module id to shell command template.
///
/// Keys are exactly the ids of modules declaring a non-empty action; the map
/// is rebuilt together with the [`UiDescription`] it was derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionMap(HashMap<String, String>);

impl ActionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten every actionable module of the description.
    #[must_use]
    pub fn from_description(ui: &UiDescription) -> Self {
        let mut actions = HashMap::new();
        ui.walk(&mut |module| {
            if let Some(template) = module.action_template() {
                actions.insert(module.id.clone(), template.to_string());
            }
        });
        Self(actions)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Resolve `id` to a runnable command with the value placeholder filled
    /// in as an integer string.
    #[must_use]
    pub fn render(&self, id: &str, value: f64) -> Option<String> {
        self.get(id)
            .map(|template| template.replace(VALUE_PLACEHOLDER, &format!("{value:.0}")))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

}

impl FromIterator<(String, String)> for ActionMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A device that completed PIN pairing, as persisted in the trust store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedDevice {
    pub id: String,
    pub token: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str) -> Module {
        Module {
            id: id.to_string(),
            kind: "text".to_string(),
            ..Default::default()
        }
    }

    fn with_children(id: &str, children: Vec<Module>) -> Module {
        Module {
            children,
            ..leaf(id)
        }
    }

    #[test]
    fn test_walk_is_depth_first_preorder() {
        let modules = vec![
            with_children("a", vec![leaf("a1"), with_children("a2", vec![leaf("a2x")])]),
            leaf("b"),
        ];

        let mut seen = Vec::new();
        walk(&modules, &mut |m| seen.push(m.id.as_str()));

        assert_eq!(seen, vec!["a", "a1", "a2", "a2x", "b"]);
    }

    #[test]
    fn test_module_parses_capabilities_inline() {
        let json = r#"{
            "id": "volume",
            "type": "slider",
            "label": "Volume",
            "source": "pamixer --get-volume",
            "action": "pamixer --set-volume {v}"
        }"#;

        let module: Module = serde_json::from_str(json).unwrap();

        assert_eq!(module.kind, "slider");
        assert_eq!(module.poll_command(), Some("pamixer --get-volume"));
        assert_eq!(module.action_template(), Some("pamixer --set-volume {v}"));
        assert!(!module.has_children());
    }

    #[test]
    fn test_source_stays_on_host() {
        let module = Module {
            capabilities: Capabilities {
                source: Some("cat /etc/shadow".to_string()),
                action: Some("notify-send {v}".to_string()),
            },
            ..leaf("x")
        };

        let value = serde_json::to_value(&module).unwrap();

        assert!(value.get("source").is_none());
        assert_eq!(value["action"], "notify-send {v}");
    }

    #[test]
    fn test_module_null_children_become_empty() {
        let json = r#"{"id": "row", "type": "row", "children": null}"#;
        let module: Module = serde_json::from_str(json).unwrap();
        assert!(module.children.is_empty());
    }

    #[test]
    fn test_blank_source_is_not_pollable() {
        let module = Module {
            capabilities: Capabilities {
                source: Some("   ".to_string()),
                action: Some(String::new()),
            },
            ..leaf("x")
        };
        assert!(module.poll_command().is_none());
        assert!(module.action_template().is_none());
    }

    #[test]
    fn test_description_omits_empty_hash_and_css() {
        let ui = UiDescription {
            hostname: "desk".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&ui).unwrap();
        assert!(!json.contains("hash"));
        assert!(!json.contains("css"));
        assert!(json.contains("\"profiles\":[]"));
    }

    #[test]
    fn test_action_map_collects_nested_actions() {
        let mut button = leaf("lock");
        button.capabilities.action = Some("loginctl lock-session".to_string());
        let mut slider = leaf("brightness");
        slider.capabilities.action = Some("brightnessctl set {v}%".to_string());

        let ui = UiDescription {
            hostname: "desk".to_string(),
            profiles: vec![Tab {
                name: "main".to_string(),
                modules: vec![button, with_children("row", vec![slider, leaf("label")])],
            }],
            ..Default::default()
        };

        let actions = ActionMap::from_description(&ui);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions.get("lock"), Some("loginctl lock-session"));
        assert!(actions.get("row").is_none());
        assert!(actions.get("label").is_none());
    }

    #[test]
    fn test_action_map_render_formats_integer() {
        let actions: ActionMap = [("vol".to_string(), "set {v} and {v}".to_string())]
            .into_iter()
            .collect();

        assert_eq!(actions.render("vol", 42.4).as_deref(), Some("set 42 and 42"));
        assert_eq!(actions.render("vol", 0.0).as_deref(), Some("set 0 and 0"));
        assert!(actions.render("missing", 1.0).is_none());
    }

    #[test]
    fn test_trusted_device_wire_names() {
        let device = TrustedDevice {
            id: "phone-1234abcd".to_string(),
            token: "t".to_string(),
            name: "Android Device".to_string(),
        };
        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["id"], "phone-1234abcd");
        assert_eq!(value["token"], "t");
        assert_eq!(value["name"], "Android Device");
    }
}

/// Property-based tests for the module tree.
#[cfg(test)]
mod proptest_tree_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_module() -> impl Strategy<Value = Module> {
        let leaf = (
            "[a-z]{1,8}",
            proptest::option::of("[a-z ]{1,12}"),
            proptest::option::of("[a-z {}]{1,12}"),
        )
            .prop_map(|(id, source, action)| Module {
                id,
                kind: "text".to_string(),
                capabilities: Capabilities { source, action },
                ..Default::default()
            });

        leaf.prop_recursive(4, 32, 4, |inner| {
            ("[a-z]{1,8}", proptest::collection::vec(inner, 0..4)).prop_map(|(id, children)| {
                Module {
                    id,
                    kind: "row".to_string(),
                    children,
                    ..Default::default()
                }
            })
        })
    }

    fn strip_sources(modules: &mut [Module]) {
        for module in modules {
            module.capabilities.source = None;
            strip_sources(&mut module.children);
        }
    }

    fn count(module: &Module) -> usize {
        1 + module.children.iter().map(count).sum::<usize>()
    }

    proptest! {
        #[test]
        fn walk_visits_every_node_once(modules in proptest::collection::vec(arb_module(), 0..5)) {
            let mut visited = 0;
            walk(&modules, &mut |_| visited += 1);
            prop_assert_eq!(visited, modules.iter().map(count).sum::<usize>());
        }

        #[test]
        fn action_map_keys_are_actionable_ids(
            modules in proptest::collection::vec(arb_module(), 0..5),
        ) {
            let ui = UiDescription {
                hostname: "h".to_string(),
                profiles: vec![Tab { name: "t".to_string(), modules }],
                ..Default::default()
            };
            let actions = ActionMap::from_description(&ui);
            for id in actions.0.keys() {
                let mut found = false;
                ui.walk(&mut |m| found |= &m.id == id && m.action_template().is_some());
                prop_assert!(found);
            }
        }

        #[test]
        fn description_survives_json(modules in proptest::collection::vec(arb_module(), 0..5)) {
            let ui = UiDescription {
                hostname: "h".to_string(),
                profiles: vec![Tab { name: "t".to_string(), modules }],
                ..Default::default()
            };
            let json = serde_json::to_string(&ui).unwrap();
            let back: UiDescription = serde_json::from_str(&json).unwrap();

            let mut expected = ui;
            for tab in &mut expected.profiles {
                strip_sources(&mut tab.modules);
            }
            prop_assert_eq!(back, expected);
        }
    }
}
