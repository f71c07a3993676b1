//! Client proxy for the `com.canonical.dbusmenu` interface and the typed
//! menu records built from its layout replies.
//!
//! Layout nodes arrive as `(ia{sv}av)` structures whose property maps are
//! dynamic. Parsing is defensive by construction: a missing or mistyped
//! property falls back to its default (`visible = true`, `enabled = true`,
//! no label, no type) instead of rejecting the record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use zbus::zvariant::{OwnedValue, Type, Value};

/// One node of a `GetLayout` reply, as delivered on the wire.
///
/// Children are nested variants; [`MenuRecord::from_node`] unfolds the
/// recursion into typed records.
#[derive(Debug, Clone, Serialize, Deserialize, Type)]
pub struct LayoutNode {
    pub id: i32,
    pub properties: HashMap<String, OwnedValue>,
    pub children: Vec<OwnedValue>,
}

/// Proxy for a peer's menu object.
#[zbus::proxy(interface = "com.canonical.dbusmenu", gen_blocking = false)]
pub trait DBusMenu {
    /// Fetches the layout subtree below `parent_id`. This system always
    /// calls with `parent_id = 0`, `recursion_depth = -1` (unlimited) and an
    /// empty property filter.
    fn get_layout(
        &self,
        parent_id: i32,
        recursion_depth: i32,
        property_names: &[&str],
    ) -> zbus::Result<(u32, LayoutNode)>;

    /// Notifies the peer of a menu event; used with `event_id = "clicked"`.
    fn event(
        &self,
        id: i32,
        event_id: &str,
        data: &Value<'_>,
        timestamp: u32,
    ) -> zbus::Result<()>;

    /// Courtesy notice sent before displaying the menu. Optional on the peer
    /// side; the returned `needUpdate` flag is informational.
    fn about_to_show(&self, id: i32) -> zbus::Result<bool>;

    #[zbus(signal)]
    fn layout_updated(&self, revision: u32, parent: i32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn items_properties_updated(
        &self,
        updated_props: Vec<(i32, HashMap<String, OwnedValue>)>,
        removed_props: Vec<(i32, Vec<String>)>,
    ) -> zbus::Result<()>;
}

/// A menu node with its dynamic property map resolved to a fixed,
/// defaulted field set. The only menu representation seen outside this
/// crate.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuRecord {
    /// Peer-assigned id, stable within one menu tree.
    pub id: i32,
    pub label: Option<String>,
    pub item_type: Option<String>,
    pub enabled: bool,
    pub visible: bool,
    pub children_display: Option<String>,
    pub children: Vec<MenuRecord>,
}

impl Default for MenuRecord {
    /// Matches the wire defaults: records are visible and enabled unless a
    /// property says otherwise.
    fn default() -> Self {
        Self {
            id: 0,
            label: None,
            item_type: None,
            enabled: true,
            visible: true,
            children_display: None,
            children: Vec::new(),
        }
    }
}

impl MenuRecord {
    /// Builds the record tree for a `GetLayout` reply root.
    pub fn from_node(node: &LayoutNode) -> Self {
        let mut record = Self::from_parts(node.id, &node.properties);
        record.children = node
            .children
            .iter()
            .filter_map(|child| Self::from_value(child))
            .collect();
        record
    }

    /// Parses one nested child value. Returns `None` for values that are
    /// not layout structures at all; property-level problems are defaulted,
    /// not rejected.
    pub fn from_value(value: &Value<'_>) -> Option<Self> {
        match value {
            Value::Value(inner) => Self::from_value(inner),
            Value::Structure(structure) => {
                let fields = structure.fields();
                let id = match fields.first() {
                    Some(Value::I32(id)) => *id,
                    _ => return None,
                };
                let properties = match fields.get(1) {
                    Some(Value::Dict(dict)) => dict
                        .try_clone()
                        .ok()
                        .and_then(|d| HashMap::try_from(d).ok())
                        .unwrap_or_default(),
                    _ => HashMap::new(),
                };
                let mut record = Self::from_parts(id, &properties);
                if let Some(Value::Array(children)) = fields.get(2) {
                    record.children =
                        children.iter().filter_map(Self::from_value).collect();
                }
                Some(record)
            }
            _ => None,
        }
    }

    fn from_parts(id: i32, properties: &HashMap<String, OwnedValue>) -> Self {
        Self {
            id,
            label: string_prop(properties, "label"),
            item_type: string_prop(properties, "type"),
            enabled: bool_prop(properties, "enabled", true),
            visible: bool_prop(properties, "visible", true),
            children_display: string_prop(properties, "children-display"),
            children: Vec::new(),
        }
    }

    /// Separators carry no action and no entry; they only partition their
    /// siblings into sections.
    pub fn is_separator(&self) -> bool {
        self.item_type.as_deref() == Some("separator")
    }

    pub fn has_submenu(&self) -> bool {
        self.children_display.as_deref() == Some("submenu")
    }
}

fn unwrap_variant<'a>(value: &'a Value<'a>) -> &'a Value<'a> {
    match value {
        Value::Value(inner) => inner,
        other => other,
    }
}

fn string_prop(properties: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    match properties.get(key).map(|v| unwrap_variant(v)) {
        Some(Value::Str(s)) => Some(s.as_str().to_owned()),
        _ => None,
    }
}

fn bool_prop(properties: &HashMap<String, OwnedValue>, key: &str, default: bool) -> bool {
    match properties.get(key).map(|v| unwrap_variant(v)) {
        Some(Value::Bool(b)) => *b,
        _ => default,
    }
}
