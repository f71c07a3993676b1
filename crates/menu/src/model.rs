//! Building the local menu model from a peer's layout records.
//!
//! The whole tree is rebuilt from scratch on every successful fetch and
//! swapped atomically, so no node survives across rebuilds. Separators are
//! never emitted as entries; they partition their siblings into sections.

use traywatch_protocol::MenuRecord;

/// Prefix for deterministic action names, so the owning layers can add,
/// look up, and remove bindings by id without back-references into the
/// tree.
pub const ACTION_PREFIX: &str = "menuitem.";

/// Maps an entry's peer-assigned id to its deterministic action name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBinding {
    pub item_id: i32,
    pub name: String,
    pub enabled: bool,
}

impl ActionBinding {
    fn new(item_id: i32, enabled: bool) -> Self {
        Self {
            item_id,
            name: format!("{ACTION_PREFIX}{item_id}"),
            enabled,
        }
    }
}

/// One actionable (or deliberately disabled) menu entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub item_id: i32,
    pub label: String,
    pub enabled: bool,
    /// Action name this entry invokes; matches a binding of the same
    /// generation.
    pub action: String,
    pub submenu: Option<MenuModel>,
}

/// A built menu level: flat when the siblings contained no separator,
/// sectioned otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuModel {
    Flat(Vec<MenuEntry>),
    Sectioned(Vec<Vec<MenuEntry>>),
}

impl MenuModel {
    /// Entries at this level only, not counting submenus.
    pub fn entry_count(&self) -> usize {
        match self {
            MenuModel::Flat(entries) => entries.len(),
            MenuModel::Sectioned(sections) => sections.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}

/// Builds the menu model and the action bindings for one generation from
/// the sibling records of the layout root.
pub fn build_menu(records: &[MenuRecord]) -> (MenuModel, Vec<ActionBinding>) {
    let mut bindings = Vec::new();
    let model = build_level(records, &mut bindings);
    (model, bindings)
}

fn build_level(records: &[MenuRecord], bindings: &mut Vec<ActionBinding>) -> MenuModel {
    if !records.iter().any(MenuRecord::is_separator) {
        return MenuModel::Flat(
            records
                .iter()
                .filter_map(|record| build_entry(record, bindings))
                .collect(),
        );
    }

    let mut sections = Vec::new();
    let mut current = Vec::new();
    for record in records {
        if record.is_separator() {
            sections.push(std::mem::take(&mut current));
        } else if let Some(entry) = build_entry(record, bindings) {
            current.push(entry);
        }
    }
    sections.push(current);
    MenuModel::Sectioned(sections)
}

/// Emits one entry, or `None` for records that produce nothing: invisible
/// records are omitted entirely, as are records without a label.
/// Visible-but-disabled records are emitted with a disabled binding.
fn build_entry(record: &MenuRecord, bindings: &mut Vec<ActionBinding>) -> Option<MenuEntry> {
    if !record.visible {
        return None;
    }
    let label = record.label.as_deref().filter(|label| !label.is_empty())?;

    let binding = ActionBinding::new(record.id, record.enabled);
    let action = binding.name.clone();
    bindings.push(binding);

    let submenu = record
        .has_submenu()
        .then(|| build_level(&record.children, bindings));

    Some(MenuEntry {
        item_id: record.id,
        label: label.to_owned(),
        enabled: record.enabled,
        action,
        submenu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i32, label: &str) -> MenuRecord {
        MenuRecord {
            id,
            label: Some(label.to_owned()),
            enabled: true,
            visible: true,
            ..MenuRecord::default()
        }
    }

    fn separator(id: i32) -> MenuRecord {
        MenuRecord {
            id,
            item_type: Some("separator".to_owned()),
            ..MenuRecord::default()
        }
    }

    #[test]
    fn no_separator_builds_a_flat_list() {
        let records = [entry(1, "Open"), entry(2, "Quit")];
        let (model, bindings) = build_menu(&records);
        match model {
            MenuModel::Flat(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].label, "Open");
                assert_eq!(entries[1].label, "Quit");
            }
            MenuModel::Sectioned(_) => panic!("expected a flat model"),
        }
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn separators_split_siblings_into_sections() {
        let records = [
            entry(1, "A"),
            separator(2),
            entry(3, "B"),
            entry(4, "C"),
            separator(5),
            entry(6, "D"),
        ];
        let (model, _) = build_menu(&records);
        match model {
            MenuModel::Sectioned(sections) => {
                assert_eq!(sections.len(), 3);
                assert_eq!(sections[0].len(), 1);
                assert_eq!(sections[0][0].label, "A");
                assert_eq!(sections[1].len(), 2);
                assert_eq!(sections[1][0].label, "B");
                assert_eq!(sections[1][1].label, "C");
                assert_eq!(sections[2].len(), 1);
                assert_eq!(sections[2][0].label, "D");
            }
            MenuModel::Flat(_) => panic!("expected sections"),
        }
    }

    #[test]
    fn separator_never_becomes_an_entry_or_binding() {
        let records = [entry(1, "A"), separator(2), entry(3, "B")];
        let (model, bindings) = build_menu(&records);
        assert_eq!(model.entry_count(), 2);
        assert!(bindings.iter().all(|b| b.item_id != 2));
    }

    #[test]
    fn leading_separator_opens_an_empty_section() {
        let records = [separator(1), entry(2, "A")];
        let (model, _) = build_menu(&records);
        match model {
            MenuModel::Sectioned(sections) => {
                assert_eq!(sections.len(), 2);
                assert!(sections[0].is_empty());
                assert_eq!(sections[1][0].label, "A");
            }
            MenuModel::Flat(_) => panic!("expected sections"),
        }
    }

    #[test]
    fn invisible_records_are_omitted() {
        let mut hidden = entry(2, "Hidden");
        hidden.visible = false;
        let records = [entry(1, "Shown"), hidden];
        let (model, bindings) = build_menu(&records);
        assert_eq!(model.entry_count(), 1);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].item_id, 1);
    }

    #[test]
    fn disabled_records_are_emitted_with_a_disabled_binding() {
        let mut grayed = entry(2, "Unavailable");
        grayed.enabled = false;
        let records = [entry(1, "Open"), grayed];
        let (model, bindings) = build_menu(&records);
        assert_eq!(model.entry_count(), 2);
        let binding = bindings.iter().find(|b| b.item_id == 2).unwrap();
        assert!(!binding.enabled);
        match model {
            MenuModel::Flat(entries) => assert!(!entries[1].enabled),
            MenuModel::Sectioned(_) => panic!("expected a flat model"),
        }
    }

    #[test]
    fn unlabeled_records_produce_no_entry() {
        let records = [entry(1, "A"), MenuRecord { id: 2, ..MenuRecord::default() }];
        let (model, bindings) = build_menu(&records);
        assert_eq!(model.entry_count(), 1);
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn empty_label_counts_as_unlabeled() {
        let records = [entry(1, "")];
        let (model, bindings) = build_menu(&records);
        assert!(model.is_empty());
        assert!(bindings.is_empty());
    }

    #[test]
    fn action_names_concatenate_prefix_and_decimal_id() {
        let records = [entry(42, "Answer")];
        let (model, bindings) = build_menu(&records);
        assert_eq!(bindings[0].name, "menuitem.42");
        match model {
            MenuModel::Flat(entries) => assert_eq!(entries[0].action, "menuitem.42"),
            MenuModel::Sectioned(_) => panic!("expected a flat model"),
        }
    }

    #[test]
    fn submenus_recurse_and_collect_bindings() {
        let mut parent = entry(1, "File");
        parent.children_display = Some("submenu".to_owned());
        parent.children = vec![entry(10, "New"), separator(11), entry(12, "Close")];
        let (model, bindings) = build_menu(&[parent]);

        let MenuModel::Flat(entries) = model else {
            panic!("expected a flat top level");
        };
        let submenu = entries[0].submenu.as_ref().unwrap();
        match submenu {
            MenuModel::Sectioned(sections) => {
                assert_eq!(sections.len(), 2);
                assert_eq!(sections[0][0].label, "New");
                assert_eq!(sections[1][0].label, "Close");
            }
            MenuModel::Flat(_) => panic!("expected sections in submenu"),
        }
        // Parent and both children are bound.
        let ids: Vec<i32> = bindings.iter().map(|b| b.item_id).collect();
        assert_eq!(ids, vec![1, 10, 12]);
    }

    #[test]
    fn invisible_parent_omits_its_whole_subtree() {
        let mut parent = entry(1, "Hidden");
        parent.visible = false;
        parent.children_display = Some("submenu".to_owned());
        parent.children = vec![entry(10, "Child")];
        let (model, bindings) = build_menu(&[parent]);
        assert!(model.is_empty());
        assert!(bindings.is_empty());
    }
}
