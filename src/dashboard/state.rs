use super::documents::AttachmentState;
use crate::models::entry::{Entry, EntryKind};

/// Lifecycle of the dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No request code resolved yet.
    #[default]
    Unresolved,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    General,
    Attachments,
    Changes,
}

/// The create/edit dialog.
///
/// `child_id` is the id of the entry being edited, or the id assigned by the
/// server once a new entry's general information has been saved. Tabs other
/// than `General` are locked until it is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: EntryKind,
    pub edit_mode: bool,
    pub current: Option<Entry>,
    pub child_id: Option<String>,
    pub tab: Tab,
    pub loading: bool,
    pub error: Option<String>,
    pub attachments: AttachmentState,
}

impl Dialog {
    pub fn create(kind: EntryKind) -> Self {
        Self {
            kind,
            edit_mode: false,
            current: None,
            child_id: None,
            tab: Tab::General,
            loading: false,
            error: None,
            attachments: AttachmentState::default(),
        }
    }

    pub fn edit(entry: Entry) -> Self {
        let id = entry.id().to_string();
        Self {
            kind: entry.kind(),
            edit_mode: true,
            child_id: (!id.is_empty()).then_some(id),
            current: Some(entry),
            ..Self::create(EntryKind::default())
        }
    }

    pub fn title(&self) -> &'static str {
        match (self.edit_mode, self.kind) {
            (false, EntryKind::Person) => "Add person",
            (false, EntryKind::Vehicle) => "Add vehicle",
            (true, EntryKind::Person) => "Edit person",
            (true, EntryKind::Vehicle) => "Edit vehicle",
        }
    }

    pub fn can_select(&self, tab: Tab) -> bool {
        match tab {
            Tab::General => true,
            Tab::Attachments => self.child_id.is_some(),
            Tab::Changes => {
                self.kind == EntryKind::Person && self.edit_mode && self.child_id.is_some()
            }
        }
    }

    pub fn available_tabs(&self) -> Vec<Tab> {
        [Tab::General, Tab::Attachments, Tab::Changes]
            .into_iter()
            .filter(|t| self.can_select(*t))
            .collect()
    }

    /// Returns false and leaves the tab unchanged when `tab` is locked.
    pub fn select(&mut self, tab: Tab) -> bool {
        if !self.can_select(tab) {
            return false;
        }
        self.tab = tab;
        true
    }
}
