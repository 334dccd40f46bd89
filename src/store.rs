//! The catalog-entry store: ordered entries plus group records
//!
//! Owns every entry and group record. Entry order is significant: it is the
//! sole source of recipe-block structure, so all listing operations preserve
//! insertion order.

use std::collections::BTreeMap;

use crate::models::{BookmarkEntry, BookmarkGroup, EntryId, GroupId, Role, DEFAULT_GROUP_ID};
use crate::recipe;

#[derive(Debug)]
pub struct BookmarkStore {
    entries: Vec<BookmarkEntry>,
    groups: BTreeMap<GroupId, BookmarkGroup>,
    next_group_id: GroupId,
    next_entry_id: EntryId,
}

impl Default for BookmarkStore {
    fn default() -> BookmarkStore {
        BookmarkStore::new()
    }
}

impl BookmarkStore {
    pub fn new() -> BookmarkStore {
        let mut groups = BTreeMap::new();
        groups.insert(DEFAULT_GROUP_ID, BookmarkGroup::default());
        BookmarkStore {
            entries: Vec::new(),
            groups,
            next_group_id: 1,
            next_entry_id: 1,
        }
    }

    /// Rebuilds a store from persisted parts. Entry ids are reassigned in
    /// catalog order. The default group record is restored if missing and
    /// group records with no entries are dropped.
    pub fn from_parts(
        entries: Vec<BookmarkEntry>,
        groups: BTreeMap<GroupId, BookmarkGroup>,
        next_group_id: GroupId,
    ) -> BookmarkStore {
        let max_group = entries
            .iter()
            .map(|e| e.group_id)
            .chain(groups.keys().copied())
            .max()
            .unwrap_or(0);
        let next_entry_id = entries.iter().map(|e| e.id()).max().unwrap_or(0) + 1;
        let mut store = BookmarkStore {
            entries,
            groups,
            next_group_id: next_group_id.max(max_group + 1).max(1),
            next_entry_id,
        };
        for entry in &store.entries {
            store
                .groups
                .entry(entry.group_id)
                .or_insert_with(BookmarkGroup::default);
        }
        store.groups.entry(DEFAULT_GROUP_ID).or_default();
        store.prune_empty_groups();
        store
    }

    /// Allocates a fresh group id with default settings.
    pub fn create_group(&mut self) -> GroupId {
        let group_id = self.next_group_id;
        self.next_group_id += 1;
        self.groups.insert(group_id, BookmarkGroup::default());
        group_id
    }

    /// Auto-vivification: referencing a group id with no record creates one.
    pub fn ensure_group(&mut self, group_id: GroupId) {
        self.groups
            .entry(group_id)
            .or_insert_with(BookmarkGroup::default);
        if group_id >= self.next_group_id {
            self.next_group_id = group_id + 1;
        }
    }

    pub fn group(&self, group_id: GroupId) -> Option<&BookmarkGroup> {
        self.groups.get(&group_id)
    }

    pub fn group_mut(&mut self, group_id: GroupId) -> Option<&mut BookmarkGroup> {
        self.groups.get_mut(&group_id)
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &BookmarkGroup)> {
        self.groups.iter().map(|(&id, g)| (id, g))
    }

    pub fn next_group_id(&self) -> GroupId {
        self.next_group_id
    }

    /// Appends an entry to the catalog, creating the group record if needed.
    pub fn add_entry(
        &mut self,
        group_id: GroupId,
        item_key: impl Into<String>,
        unit_factor: u64,
        role: Role,
    ) -> EntryId {
        self.ensure_group(group_id);
        let id = self.next_entry_id;
        self.next_entry_id += 1;
        self.entries
            .push(BookmarkEntry::new(id, group_id, item_key, unit_factor, role));
        id
    }

    /// Adds a whole recipe as a fresh group: the output entry first, then
    /// every input in recipe order. Returns the new group id.
    pub fn add_recipe(
        &mut self,
        output: (&str, u64),
        inputs: &[(String, u64)],
    ) -> GroupId {
        let group_id = self.create_group();
        self.add_entry(group_id, output.0, output.1, Role::Output);
        for (key, factor) in inputs {
            self.add_entry(group_id, key.as_str(), *factor, Role::Input);
        }
        group_id
    }

    pub fn entry(&self, id: EntryId) -> Option<&BookmarkEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut BookmarkEntry> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    /// All entries in catalog order.
    pub fn entries(&self) -> &[BookmarkEntry] {
        &self.entries
    }

    /// Entries of one group, in catalog order.
    pub fn group_entries(&self, group_id: GroupId) -> Vec<&BookmarkEntry> {
        self.entries
            .iter()
            .filter(|e| e.group_id == group_id)
            .collect()
    }

    pub fn group_entry_ids(&self, group_id: GroupId) -> Vec<EntryId> {
        self.entries
            .iter()
            .filter(|e| e.group_id == group_id)
            .map(|e| e.id())
            .collect()
    }

    /// Distinct group ids that still have entries, in catalog order of first
    /// appearance.
    pub fn active_group_ids(&self) -> Vec<GroupId> {
        let mut ids = Vec::new();
        for entry in &self.entries {
            if !ids.contains(&entry.group_id) {
                ids.push(entry.group_id);
            }
        }
        ids
    }

    /// Reassigns an entry to a group, auto-vivifying the target record.
    /// Callers that can empty the source group must prune afterwards.
    pub fn set_group_id(&mut self, id: EntryId, group_id: GroupId) -> bool {
        self.ensure_group(group_id);
        match self.entries.iter_mut().find(|e| e.id() == id) {
            Some(entry) => {
                entry.group_id = group_id;
                true
            }
            None => false,
        }
    }

    /// Removes one entry. An output takes its whole recipe block with it;
    /// any other role is removed alone. Empty groups are pruned.
    pub fn remove_entry(&mut self, id: EntryId) -> bool {
        let Some(entry) = self.entry(id) else {
            return false;
        };
        let mut doomed = vec![id];
        if entry.is_output() {
            doomed.extend(recipe::recipe_block(&self.entries, id));
        }
        self.entries.retain(|e| !doomed.contains(&e.id()));
        self.prune_empty_groups();
        true
    }

    /// Removes a group's entries and its record. The default group is only
    /// emptied; its record survives.
    pub fn remove_group(&mut self, group_id: GroupId) {
        self.entries.retain(|e| e.group_id != group_id);
        if group_id != DEFAULT_GROUP_ID {
            self.groups.remove(&group_id);
        }
        self.prune_empty_groups();
    }

    /// Drops every non-default group record that no entry references.
    pub fn prune_empty_groups(&mut self) {
        let referenced: Vec<GroupId> = self.active_group_ids();
        self.groups
            .retain(|&id, _| id == DEFAULT_GROUP_ID || referenced.contains(&id));
    }
}
