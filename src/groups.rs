//! Group membership editing
//!
//! The merge/detach operations behind the UI layer's drag gestures, plus the
//! chain-mode toggle. Merging pulls whole source groups, never just the
//! entries that were pointed at; roles and catalog order are never changed.

use crate::chain;
use crate::models::{EntryId, GroupId, DEFAULT_GROUP_ID};
use crate::store::BookmarkStore;

/// Merges the groups touched by `entry_ids` into one.
///
/// The target is the first non-default group seen in catalog order, or a
/// fresh group when every entry is in the default group. All entries of
/// every source group move (not only the ones passed in), plus the passed
/// default-group entries. Emptied source records are deleted. Fewer than two
/// resolved entries is a no-op; returns the target group id otherwise.
pub fn merge_into_group(store: &mut BookmarkStore, entry_ids: &[EntryId]) -> Option<GroupId> {
    let mut selected: Vec<EntryId> = Vec::new();
    let mut source_groups: Vec<GroupId> = Vec::new();
    for entry in store.entries() {
        if !entry_ids.contains(&entry.id()) {
            continue;
        }
        selected.push(entry.id());
        if entry.group_id != DEFAULT_GROUP_ID && !source_groups.contains(&entry.group_id) {
            source_groups.push(entry.group_id);
        }
    }
    if selected.len() < 2 {
        return None;
    }

    let target = match source_groups.first() {
        Some(&id) => id,
        None => store.create_group(),
    };

    // whole source groups move, not merely the entries passed in
    let movers: Vec<EntryId> = store
        .entries()
        .iter()
        .filter(|e| source_groups.contains(&e.group_id) && e.group_id != target)
        .map(|e| e.id())
        .chain(
            selected
                .iter()
                .copied()
                .filter(|&id| store.entry(id).is_some_and(|e| e.group_id == DEFAULT_GROUP_ID)),
        )
        .collect();
    for id in movers {
        store.set_group_id(id, target);
    }
    store.prune_empty_groups();
    Some(target)
}

/// Sends each entry back to the default group and deletes any source group
/// record that ends up empty. An empty set is a no-op.
pub fn detach_from_group(store: &mut BookmarkStore, entry_ids: &[EntryId]) {
    for &id in entry_ids {
        store.set_group_id(id, DEFAULT_GROUP_ID);
    }
    store.prune_empty_groups();
}

/// Flips a group's chain mode. Enabling it recomputes the chain right away.
/// Returns the new state, or None for an unknown group.
pub fn toggle_chain_mode(store: &mut BookmarkStore, group_id: GroupId) -> Option<bool> {
    let group = store.group_mut(group_id)?;
    group.chain_mode = !group.chain_mode;
    let enabled = group.chain_mode;
    if enabled {
        chain::recompute(store, group_id);
    }
    Some(enabled)
}

/// Flips a group's expanded flag. Returns the new state, or None for an
/// unknown group.
pub fn toggle_expanded(store: &mut BookmarkStore, group_id: GroupId) -> Option<bool> {
    let group = store.group_mut(group_id)?;
    group.expanded = !group.expanded;
    Some(group.expanded)
}
