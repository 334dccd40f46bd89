//! Recipe-block resolution
//!
//! A recipe block is an output entry plus the input entries immediately
//! trailing it in catalog order. Membership is derived purely from order and
//! role; group ids play no part, so a block can in principle straddle groups.

use crate::models::{BookmarkEntry, EntryId, Role};

/// Input entries of the recipe headed by `output_id`: every input after the
/// output in catalog order, up to (and excluding) the next output. Standalone
/// entries are passed over without ending the block. Returns an empty block
/// when `output_id` is absent.
pub fn recipe_block(entries: &[BookmarkEntry], output_id: EntryId) -> Vec<EntryId> {
    let Some(pos) = entries.iter().position(|e| e.id() == output_id) else {
        return Vec::new();
    };
    let mut block = Vec::new();
    for entry in &entries[pos + 1..] {
        match entry.role {
            Role::Output => break,
            Role::Input => block.push(entry.id()),
            Role::Standalone => {}
        }
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_GROUP_ID;

    fn entry(id: EntryId, key: &str, role: Role) -> BookmarkEntry {
        BookmarkEntry::new(id, DEFAULT_GROUP_ID, key, 1, role)
    }

    #[test]
    fn blocks_split_at_the_next_output() {
        // [OUT a, IN x, IN y, OUT b, IN z]
        let entries = vec![
            entry(1, "a", Role::Output),
            entry(2, "x", Role::Input),
            entry(3, "y", Role::Input),
            entry(4, "b", Role::Output),
            entry(5, "z", Role::Input),
        ];
        assert_eq!(recipe_block(&entries, 1), vec![2, 3]);
        assert_eq!(recipe_block(&entries, 4), vec![5]);
    }

    #[test]
    fn standalone_entries_do_not_end_a_block() {
        let entries = vec![
            entry(1, "a", Role::Output),
            entry(2, "x", Role::Input),
            entry(3, "loose", Role::Standalone),
            entry(4, "y", Role::Input),
        ];
        assert_eq!(recipe_block(&entries, 1), vec![2, 4]);
    }

    #[test]
    fn trailing_output_has_an_empty_block() {
        let entries = vec![entry(1, "a", Role::Output)];
        assert_eq!(recipe_block(&entries, 1), Vec::<EntryId>::new());
    }

    #[test]
    fn unknown_output_resolves_to_nothing() {
        let entries = vec![entry(1, "a", Role::Output)];
        assert_eq!(recipe_block(&entries, 99), Vec::<EntryId>::new());
    }
}
