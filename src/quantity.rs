//! Cycle-count arithmetic and the quantized stepping policy
//!
//! Every user-facing "adjust by N" action goes through [`quantized_shift`];
//! the store-level writes below apply it and kick off a chain recompute when
//! the touched entry sits in a chain-mode group.

use crate::chain;
use crate::models::EntryId;
use crate::store::BookmarkStore;

/// The canonical adjust-by-N policy.
///
/// A positive shift rounds `current_cycles + shift` down to the nearest
/// multiple of `shift` (batch-to-multiple quantization, not a plain add); a
/// negative shift is a plain add. A result that would drop to zero or below
/// collapses to one cycle when coming from above one, and is otherwise
/// floored at `min_cycles`.
pub fn quantized_shift(current_cycles: u64, shift: i64, min_cycles: u64) -> u64 {
    let current = current_cycles as i64;
    let result = if shift > 0 {
        (current + shift) / shift * shift
    } else {
        current + shift
    };
    if result <= 0 && current > 1 {
        1
    } else {
        result.max(min_cycles as i64).max(1) as u64
    }
}

/// Recomputes the chain if the entry's group has chain mode on.
fn recompute_if_chained(store: &mut BookmarkStore, id: EntryId) {
    let Some(group_id) = store.entry(id).map(|e| e.group_id) else {
        return;
    };
    if store.group(group_id).is_some_and(|g| g.chain_mode) {
        chain::recompute(store, group_id);
    }
}

/// Sets an entry's total amount (clamped to its unit factor).
/// Returns false when the entry does not exist.
pub fn set_amount(store: &mut BookmarkStore, id: EntryId, amount: u64) -> bool {
    match store.entry_mut(id) {
        Some(entry) => {
            entry.set_amount(amount);
            recompute_if_chained(store, id);
            true
        }
        None => false,
    }
}

/// Sets an entry's batch count. Returns false when the entry does not exist.
pub fn set_cycles(store: &mut BookmarkStore, id: EntryId, cycles: u64) -> bool {
    match store.entry_mut(id) {
        Some(entry) => {
            entry.set_cycles(cycles);
            recompute_if_chained(store, id);
            true
        }
        None => false,
    }
}

/// Applies a quantized shift to an entry's batch count and returns the new
/// count, or None when the entry does not exist. A zero shift is a no-op.
pub fn shift_cycles(store: &mut BookmarkStore, id: EntryId, shift: i64) -> Option<u64> {
    let entry = store.entry_mut(id)?;
    if shift == 0 {
        return Some(entry.cycles());
    }
    let cycles = quantized_shift(entry.cycles(), shift, 1);
    entry.set_cycles(cycles);
    recompute_if_chained(store, id);
    Some(cycles)
}
