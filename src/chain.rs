//! Chain-demand propagation
//!
//! When a group runs in chain mode, the quantities needed by one recipe
//! drive the batch counts of the other recipes in the group that supply its
//! inputs. The first output in catalog order is the root of the chain: its
//! amount is taken as given, demand flows downward, and every other output
//! (plus the inputs of its recipe block) is rewritten to the batch count the
//! chain requires.

use std::collections::{HashMap, HashSet};

use crate::models::{BookmarkEntry, EntryId, GroupId};
use crate::recipe;
use crate::store::BookmarkStore;

/// Recomputes batch counts for a chain-mode group. Safe to call on any
/// group; with fewer than two outputs there is nothing to balance and the
/// catalog is left untouched.
pub fn recompute(store: &mut BookmarkStore, group_id: GroupId) {
    for (id, cycles) in plan_recompute(store, group_id) {
        if let Some(entry) = store.entry_mut(id) {
            entry.set_cycles(cycles);
        }
    }
}

/// Demand state for one balancing pass, keyed by output entry id.
struct Demand {
    /// Producer map: which output satisfies each input.
    preferred: HashMap<EntryId, EntryId>,
    /// Quantity each output is currently planned to produce.
    current: HashMap<EntryId, u64>,
    /// Quantity the chain has asked of each output so far.
    required: HashMap<EntryId, u64>,
}

/// Computes the new batch counts without touching the store.
fn plan_recompute(store: &BookmarkStore, group_id: GroupId) -> Vec<(EntryId, u64)> {
    let entries = store.entries();
    let by_id: HashMap<EntryId, &BookmarkEntry> =
        entries.iter().map(|e| (e.id(), e)).collect();

    let member = |id: EntryId| by_id.get(&id).is_some_and(|e| e.group_id == group_id);
    let outputs: Vec<EntryId> = entries
        .iter()
        .filter(|e| e.group_id == group_id && e.is_output())
        .map(|e| e.id())
        .collect();
    if outputs.len() < 2 {
        return Vec::new();
    }

    // Recipe blocks are order-derived over the whole catalog; the engine
    // only considers the block members that belong to this group.
    let blocks: HashMap<EntryId, Vec<EntryId>> = outputs
        .iter()
        .map(|&o| {
            let block = recipe::recipe_block(entries, o)
                .into_iter()
                .filter(|&i| member(i))
                .collect();
            (o, block)
        })
        .collect();

    let mut demand = Demand {
        preferred: HashMap::new(),
        current: outputs.iter().map(|&o| (o, 0)).collect(),
        required: outputs.iter().map(|&o| (o, 0)).collect(),
    };

    for &output in &outputs {
        let mut path = HashSet::from([output]);
        map_producers(output, &outputs, &blocks, &by_id, &mut path, &mut demand.preferred);
    }

    let root = outputs[0];
    let Some(root_entry) = by_id.get(&root) else {
        return Vec::new();
    };
    demand.current.insert(root, root_entry.amount());
    let path = HashSet::from([root]);
    propagate(root, root_entry.cycles(), &blocks, &by_id, &mut demand, &path);

    let mut plan = Vec::new();
    for &output in &outputs[1..] {
        let produced = demand.current.get(&output).copied().unwrap_or(0);
        if produced == 0 {
            continue;
        }
        let Some(entry) = by_id.get(&output) else {
            continue;
        };
        let cycles = produced.div_ceil(entry.unit_factor());
        plan.push((output, cycles));
        // every ingredient of a recipe tracks that recipe's batch count
        if let Some(block) = blocks.get(&output) {
            for &input in block {
                plan.push((input, cycles));
            }
        }
    }
    plan
}

/// Builds the input -> output producer map by walking each recipe block and
/// recursing into the block of every producer found. The path guard keeps a
/// producer from being revisited along the current search path but is
/// released on backtrack, so two different inputs may still resolve to the
/// same producer.
fn map_producers(
    output: EntryId,
    outputs: &[EntryId],
    blocks: &HashMap<EntryId, Vec<EntryId>>,
    by_id: &HashMap<EntryId, &BookmarkEntry>,
    path: &mut HashSet<EntryId>,
    preferred: &mut HashMap<EntryId, EntryId>,
) {
    let Some(block) = blocks.get(&output) else {
        return;
    };
    for &input in block {
        if preferred.contains_key(&input) {
            continue;
        }
        let Some(input_entry) = by_id.get(&input) else {
            continue;
        };
        let producer = outputs.iter().copied().find(|p| {
            !path.contains(p)
                && by_id
                    .get(p)
                    .is_some_and(|e| e.item_key() == input_entry.item_key())
        });
        let Some(producer) = producer else {
            continue;
        };
        preferred.insert(input, producer);
        path.insert(producer);
        map_producers(producer, outputs, blocks, by_id, path, preferred);
        path.remove(&producer);
    }
}

/// Grants `incremental` more cycles of demand to `output`'s ingredients.
/// Each producer receives only the cycles just granted, never the absolute
/// total, so demand arriving over several paths accumulates correctly. The
/// visited set is path-local: extended per call, never globally.
fn propagate(
    output: EntryId,
    incremental: u64,
    blocks: &HashMap<EntryId, Vec<EntryId>>,
    by_id: &HashMap<EntryId, &BookmarkEntry>,
    demand: &mut Demand,
    path: &HashSet<EntryId>,
) {
    let Some(block) = blocks.get(&output) else {
        return;
    };
    for &input in block {
        let Some(&producer) = demand.preferred.get(&input) else {
            continue;
        };
        let (Some(input_entry), Some(producer_entry)) =
            (by_id.get(&input), by_id.get(&producer))
        else {
            continue;
        };
        let needed = input_entry.unit_factor() * incremental;
        let required = demand.required.entry(producer).or_insert(0);
        *required += needed;
        let required = *required;
        let current = demand.current.entry(producer).or_insert(0);
        if required > *current {
            let shift = (required - *current).div_ceil(producer_entry.unit_factor());
            *current += shift * producer_entry.unit_factor();
            if !path.contains(&producer) {
                let mut next = path.clone();
                next.insert(producer);
                propagate(producer, shift, blocks, by_id, demand, &next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    /// One recipe per tuple: (output key, output factor, inputs).
    fn chain_group(recipes: &[(&str, u64, &[(&str, u64)])]) -> (BookmarkStore, GroupId) {
        let mut store = BookmarkStore::new();
        let group_id = store.create_group();
        for (out, factor, inputs) in recipes {
            store.add_entry(group_id, *out, *factor, Role::Output);
            for (key, f) in *inputs {
                store.add_entry(group_id, *key, *f, Role::Input);
            }
        }
        (store, group_id)
    }

    fn cycles_of(store: &BookmarkStore, key: &str) -> Vec<u64> {
        store
            .entries()
            .iter()
            .filter(|e| e.item_key() == key)
            .map(|e| e.cycles())
            .collect()
    }

    #[test]
    fn demand_drives_the_supplying_recipe() {
        // A needs k per cycle; B produces k
        let (mut store, gid) = chain_group(&[
            ("mod:a", 1, &[("mod:k", 1)]),
            ("mod:k", 1, &[("mod:ore", 1)]),
        ]);
        let root = store.group_entry_ids(gid)[0];
        store.entry_mut(root).unwrap().set_cycles(2);
        recompute(&mut store, gid);

        // B runs twice, and every input in B's block tracks that count
        let b_out = store
            .entries()
            .iter()
            .find(|e| e.item_key() == "mod:k" && e.is_output())
            .unwrap();
        assert_eq!(b_out.cycles(), 2);
        assert_eq!(cycles_of(&store, "mod:ore"), vec![2]);
        // the commit never rewrites the root's own block
        let root_input = store
            .entries()
            .iter()
            .find(|e| e.item_key() == "mod:k" && e.is_input())
            .unwrap();
        assert_eq!(root_input.cycles(), 1);
    }

    #[test]
    fn unit_factors_batch_demand_up() {
        // root wants 3 cycles x 2 planks each = 6 planks;
        // the plank recipe yields 4 per cycle -> ceil(6/4) = 2 cycles
        let (mut store, gid) = chain_group(&[
            ("mod:table", 1, &[("mod:plank", 2)]),
            ("mod:plank", 4, &[("mod:log", 1)]),
        ]);
        let root = store.group_entry_ids(gid)[0];
        store.entry_mut(root).unwrap().set_cycles(3);
        recompute(&mut store, gid);

        let plank_out = store
            .entries()
            .iter()
            .find(|e| e.item_key() == "mod:plank" && e.is_output())
            .unwrap();
        assert_eq!(plank_out.cycles(), 2);
        assert_eq!(plank_out.amount(), 8);
        assert_eq!(cycles_of(&store, "mod:log"), vec![2]);
    }

    #[test]
    fn demand_cascades_through_intermediate_recipes() {
        // torch <- stick <- plank, all factor 1
        let (mut store, gid) = chain_group(&[
            ("mod:torch", 1, &[("mod:stick", 1)]),
            ("mod:stick", 1, &[("mod:plank", 1)]),
            ("mod:plank", 1, &[("mod:log", 1)]),
        ]);
        let root = store.group_entry_ids(gid)[0];
        store.entry_mut(root).unwrap().set_cycles(5);
        recompute(&mut store, gid);

        // the root's block input keeps its count; everything downstream moves
        assert_eq!(cycles_of(&store, "mod:stick"), vec![1, 5]);
        assert_eq!(cycles_of(&store, "mod:plank"), vec![5, 5]);
        assert_eq!(cycles_of(&store, "mod:log"), vec![5]);
    }

    #[test]
    fn shared_sub_ingredient_accumulates_demand_from_both_paths() {
        // a needs b and c; b and c each need one d per cycle
        let (mut store, gid) = chain_group(&[
            ("mod:a", 1, &[("mod:b", 1), ("mod:c", 1)]),
            ("mod:b", 1, &[("mod:d", 1)]),
            ("mod:c", 1, &[("mod:d", 1)]),
            ("mod:d", 1, &[]),
        ]);
        let root = store.group_entry_ids(gid)[0];
        store.entry_mut(root).unwrap().set_cycles(3);
        recompute(&mut store, gid);

        // d is demanded 3 times by b's block and 3 times by c's block
        let d_out = store
            .entries()
            .iter()
            .find(|e| e.item_key() == "mod:d" && e.is_output())
            .unwrap();
        assert_eq!(d_out.cycles(), 6);
    }

    #[test]
    fn inputs_without_a_producer_keep_their_count() {
        let (mut store, gid) = chain_group(&[
            ("mod:a", 1, &[("mod:mystery", 1)]),
            ("mod:b", 1, &[("mod:ore", 1)]),
        ]);
        let ids = store.group_entry_ids(gid);
        let mystery = ids[1];
        store.entry_mut(mystery).unwrap().set_cycles(7);
        recompute(&mut store, gid);
        assert_eq!(store.entry(mystery).unwrap().cycles(), 7);
        // b got no demand either; its count is untouched
        assert_eq!(cycles_of(&store, "mod:b"), vec![1]);
    }

    #[test]
    fn single_output_groups_are_left_alone() {
        let (mut store, gid) = chain_group(&[("mod:a", 1, &[("mod:k", 3)])]);
        let ids = store.group_entry_ids(gid);
        store.entry_mut(ids[1]).unwrap().set_cycles(9);
        recompute(&mut store, gid);
        assert_eq!(store.entry(ids[1]).unwrap().cycles(), 9);
    }

    #[test]
    fn cyclic_producer_maps_terminate() {
        // a needs b, b needs a: the path guard must stop the recursion
        let (mut store, gid) = chain_group(&[
            ("mod:a", 1, &[("mod:b", 1)]),
            ("mod:b", 1, &[("mod:a", 1)]),
        ]);
        let root = store.group_entry_ids(gid)[0];
        store.entry_mut(root).unwrap().set_cycles(4);
        recompute(&mut store, gid);
        let b_out = store
            .entries()
            .iter()
            .find(|e| e.item_key() == "mod:b" && e.is_output())
            .unwrap();
        assert_eq!(b_out.cycles(), 4);
    }

    #[test]
    fn recompute_is_a_fixed_point() {
        let (mut store, gid) = chain_group(&[
            ("mod:table", 1, &[("mod:plank", 2)]),
            ("mod:plank", 4, &[("mod:log", 1)]),
        ]);
        let root = store.group_entry_ids(gid)[0];
        store.entry_mut(root).unwrap().set_cycles(3);
        recompute(&mut store, gid);
        let snapshot: Vec<u64> = store.entries().iter().map(|e| e.amount()).collect();
        recompute(&mut store, gid);
        let again: Vec<u64> = store.entries().iter().map(|e| e.amount()).collect();
        assert_eq!(snapshot, again);
    }
}
