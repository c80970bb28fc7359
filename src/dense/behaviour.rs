//! Pre-order flattening and the optimizer strategy for the dense store.

use ahash::{AHashMap, AHashSet};

use super::node::DenseNode;
use crate::arena::{Arena, NodeId};
use crate::optimizer::{Flattening, OptimizerBehaviour};

/// Flattens the subtree under `root` into the optimizer's three arrays.
pub(crate) fn flatten(arena: &Arena<DenseNode>, root: NodeId) -> Flattening {
    let mut flattening = Flattening::new();
    walk(arena, &mut flattening, root, 0);
    flattening
}

fn walk(arena: &Arena<DenseNode>, flattening: &mut Flattening, node: NodeId, ancestor: usize) {
    let position = flattening.nodes.len();
    flattening.nodes.push(node);
    flattening.ancestors.push(ancestor);

    let mut is_leaf = true;
    for (_, child) in arena.get(node).children() {
        is_leaf = false;
        walk(arena, flattening, child, position);
    }
    if is_leaf {
        flattening.leaves.push(position);
    }
}

/// Optimizer strategy over a dense arena: slot-edge rewriting, subtree sizing
/// and memoized structural equality.
pub(crate) struct DenseBehaviour<'a> {
    arena: &'a mut Arena<DenseNode>,
    memo: AHashMap<(NodeId, NodeId), bool>,
}

impl<'a> DenseBehaviour<'a> {
    pub(crate) fn new(arena: &'a mut Arena<DenseNode>) -> Self {
        DenseBehaviour {
            arena,
            memo: AHashMap::new(),
        }
    }
}

impl OptimizerBehaviour for DenseBehaviour<'_> {
    fn nodes_equal(&mut self, a: NodeId, b: NodeId) -> bool {
        subtree_eq(self.arena, &mut self.memo, a, b)
    }

    fn change_refs(&mut self, ancestor: NodeId, internal: NodeId, dest: NodeId) {
        let node = self.arena.get_mut(ancestor);
        for slot in 0..node.slot_count() {
            if node.child(slot) == Some(internal) {
                node.set_child(slot, dest);
                return;
            }
        }
    }

    fn count_nodes(&self, root: NodeId) -> usize {
        count_subtree(self.arena, root)
    }
}

/// Nodes in the subtree under `root`, counted once per path.
fn count_subtree(arena: &Arena<DenseNode>, root: NodeId) -> usize {
    let mut count = 1;
    for (_, child) in arena.get(root).children() {
        count += count_subtree(arena, child);
    }
    count
}

/// Structural equality of two subtrees held in one arena.
///
/// Runs over an explicit stack and caches verdicts per identity pair, so a
/// subtree already shared by earlier merges is compared once rather than once
/// per referencing parent.
fn subtree_eq(
    arena: &Arena<DenseNode>,
    memo: &mut AHashMap<(NodeId, NodeId), bool>,
    a: NodeId,
    b: NodeId,
) -> bool {
    enum Step {
        Enter(NodeId, NodeId),
        Judge(NodeId, NodeId),
    }

    let mut stack = vec![Step::Enter(a, b)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(a, b) => {
                if a == b || memo.contains_key(&(a, b)) {
                    continue;
                }
                let left = arena.get(a);
                let right = arena.get(b);
                if left.symbol() != right.symbol()
                    || left.is_end_of_word() != right.is_end_of_word()
                    || !same_slot_pattern(left, right)
                {
                    memo.insert((a, b), false);
                    continue;
                }
                // Children are judged before this pair pops again.
                stack.push(Step::Judge(a, b));
                for slot in 0..left.slot_count() {
                    if let (Some(child_a), Some(child_b)) = (left.child(slot), right.child(slot)) {
                        stack.push(Step::Enter(child_a, child_b));
                    }
                }
            }
            Step::Judge(a, b) => {
                let left = arena.get(a);
                let right = arena.get(b);
                let equal = (0..left.slot_count()).all(|slot| {
                    match (left.child(slot), right.child(slot)) {
                        (Some(child_a), Some(child_b)) => pair_verdict(memo, child_a, child_b),
                        _ => true,
                    }
                });
                memo.insert((a, b), equal);
            }
        }
    }
    pair_verdict(memo, a, b)
}

fn pair_verdict(memo: &AHashMap<(NodeId, NodeId), bool>, a: NodeId, b: NodeId) -> bool {
    a == b || memo.get(&(a, b)).copied().unwrap_or(false)
}

fn same_slot_pattern(left: &DenseNode, right: &DenseNode) -> bool {
    (0..left.slot_count()).all(|slot| left.child(slot).is_some() == right.child(slot).is_some())
}

/// Number of distinct nodes reachable from `root`, `root` included.
pub(crate) fn reachable_nodes(arena: &Arena<DenseNode>, root: NodeId) -> usize {
    let mut seen = AHashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !seen.insert(node) {
            continue;
        }
        for (_, child) in arena.get(node).children() {
            stack.push(child);
        }
    }
    seen.len()
}

/// Structural equality across two independent (unminimized) tries.
pub(crate) fn tree_eq(
    left_arena: &Arena<DenseNode>,
    a: NodeId,
    right_arena: &Arena<DenseNode>,
    b: NodeId,
) -> bool {
    let left = left_arena.get(a);
    let right = right_arena.get(b);
    if left.symbol() != right.symbol()
        || left.is_end_of_word() != right.is_end_of_word()
        || left.slot_count() != right.slot_count()
    {
        return false;
    }
    (0..left.slot_count()).all(|slot| match (left.child(slot), right.child(slot)) {
        (None, None) => true,
        (Some(child_a), Some(child_b)) => tree_eq(left_arena, child_a, right_arena, child_b),
        _ => false,
    })
}
