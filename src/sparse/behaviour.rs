//! Pre-order flattening and the optimizer strategy for the sparse store.
//!
//! Sparse structural equality recurses over both the child chain and the
//! sibling chain, so it also compares sibling order. Two subtries holding the
//! same symbol set inserted in different orders therefore compare unequal and
//! stay unmerged — an accepted trade-off of this representation, not a bug.

use ahash::{AHashMap, AHashSet};

use super::node::SparseNode;
use crate::arena::{Arena, NodeId};
use crate::optimizer::{Flattening, OptimizerBehaviour};

/// Flattens the subtree under `root` into the optimizer's three arrays.
///
/// A sibling keeps its parent's ancestor position: the chain hangs off the
/// parent, not off the previous sibling. A node is a leaf when it has no
/// child, trailing siblings or not.
pub(crate) fn flatten(arena: &Arena<SparseNode>, root: NodeId) -> Flattening {
    let mut flattening = Flattening::new();
    walk(arena, &mut flattening, root, 0);
    flattening
}

fn walk(arena: &Arena<SparseNode>, flattening: &mut Flattening, node: NodeId, ancestor: usize) {
    let position = flattening.nodes.len();
    flattening.nodes.push(node);
    flattening.ancestors.push(ancestor);

    if let Some(child) = arena.get(node).child() {
        walk(arena, flattening, child, position);
    } else {
        flattening.leaves.push(position);
    }
    if let Some(sibling) = arena.get(node).sibling() {
        walk(arena, flattening, sibling, ancestor);
    }
}

/// Optimizer strategy over a sparse arena: sibling-chain splicing, span
/// sizing and memoized structural equality.
pub(crate) struct SparseBehaviour<'a> {
    arena: &'a mut Arena<SparseNode>,
    memo: AHashMap<(NodeId, NodeId), bool>,
}

impl<'a> SparseBehaviour<'a> {
    pub(crate) fn new(arena: &'a mut Arena<SparseNode>) -> Self {
        SparseBehaviour {
            arena,
            memo: AHashMap::new(),
        }
    }
}

impl OptimizerBehaviour for SparseBehaviour<'_> {
    fn nodes_equal(&mut self, a: NodeId, b: NodeId) -> bool {
        subtree_eq(self.arena, &mut self.memo, a, b)
    }

    fn change_refs(&mut self, ancestor: NodeId, internal: NodeId, dest: NodeId) {
        if self.arena.get(ancestor).child() == Some(internal) {
            self.arena.get_mut(ancestor).set_child(Some(dest));
            return;
        }
        let mut cursor = self.arena.get(ancestor).child();
        while let Some(node) = cursor {
            if self.arena.get(node).sibling() == Some(internal) {
                self.arena.get_mut(node).set_sibling(Some(dest));
                return;
            }
            cursor = self.arena.get(node).sibling();
        }
    }

    fn count_nodes(&self, root: NodeId) -> usize {
        chain_size(self.arena, root)
    }
}

/// Size of the subtree under `node` plus its trailing sibling chain — the
/// exact span `node` occupies in the flattened pre-order, and exactly what a
/// merge replaces (equality covered the siblings too).
pub(crate) fn chain_size(arena: &Arena<SparseNode>, node: NodeId) -> usize {
    let mut size = 1;
    if let Some(child) = arena.get(node).child() {
        size += chain_size(arena, child);
    }
    if let Some(sibling) = arena.get(node).sibling() {
        size += chain_size(arena, sibling);
    }
    size
}

/// Structural equality of two spans held in one arena, child and sibling
/// chains included.
///
/// Runs over an explicit stack and caches verdicts per identity pair, so a
/// span already shared by earlier merges is compared once rather than once
/// per referencing parent.
fn subtree_eq(
    arena: &Arena<SparseNode>,
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
                    || left.child().is_some() != right.child().is_some()
                    || left.sibling().is_some() != right.sibling().is_some()
                {
                    memo.insert((a, b), false);
                    continue;
                }
                // Both chains are judged before this pair pops again.
                stack.push(Step::Judge(a, b));
                if let (Some(child_a), Some(child_b)) = (left.child(), right.child()) {
                    stack.push(Step::Enter(child_a, child_b));
                }
                if let (Some(sibling_a), Some(sibling_b)) = (left.sibling(), right.sibling()) {
                    stack.push(Step::Enter(sibling_a, sibling_b));
                }
            }
            Step::Judge(a, b) => {
                let left = arena.get(a);
                let right = arena.get(b);
                let children_equal = match (left.child(), right.child()) {
                    (Some(child_a), Some(child_b)) => pair_verdict(memo, child_a, child_b),
                    _ => true,
                };
                let siblings_equal = match (left.sibling(), right.sibling()) {
                    (Some(sibling_a), Some(sibling_b)) => {
                        pair_verdict(memo, sibling_a, sibling_b)
                    }
                    _ => true,
                };
                memo.insert((a, b), children_equal && siblings_equal);
            }
        }
    }
    pair_verdict(memo, a, b)
}

fn pair_verdict(memo: &AHashMap<(NodeId, NodeId), bool>, a: NodeId, b: NodeId) -> bool {
    a == b || memo.get(&(a, b)).copied().unwrap_or(false)
}

/// Number of distinct nodes reachable from `root`, `root` included.
pub(crate) fn reachable_nodes(arena: &Arena<SparseNode>, root: NodeId) -> usize {
    let mut seen = AHashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !seen.insert(node) {
            continue;
        }
        if let Some(child) = arena.get(node).child() {
            stack.push(child);
        }
        if let Some(sibling) = arena.get(node).sibling() {
            stack.push(sibling);
        }
    }
    seen.len()
}

/// Structural equality across two independent (unminimized) tries.
pub(crate) fn tree_eq(
    left_arena: &Arena<SparseNode>,
    a: NodeId,
    right_arena: &Arena<SparseNode>,
    b: NodeId,
) -> bool {
    let left = left_arena.get(a);
    let right = right_arena.get(b);
    if left.symbol() != right.symbol() || left.is_end_of_word() != right.is_end_of_word() {
        return false;
    }
    let children_equal = match (left.child(), right.child()) {
        (None, None) => true,
        (Some(child_a), Some(child_b)) => tree_eq(left_arena, child_a, right_arena, child_b),
        _ => false,
    };
    let siblings_equal = match (left.sibling(), right.sibling()) {
        (None, None) => true,
        (Some(sibling_a), Some(sibling_b)) => {
            tree_eq(left_arena, sibling_a, right_arena, sibling_b)
        }
        _ => false,
    };
    children_equal && siblings_equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::sparse::trie::SparseTrie;

    #[test]
    fn siblings_inherit_their_parents_ancestor() {
        let mut trie = SparseTrie::new(Alphabet::new("abc"));
        trie.insert("ab").unwrap();
        trie.insert("ac").unwrap();
        let flattening = flatten(&trie.arena, NodeId::ROOT);

        // Pre-order: root, a, b, c; b and c are both children of a.
        assert_eq!(flattening.nodes.len(), 4);
        assert_eq!(flattening.ancestors, vec![0, 0, 1, 1]);
        assert_eq!(flattening.leaves, vec![2, 3]);
    }

    #[test]
    fn span_size_includes_the_sibling_tail() {
        let mut trie = SparseTrie::new(Alphabet::new("abc"));
        trie.insert("ab").unwrap();
        trie.insert("ac").unwrap();
        let flattening = flatten(&trie.arena, NodeId::ROOT);

        // The span of b covers b and its trailing sibling c.
        let b = flattening.nodes[2];
        assert_eq!(chain_size(&trie.arena, b), 2);
        assert_eq!(chain_size(&trie.arena, NodeId::ROOT), 4);
    }

    #[test]
    fn equality_is_sensitive_to_sibling_order() {
        let mut first = SparseTrie::new(Alphabet::new("abc"));
        first.insert("ab").unwrap();
        first.insert("ac").unwrap();

        let mut second = SparseTrie::new(Alphabet::new("abc"));
        second.insert("ac").unwrap();
        second.insert("ab").unwrap();

        assert!(!tree_eq(
            &first.arena,
            NodeId::ROOT,
            &second.arena,
            NodeId::ROOT
        ));
    }
}
