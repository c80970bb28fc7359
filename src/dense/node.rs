use crate::arena::NodeId;

/// Trie node holding one child slot per alphabet symbol.
///
/// Slot `k` always means "child for the alphabet symbol of rank `k`", so
/// lookup is O(1) and structural equality is independent of insertion order.
#[derive(Debug, Clone)]
pub(crate) struct DenseNode {
    symbol: char,
    eow: bool,
    children: Box<[Option<NodeId>]>,
}

impl DenseNode {
    /// The root carries a NUL placeholder symbol and is never end-of-word.
    pub(crate) fn root(slots: usize) -> Self {
        DenseNode::new('\0', false, slots)
    }

    pub(crate) fn new(symbol: char, eow: bool, slots: usize) -> Self {
        DenseNode {
            symbol,
            eow,
            children: vec![None; slots].into_boxed_slice(),
        }
    }

    pub(crate) fn symbol(&self) -> char {
        self.symbol
    }

    pub(crate) fn is_end_of_word(&self) -> bool {
        self.eow
    }

    /// Idempotent; a node never stops being end-of-word.
    pub(crate) fn mark_end_of_word(&mut self) {
        self.eow = true;
    }

    pub(crate) fn child(&self, slot: usize) -> Option<NodeId> {
        self.children[slot]
    }

    pub(crate) fn set_child(&mut self, slot: usize, child: NodeId) {
        self.children[slot] = Some(child);
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.children.len()
    }

    /// Present children with their slots, in slot order.
    pub(crate) fn children(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(slot, child)| child.map(|id| (slot, id)))
    }
}
