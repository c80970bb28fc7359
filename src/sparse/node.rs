use crate::arena::NodeId;

/// Trie node holding a first-child reference plus a next-sibling reference.
///
/// All children of one parent form a sibling chain in insertion order, so a
/// node costs two references regardless of the alphabet size; lookups scan
/// the chain.
#[derive(Debug, Clone)]
pub(crate) struct SparseNode {
    symbol: char,
    eow: bool,
    child: Option<NodeId>,
    sibling: Option<NodeId>,
}

impl SparseNode {
    /// The root carries a NUL placeholder symbol and is never end-of-word.
    pub(crate) fn root() -> Self {
        SparseNode::new('\0', false)
    }

    pub(crate) fn new(symbol: char, eow: bool) -> Self {
        SparseNode {
            symbol,
            eow,
            child: None,
            sibling: None,
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

    pub(crate) fn child(&self) -> Option<NodeId> {
        self.child
    }

    pub(crate) fn sibling(&self) -> Option<NodeId> {
        self.sibling
    }

    pub(crate) fn set_child(&mut self, child: Option<NodeId>) {
        self.child = child;
    }

    pub(crate) fn set_sibling(&mut self, sibling: Option<NodeId>) {
        self.sibling = sibling;
    }
}
