use snafu::{ensure, ResultExt};
use std::path::Path;

use super::behaviour;
use super::codec;
use super::dawg::SparseDawg;
use super::node::SparseNode;
use crate::alphabet::Alphabet;
use crate::arena::{Arena, NodeId};
use crate::error::{self, Result};
use crate::graph::WordGraph;
use crate::storage;

/// Trie whose nodes hold a first-child and a next-sibling reference.
///
/// Uses far less memory than [`DenseTrie`](crate::DenseTrie) for large
/// alphabets, at the cost of a linear chain scan per edge. Because subtree
/// equality also compares sibling order, minimization over this
/// representation cannot merge subtries whose chains were built in different
/// insertion orders — see [`to_dawg`](SparseTrie::to_dawg).
#[derive(Debug, Clone)]
pub struct SparseTrie {
    pub(crate) alphabet: Alphabet,
    pub(crate) arena: Arena<SparseNode>,
    pub(crate) word_count: usize,
}

impl SparseTrie {
    /// An empty trie over `alphabet`.
    pub fn new(alphabet: Alphabet) -> Self {
        SparseTrie {
            alphabet,
            arena: Arena::with_root(SparseNode::root()),
            word_count: 0,
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Adds `word` to the trie; re-inserting an existing word changes
    /// nothing. The whole word is validated against the alphabet before any
    /// node is created, so a failed insert leaves the trie untouched.
    pub fn insert(&mut self, word: &str) -> Result<()> {
        self.validate(word)?;
        let symbols: Vec<char> = word.chars().collect();
        let mut current = NodeId::ROOT;
        let last = symbols.len().checked_sub(1);
        for (i, &symbol) in symbols.iter().enumerate() {
            current = self.locate_or_create(current, symbol, Some(i) == last);
        }
        Ok(())
    }

    /// Removes every word. The alphabet is kept.
    pub fn clear(&mut self) {
        self.arena = Arena::with_root(SparseNode::root());
        self.word_count = 0;
    }

    /// Minimizes a copy of this trie into a read-only DAWG; the trie itself
    /// stays untouched and fully usable.
    ///
    /// Minimization over this representation is incomplete by design:
    /// subtries holding the same symbol set in differently ordered sibling
    /// chains compare unequal and stay separate.
    pub fn to_dawg(&self) -> SparseDawg {
        SparseDawg::minimize(self.clone())
    }

    /// Number of distinct nodes reachable from the root, root included.
    pub fn node_count(&self) -> usize {
        behaviour::reachable_nodes(&self.arena, NodeId::ROOT)
    }

    /// Encodes the trie into the plain pre-order byte form.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode_trie(self)
    }

    /// Decodes a payload produced by [`to_bytes`](SparseTrie::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode_trie(bytes).context(error::Payload)
    }

    /// Writes the plain byte form to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        storage::write_file(path.as_ref(), &self.to_bytes())
    }

    /// Reads a trie previously written with [`save`](SparseTrie::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(&storage::read_file(path.as_ref())?)
    }

    fn validate(&self, word: &str) -> Result<()> {
        for symbol in word.chars() {
            ensure!(
                self.alphabet.contains(symbol),
                error::InvalidSymbol { symbol }
            );
        }
        Ok(())
    }

    fn locate_or_create(&mut self, parent: NodeId, symbol: char, terminal: bool) -> NodeId {
        match self.find_child(parent, symbol) {
            Some(child) => {
                if terminal && !self.arena.get(child).is_end_of_word() {
                    self.arena.get_mut(child).mark_end_of_word();
                    self.word_count += 1;
                }
                child
            }
            None => {
                if terminal {
                    self.word_count += 1;
                }
                let child = self.arena.push(SparseNode::new(symbol, terminal));
                match self.arena.get(parent).child() {
                    None => self.arena.get_mut(parent).set_child(Some(child)),
                    Some(first) => {
                        let last = self.last_sibling(first);
                        self.arena.get_mut(last).set_sibling(Some(child));
                    }
                }
                child
            }
        }
    }

    /// Scans `parent`'s sibling chain for `symbol`.
    fn find_child(&self, parent: NodeId, symbol: char) -> Option<NodeId> {
        let mut cursor = self.arena.get(parent).child();
        while let Some(node) = cursor {
            if self.arena.get(node).symbol() == symbol {
                return Some(node);
            }
            cursor = self.arena.get(node).sibling();
        }
        None
    }

    fn last_sibling(&self, mut node: NodeId) -> NodeId {
        while let Some(next) = self.arena.get(node).sibling() {
            node = next;
        }
        node
    }

    /// Walks `word` edge by edge; `None` when the walk falls off the trie.
    pub(crate) fn seek(&self, word: &str) -> Result<Option<NodeId>> {
        self.validate(word)?;
        let mut current = NodeId::ROOT;
        for symbol in word.chars() {
            match self.find_child(current, symbol) {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

impl WordGraph for SparseTrie {
    fn contains(&self, word: &str) -> Result<bool> {
        Ok(self
            .seek(word)?
            .map_or(false, |node| self.arena.get(node).is_end_of_word()))
    }

    fn is_prefix(&self, prefix: &str) -> Result<bool> {
        Ok(self.seek(prefix)?.is_some())
    }

    fn size(&self) -> usize {
        self.word_count
    }
}

impl PartialEq for SparseTrie {
    fn eq(&self, other: &Self) -> bool {
        self.word_count == other.word_count
            && self.alphabet == other.alphabet
            && behaviour::tree_eq(&self.arena, NodeId::ROOT, &other.arena, NodeId::ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const ENGLISH: &str = "abcdefghijklmnopqrstuvwxyz";

    fn english_trie() -> SparseTrie {
        SparseTrie::new(Alphabet::new(ENGLISH))
    }

    #[test]
    fn insert_and_contains() {
        let mut trie = english_trie();
        trie.insert("war").unwrap();
        trie.insert("warrior").unwrap();
        trie.insert("wall").unwrap();

        assert!(trie.contains("war").unwrap());
        assert!(trie.contains("warrior").unwrap());
        assert!(trie.contains("wall").unwrap());
        assert!(!trie.contains("word").unwrap());
        assert!(!trie.contains("wa").unwrap());
    }

    #[test]
    fn prefixes_cover_partial_words() {
        let mut trie = english_trie();
        trie.insert("warrior").unwrap();

        assert!(trie.is_prefix("wa").unwrap());
        assert!(trie.is_prefix("warrior").unwrap());
        assert!(!trie.is_prefix("wo").unwrap());
        assert!(!trie.contains("wa").unwrap());
    }

    #[test]
    fn size_counts_distinct_words_only() {
        let mut trie = english_trie();
        trie.insert("war").unwrap();
        trie.insert("war").unwrap();
        assert_eq!(trie.size(), 1);
        trie.insert("warrior").unwrap();
        trie.insert("wall").unwrap();
        assert_eq!(trie.size(), 3);
    }

    #[test]
    fn foreign_symbol_is_rejected_without_side_effects() {
        let mut trie = english_trie();
        trie.insert("war").unwrap();

        let err = trie.insert("wa*").unwrap_err();
        assert!(matches!(err, Error::InvalidSymbol { symbol: '*' }));
        assert_eq!(trie.size(), 1);
        assert!(trie.contains("wa*").is_err());
        assert!(trie.is_prefix("w*").is_err());
    }

    #[test]
    fn clear_empties_the_trie() {
        let mut trie = english_trie();
        trie.insert("warrior").unwrap();
        trie.insert("wall").unwrap();
        trie.clear();

        assert!(trie.is_empty());
        assert_eq!(trie.size(), 0);
        assert!(!trie.contains("wall").unwrap());
    }

    #[test]
    fn empty_word_is_a_noop() {
        let mut trie = english_trie();
        trie.insert("").unwrap();
        assert!(trie.is_empty());
        assert!(!trie.contains("").unwrap());
        assert!(trie.is_prefix("").unwrap());
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut first = english_trie();
        first.insert("ab").unwrap();
        first.insert("ac").unwrap();

        let mut second = english_trie();
        second.insert("ac").unwrap();
        second.insert("ab").unwrap();

        // Same word set, different sibling chains.
        assert_ne!(first, second);
        assert!(second.contains("ab").unwrap());
        assert!(second.contains("ac").unwrap());
    }

    #[test]
    fn to_dawg_leaves_the_trie_usable() {
        let mut trie = english_trie();
        trie.insert("bar").unwrap();
        trie.insert("baton").unwrap();

        let dawg = trie.to_dawg();
        trie.insert("balloon").unwrap();

        assert!(trie.contains("balloon").unwrap());
        assert!(!dawg.contains("balloon").unwrap());
        assert_eq!(dawg.size(), 2);
    }
}
