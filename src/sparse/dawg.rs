use std::path::Path;

use super::behaviour::{self, SparseBehaviour};
use super::codec;
use super::trie::SparseTrie;
use crate::alphabet::Alphabet;
use crate::arena::NodeId;
use crate::error::{self, Result};
use crate::graph::WordGraph;
use crate::optimizer::Optimizer;
use crate::storage;
use snafu::ResultExt;

/// Read-only, minimized view of a [`SparseTrie`].
///
/// After minimization a node may be shared by several parents, so the
/// wrapped trie must never be mutated again; only the query surface is
/// exposed. Sparse equality compares sibling chains too, so only subtries
/// whose chains match insertion order for insertion order get merged —
/// duplicates built in a different order are kept.
#[derive(Debug, Clone)]
pub struct SparseDawg {
    trie: SparseTrie,
}

impl SparseDawg {
    /// Minimizes `trie` in place and wraps it.
    pub(crate) fn minimize(mut trie: SparseTrie) -> Self {
        let flattening = behaviour::flatten(&trie.arena, NodeId::ROOT);
        let mut strategy = SparseBehaviour::new(&mut trie.arena);
        Optimizer::new(&mut strategy, flattening).eliminate_duplicates();
        SparseDawg { trie }
    }

    /// Builds a trie from `words` and minimizes it.
    pub fn from_words<I, W>(alphabet: Alphabet, words: I) -> Result<Self>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let mut trie = SparseTrie::new(alphabet);
        for word in words {
            trie.insert(word.as_ref())?;
        }
        Ok(SparseDawg::minimize(trie))
    }

    pub fn alphabet(&self) -> &Alphabet {
        self.trie.alphabet()
    }

    /// Number of distinct nodes reachable from the root, root included.
    pub fn node_count(&self) -> usize {
        self.trie.node_count()
    }

    /// Encodes the graph into the identity-aware byte form: shared subtrees
    /// are written once and restored shared.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode_dawg(&self.trie)
    }

    /// Decodes a payload produced by [`to_bytes`](SparseDawg::to_bytes).
    ///
    /// The payload does not carry the alphabet, so the caller supplies it.
    pub fn from_bytes(alphabet: &Alphabet, bytes: &[u8]) -> Result<Self> {
        let trie = codec::decode_dawg(alphabet, bytes).context(error::Payload)?;
        Ok(SparseDawg { trie })
    }

    /// Writes the identity-aware byte form to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        storage::write_file(path.as_ref(), &self.to_bytes())
    }

    /// Reads a graph previously written with [`save`](SparseDawg::save).
    pub fn load(alphabet: &Alphabet, path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(alphabet, &storage::read_file(path.as_ref())?)
    }
}

impl WordGraph for SparseDawg {
    fn contains(&self, word: &str) -> Result<bool> {
        self.trie.contains(word)
    }

    fn is_prefix(&self, prefix: &str) -> Result<bool> {
        self.trie.is_prefix(prefix)
    }

    fn size(&self) -> usize {
        self.trie.size()
    }
}
