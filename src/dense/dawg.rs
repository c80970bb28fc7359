use std::path::Path;

use super::behaviour::{self, DenseBehaviour};
use super::codec;
use super::trie::DenseTrie;
use crate::alphabet::Alphabet;
use crate::arena::NodeId;
use crate::error::{self, Result};
use crate::graph::WordGraph;
use crate::optimizer::Optimizer;
use crate::storage;
use snafu::ResultExt;

/// Read-only, minimized view of a [`DenseTrie`].
///
/// After minimization a node may be shared by several parents, so the
/// wrapped trie must never be mutated again; only the query surface is
/// exposed. Because dense subtree equality is order-independent, every
/// maximal class of structurally identical subtrees collapses to a single
/// node.
#[derive(Debug, Clone)]
pub struct DenseDawg {
    trie: DenseTrie,
}

impl DenseDawg {
    /// Minimizes `trie` in place and wraps it.
    pub(crate) fn minimize(mut trie: DenseTrie) -> Self {
        let flattening = behaviour::flatten(&trie.arena, NodeId::ROOT);
        let mut strategy = DenseBehaviour::new(&mut trie.arena);
        Optimizer::new(&mut strategy, flattening).eliminate_duplicates();
        DenseDawg { trie }
    }

    /// Builds a trie from `words` and minimizes it.
    pub fn from_words<I, W>(alphabet: Alphabet, words: I) -> Result<Self>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let mut trie = DenseTrie::new(alphabet);
        for word in words {
            trie.insert(word.as_ref())?;
        }
        Ok(DenseDawg::minimize(trie))
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

    /// Decodes a payload produced by [`to_bytes`](DenseDawg::to_bytes).
    ///
    /// The payload does not carry the alphabet, so the caller supplies it.
    pub fn from_bytes(alphabet: &Alphabet, bytes: &[u8]) -> Result<Self> {
        let trie = codec::decode_dawg(alphabet, bytes).context(error::Payload)?;
        Ok(DenseDawg { trie })
    }

    /// Writes the identity-aware byte form to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        storage::write_file(path.as_ref(), &self.to_bytes())
    }

    /// Reads a graph previously written with [`save`](DenseDawg::save).
    pub fn load(alphabet: &Alphabet, path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(alphabet, &storage::read_file(path.as_ref())?)
    }
}

impl WordGraph for DenseDawg {
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

#[cfg(test)]
mod tests {
    use super::*;

    const UA: &str = "абвгґдеєжзиіїйклмнопрстуфхцчшщьюя";
    const WORDS: [&str; 7] = ["бар", "барабан", "баран", "балон", "бал", "балка", "батон"];

    #[test]
    fn minimization_preserves_the_query_contract() {
        let mut trie = DenseTrie::new(Alphabet::new(UA));
        for word in WORDS {
            trie.insert(word).unwrap();
        }
        let dawg = trie.to_dawg();

        assert_eq!(dawg.size(), trie.size());
        for word in WORDS {
            assert!(dawg.contains(word).unwrap());
            for end in word.char_indices().map(|(i, _)| i).skip(1) {
                assert_eq!(
                    dawg.is_prefix(&word[..end]).unwrap(),
                    trie.is_prefix(&word[..end]).unwrap()
                );
            }
        }
        assert!(!dawg.contains("ба").unwrap());
        assert!(!dawg.is_prefix("бу").unwrap());
    }

    #[test]
    fn shared_suffixes_collapse() {
        let mut trie = DenseTrie::new(Alphabet::new("abltfon"));
        trie.insert("balon").unwrap();
        trie.insert("baton").unwrap();

        // root, b, a, l, t and one shared o-n tail.
        assert_eq!(trie.node_count(), 9);
        let dawg = trie.to_dawg();
        assert_eq!(dawg.node_count(), 7);
        assert!(dawg.contains("balon").unwrap());
        assert!(dawg.contains("baton").unwrap());
    }

    #[test]
    fn minimization_reduces_node_count_on_real_words() {
        let mut trie = DenseTrie::new(Alphabet::new(UA));
        for word in WORDS {
            trie.insert(word).unwrap();
        }
        let dawg = trie.to_dawg();
        assert!(dawg.node_count() < trie.node_count());
    }

    #[test]
    fn from_words_matches_manual_construction() {
        let dawg = DenseDawg::from_words(Alphabet::new("alortw"), ["troll", "wall"]).unwrap();
        assert_eq!(dawg.size(), 2);
        assert!(dawg.contains("troll").unwrap());
        assert!(dawg.contains("wall").unwrap());
        assert!(dawg.contains("walls").is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dawg = DenseDawg::from_words(Alphabet::new("alortw"), ["troll", "wall"]).unwrap();
        let path = std::env::temp_dir().join(format!("dense-dawg-{}.bin", std::process::id()));

        dawg.save(&path).unwrap();
        let restored = DenseDawg::load(dawg.alphabet(), &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.size(), 2);
        assert!(restored.contains("troll").unwrap());
    }
}
