//! Byte encodings of sparse tries and DAWGs.
//!
//! The plain trie form is a pre-order symbol/marker sequence: each node emits
//! its symbol, an optional `'*'` end-of-word marker, then its child chain and
//! its sibling chain, with `')'` standing for an absent node so the decoder
//! knows where each chain ends. Markers are in-band: an alphabet containing
//! `'*'` or `')'` cannot use this form.
//!
//! The DAWG form assigns a dense index to each distinct node on first visit
//! and stores four parallel arrays (symbols, end-of-word bits, child indexes,
//! sibling indexes, index 0 = no reference), so shared subtrees are written
//! once and sharing survives a round trip.

use ahash::AHashMap;
use snafu::{ensure, OptionExt};
use std::iter::Peekable;
use std::str::Chars;

use super::node::SparseNode;
use super::trie::SparseTrie;
use crate::alphabet::Alphabet;
use crate::arena::{Arena, NodeId};
use crate::error::{self, FormatError};
use crate::wire::{Reader, Writer};

type Result<T> = std::result::Result<T, FormatError>;

const EOW_MARKER: char = '*';
const END_MARKER: char = ')';

pub(super) fn encode_trie(trie: &SparseTrie) -> Vec<u8> {
    let mut tree = String::new();
    encode_node(&trie.arena, Some(NodeId::ROOT), &mut tree);

    let mut writer = Writer::new();
    writer.write_u32(trie.word_count as u32);
    writer.write_str(&trie.alphabet.symbols().collect::<String>());
    writer.write_str(&tree);
    writer.into_bytes()
}

fn encode_node(arena: &Arena<SparseNode>, node: Option<NodeId>, out: &mut String) {
    match node {
        None => out.push(END_MARKER),
        Some(id) => {
            let node = arena.get(id);
            out.push(node.symbol());
            if node.is_end_of_word() {
                out.push(EOW_MARKER);
            }
            encode_node(arena, node.child(), out);
            encode_node(arena, node.sibling(), out);
        }
    }
}

pub(super) fn decode_trie(bytes: &[u8]) -> Result<SparseTrie> {
    let mut reader = Reader::new(bytes);
    let word_count = reader.read_u32()?;
    let alphabet = Alphabet::new(reader.read_str()?);
    let tree = reader.read_str()?;
    reader.finish()?;

    let mut arena = Arena::new();
    let mut chars = tree.chars().peekable();
    let root = parse_node(&mut chars, &mut arena, &alphabet, true)?;
    ensure!(root.is_some(), error::EmptyGraph);
    let remaining = chars.count();
    ensure!(remaining == 0, error::TrailingData { remaining });

    let counted = arena.iter().filter(|node| node.is_end_of_word()).count() as u32;
    ensure!(
        counted == word_count,
        error::WordCountMismatch {
            stored: word_count,
            counted,
        }
    );

    Ok(SparseTrie {
        alphabet,
        arena,
        word_count: word_count as usize,
    })
}

fn parse_node(
    chars: &mut Peekable<Chars>,
    arena: &mut Arena<SparseNode>,
    alphabet: &Alphabet,
    root: bool,
) -> Result<Option<NodeId>> {
    let symbol = chars.next().context(error::TruncatedTree)?;
    if symbol == END_MARKER {
        return Ok(None);
    }
    ensure!(
        symbol != EOW_MARKER,
        error::UnexpectedMarker { found: symbol }
    );
    // The root carries its NUL placeholder, everything below must be spelled
    // in the alphabet.
    ensure!(
        root || alphabet.contains(symbol),
        error::ForeignSymbol { symbol }
    );
    let eow = chars.peek() == Some(&EOW_MARKER);
    if eow {
        chars.next();
    }

    let node = arena.push(SparseNode::new(symbol, eow));
    let child = parse_node(chars, arena, alphabet, false)?;
    arena.get_mut(node).set_child(child);
    let sibling = parse_node(chars, arena, alphabet, false)?;
    arena.get_mut(node).set_sibling(sibling);
    Ok(Some(node))
}

pub(super) fn encode_dawg(trie: &SparseTrie) -> Vec<u8> {
    let mut table = DawgTable::default();
    let mut indexes = AHashMap::new();
    assign(&trie.arena, &mut indexes, &mut table, NodeId::ROOT);

    let mut writer = Writer::new();
    writer.write_u32(trie.word_count as u32);
    writer.write_u32(table.eows.len() as u32);
    writer.write_str(&table.symbols);
    writer.write_bits(&table.eows);
    for &child in &table.children {
        writer.write_u32(child);
    }
    for &sibling in &table.siblings {
        writer.write_u32(sibling);
    }
    writer.into_bytes()
}

#[derive(Default)]
struct DawgTable {
    symbols: String,
    eows: Vec<bool>,
    children: Vec<u32>,
    siblings: Vec<u32>,
}

/// Assigns a dense index to `node` on first visit and returns it; a node
/// seen before only returns its index, so shared subtrees are emitted once.
fn assign(
    arena: &Arena<SparseNode>,
    indexes: &mut AHashMap<NodeId, u32>,
    table: &mut DawgTable,
    node: NodeId,
) -> u32 {
    if let Some(&index) = indexes.get(&node) {
        return index;
    }
    let index = indexes.len() as u32;
    indexes.insert(node, index);

    let current = arena.get(node);
    table.symbols.push(current.symbol());
    table.eows.push(current.is_end_of_word());
    table.children.push(0);
    table.siblings.push(0);

    if let Some(child) = current.child() {
        table.children[index as usize] = assign(arena, indexes, table, child);
    }
    if let Some(sibling) = current.sibling() {
        table.siblings[index as usize] = assign(arena, indexes, table, sibling);
    }
    index
}

pub(super) fn decode_dawg(alphabet: &Alphabet, bytes: &[u8]) -> Result<SparseTrie> {
    let mut reader = Reader::new(bytes);
    let word_count = reader.read_u32()?;
    let distinct = reader.read_u32()?;
    ensure!(distinct >= 1, error::EmptyGraph);

    let symbols: Vec<char> = reader.read_str()?.chars().collect();
    ensure!(
        symbols.len() == distinct as usize,
        error::SymbolCountMismatch {
            stored: distinct,
            counted: symbols.len() as u32,
        }
    );
    let eows = reader.read_bits(distinct as usize)?;

    let mut arena = Arena::new();
    for i in 0..distinct as usize {
        arena.push(SparseNode::new(symbols[i], eows[i]));
    }
    for i in 0..distinct as usize {
        let child = read_reference(&mut reader, distinct)?;
        arena.get_mut(NodeId::new(i)).set_child(child);
    }
    for i in 0..distinct as usize {
        let sibling = read_reference(&mut reader, distinct)?;
        arena.get_mut(NodeId::new(i)).set_sibling(sibling);
    }
    reader.finish()?;

    Ok(SparseTrie {
        alphabet: alphabet.clone(),
        arena,
        word_count: word_count as usize,
    })
}

/// Reads a node reference; 0 means none, anything else must resolve.
fn read_reference(reader: &mut Reader, count: u32) -> Result<Option<NodeId>> {
    let index = reader.read_u32()?;
    if index == 0 {
        return Ok(None);
    }
    ensure!(index < count, error::DanglingIndex { index, count });
    Ok(Some(NodeId::new(index as usize)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::graph::WordGraph;
    use crate::sparse::dawg::SparseDawg;

    const UA: &str = "абвгґдеєжзиіїйклмнопрстуфхцчшщьюя";
    const WORDS: [&str; 7] = ["бар", "барабан", "баран", "балон", "бал", "балка", "батон"];

    fn ua_trie() -> SparseTrie {
        let mut trie = SparseTrie::new(Alphabet::new(UA));
        for word in WORDS {
            trie.insert(word).unwrap();
        }
        trie
    }

    #[test]
    fn trie_round_trip_preserves_structure() {
        let trie = ua_trie();
        let restored = SparseTrie::from_bytes(&trie.to_bytes()).unwrap();

        assert_eq!(restored, trie);
        for word in WORDS {
            assert!(restored.contains(word).unwrap());
        }
    }

    #[test]
    fn dawg_round_trip_preserves_queries_and_sharing() {
        let trie = ua_trie();
        let dawg = trie.to_dawg();
        let restored = SparseDawg::from_bytes(trie.alphabet(), &dawg.to_bytes()).unwrap();

        assert_eq!(restored.size(), dawg.size());
        assert_eq!(restored.node_count(), dawg.node_count());
        for word in WORDS {
            assert!(restored.contains(word).unwrap());
        }
        assert!(!restored.contains("бара").unwrap());
    }

    #[test]
    fn truncated_tree_is_rejected() {
        let mut writer = Writer::new();
        writer.write_u32(0);
        writer.write_str("ab");
        writer.write_str("\0");
        let err = decode_trie(&writer.into_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::TruncatedTree));
    }

    #[test]
    fn foreign_tree_symbol_is_rejected() {
        let mut writer = Writer::new();
        writer.write_u32(1);
        writer.write_str("ab");
        writer.write_str("\0x*))))");
        let err = decode_trie(&writer.into_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::ForeignSymbol { symbol: 'x' }));
    }

    #[test]
    fn corrupted_word_count_is_rejected() {
        let mut bytes = ua_trie().to_bytes();
        bytes[0] = bytes[0].wrapping_add(1);
        let err = SparseTrie::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Payload {
                source: FormatError::WordCountMismatch { .. }
            }
        ));
    }

    #[test]
    fn dangling_dawg_reference_is_rejected() {
        let alphabet = Alphabet::new("ab");
        let mut writer = Writer::new();
        writer.write_u32(1);
        writer.write_u32(2);
        writer.write_str("\0a");
        writer.write_bits(&[false, true]);
        writer.write_u32(1); // root child -> node 1
        writer.write_u32(7); // node 1 child -> dangling
        writer.write_u32(0);
        writer.write_u32(0);
        let err = decode_dawg(&alphabet, &writer.into_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::DanglingIndex { index: 7, .. }));
    }
}
