//! Byte encodings of dense tries and DAWGs.
//!
//! The plain trie form is a pre-order symbol/marker sequence: each node emits
//! its symbol, an optional `'*'` end-of-word marker and its children between
//! `'('` and `')'`. A child's leading symbol doubles as its slot tag, so
//! absent slots cost nothing on the wire. Markers are in-band: an alphabet
//! containing `'*'`, `'('` or `')'` cannot use this form.
//!
//! The DAWG form assigns a dense index to each distinct node on first visit
//! and stores parallel arrays plus a per-node slot list, so shared subtrees
//! are written once and sharing survives a round trip.

use ahash::AHashMap;
use snafu::{ensure, OptionExt};
use std::iter::Peekable;
use std::str::Chars;

use super::node::DenseNode;
use super::trie::DenseTrie;
use crate::alphabet::Alphabet;
use crate::arena::{Arena, NodeId};
use crate::error::{self, FormatError};
use crate::wire::{Reader, Writer};

type Result<T> = std::result::Result<T, FormatError>;

const EOW_MARKER: char = '*';
const GROUP_OPEN: char = '(';
const GROUP_CLOSE: char = ')';

pub(super) fn encode_trie(trie: &DenseTrie) -> Vec<u8> {
    let mut tree = String::new();
    encode_node(&trie.arena, NodeId::ROOT, &mut tree);

    let mut writer = Writer::new();
    writer.write_u32(trie.word_count as u32);
    writer.write_str(&trie.alphabet.symbols().collect::<String>());
    writer.write_str(&tree);
    writer.into_bytes()
}

fn encode_node(arena: &Arena<DenseNode>, node: NodeId, out: &mut String) {
    let node = arena.get(node);
    out.push(node.symbol());
    if node.is_end_of_word() {
        out.push(EOW_MARKER);
    }
    out.push(GROUP_OPEN);
    for (_, child) in node.children() {
        encode_node(arena, child, out);
    }
    out.push(GROUP_CLOSE);
}

pub(super) fn decode_trie(bytes: &[u8]) -> Result<DenseTrie> {
    let mut reader = Reader::new(bytes);
    let word_count = reader.read_u32()?;
    let alphabet = Alphabet::new(reader.read_str()?);
    let tree = reader.read_str()?;
    reader.finish()?;

    let mut arena = Arena::new();
    let mut chars = tree.chars().peekable();
    parse_node(&mut chars, &mut arena, &alphabet)?;
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

    Ok(DenseTrie {
        alphabet,
        arena,
        word_count: word_count as usize,
    })
}

fn parse_node(
    chars: &mut Peekable<Chars>,
    arena: &mut Arena<DenseNode>,
    alphabet: &Alphabet,
) -> Result<NodeId> {
    let symbol = chars.next().context(error::TruncatedTree)?;
    ensure!(
        symbol != GROUP_OPEN && symbol != GROUP_CLOSE && symbol != EOW_MARKER,
        error::UnexpectedMarker { found: symbol }
    );
    let eow = chars.peek() == Some(&EOW_MARKER);
    if eow {
        chars.next();
    }
    let node = arena.push(DenseNode::new(symbol, eow, alphabet.len()));

    match chars.next() {
        Some(GROUP_OPEN) => {}
        Some(found) => return error::UnexpectedMarker { found }.fail(),
        None => return error::TruncatedTree.fail(),
    }
    let mut last_slot: Option<usize> = None;
    loop {
        let lead = *chars.peek().context(error::TruncatedTree)?;
        if lead == GROUP_CLOSE {
            chars.next();
            break;
        }
        // The child's own symbol tags its slot.
        let slot = alphabet
            .index_of(lead)
            .context(error::ForeignSymbol { symbol: lead })?;
        ensure!(
            last_slot.map_or(true, |previous| slot > previous),
            error::SlotOrder { slot: slot as u16 }
        );
        last_slot = Some(slot);
        let child = parse_node(chars, arena, alphabet)?;
        arena.get_mut(node).set_child(slot, child);
    }
    Ok(node)
}

pub(super) fn encode_dawg(trie: &DenseTrie) -> Vec<u8> {
    let mut table = DawgTable::default();
    let mut indexes = AHashMap::new();
    assign(&trie.arena, &mut indexes, &mut table, NodeId::ROOT);

    let mut writer = Writer::new();
    writer.write_u32(trie.word_count as u32);
    writer.write_u32(table.eows.len() as u32);
    writer.write_str(&table.symbols);
    writer.write_bits(&table.eows);
    for children in &table.children {
        writer.write_u16(children.len() as u16);
        for &(slot, index) in children {
            writer.write_u16(slot);
            writer.write_u32(index);
        }
    }
    writer.into_bytes()
}

#[derive(Default)]
struct DawgTable {
    symbols: String,
    eows: Vec<bool>,
    children: Vec<Vec<(u16, u32)>>,
}

/// Assigns a dense index to `node` on first visit and returns it; a node
/// seen before only returns its index, so shared subtrees are emitted once.
fn assign(
    arena: &Arena<DenseNode>,
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
    table.children.push(Vec::new());

    let children: Vec<(usize, NodeId)> = current.children().collect();
    for (slot, child) in children {
        let child_index = assign(arena, indexes, table, child);
        table.children[index as usize].push((slot as u16, child_index));
    }
    index
}

pub(super) fn decode_dawg(alphabet: &Alphabet, bytes: &[u8]) -> Result<DenseTrie> {
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
        arena.push(DenseNode::new(symbols[i], eows[i], alphabet.len()));
    }
    for i in 0..distinct as usize {
        let child_count = reader.read_u16()?;
        let mut last_slot: Option<u16> = None;
        for _ in 0..child_count {
            let slot = reader.read_u16()?;
            ensure!(
                (slot as usize) < alphabet.len(),
                error::SlotOutOfRange {
                    slot,
                    len: alphabet.len(),
                }
            );
            ensure!(
                last_slot.map_or(true, |previous| slot > previous),
                error::SlotOrder { slot }
            );
            last_slot = Some(slot);
            let index = reader.read_u32()?;
            // Index 0 is the root, which is a child to none.
            ensure!(
                index >= 1 && index < distinct,
                error::DanglingIndex {
                    index,
                    count: distinct,
                }
            );
            arena
                .get_mut(NodeId::new(i))
                .set_child(slot as usize, NodeId::new(index as usize));
        }
    }
    reader.finish()?;

    Ok(DenseTrie {
        alphabet: alphabet.clone(),
        arena,
        word_count: word_count as usize,
    })
}
