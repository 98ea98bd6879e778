//! Deterministic Huffman tree construction and tree-walk decoding.
//!
//! Nodes live in an arena (`Vec<HuffmanNode>`) and refer to their children
//! by index, so every node has exactly one owner and the structure cannot
//! contain cycles.
//!
//! # Ordering
//!
//! The priority queue pops the node with the smallest
//! `(frequency, kind, key)` first:
//! - leaves (`kind = 0`) are keyed by symbol code point
//! - internal nodes (`kind = 1`) are keyed by creation sequence number
//!
//! A leaf therefore always wins a tie against an internal node of equal
//! frequency. The first node popped becomes the left child. Encoder and
//! decoder both rebuild the tree from the same frequency table, so this
//! order is what makes their codes agree.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::bitio::BitReader;
use crate::error::{Error, HuffmanError, Result};
use crate::frequency::FrequencyTable;

/// Index of a node in the tree's arena.
pub type NodeId = usize;

/// A node in the Huffman tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffmanNode {
    Leaf {
        symbol: char,
        freq: u64,
    },
    Internal {
        freq: u64,
        /// Creation order, starting from 0
        seq: u64,
        left: NodeId,
        right: NodeId,
    },
}

impl HuffmanNode {
    pub fn freq(&self) -> u64 {
        match self {
            HuffmanNode::Leaf { freq, .. } | HuffmanNode::Internal { freq, .. } => *freq,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffmanNode::Leaf { .. })
    }
}

/// Secondary ordering key. The derived `Ord` places every `Leaf` before
/// every `Internal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TieBreak {
    Leaf(u32),
    Internal(u64),
}

/// A node waiting in the priority queue.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    freq: u64,
    tie_break: TieBreak,
    node: NodeId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap (a max-heap) pops the smallest key first
        other
            .freq
            .cmp(&self.freq)
            .then_with(|| other.tie_break.cmp(&self.tie_break))
    }
}

/// A strict binary prefix-code tree.
///
/// # Invariants
/// - every `Internal` node has exactly two children, both with lower ids
/// - a table with one symbol yields a single `Leaf` root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<HuffmanNode>,
    root: NodeId,
}

impl HuffmanTree {
    /// Build the tree for `table`.
    ///
    /// # Errors
    /// `HuffmanError::EmptyInput` if the table has no symbols.
    pub fn build(table: &FrequencyTable) -> Result<Self> {
        if table.is_empty() {
            return Err(HuffmanError::EmptyInput.into());
        }

        let mut nodes = Vec::with_capacity(2 * table.len() - 1);
        let mut queue = BinaryHeap::with_capacity(table.len());

        for (symbol, freq) in table.iter() {
            queue.push(QueueEntry {
                freq,
                tie_break: TieBreak::Leaf(symbol as u32),
                node: nodes.len(),
            });
            nodes.push(HuffmanNode::Leaf { symbol, freq });
        }

        let mut seq = 0u64;
        let root = loop {
            let Some(left) = queue.pop() else {
                return Err(HuffmanError::EmptyInput.into());
            };
            let Some(right) = queue.pop() else {
                break left.node;
            };

            let freq = left.freq + right.freq;
            queue.push(QueueEntry {
                freq,
                tie_break: TieBreak::Internal(seq),
                node: nodes.len(),
            });
            nodes.push(HuffmanNode::Internal {
                freq,
                seq,
                left: left.node,
                right: right.node,
            });
            seq += 1;
        };

        Ok(Self { nodes, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &HuffmanNode {
        &self.nodes[id]
    }

    /// Number of leaves, i.e. distinct symbols.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Length of the longest root-to-leaf path (0 for a single leaf).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 0)];
        while let Some((id, depth)) = stack.pop() {
            match self.nodes[id] {
                HuffmanNode::Leaf { .. } => max_depth = max_depth.max(depth),
                HuffmanNode::Internal { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Walk a logical bit sequence against the tree and append the decoded
    /// symbols to `out`.
    ///
    /// Descends left on 0 and right on 1, emitting a symbol and restarting at
    /// the root on every leaf. For a single-leaf tree each `0` is one symbol.
    ///
    /// Returns the number of symbols decoded.
    ///
    /// # Errors
    /// - `HuffmanError::InvalidBit` for an element other than 0 or 1
    /// - `HuffmanError::InvalidCode` for a `1` in a single-leaf tree
    /// - `HuffmanError::TruncatedPayload` if the sequence ends mid-code
    pub fn decode_into(&self, bits: &[u8], out: &mut String) -> Result<u64> {
        let bits = bits.iter().enumerate().map(|(position, &value)| match value {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(Error::from(HuffmanError::InvalidBit { position, value })),
        });
        self.walk(bits, out)
    }

    /// Like [`decode_into`](Self::decode_into), reading packed payload bits
    /// directly. The reader stops at its bit count, so padding is never walked.
    pub fn decode_packed(&self, reader: BitReader<'_>, out: &mut String) -> Result<u64> {
        self.walk(reader.map(Ok), out)
    }

    fn walk<I>(&self, bits: I, out: &mut String) -> Result<u64>
    where
        I: Iterator<Item = Result<bool>>,
    {
        let mut decoded = 0u64;

        if let HuffmanNode::Leaf { symbol, .. } = self.nodes[self.root] {
            for (position, bit) in bits.enumerate() {
                if bit? {
                    return Err(HuffmanError::InvalidCode { position }.into());
                }
                out.push(symbol);
                decoded += 1;
            }
            return Ok(decoded);
        }

        let mut current = self.root;
        let mut code_start = 0;
        let mut walked = 0;
        for (position, bit) in bits.enumerate() {
            // The walk restarts at the (internal) root after every leaf
            let HuffmanNode::Internal { left, right, .. } = self.nodes[current] else {
                return Err(HuffmanError::InvalidCode { position }.into());
            };
            current = if bit? { right } else { left };
            walked = position + 1;

            if let HuffmanNode::Leaf { symbol, .. } = self.nodes[current] {
                out.push(symbol);
                decoded += 1;
                current = self.root;
                code_start = walked;
            }
        }

        if current != self.root {
            return Err(HuffmanError::TruncatedPayload {
                position: code_start,
                pending: walked - code_start,
            }
            .into());
        }

        Ok(decoded)
    }

    /// Decode a complete logical bit sequence into text.
    pub fn decode_bits(&self, bits: &[u8]) -> Result<String> {
        let mut out = String::new();
        self.decode_into(bits, &mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn children(tree: &HuffmanTree, id: NodeId) -> (NodeId, NodeId) {
        match tree.node(id) {
            HuffmanNode::Internal { left, right, .. } => (*left, *right),
            leaf => panic!("expected internal node, got {leaf:?}"),
        }
    }

    fn symbol(tree: &HuffmanTree, id: NodeId) -> char {
        match tree.node(id) {
            HuffmanNode::Leaf { symbol, .. } => *symbol,
            internal => panic!("expected leaf, got {internal:?}"),
        }
    }

    #[test]
    fn test_empty_table_rejected() {
        let result = HuffmanTree::build(&FrequencyTable::default());
        assert!(matches!(result, Err(Error::Huffman(HuffmanError::EmptyInput))));
    }

    #[test]
    fn test_single_symbol_is_leaf_root() {
        let tree = HuffmanTree::build(&FrequencyTable::from_text("aaaa")).unwrap();
        assert_eq!(
            tree.node(tree.root()),
            &HuffmanNode::Leaf { symbol: 'a', freq: 4 }
        );
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_aabbbcc_shape() {
        // a:2 and c:2 merge first (a wins the tie by code point), then b:3
        // pairs with that internal node of weight 4.
        let tree = HuffmanTree::build(&FrequencyTable::from_text("aabbbcc")).unwrap();
        assert_eq!(tree.node(tree.root()).freq(), 7);

        let (left, right) = children(&tree, tree.root());
        assert_eq!(symbol(&tree, left), 'b');

        let (rl, rr) = children(&tree, right);
        assert_eq!(symbol(&tree, rl), 'a');
        assert_eq!(symbol(&tree, rr), 'c');
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_leaf_beats_internal_on_equal_frequency() {
        // a:1 + b:1 -> internal(2); c:2 ties with it and must be popped first
        let tree = HuffmanTree::build(&FrequencyTable::from_text("abcc")).unwrap();
        let (left, right) = children(&tree, tree.root());
        assert_eq!(symbol(&tree, left), 'c');
        let (rl, rr) = children(&tree, right);
        assert_eq!(symbol(&tree, rl), 'a');
        assert_eq!(symbol(&tree, rr), 'b');
    }

    #[test]
    fn test_internal_ties_break_by_sequence() {
        // Four symbols of weight 1 make two internal nodes of weight 2;
        // the older one (a,b) must end up on the left.
        let tree = HuffmanTree::build(&FrequencyTable::from_text("dcba")).unwrap();
        let (left, right) = children(&tree, tree.root());
        let (ll, lr) = children(&tree, left);
        let (rl, rr) = children(&tree, right);
        assert_eq!(
            [ll, lr, rl, rr].map(|id| symbol(&tree, id)),
            ['a', 'b', 'c', 'd']
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let table = FrequencyTable::from_text("the quick brown fox jumps over the lazy dog");
        let first = HuffmanTree::build(&table).unwrap();
        for _ in 0..10 {
            assert_eq!(HuffmanTree::build(&table).unwrap(), first);
        }
    }

    #[test]
    fn test_decode_bits() {
        let tree = HuffmanTree::build(&FrequencyTable::from_text("aabbbcc")).unwrap();
        // b=0, a=10, c=11
        let bits = [1, 0, 1, 0, 0, 0, 0, 1, 1, 1, 1];
        assert_eq!(tree.decode_bits(&bits).unwrap(), "aabbbcc");
    }

    #[test]
    fn test_decode_truncated() {
        let tree = HuffmanTree::build(&FrequencyTable::from_text("aabbbcc")).unwrap();
        let result = tree.decode_bits(&[1, 0, 0, 1]);
        assert!(matches!(
            result,
            Err(Error::Huffman(HuffmanError::TruncatedPayload { position: 3, pending: 1 }))
        ));
    }

    #[test]
    fn test_decode_invalid_bit() {
        let tree = HuffmanTree::build(&FrequencyTable::from_text("aabbbcc")).unwrap();
        let result = tree.decode_bits(&[1, 0, 7]);
        assert!(matches!(
            result,
            Err(Error::Huffman(HuffmanError::InvalidBit { position: 2, value: 7 }))
        ));
    }

    #[test]
    fn test_decode_single_leaf() {
        let tree = HuffmanTree::build(&FrequencyTable::from_text("x")).unwrap();
        assert_eq!(tree.decode_bits(&[0, 0, 0]).unwrap(), "xxx");
        assert!(matches!(
            tree.decode_bits(&[0, 1]),
            Err(Error::Huffman(HuffmanError::InvalidCode { position: 1 }))
        ));
    }

    #[test]
    fn test_decode_packed() {
        let tree = HuffmanTree::build(&FrequencyTable::from_text("aabbbcc")).unwrap();
        let payload = [0xA1, 0xE0];

        let mut out = String::new();
        let reader = BitReader::with_bit_len(&payload, 11).unwrap();
        assert_eq!(tree.decode_packed(reader, &mut out).unwrap(), 7);
        assert_eq!(out, "aabbbcc");

        // One bit short: the final 'c' is cut off, padding is not consulted
        let reader = BitReader::with_bit_len(&payload, 10).unwrap();
        assert!(matches!(
            tree.decode_packed(reader, &mut String::new()),
            Err(Error::Huffman(HuffmanError::TruncatedPayload { position: 9, pending: 1 }))
        ));
    }

    #[test]
    fn test_decode_packed_single_leaf() {
        let tree = HuffmanTree::build(&FrequencyTable::from_text("x")).unwrap();

        let mut out = String::new();
        let reader = BitReader::with_bit_len(&[0x00], 5).unwrap();
        assert_eq!(tree.decode_packed(reader, &mut out).unwrap(), 5);
        assert_eq!(out, "xxxxx");

        let reader = BitReader::with_bit_len(&[0b0010_0000], 3).unwrap();
        assert!(matches!(
            tree.decode_packed(reader, &mut String::new()),
            Err(Error::Huffman(HuffmanError::InvalidCode { position: 2 }))
        ));
    }
}
