//! Prefix-code generation from a Huffman tree.

use std::collections::BTreeMap;
use std::fmt;

use crate::bitio::BitWriter;
use crate::error::{HuffmanError, Result};
use crate::tree::{HuffmanNode, HuffmanTree};

/// A variable-length bit string, most significant (first emitted) bit first.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Code {
    bits: Vec<bool>,
}

impl Code {
    /// The one-bit code `0`.
    pub fn zero() -> Self {
        Code { bits: vec![false] }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// True if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        other.bits.starts_with(&self.bits)
    }

    /// Append this code to a bit writer, at most 64 bits per write.
    pub fn write_to(&self, writer: &mut BitWriter) -> Result<()> {
        for chunk in self.bits.chunks(64) {
            let value = chunk.iter().fold(0u64, |acc, &bit| (acc << 1) | bit as u64);
            writer.write_bits(value, chunk.len())?;
        }
        Ok(())
    }

    fn child(&self, bit: bool) -> Code {
        let mut bits = Vec::with_capacity(self.bits.len() + 1);
        bits.extend_from_slice(&self.bits);
        bits.push(bit);
        Code { bits }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Symbol to code mapping. The set of codes is prefix-free.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixCodeTable {
    codes: BTreeMap<char, Code>,
}

impl PrefixCodeTable {
    /// Derive codes by depth-first traversal: `0` going left, `1` going right.
    ///
    /// A single-leaf tree has no edges, so its only symbol gets the code `0`.
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut codes = BTreeMap::new();

        // Depth is bounded by the alphabet size, so an explicit stack is plenty
        let mut stack = vec![(tree.root(), Code::default())];
        while let Some((id, code)) = stack.pop() {
            match tree.node(id) {
                HuffmanNode::Leaf { symbol, .. } => {
                    let code = if code.is_empty() { Code::zero() } else { code };
                    codes.insert(*symbol, code);
                }
                HuffmanNode::Internal { left, right, .. } => {
                    stack.push((*right, code.child(true)));
                    stack.push((*left, code.child(false)));
                }
            }
        }

        Self { codes }
    }

    pub fn get(&self, symbol: char) -> Option<&Code> {
        self.codes.get(&symbol)
    }

    /// Look up `symbol`, failing if it has no code.
    pub fn code(&self, symbol: char) -> Result<&Code> {
        self.codes
            .get(&symbol)
            .ok_or_else(|| HuffmanError::SymbolNotInTable { symbol }.into())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// `(symbol, code)` pairs in ascending code-point order.
    pub fn iter(&self) -> impl Iterator<Item = (char, &Code)> {
        self.codes.iter().map(|(&symbol, code)| (symbol, code))
    }

    /// Check that no code is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let mut sorted: Vec<&Code> = self.codes.values().collect();
        // After a lexicographic sort any prefix sits directly before a code it prefixes
        sorted.sort();
        sorted.windows(2).all(|w| !w[0].is_prefix_of(w[1]))
    }

    /// Encode `text` into `writer`, returning the number of symbols written.
    ///
    /// # Errors
    /// `HuffmanError::SymbolNotInTable` for a symbol without a code.
    pub fn encode_into(&self, text: &str, writer: &mut BitWriter) -> Result<u64> {
        let mut symbols = 0u64;
        for symbol in text.chars() {
            self.code(symbol)?.write_to(writer)?;
            symbols += 1;
        }
        Ok(symbols)
    }

    /// Number of payload bits needed to encode a text with these frequencies.
    pub fn encoded_bit_len(&self, frequencies: impl IntoIterator<Item = (char, u64)>) -> Result<u64> {
        frequencies.into_iter().try_fold(0u64, |acc, (symbol, count)| {
            Ok(acc + count * self.code(symbol)?.len() as u64)
        })
    }
}
