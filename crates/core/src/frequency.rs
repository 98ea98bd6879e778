//! Symbol frequency analysis.
//!
//! Input is decoded as UTF-8 and counted per Unicode scalar value, so a
//! multi-byte character is one symbol on both the encode and decode side.

use std::collections::BTreeMap;

use crate::error::Result;

/// Occurrence count per symbol, ordered by ascending code point.
///
/// Built once per input and not mutated afterwards. The sum of all counts
/// equals the number of symbols analyzed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<char, u64>,
}

impl FrequencyTable {
    /// Count every symbol of `text`.
    pub fn from_text(text: &str) -> Self {
        let mut counts = BTreeMap::new();
        for symbol in text.chars() {
            *counts.entry(symbol).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Decode `bytes` as UTF-8 and count its symbols.
    ///
    /// # Errors
    /// `Error::InvalidText` if `bytes` is not valid UTF-8.
    pub fn analyze(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn get(&self, symbol: char) -> Option<u64> {
        self.counts.get(&symbol).copied()
    }

    /// Total number of symbols counted.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// `(symbol, count)` pairs in ascending code-point order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (char, u64)> + '_ {
        self.counts.iter().map(|(&symbol, &count)| (symbol, count))
    }
}

impl FromIterator<(char, u64)> for FrequencyTable {
    /// Later pairs for the same symbol replace earlier ones; callers that must
    /// reject duplicates check before collecting.
    fn from_iter<I: IntoIterator<Item = (char, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_counts() {
        let table = FrequencyTable::from_text("aabbbcc");
        assert_eq!(table.len(), 3);
        assert_eq!(table.get('a'), Some(2));
        assert_eq!(table.get('b'), Some(3));
        assert_eq!(table.get('c'), Some(2));
        assert_eq!(table.get('d'), None);
        assert_eq!(table.total(), 7);
    }

    #[test]
    fn test_empty_input() {
        let table = FrequencyTable::analyze(b"").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
    }

    #[test]
    fn test_multibyte_symbols_count_once() {
        // "é" is two bytes, "€" three, "𝄞" four
        let text = "é€𝄞é";
        let table = FrequencyTable::analyze(text.as_bytes()).unwrap();
        assert_eq!(table.total(), 4);
        assert_eq!(table.get('é'), Some(2));
        assert_eq!(table.get('€'), Some(1));
        assert_eq!(table.get('𝄞'), Some(1));
    }

    #[test]
    fn test_iter_ascending_code_points() {
        let table = FrequencyTable::from_text("zéa a");
        let symbols: Vec<char> = table.iter().map(|(s, _)| s).collect();
        assert_eq!(symbols, vec![' ', 'a', 'z', 'é']);
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let result = FrequencyTable::analyze(&[b'a', 0xFF, b'b']);
        assert!(matches!(result, Err(Error::InvalidText(_))));
    }
}
