//! Error types for the huffc core.
//!
//! All operations return structured errors rather than panicking. The CLI is
//! responsible for turning them into exit codes and messages; nothing in the
//! core retries or swallows a failure.

use thiserror::Error;

/// Top-level error type for all operations in the system.
///
/// Each variant corresponds to a specific failure domain:
/// - Bit I/O: reading/writing bits from/to byte buffers
/// - Huffman: tree construction, encode or decode failures
/// - Header: the frequency-table header and its `HEADER_END` delimiter
/// - Text: input that does not decode to Unicode symbols
/// - I/O: file system operations
#[derive(Debug, Error)]
pub enum Error {
    /// Bit I/O operation failed (e.g., reading past end of buffer)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Huffman codec error (e.g., empty input, truncated payload)
    #[error("huffman codec error: {0}")]
    Huffman(#[from] HuffmanError),

    /// Header error (e.g., missing delimiter, malformed entries)
    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    /// Input bytes are not valid UTF-8, so they cannot be split into symbols
    #[error("input is not valid UTF-8 text: {0}")]
    InvalidText(#[from] std::str::Utf8Error),

    /// A freshly encoded artifact did not decode back to its input
    #[error("verification failed: input crc32 {expected:#010x}, decoded crc32 {actual:#010x}")]
    VerificationFailed { expected: u32, actual: u32 },

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bit-level I/O errors.
#[derive(Debug, Error)]
pub enum BitIoError {
    /// Attempted to read past the end of the buffer
    #[error("unexpected end of bit stream")]
    UnexpectedEof,

    /// Invalid bit count (e.g., more than 64 bits in one call)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),
}

/// Huffman codec errors.
#[derive(Debug, Error)]
pub enum HuffmanError {
    /// No symbols at all (cannot build a tree with zero leaves)
    #[error("empty input: nothing to compress")]
    EmptyInput,

    /// An input symbol has no code in the prefix-code table
    #[error("symbol {symbol:?} (U+{code_point:04X}) not found in code table", code_point = *symbol as u32)]
    SymbolNotInTable { symbol: char },

    /// A logical bit sequence contained a value other than 0 or 1
    #[error("invalid bit value {value} at position {position}")]
    InvalidBit { position: usize, value: u8 },

    /// The bit sequence ended in the middle of a code
    #[error("payload truncated: {pending} trailing bits at position {position} do not complete a code")]
    TruncatedPayload { position: usize, pending: usize },

    /// A bit that leads nowhere in the tree (only possible for a single-leaf tree)
    #[error("invalid huffman code at bit position {position}")]
    InvalidCode { position: usize },

    /// Decoded symbol count doesn't match the frequency table
    #[error("decoded length mismatch: expected {expected} symbols, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },
}

/// Header (frequency table + delimiter + bit count) errors.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The backward scan found no acceptable `HEADER_END` delimiter
    #[error("HEADER_END delimiter not found: corrupt or foreign file")]
    DelimiterNotFound,

    /// A frequency field holds a negative value
    #[error("negative {field} in header: {value}")]
    NegativeField { field: &'static str, value: i64 },

    /// A symbol field is not a Unicode scalar value
    #[error("invalid symbol code point {code_point:#x} in header")]
    InvalidSymbol { code_point: i32 },

    /// The same symbol appears twice in the frequency table
    #[error("duplicate symbol {symbol:?} in header")]
    DuplicateSymbol { symbol: char },

    /// Recorded bit count and payload size disagree
    #[error("bit count {bit_count} does not fit a payload of {payload_bytes} bytes")]
    PayloadLengthMismatch { bit_count: u64, payload_bytes: usize },

    /// A value does not fit the header's 32-bit fields
    #[error("{field} {value} exceeds the header's int32 range")]
    FieldOverflow { field: &'static str, value: u64 },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
