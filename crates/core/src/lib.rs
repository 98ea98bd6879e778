//! huffc-core: lossless text compression with deterministic Huffman coding
//!
//! This library provides the core components of the `huffc` file compressor:
//! - Counts symbol (Unicode scalar value) frequencies
//! - Builds a Huffman tree with a fixed tie-break order
//! - Packs prefix codes MSB-first with an exact bit count
//! - Persists the frequency table in a `HEADER_END`-delimited header
//!
//! # Architecture
//!
//! - `bitio`: bit packing and unpacking
//! - `frequency`: symbol frequency analysis
//! - `tree`: tree construction and tree-walk decoding
//! - `codes`: prefix-code generation
//! - `header`: header format and backward delimiter scan
//! - `pipeline`: `compress` / `decompress` and their file variants
//! - `metrics`: observable run statistics
//!
//! # Example
//! ```
//! let encoded = huffc_core::compress("aabbbcc".as_bytes()).unwrap();
//! let decoded = huffc_core::decompress(&encoded).unwrap();
//! assert_eq!(decoded, b"aabbbcc");
//! ```
//!
//! # Design Principles
//!
//! - **No panics**: All errors are structured and recoverable
//! - **Deterministic**: Identical input gives byte-identical output
//! - **Stateless**: Each call stands alone; no shared mutable state

pub mod bitio;
pub mod codes;
pub mod error;
pub mod frequency;
pub mod header;
pub mod metrics;
pub mod pipeline;
pub mod tree;

// Re-export commonly used types
pub use error::{Error, Result};
pub use pipeline::{compress, decompress, CompressionStats};
