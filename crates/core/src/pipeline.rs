//! Encode and decode pipelines.
//!
//! ```text
//! encode: bytes -> FrequencyTable -> HuffmanTree -> PrefixCodeTable
//!               -> BitWriter -> header + payload
//! decode: header + payload -> FrequencyTable -> HuffmanTree
//!               -> BitReader(bit_count) -> tree walk -> bytes
//! ```
//!
//! Every call is independent: nothing is cached between invocations and no
//! global state is touched, so the same input always yields the same output.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::bitio::{BitReader, BitWriter};
use crate::codes::PrefixCodeTable;
use crate::error::{Error, HuffmanError, Result};
use crate::frequency::FrequencyTable;
use crate::header::{encode_header, read_header};
use crate::tree::HuffmanTree;

/// Sizes and checksum of one encode or decode run.
///
/// `original_*` always describes the uncompressed text and `encoded_bytes`
/// the artifact, whichever direction the run went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressionStats {
    pub original_bytes: u64,
    pub encoded_bytes: u64,
    /// Number of symbols (chars) in the text
    pub symbols: u64,
    pub distinct_symbols: usize,
    /// Header size including delimiter and bit count
    pub header_bytes: u64,
    pub payload_bits: u64,
    /// CRC-32 of the uncompressed bytes
    pub original_crc32: u32,
}

impl CompressionStats {
    /// encoded / original, or 0.0 for an empty original.
    pub fn ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            0.0
        } else {
            self.encoded_bytes as f64 / self.original_bytes as f64
        }
    }

    /// Zero bits appended to complete the last payload byte.
    pub fn padding_bits(&self) -> u64 {
        self.payload_bits.div_ceil(8) * 8 - self.payload_bits
    }
}

/// Compress UTF-8 text into a self-describing artifact.
///
/// # Errors
/// - `Error::InvalidText` if `input` is not UTF-8
/// - `HuffmanError::EmptyInput` if `input` is empty
pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    compress_with_stats(input).map(|(encoded, _)| encoded)
}

/// Like [`compress`], also returning run statistics.
pub fn compress_with_stats(input: &[u8]) -> Result<(Vec<u8>, CompressionStats)> {
    let text = std::str::from_utf8(input)?;

    let frequencies = FrequencyTable::from_text(text);
    if frequencies.is_empty() {
        return Err(HuffmanError::EmptyInput.into());
    }

    let tree = HuffmanTree::build(&frequencies)?;
    let codes = PrefixCodeTable::from_tree(&tree);
    debug!(
        distinct_symbols = codes.len(),
        depth = tree.depth(),
        "built prefix codes"
    );

    let mut writer = BitWriter::with_capacity(input.len() / 2);
    let symbols = codes.encode_into(text, &mut writer)?;
    let payload = writer.finish();

    let header = encode_header(&frequencies, payload.bit_len)?;
    debug!(
        header_bytes = header.len(),
        payload_bits = payload.bit_len,
        padding_bits = payload.padding(),
        "packed payload"
    );

    let mut encoded = Vec::with_capacity(header.len() + payload.bytes.len());
    encoded.extend_from_slice(&header);
    encoded.extend_from_slice(&payload.bytes);

    let stats = CompressionStats {
        original_bytes: input.len() as u64,
        encoded_bytes: encoded.len() as u64,
        symbols,
        distinct_symbols: frequencies.len(),
        header_bytes: header.len() as u64,
        payload_bits: payload.bit_len,
        original_crc32: crc32fast::hash(input),
    };

    Ok((encoded, stats))
}

/// Reconstruct the original bytes from an artifact produced by [`compress`].
///
/// # Errors
/// - `HeaderError::*` for a missing or malformed header
/// - `HuffmanError::TruncatedPayload` if the payload ends mid-code
/// - `HuffmanError::LengthMismatch` if the symbol count disagrees with the header
pub fn decompress(encoded: &[u8]) -> Result<Vec<u8>> {
    decode_from(&mut Cursor::new(encoded)).map(|(decoded, _)| decoded)
}

/// Decode an artifact from any seekable reader.
pub fn decode_from<R: Read + Seek>(reader: &mut R) -> Result<(Vec<u8>, CompressionStats)> {
    let header = read_header(reader)?;

    let mut payload = Vec::with_capacity(header.payload_len() as usize);
    reader.read_to_end(&mut payload)?;

    let tree = HuffmanTree::build(&header.frequencies)?;
    let bits = BitReader::with_bit_len(&payload, header.bit_count)?;

    let expected = header.frequencies.total();
    // Every code is at least one bit long
    let mut text = String::with_capacity(expected.min(header.bit_count) as usize);
    let symbols = tree.decode_packed(bits, &mut text)?;
    if symbols != expected {
        return Err(HuffmanError::LengthMismatch {
            expected,
            actual: symbols,
        }
        .into());
    }
    debug!(symbols, bytes = text.len(), "decoded payload");

    let decoded = text.into_bytes();
    let stats = CompressionStats {
        original_bytes: decoded.len() as u64,
        encoded_bytes: header.payload_offset + payload.len() as u64,
        symbols,
        distinct_symbols: header.frequencies.len(),
        header_bytes: header.payload_offset,
        payload_bits: header.bit_count,
        original_crc32: crc32fast::hash(&decoded),
    };

    Ok((decoded, stats))
}

/// Compress the file at `input` into a new file at `output`.
///
/// The output file is only created once compression has succeeded, so an
/// empty or non-UTF-8 input leaves no file behind.
pub fn encode_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<CompressionStats> {
    let (input, output) = (input.as_ref(), output.as_ref());

    let data = fs::read(input)?;
    let (encoded, stats) = compress_with_stats(&data)?;

    let mut writer = BufWriter::new(File::create(output)?);
    writer.write_all(&encoded)?;
    writer.flush()?;

    info!(
        input = %input.display(),
        output = %output.display(),
        original_bytes = stats.original_bytes,
        encoded_bytes = stats.encoded_bytes,
        "encoded file"
    );
    Ok(stats)
}

/// Decompress the artifact at `input` into a new file at `output`.
///
/// The header is located with the backward scan directly on the open file.
pub fn decode_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<CompressionStats> {
    let (input, output) = (input.as_ref(), output.as_ref());

    let mut reader = BufReader::new(File::open(input)?);
    let (decoded, stats) = decode_from(&mut reader)?;
    drop(reader);

    let mut writer = BufWriter::new(File::create(output)?);
    writer.write_all(&decoded)?;
    writer.flush()?;

    info!(
        input = %input.display(),
        output = %output.display(),
        encoded_bytes = stats.encoded_bytes,
        original_bytes = stats.original_bytes,
        "decoded file"
    );
    Ok(stats)
}

/// Decode the artifact at `encoded` in memory and check it against the
/// statistics of the run that produced it.
///
/// # Errors
/// `Error::VerificationFailed` if the checksum or length differs.
pub fn verify_file(encoded: impl AsRef<Path>, expected: &CompressionStats) -> Result<()> {
    let mut reader = BufReader::new(File::open(encoded.as_ref())?);
    let (_, actual) = decode_from(&mut reader)?;

    if actual.original_crc32 != expected.original_crc32
        || actual.original_bytes != expected.original_bytes
    {
        return Err(Error::VerificationFailed {
            expected: expected.original_crc32,
            actual: actual.original_crc32,
        });
    }

    debug!(crc32 = actual.original_crc32, "verified round trip");
    Ok(())
}
