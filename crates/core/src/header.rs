//! Header serialization and the backward `HEADER_END` scan.
//!
//! The header persists the frequency table so the decoder can rebuild the
//! exact tree the encoder used, plus the exact payload bit count so padding
//! in the last byte is never decoded.
//!
//! # File Format
//!
//! ```text
//! +------------------------+
//! | entry_count (4)        |  i32 little-endian, distinct symbols
//! +------------------------+
//! | code_point (4)         |  i32, repeated entry_count times,
//! | frequency (4)          |  i32  in ascending code-point order
//! +------------------------+
//! | "HEADER_END" (10)      |  ASCII delimiter
//! +------------------------+
//! | bit_count (8)          |  i64, meaningful bits in the payload
//! +------------------------+
//! | payload (variable)     |  ceil(bit_count / 8) bytes, MSB-first
//! +------------------------+
//! ```
//!
//! # Locating the Header
//!
//! The header length is not stored separately. The reader scans the file
//! backward from the end in 1024-byte chunks for the delimiter; adjacent
//! chunks overlap by `DELIMITER.len() - 1` bytes so a delimiter across a
//! chunk boundary is still seen. The same ten bytes can occur by chance in
//! the payload, so a candidate is only accepted where the entry count at
//! offset 0 says the delimiter must be. Other candidates are skipped.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use tracing::{debug, trace, warn};

use crate::error::{HeaderError, Result};
use crate::frequency::FrequencyTable;

/// Delimiter between the frequency table and the bit count.
pub const DELIMITER: &[u8; 10] = b"HEADER_END";

/// Chunk size of the backward delimiter scan.
pub const SCAN_CHUNK_SIZE: usize = 1024;

const ENTRY_COUNT_SIZE: usize = 4;
const ENTRY_SIZE: usize = 8;
const BIT_COUNT_SIZE: usize = 8;

/// A parsed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub frequencies: FrequencyTable,
    /// Number of meaningful payload bits
    pub bit_count: u64,
    /// Byte offset of the first payload byte
    pub payload_offset: u64,
}

impl Header {
    /// Payload length in bytes implied by `bit_count`.
    pub fn payload_len(&self) -> u64 {
        self.bit_count.div_ceil(8)
    }
}

/// Offset of the delimiter for a header with `entries` symbols.
pub fn delimiter_offset(entries: usize) -> usize {
    ENTRY_COUNT_SIZE + entries * ENTRY_SIZE
}

/// Total header size (everything before the payload) for `entries` symbols.
pub fn header_len(entries: usize) -> usize {
    delimiter_offset(entries) + DELIMITER.len() + BIT_COUNT_SIZE
}

fn to_i32(field: &'static str, value: u64) -> Result<i32> {
    i32::try_from(value).map_err(|_| HeaderError::FieldOverflow { field, value }.into())
}

/// Serialize the header for `table` and a payload of `bit_count` bits.
///
/// # Errors
/// `HeaderError::FieldOverflow` if the entry count or any frequency does not
/// fit in an `i32`, or `bit_count` does not fit in an `i64`.
pub fn encode_header(table: &FrequencyTable, bit_count: u64) -> Result<Vec<u8>> {
    let mut header = Vec::with_capacity(header_len(table.len()));

    header.extend_from_slice(&to_i32("entry count", table.len() as u64)?.to_le_bytes());
    for (symbol, freq) in table.iter() {
        // Every char is <= 0x10FFFF, well inside i32
        header.extend_from_slice(&(symbol as i32).to_le_bytes());
        header.extend_from_slice(&to_i32("frequency", freq)?.to_le_bytes());
    }

    header.extend_from_slice(DELIMITER);

    let bit_count = i64::try_from(bit_count).map_err(|_| HeaderError::FieldOverflow {
        field: "bit count",
        value: bit_count,
    })?;
    header.extend_from_slice(&bit_count.to_le_bytes());

    Ok(header)
}

/// Write the header to `writer`, returning the number of bytes written.
pub fn write_header<W: Write>(
    writer: &mut W,
    table: &FrequencyTable,
    bit_count: u64,
) -> Result<usize> {
    let header = encode_header(table, bit_count)?;
    writer.write_all(&header)?;
    Ok(header.len())
}

/// Read and validate the header of a seekable encoded stream.
///
/// A delimiter candidate is accepted only where the entry count at offset 0
/// places it and where the bit count after it matches the remaining payload
/// length. Rejected candidates are skipped.
///
/// On success the reader is positioned at the first payload byte.
///
/// # Errors
/// - `HeaderError::DelimiterNotFound` if no candidate is accepted
/// - `HeaderError::NegativeField`, `InvalidSymbol`, `DuplicateSymbol` for a
///   malformed frequency table behind an accepted delimiter
pub fn read_header<R: Read + Seek>(reader: &mut R) -> Result<Header> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    let mut scan = DelimiterScan::new(file_len);

    // Read on the first candidate; the inner None means offset 0 holds no usable count
    let mut expected: Option<Option<u64>> = None;

    while let Some(offset) = scan.next_candidate(reader)? {
        let expected_offset = match expected {
            Some(e) => e,
            None => *expected.insert(expected_delimiter_offset(reader)?),
        };

        if expected_offset != Some(offset) {
            warn!(offset, ?expected_offset, "skipping misplaced HEADER_END candidate");
            continue;
        }

        let Some(bit_count) = candidate_bit_count(reader, offset, file_len)? else {
            warn!(offset, file_len, "skipping HEADER_END candidate with inconsistent bit count");
            continue;
        };

        debug!(offset, file_len, bit_count, "found header delimiter");
        return parse_table(reader, offset, bit_count);
    }

    Err(HeaderError::DelimiterNotFound.into())
}

/// Read the header of an in-memory encoded artifact.
pub fn read_header_from_bytes(bytes: &[u8]) -> Result<Header> {
    read_header(&mut Cursor::new(bytes))
}

/// Where the entry count at offset 0 says the delimiter has to start, or
/// `None` for a negative count.
///
/// Only called once a candidate exists, so the stream holds at least
/// `DELIMITER.len()` bytes.
fn expected_delimiter_offset<R: Read + Seek>(reader: &mut R) -> Result<Option<u64>> {
    let mut count_bytes = [0u8; ENTRY_COUNT_SIZE];
    reader.seek(SeekFrom::Start(0))?;
    reader.read_exact(&mut count_bytes)?;

    let count = i32::from_le_bytes(count_bytes);
    if count < 0 {
        return Ok(None);
    }

    Ok(Some(ENTRY_COUNT_SIZE as u64 + count as u64 * ENTRY_SIZE as u64))
}

/// The bit count recorded after the delimiter at `delimiter_offset`, if it is
/// present, non-negative and exactly fills the rest of the stream.
fn candidate_bit_count<R: Read + Seek>(
    reader: &mut R,
    delimiter_offset: u64,
    file_len: u64,
) -> Result<Option<u64>> {
    let bit_count_offset = delimiter_offset + DELIMITER.len() as u64;
    let payload_offset = bit_count_offset + BIT_COUNT_SIZE as u64;
    if payload_offset > file_len {
        return Ok(None);
    }

    let mut bit_count_bytes = [0u8; BIT_COUNT_SIZE];
    reader.seek(SeekFrom::Start(bit_count_offset))?;
    reader.read_exact(&mut bit_count_bytes)?;

    let Ok(bit_count) = u64::try_from(i64::from_le_bytes(bit_count_bytes)) else {
        return Ok(None);
    };
    if bit_count.div_ceil(8) != file_len - payload_offset {
        return Ok(None);
    }

    Ok(Some(bit_count))
}

/// Parse the frequency table in front of an accepted delimiter and leave the
/// reader at the payload.
fn parse_table<R: Read + Seek>(
    reader: &mut R,
    delimiter_offset: u64,
    bit_count: u64,
) -> Result<Header> {
    let mut table_bytes = vec![0u8; delimiter_offset as usize];
    reader.seek(SeekFrom::Start(0))?;
    reader.read_exact(&mut table_bytes)?;

    let mut counts = BTreeMap::new();
    for entry in table_bytes[ENTRY_COUNT_SIZE..].chunks_exact(ENTRY_SIZE) {
        let code_point = i32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]);
        let freq = i32::from_le_bytes([entry[4], entry[5], entry[6], entry[7]]);

        let symbol = u32::try_from(code_point)
            .ok()
            .and_then(char::from_u32)
            .ok_or(HeaderError::InvalidSymbol { code_point })?;

        if freq < 0 {
            return Err(HeaderError::NegativeField {
                field: "frequency",
                value: freq as i64,
            }
            .into());
        }

        if counts.insert(symbol, freq as u64).is_some() {
            return Err(HeaderError::DuplicateSymbol { symbol }.into());
        }
    }

    let payload_offset = delimiter_offset + (DELIMITER.len() + BIT_COUNT_SIZE) as u64;
    reader.seek(SeekFrom::Start(payload_offset))?;

    debug!(
        symbols = counts.len(),
        bit_count,
        payload_offset,
        "parsed header"
    );

    Ok(Header {
        frequencies: counts.into_iter().collect(),
        bit_count,
        payload_offset,
    })
}

/// Backward scan over a seekable stream yielding delimiter offsets, last first.
///
/// Read-only: re-running it on the same stream yields the same offsets.
struct DelimiterScan {
    /// Exclusive end of the region still to be read
    end: u64,
    /// Matches from the current chunk, ascending
    pending: Vec<u64>,
}

impl DelimiterScan {
    fn new(file_len: u64) -> Self {
        Self {
            end: file_len,
            pending: Vec::new(),
        }
    }

    fn next_candidate<R: Read + Seek>(&mut self, reader: &mut R) -> Result<Option<u64>> {
        let overlap = DELIMITER.len() as u64 - 1;

        loop {
            if let Some(offset) = self.pending.pop() {
                return Ok(Some(offset));
            }
            if self.end < DELIMITER.len() as u64 {
                return Ok(None);
            }

            let start = self.end.saturating_sub(SCAN_CHUNK_SIZE as u64);
            let mut chunk = vec![0u8; (self.end - start) as usize];
            reader.seek(SeekFrom::Start(start))?;
            reader.read_exact(&mut chunk)?;
            trace!(start, end = self.end, "scanning chunk for header delimiter");

            self.pending.extend(
                chunk
                    .windows(DELIMITER.len())
                    .enumerate()
                    .filter(|(_, window)| *window == DELIMITER)
                    .map(|(i, _)| start + i as u64),
            );

            // Only matches that end inside this chunk were taken, so the next
            // chunk's overlap cannot report any of them again.
            self.end = if start == 0 { 0 } else { start + overlap };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sample_header() -> Vec<u8> {
        encode_header(&FrequencyTable::from_text("aabbbcc"), 11).unwrap()
    }

    #[test]
    fn test_layout() {
        let header = sample_header();
        assert_eq!(header.len(), header_len(3));
        assert_eq!(header.len(), 4 + 3 * 8 + 10 + 8);

        assert_eq!(&header[0..4], &3i32.to_le_bytes());
        assert_eq!(&header[4..8], &('a' as i32).to_le_bytes());
        assert_eq!(&header[8..12], &2i32.to_le_bytes());
        assert_eq!(&header[12..16], &('b' as i32).to_le_bytes());
        assert_eq!(&header[16..20], &3i32.to_le_bytes());
        assert_eq!(&header[20..24], &('c' as i32).to_le_bytes());
        assert_eq!(&header[24..28], &2i32.to_le_bytes());
        assert_eq!(&header[28..38], DELIMITER);
        assert_eq!(&header[38..46], &11i64.to_le_bytes());
    }

    #[test]
    fn test_read_back() {
        let mut file = sample_header();
        file.extend_from_slice(&[0xA1, 0xE0]);

        let header = read_header_from_bytes(&file).unwrap();
        assert_eq!(header.frequencies, FrequencyTable::from_text("aabbbcc"));
        assert_eq!(header.bit_count, 11);
        assert_eq!(header.payload_offset, 46);
        assert_eq!(header.payload_len(), 2);
    }

    #[test]
    fn test_reader_left_at_payload() {
        let mut file = sample_header();
        file.extend_from_slice(&[0xA1, 0xE0]);

        let mut cursor = Cursor::new(file);
        read_header(&mut cursor).unwrap();
        let mut payload = Vec::new();
        cursor.read_to_end(&mut payload).unwrap();
        assert_eq!(payload, vec![0xA1, 0xE0]);
    }

    #[test]
    fn test_missing_delimiter() {
        let result = read_header_from_bytes(b"definitely not an encoded file");
        assert!(matches!(
            result,
            Err(Error::Header(HeaderError::DelimiterNotFound))
        ));

        let result = read_header_from_bytes(b"");
        assert!(matches!(
            result,
            Err(Error::Header(HeaderError::DelimiterNotFound))
        ));
    }

    #[test]
    fn test_delimiter_inside_payload_is_skipped() {
        // 80 payload bits spelling the delimiter itself
        let mut file = encode_header(&FrequencyTable::from_text("ab"), 80).unwrap();
        file.extend_from_slice(DELIMITER);

        let header = read_header_from_bytes(&file).unwrap();
        assert_eq!(header.payload_offset, header_len(2) as u64);
        assert_eq!(header.bit_count, 80);
    }

    #[test]
    fn test_delimiter_across_chunk_boundary() {
        // Enough entries that the delimiter straddles the first 1024-byte
        // chunk read from the end of the file.
        let text: String = (0..130u32).filter_map(|i| char::from_u32(0x100 + i)).collect();
        let table = FrequencyTable::from_text(&text);
        let mut file = encode_header(&table, 0).unwrap();

        // Pad the payload so the first chunk starts 4 bytes into the delimiter
        let delimiter_at = delimiter_offset(table.len());
        let payload_len = delimiter_at + 4 + SCAN_CHUNK_SIZE - file.len();
        let bit_count = payload_len as i64 * 8;
        let bit_count_at = delimiter_at + DELIMITER.len();
        file[bit_count_at..bit_count_at + 8].copy_from_slice(&bit_count.to_le_bytes());
        file.resize(file.len() + payload_len, 0);

        let boundary = file.len() - SCAN_CHUNK_SIZE;
        assert!(delimiter_at < boundary && boundary < delimiter_at + DELIMITER.len());

        let header = read_header_from_bytes(&file).unwrap();
        assert_eq!(header.frequencies, table);
        assert_eq!(header.bit_count, bit_count as u64);
    }

    #[test]
    fn test_negative_frequency() {
        let mut file = sample_header();
        file[8..12].copy_from_slice(&(-1i32).to_le_bytes());
        file.extend_from_slice(&[0xA1, 0xE0]);

        let result = read_header_from_bytes(&file);
        assert!(matches!(
            result,
            Err(Error::Header(HeaderError::NegativeField { field: "frequency", .. }))
        ));
    }

    #[test]
    fn test_invalid_symbol() {
        let mut file = sample_header();
        // surrogate code points are not chars
        file[4..8].copy_from_slice(&0xD800i32.to_le_bytes());
        file.extend_from_slice(&[0xA1, 0xE0]);

        let result = read_header_from_bytes(&file);
        assert!(matches!(
            result,
            Err(Error::Header(HeaderError::InvalidSymbol { code_point: 0xD800 }))
        ));
    }

    #[test]
    fn test_duplicate_symbol() {
        let mut file = sample_header();
        file[12..16].copy_from_slice(&('a' as i32).to_le_bytes());
        file.extend_from_slice(&[0xA1, 0xE0]);

        let result = read_header_from_bytes(&file);
        assert!(matches!(
            result,
            Err(Error::Header(HeaderError::DuplicateSymbol { symbol: 'a' }))
        ));
    }

    fn assert_not_found(result: Result<Header>) {
        assert!(
            matches!(result, Err(Error::Header(HeaderError::DelimiterNotFound))),
            "expected DelimiterNotFound, got {result:?}"
        );
    }

    #[test]
    fn test_payload_length_mismatch_rejects_candidate() {
        let mut file = sample_header();
        file.extend_from_slice(&[0xA1, 0xE0, 0x00]);

        assert_not_found(read_header_from_bytes(&file));
    }

    #[test]
    fn test_entry_count_disagrees_with_delimiter() {
        let mut file = sample_header();
        file[0..4].copy_from_slice(&7i32.to_le_bytes());
        file.extend_from_slice(&[0xA1, 0xE0]);

        assert_not_found(read_header_from_bytes(&file));
    }

    #[test]
    fn test_foreign_text_mentioning_delimiter() {
        assert_not_found(read_header_from_bytes(b"some notes about HEADER_END markers"));
    }

    #[test]
    fn test_negative_entry_count_rejects_candidate() {
        let mut file = vec![0xFF; 8];
        file.extend_from_slice(DELIMITER);

        assert_not_found(read_header_from_bytes(&file));
    }

    #[test]
    fn test_negative_bit_count_rejects_candidate() {
        let mut file = sample_header();
        file[38..46].copy_from_slice(&(-8i64).to_le_bytes());
        file.push(0xA1);

        assert_not_found(read_header_from_bytes(&file));
    }

    #[test]
    fn test_bit_count_cut_off_rejects_candidate() {
        // Delimiter sits where the count says, but the file ends inside the bit count
        let file = &sample_header()[..42];

        assert_not_found(read_header_from_bytes(file));
    }

    #[test]
    fn test_trailing_delimiter_after_artifact() {
        let mut file = sample_header();
        file.extend_from_slice(&[0xA1, 0xE0]);
        file.extend_from_slice(DELIMITER);

        assert_not_found(read_header_from_bytes(&file));
    }

    #[test]
    fn test_frequency_overflow() {
        let table: FrequencyTable = [('a', i32::MAX as u64 + 1)].into_iter().collect();
        let result = encode_header(&table, 8);
        assert!(matches!(
            result,
            Err(Error::Header(HeaderError::FieldOverflow { field: "frequency", .. }))
        ));
    }

    #[test]
    fn test_write_header() {
        let mut out = Vec::new();
        let written = write_header(&mut out, &FrequencyTable::from_text("aabbbcc"), 11).unwrap();
        assert_eq!(written, out.len());
        assert_eq!(out, sample_header());
    }
}
