//! Bit-level packing and unpacking.
//!
//! `BitWriter` and `BitReader` operate MSB-first (most significant bit
//! first). Unlike a plain byte buffer, a packed buffer here always travels
//! with its exact bit count, so the zero padding that fills the final byte
//! can never be mistaken for data.
//!
//! # Padding Rules
//! - BitWriter: pads the final partial byte with trailing zeros and reports
//!   the number of real bits alongside the bytes
//! - BitReader: refuses to read past the recorded bit count
//!
//! # Example
//! ```
//! use huffc_core::bitio::{BitWriter, BitReader};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3).unwrap();
//! writer.write_bits(0b11, 2).unwrap();
//! // 10111 -> padded to 10111000, 5 real bits
//!
//! let packed = writer.finish();
//! assert_eq!(packed.bit_len, 5);
//!
//! let reader = BitReader::with_bit_len(&packed.bytes, packed.bit_len).unwrap();
//! let bits: Vec<bool> = reader.collect();
//! assert_eq!(bits, [true, false, true, true, true]);
//! ```

use crate::error::{BitIoError, HeaderError, HuffmanError, Result};

/// A packed byte buffer plus the number of meaningful bits in it.
///
/// # Invariants
/// - `bytes.len() == bit_len.div_ceil(8)`
/// - bits past `bit_len` in the last byte are zero
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackedBits {
    pub bytes: Vec<u8>,
    pub bit_len: u64,
}

impl PackedBits {
    /// Number of zero bits appended to complete the final byte.
    pub fn padding(&self) -> u64 {
        self.bytes.len() as u64 * 8 - self.bit_len
    }
}

/// Writes bits MSB-first into a byte buffer.
///
/// # Invariants
/// - `bit_count` is always < 8
#[derive(Debug, Clone)]
pub struct BitWriter {
    /// Completed bytes
    bytes: Vec<u8>,
    /// Accumulator for the current partial byte (MSB-aligned)
    bit_buffer: u8,
    /// Number of bits in bit_buffer (0-7)
    bit_count: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a writer expecting roughly `bytes` bytes of output.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            bit_buffer: 0,
            bit_count: 0,
        }
    }

    /// Append a single bit.
    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.bit_buffer |= 0x80 >> self.bit_count;
        }
        self.bit_count += 1;

        if self.bit_count == 8 {
            self.bytes.push(self.bit_buffer);
            self.bit_buffer = 0;
            self.bit_count = 0;
        }
    }

    /// Write up to 64 bits to the output.
    ///
    /// Bits are written MSB-first. For example, writing value=0b101 with count=3
    /// writes bits 1, 0, 1 in that order.
    ///
    /// # Errors
    /// Returns `BitIoError::InvalidBitCount` if count > 64.
    pub fn write_bits(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        let mut remaining = count;
        let mut val = value;

        while remaining > 0 {
            let bits_to_write = remaining.min(8 - self.bit_count as usize);

            // Top bits_to_write bits of the remaining value
            let shift = remaining - bits_to_write;
            let bits = ((val >> shift) & ((1u64 << bits_to_write) - 1)) as u8;

            self.bit_buffer |= bits << (8 - self.bit_count as usize - bits_to_write);
            self.bit_count += bits_to_write as u8;

            if self.bit_count == 8 {
                self.bytes.push(self.bit_buffer);
                self.bit_buffer = 0;
                self.bit_count = 0;
            }

            // shift < 64 because at least one bit was written this round
            val &= (1u64 << shift) - 1;
            remaining -= bits_to_write;
        }

        Ok(())
    }

    /// Finish writing and return the packed bytes with their exact bit count.
    ///
    /// A trailing partial byte is flushed with zero padding.
    pub fn finish(mut self) -> PackedBits {
        let bit_len = self.bit_len();
        if self.bit_count > 0 {
            self.bytes.push(self.bit_buffer);
        }
        PackedBits {
            bytes: self.bytes,
            bit_len,
        }
    }

    /// Return the total number of bits written (including partial byte).
    pub fn bit_len(&self) -> u64 {
        self.bytes.len() as u64 * 8 + self.bit_count as u64
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads bits MSB-first from a byte buffer, stopping at a recorded bit count.
///
/// # Invariants
/// - `bit_position <= bit_len <= data.len() * 8`
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Current bit position (0 = MSB of first byte)
    bit_position: u64,
    /// Number of meaningful bits in `data`
    bit_len: u64,
}

impl<'a> BitReader<'a> {
    /// Reader over every bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_position: 0,
            bit_len: data.len() as u64 * 8,
        }
    }

    /// Reader over the first `bit_len` bits of `data`; padding is never returned.
    ///
    /// # Errors
    /// `HeaderError::PayloadLengthMismatch` if `data` is not exactly
    /// `bit_len` bits rounded up to whole bytes.
    pub fn with_bit_len(data: &'a [u8], bit_len: u64) -> Result<Self> {
        if bit_len.div_ceil(8) != data.len() as u64 {
            return Err(HeaderError::PayloadLengthMismatch {
                bit_count: bit_len,
                payload_bytes: data.len(),
            }
            .into());
        }
        Ok(Self {
            data,
            bit_position: 0,
            bit_len,
        })
    }

    /// Read a single bit.
    ///
    /// # Errors
    /// `BitIoError::UnexpectedEof` once `bit_len` bits have been read.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.is_empty() {
            return Err(BitIoError::UnexpectedEof.into());
        }
        let byte = self.data[(self.bit_position / 8) as usize];
        let bit = byte & (0x80 >> (self.bit_position % 8)) != 0;
        self.bit_position += 1;
        Ok(bit)
    }

    pub fn bits_remaining(&self) -> u64 {
        self.bit_len - self.bit_position
    }

    pub fn position(&self) -> u64 {
        self.bit_position
    }

    pub fn is_empty(&self) -> bool {
        self.bit_position >= self.bit_len
    }
}

impl Iterator for BitReader<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        self.read_bit().ok()
    }
}

/// Pack a logical bit sequence (one `0`/`1` value per element) into bytes.
///
/// # Errors
/// `HuffmanError::InvalidBit` for any element other than 0 or 1.
pub fn pack(bits: &[u8]) -> Result<PackedBits> {
    let mut writer = BitWriter::with_capacity(bits.len().div_ceil(8));
    for (position, &value) in bits.iter().enumerate() {
        match value {
            0 => writer.write_bit(false),
            1 => writer.write_bit(true),
            _ => return Err(HuffmanError::InvalidBit { position, value }.into()),
        }
    }
    Ok(writer.finish())
}

/// Unpack the first `bit_len` bits of `bytes` into a logical bit sequence.
///
/// Padding bits beyond `bit_len` are discarded.
pub fn unpack(bytes: &[u8], bit_len: u64) -> Result<Vec<u8>> {
    let reader = BitReader::with_bit_len(bytes, bit_len)?;
    Ok(reader.map(u8::from).collect())
}
