//! Metrics collection and reporting for a compression run.
//!
//! This module provides observable insights into a single encode or decode:
//! - Throughput (bytes in/out)
//! - Compression ratio and bits per symbol
//! - Header overhead and payload padding
//! - CRC-32 of the uncompressed data, and the verification outcome
//! - Timing information
//!
//! # Thread Safety
//!
//! The `Metrics` struct is NOT thread-safe. Runs are single-threaded, so one
//! instance per run is all that is needed.

use std::fmt;
use std::time::{Duration, Instant};

use crate::pipeline::CompressionStats;

/// Direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encode,
    Decode,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Encode => f.write_str("encode"),
            Operation::Decode => f.write_str("decode"),
        }
    }
}

/// Metrics for one encode or decode run.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub operation: Operation,

    // === Timing ===
    /// When the run started
    pub start_time: Instant,

    /// When the run ended (set on completion)
    pub end_time: Option<Instant>,

    // === Input/Output ===
    /// Bytes read from the input file
    pub input_bytes: u64,

    /// Bytes written to the output file
    pub output_bytes: u64,

    // === Coding ===
    pub symbols: u64,
    pub distinct_symbols: usize,
    pub header_bytes: u64,
    pub payload_bits: u64,

    /// CRC-32 of the uncompressed data
    pub original_crc32: u32,

    /// Round-trip verification result, if one was run
    pub verified: Option<bool>,
}

impl Metrics {
    /// Create new metrics with start time set to now.
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            start_time: Instant::now(),
            end_time: None,
            input_bytes: 0,
            output_bytes: 0,
            symbols: 0,
            distinct_symbols: 0,
            header_bytes: 0,
            payload_bits: 0,
            original_crc32: 0,
            verified: None,
        }
    }

    /// Fold in the statistics returned by the pipeline.
    pub fn record(&mut self, stats: &CompressionStats) {
        let (input, output) = match self.operation {
            Operation::Encode => (stats.original_bytes, stats.encoded_bytes),
            Operation::Decode => (stats.encoded_bytes, stats.original_bytes),
        };
        self.input_bytes = input;
        self.output_bytes = output;
        self.symbols = stats.symbols;
        self.distinct_symbols = stats.distinct_symbols;
        self.header_bytes = stats.header_bytes;
        self.payload_bits = stats.payload_bits;
        self.original_crc32 = stats.original_crc32;
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    fn original_bytes(&self) -> u64 {
        match self.operation {
            Operation::Encode => self.input_bytes,
            Operation::Decode => self.output_bytes,
        }
    }

    fn encoded_bytes(&self) -> u64 {
        match self.operation {
            Operation::Encode => self.output_bytes,
            Operation::Decode => self.input_bytes,
        }
    }

    /// Compute compression ratio (encoded / original).
    ///
    /// Returns 0.0 if nothing was recorded.
    pub fn compression_ratio(&self) -> f64 {
        let original = self.original_bytes();
        if original == 0 {
            0.0
        } else {
            self.encoded_bytes() as f64 / original as f64
        }
    }

    /// Average payload bits per symbol (header excluded).
    pub fn bits_per_symbol(&self) -> f64 {
        if self.symbols == 0 {
            0.0
        } else {
            self.payload_bits as f64 / self.symbols as f64
        }
    }

    /// Compute throughput in input bytes/second.
    pub fn throughput_bps(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            self.input_bytes as f64 / duration_secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== {} Summary ===", capitalize(self.operation));
        println!("Duration: {} ms", self.duration().as_millis());
        println!();

        println!("Input:  {} bytes ({:.2} KiB)", self.input_bytes, self.input_bytes as f64 / 1024.0);
        println!("Output: {} bytes ({:.2} KiB)", self.output_bytes, self.output_bytes as f64 / 1024.0);
        println!("CRC-32: {:#010x}", self.original_crc32);
        match self.verified {
            Some(true) => println!("Verification: PASSED ✓"),
            Some(false) => println!("Verification: FAILED ✗"),
            None => {}
        }
        println!();

        println!("=== Coding ===");
        println!("Symbols: {} ({} distinct)", self.symbols, self.distinct_symbols);
        println!("Header: {} bytes", self.header_bytes);
        println!("Payload: {} bits ({} bytes)", self.payload_bits, self.payload_bits.div_ceil(8));
        println!("Bits/symbol: {:.3}", self.bits_per_symbol());
        println!("Ratio: {:.1}%", self.compression_ratio() * 100.0);
        println!();

        println!("=== Performance ===");
        println!("Throughput: {:.2} MB/s", self.throughput_bps() / 1_000_000.0);
        println!();
    }

    /// Print just the final result (pass/fail).
    pub fn print_result(&self) {
        if self.verified == Some(false) {
            println!("✗ {} failed verification", capitalize(self.operation));
        } else {
            println!("✓ {} completed successfully", capitalize(self.operation));
            println!(
                "  {} bytes -> {} bytes in {} ms",
                self.input_bytes,
                self.output_bytes,
                self.duration().as_millis()
            );
        }
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        let mut text = format!(
            "operation={}\n\
             duration_ms={}\n\
             input_bytes={}\n\
             output_bytes={}\n\
             symbols={}\n\
             distinct_symbols={}\n\
             header_bytes={}\n\
             payload_bits={}\n\
             compression_ratio={:.4}\n\
             bits_per_symbol={:.4}\n\
             crc32={:#010x}\n",
            self.operation,
            self.duration().as_millis(),
            self.input_bytes,
            self.output_bytes,
            self.symbols,
            self.distinct_symbols,
            self.header_bytes,
            self.payload_bits,
            self.compression_ratio(),
            self.bits_per_symbol(),
            self.original_crc32,
        );
        if let Some(verified) = self.verified {
            text.push_str(&format!("verified={verified}\n"));
        }
        text
    }
}

fn capitalize(operation: Operation) -> &'static str {
    match operation {
        Operation::Encode => "Encode",
        Operation::Decode => "Decode",
    }
}
