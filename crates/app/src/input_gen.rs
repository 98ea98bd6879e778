//! Sample text generation.
//!
//! `huffc sample` writes a file with interesting compression
//! characteristics: a mix of repetitive and random text.
//!
//! # Design
//!
//! Generated text has:
//! - Some highly compressible sections (runs of one character)
//! - Some moderately compressible sections (limited, text-like alphabet)
//! - Some structured sections (short repeating patterns)
//! - Some poorly compressible sections (random code points, mostly multi-byte)
//!
//! The output is always valid UTF-8 and exactly `size_bytes` long.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate sample text with mixed compressibility.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `size_bytes`: exact size of the UTF-8 encoding
pub fn generate_sample_text(seed: u64, size_bytes: usize) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut text = String::with_capacity(size_bytes);

    while text.len() < size_bytes {
        let chunk_end = (text.len() + 8192).min(size_bytes);

        let chunk_type: u8 = rng.gen_range(0..10);

        match chunk_type {
            // 30% highly compressible (runs of one character)
            0..=2 => {
                let c = random_bmp_char(&mut rng);
                fill(&mut text, chunk_end, || c);
            }

            // 30% moderately compressible (limited alphabet, text-like)
            3..=5 => {
                let alphabet: Vec<char> = "abcdefghijklmnopqrstuvwxyz .!,\néè".chars().collect();
                fill(&mut text, chunk_end, || alphabet[rng.gen_range(0..alphabet.len())]);
            }

            // 20% structured (repeating patterns)
            6..=7 => {
                let pattern = generate_pattern(&mut rng);
                let mut pos = 0;
                fill(&mut text, chunk_end, || {
                    pos += 1;
                    pattern[(pos - 1) % pattern.len()]
                });
            }

            // 20% poorly compressible (any scalar value)
            _ => fill(&mut text, chunk_end, || rng.gen::<char>()),
        }
    }

    text
}

/// Append characters until `text` is exactly `end` bytes long. A character
/// that would overshoot is replaced by a space.
fn fill(text: &mut String, end: usize, mut next: impl FnMut() -> char) {
    while text.len() < end {
        let c = next();
        if text.len() + c.len_utf8() <= end {
            text.push(c);
        } else {
            text.push(' ');
        }
    }
}

fn random_bmp_char(rng: &mut ChaCha8Rng) -> char {
    // Below the surrogate range, so every value is a valid char
    char::from_u32(rng.gen_range(0x20..0xD000)).unwrap_or('?')
}

/// Generate a small repeating pattern.
fn generate_pattern(rng: &mut ChaCha8Rng) -> Vec<char> {
    let pattern_len = rng.gen_range(4..=32);
    (0..pattern_len).map(|_| random_bmp_char(rng)).collect()
}

/// Write generated text to a file.
pub fn write_sample_file(path: &std::path::Path, seed: u64, size_bytes: usize) -> std::io::Result<()> {
    std::fs::write(path, generate_sample_text(seed, size_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sample_text() {
        let text = generate_sample_text(42, 1000);
        assert_eq!(text.len(), 1000);
    }

    #[test]
    fn test_determinism() {
        let text1 = generate_sample_text(12345, 5000);
        let text2 = generate_sample_text(12345, 5000);

        assert_eq!(text1, text2);
    }

    #[test]
    fn test_different_seeds() {
        let text1 = generate_sample_text(1, 1000);
        let text2 = generate_sample_text(2, 1000);

        assert_ne!(text1, text2);
    }

    #[test]
    fn test_various_sizes() {
        for size in [0, 1, 2, 3, 100, 1000, 10000, 100000] {
            let text = generate_sample_text(999, size);
            assert_eq!(text.len(), size);
        }
    }

    #[test]
    fn test_contains_multibyte_symbols() {
        let text = generate_sample_text(7, 100_000);
        assert!(text.chars().any(|c| c.len_utf8() > 1));
    }

    #[test]
    fn test_sample_round_trips() {
        let text = generate_sample_text(2024, 50_000);
        let encoded = huffc_core::compress(text.as_bytes()).unwrap();
        assert_eq!(huffc_core::decompress(&encoded).unwrap(), text.as_bytes());
    }

    #[test]
    fn test_write_sample_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        write_sample_file(&path, 5, 4096).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), generate_sample_text(5, 4096));
    }
}
