//! # Bitstring Status List Codec
//!
//! A status list is a fixed-size bit vector. Bit `i` lives in byte `i / 8`
//! at position `7 - (i % 8)` (most significant bit first). The default list
//! is 16384 bytes, 131072 addressable indices.
//!
//! On the wire the list is gzip-compressed, base64url-encoded, and stripped
//! of `=` padding. Decoding restores padding before base64url decoding.

use std::io::{Read, Write};

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::StatusError;

/// Default list size in bytes.
pub const DEFAULT_LIST_SIZE: usize = 16384;

/// Upper bound on decompressed list size, guarding against gzip bombs in
/// fetched status lists.
const MAX_DECODED_BYTES: u64 = 16 * 1024 * 1024;

/// A mutable status bit vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitstring(Vec<u8>);

impl Bitstring {
    /// An all-zero list of `size_bytes` bytes.
    pub fn new(size_bytes: usize) -> Self {
        Self(vec![0u8; size_bytes])
    }

    /// Wrap existing bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of addressable bits.
    pub fn capacity(&self) -> u64 {
        self.0.len() as u64 * 8
    }

    fn locate(&self, index: u64) -> Result<(usize, u8), StatusError> {
        if index >= self.capacity() {
            return Err(StatusError::IndexOutOfRange {
                index,
                capacity: self.capacity(),
            });
        }
        let byte = (index / 8) as usize;
        let mask = 1u8 << (7 - (index % 8));
        Ok((byte, mask))
    }

    /// Read bit `index`.
    pub fn get(&self, index: u64) -> Result<bool, StatusError> {
        let (byte, mask) = self.locate(index)?;
        Ok(self.0[byte] & mask != 0)
    }

    /// Write bit `index`.
    pub fn set(&mut self, index: u64, value: bool) -> Result<(), StatusError> {
        let (byte, mask) = self.locate(index)?;
        if value {
            self.0[byte] |= mask;
        } else {
            self.0[byte] &= !mask;
        }
        Ok(())
    }

    /// Number of set bits.
    pub fn count_set(&self) -> u64 {
        self.0.iter().map(|b| u64::from(b.count_ones())).sum()
    }

    /// Encode as an `encodedList` token.
    pub fn encode(&self) -> Result<String, StatusError> {
        encode_list(&self.0)
    }

    /// Decode an `encodedList` token.
    pub fn decode(token: &str) -> Result<Self, StatusError> {
        decode_list(token).map(Self)
    }
}

/// gzip, then base64url without padding.
pub fn encode_list(bytes: &[u8]) -> Result<String, StatusError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    let compressed = encoder.finish()?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Restore padding, base64url-decode, gunzip.
pub fn decode_list(token: &str) -> Result<Vec<u8>, StatusError> {
    let mut padded = token.trim().to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    let compressed = URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| StatusError::Encoding(format!("invalid base64url: {e}")))?;

    let mut out = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .take(MAX_DECODED_BYTES + 1)
        .read_to_end(&mut out)
        .map_err(|e| StatusError::Encoding(format!("invalid gzip stream: {e}")))?;
    if out.len() as u64 > MAX_DECODED_BYTES {
        return Err(StatusError::Encoding(format!(
            "decoded list exceeds {MAX_DECODED_BYTES} bytes"
        )));
    }
    Ok(out)
}
