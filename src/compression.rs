//! gRPC Message Decompression
//!
//! Implements bounded decompression for gRPC message payloads.
//! Supports gzip, deflate, and identity (no compression).
//!
//! Uses flate2 for gzip/deflate. Decompression output is capped by the
//! caller-supplied limit so a small compressed payload cannot expand past
//! the configured message size.

use std::fmt;
use std::io::Read;

use bytes::Bytes;
use serde::Deserialize;

use crate::framing::DeframeError;

/// gRPC compression algorithm (grpc-encoding values)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionEncoding {
    /// No compression
    #[default]
    Identity,
    /// Gzip compression
    Gzip,
    /// Deflate compression
    Deflate,
}

impl CompressionEncoding {
    /// Parse from a grpc-encoding header value
    pub fn from_bytes(value: &[u8]) -> Option<Self> {
        if value.eq_ignore_ascii_case(b"identity") {
            Some(Self::Identity)
        } else if value.eq_ignore_ascii_case(b"gzip") {
            Some(Self::Gzip)
        } else if value.eq_ignore_ascii_case(b"deflate") {
            Some(Self::Deflate)
        } else {
            None
        }
    }

    /// Get header value as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }

    /// Decompressor handle for this encoding
    ///
    /// Returns `None` for identity: an identity stream must never set the
    /// compressed flag, so there is nothing to decompress.
    pub fn decompressor(&self) -> Option<Box<dyn Decompressor>> {
        match self {
            Self::Identity => None,
            Self::Gzip => Some(Box::new(GzipDecompressor)),
            Self::Deflate => Some(Box::new(DeflateDecompressor)),
        }
    }
}

impl fmt::Display for CompressionEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CompressionEncoding {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CompressionEncoding::from_bytes(s.as_bytes()).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown message encoding: '{}', expected 'identity', 'gzip', or 'deflate'",
                s
            ))
        })
    }
}

/// Bounded decompression capability
///
/// Implementations must refuse to produce more than `limit` output bytes.
/// One instance may be reused across frames of the same stream; resources
/// are released on drop.
pub trait Decompressor: Send {
    /// Decompress `input`, producing at most `limit` bytes
    fn decompress(&mut self, input: &[u8], limit: usize) -> Result<Bytes, DeframeError>;
}

/// Gzip decompressor backed by flate2
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipDecompressor;

impl Decompressor for GzipDecompressor {
    fn decompress(&mut self, input: &[u8], limit: usize) -> Result<Bytes, DeframeError> {
        read_bounded(flate2::read::GzDecoder::new(input), limit, "gzip")
    }
}

/// Deflate decompressor backed by flate2
#[derive(Debug, Clone, Copy, Default)]
pub struct DeflateDecompressor;

impl Decompressor for DeflateDecompressor {
    fn decompress(&mut self, input: &[u8], limit: usize) -> Result<Bytes, DeframeError> {
        read_bounded(flate2::read::DeflateDecoder::new(input), limit, "deflate")
    }
}

/// Read the whole decompressed stream, failing once output exceeds `limit`
///
/// Reads one byte past the limit so overflow is detected without draining
/// the rest of an oversized stream.
fn read_bounded<R: Read>(reader: R, limit: usize, algorithm: &str) -> Result<Bytes, DeframeError> {
    let mut output = Vec::new();
    let mut bounded = reader.take((limit as u64).saturating_add(1));
    bounded
        .read_to_end(&mut output)
        .map_err(|e| DeframeError::Compression(format!("{} decompress: {}", algorithm, e)))?;

    if output.len() > limit {
        return Err(DeframeError::MessageTooLarge {
            size: output.len(),
            max: limit,
        });
    }

    Ok(Bytes::from(output))
}
