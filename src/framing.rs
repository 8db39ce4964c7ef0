//! gRPC Message Framing (5-byte header)
//!
//! gRPC では各メッセージに 5 バイトのヘッダーが付与されます:
//!
//! ```text
//! +------------------+
//! | 1 byte: flags    |  bit 0 = compressed (0/1)
//! +------------------+
//! | 4 bytes: length  |  big-endian message length
//! +------------------+
//! | N bytes: message |  Protobuf or raw bytes
//! +------------------+
//! ```
//!
//! [`FrameDecoder`] は受信バッファの現在カーソル位置でフレームを
//! ちょうど 1 つデコードする単段デコーダです。ヘッダーまたは
//! ペイロードが揃っていない場合はカーソルを動かさず `None` を返します。

use std::fmt;

use bytes::Bytes;

use crate::buffer::ReadBuffer;
use crate::compression::Decompressor;
use crate::status::GrpcStatusCode;

/// gRPC framing header size (1 byte flags + 4 bytes length)
pub const FRAME_HEADER_SIZE: usize = 5;

/// Maximum gRPC message size (default: 4MB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Flags byte value indicating a compressed message
const COMPRESSED_FLAG: u8 = 1;

/// Errors surfaced while deframing a gRPC byte stream
///
/// All of these are terminal for the stream: gRPC framing has no resync
/// point, so the caller ends the RPC with the matching status code.
#[derive(Debug, Clone)]
pub enum DeframeError {
    /// Declared or decompressed message size exceeds the limit
    MessageTooLarge {
        /// Observed size
        size: usize,
        /// Maximum allowed
        max: usize,
    },
    /// Frame has the compressed flag set but no decompressor is configured
    MissingDecompressor,
    /// Decompression failed (corrupt or truncated payload)
    Compression(String),
}

impl DeframeError {
    /// gRPC status code to end the RPC with
    pub fn status(&self) -> GrpcStatusCode {
        match self {
            Self::MessageTooLarge { .. } => GrpcStatusCode::ResourceExhausted,
            Self::MissingDecompressor => GrpcStatusCode::Internal,
            Self::Compression(_) => GrpcStatusCode::Internal,
        }
    }
}

impl fmt::Display for DeframeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageTooLarge { size, max } => {
                write!(f, "Message too large: {} bytes (max: {})", size, max)
            }
            Self::MissingDecompressor => {
                write!(f, "Compressed message received but no decompressor is configured")
            }
            Self::Compression(msg) => write!(f, "Compression error: {}", msg),
        }
    }
}

impl std::error::Error for DeframeError {}

/// Single-step gRPC frame decoder
///
/// Decodes exactly one frame at the buffer's cursor per call. Holds only
/// immutable configuration; all mutable state lives in the buffer owned by
/// the caller.
pub struct FrameDecoder {
    max_message_size: usize,
    decompressor: Option<Box<dyn Decompressor>>,
}

impl FrameDecoder {
    /// Create a decoder without decompression support
    ///
    /// Any frame with the compressed flag set fails with
    /// [`DeframeError::MissingDecompressor`].
    pub fn new(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            decompressor: None,
        }
    }

    /// Create a decoder that hands compressed payloads to `decompressor`
    pub fn with_decompressor(max_message_size: usize, decompressor: Box<dyn Decompressor>) -> Self {
        Self {
            max_message_size,
            decompressor: Some(decompressor),
        }
    }

    /// Configured message size limit
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Try to decode one frame at the buffer's cursor
    ///
    /// Returns `Ok(None)` when fewer than 5 header bytes or fewer than the
    /// declared payload bytes are readable; the cursor does not move in
    /// that case. On success the cursor advances past the header and the
    /// (compressed) payload, and the returned bytes are independent of the
    /// buffer.
    ///
    /// The size limit is checked against the declared length before any
    /// payload allocation, so an oversized frame fails even while its
    /// payload bytes are still in flight.
    pub fn decode(&mut self, buf: &mut ReadBuffer) -> Result<Option<Bytes>, DeframeError> {
        let readable = buf.readable();
        if readable.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let compressed = readable[0] == COMPRESSED_FLAG;
        let length =
            u32::from_be_bytes([readable[1], readable[2], readable[3], readable[4]]) as usize;

        if length > self.max_message_size {
            ftlog::warn!(
                "[gRPC] declared message length {} exceeds limit {}",
                length,
                self.max_message_size
            );
            return Err(DeframeError::MessageTooLarge {
                size: length,
                max: self.max_message_size,
            });
        }

        if readable.len() - FRAME_HEADER_SIZE < length {
            return Ok(None);
        }

        let payload = &readable[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + length];
        let message = if compressed {
            match self.decompressor.as_mut() {
                Some(decompressor) => decompressor.decompress(payload, self.max_message_size)?,
                None => return Err(DeframeError::MissingDecompressor),
            }
        } else {
            Bytes::copy_from_slice(payload)
        };

        buf.advance(FRAME_HEADER_SIZE + length);
        Ok(Some(message))
    }
}

impl fmt::Debug for FrameDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("max_message_size", &self.max_message_size)
            .field("decompressor", &self.decompressor.is_some())
            .finish()
    }
}
