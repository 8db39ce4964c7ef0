//! Streaming gRPC Deframer
//!
//! トランスポートから届くチャンクを蓄積し、完全なフレームを順に取り出す
//! ストリーム毎のアキュムレータです。読み取り済みプレフィックスが
//! 大きくなった場合のみコンパクションを行い、長寿命ストリームでも
//! バッファが消費済みバイトを溜め込まないようにします。

use bytes::Bytes;

use crate::buffer::ReadBuffer;
use crate::compression::Decompressor;
use crate::framing::{DeframeError, FrameDecoder};

/// Consumed-prefix size below which compaction is never worth the memmove
const COMPACTION_FLOOR: usize = 1024;

/// Streaming gRPC frame deframer
///
/// One instance per stream, driven by a single caller: `append` transport
/// chunks as they arrive, then pull frames with `decode_next` until it
/// returns `None`. Frames come out in strict byte-stream order regardless
/// of how the stream was chunked.
#[derive(Debug)]
pub struct Deframer {
    decoder: FrameDecoder,
    buffer: Option<ReadBuffer>,
}

impl Deframer {
    /// Create a deframer without decompression support
    pub fn new(max_message_size: usize) -> Self {
        Self {
            decoder: FrameDecoder::new(max_message_size),
            buffer: None,
        }
    }

    /// Create a deframer that decompresses flagged messages
    pub fn with_decompressor(max_message_size: usize, decompressor: Box<dyn Decompressor>) -> Self {
        Self {
            decoder: FrameDecoder::with_decompressor(max_message_size, decompressor),
            buffer: None,
        }
    }

    /// Configured message size limit
    pub fn max_message_size(&self) -> usize {
        self.decoder.max_message_size()
    }

    /// Append a transport chunk
    ///
    /// Chunk boundaries need not align with frame boundaries. A chunk
    /// appended to an empty deframer becomes the internal buffer without a
    /// copy. Otherwise the consumed prefix is discarded first when it
    /// exceeds both the compaction floor and half the buffer's capacity,
    /// which keeps the bytes copied per frame amortised O(1) under
    /// steady-state streaming.
    pub fn append(&mut self, chunk: Vec<u8>) {
        match self.buffer.as_mut() {
            Some(buffer) if !buffer.is_empty() => {
                let consumed = buffer.reader_index();
                if consumed > COMPACTION_FLOOR && consumed > buffer.capacity() / 2 {
                    ftlog::debug!("[gRPC] discarding {} consumed bytes before append", consumed);
                    buffer.discard_read_bytes();
                }
                buffer.extend_from_slice(&chunk);
            }
            _ => self.buffer = Some(ReadBuffer::from_vec(chunk)),
        }
    }

    /// Try to produce the next complete frame
    ///
    /// Returns `Ok(None)` when the buffer is empty or holds only part of a
    /// frame. Errors come verbatim from the frame decoder and are terminal
    /// for the stream; the buffer is left exactly as the decoder left it.
    pub fn decode_next(&mut self) -> Result<Option<Bytes>, DeframeError> {
        let Some(buffer) = self.buffer.as_mut() else {
            return Ok(None);
        };

        let frame = self.decoder.decode(buffer)?;
        if buffer.is_empty() {
            // Fully drained: drop the allocation so the next append takes
            // the no-copy path
            self.buffer = None;
        }
        Ok(frame)
    }

    /// Decode all complete frames into `sink`, in order
    ///
    /// Stops at the first incomplete frame; an error leaves frames decoded
    /// so far in `sink`.
    pub fn drain_into(&mut self, sink: &mut Vec<Bytes>) -> Result<(), DeframeError> {
        while let Some(frame) = self.decode_next()? {
            sink.push(frame);
        }
        Ok(())
    }

    /// Check if any undecoded bytes are buffered
    pub fn has_pending(&self) -> bool {
        self.buffer.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// Number of undecoded bytes buffered
    pub fn pending_len(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn test_streaming_across_chunk_boundary() {
        let mut deframer = Deframer::new(1024);

        let mut data = frame(b"Frame 1");
        data.extend(frame(b"Frame 2"));

        deframer.append(data[..10].to_vec());
        assert!(deframer.decode_next().unwrap().is_none());
        assert!(deframer.has_pending());

        deframer.append(data[10..].to_vec());

        let first = deframer.decode_next().unwrap().unwrap();
        assert_eq!(&first[..], b"Frame 1");

        let second = deframer.decode_next().unwrap().unwrap();
        assert_eq!(&second[..], b"Frame 2");

        assert!(deframer.decode_next().unwrap().is_none());
        assert!(!deframer.has_pending());
    }

    #[test]
    fn test_two_frames_in_one_chunk() {
        let mut deframer = Deframer::new(1024);
        deframer.append(vec![0, 0, 0, 0, 1, b'A', 0, 0, 0, 0, 1, b'B']);

        let mut frames = Vec::new();
        deframer.drain_into(&mut frames).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], b"A");
        assert_eq!(&frames[1][..], b"B");
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut deframer = Deframer::new(1024);
        let data = frame(b"Hello");

        for &byte in &data[..data.len() - 1] {
            deframer.append(vec![byte]);
            assert!(deframer.decode_next().unwrap().is_none());
        }

        deframer.append(vec![data[data.len() - 1]]);
        let message = deframer.decode_next().unwrap().unwrap();
        assert_eq!(&message[..], b"Hello");
    }

    #[test]
    fn test_empty_chunk_append() {
        let mut deframer = Deframer::new(1024);
        deframer.append(Vec::new());
        assert!(!deframer.has_pending());
        assert!(deframer.decode_next().unwrap().is_none());

        deframer.append(frame(b"x"));
        let message = deframer.decode_next().unwrap().unwrap();
        assert_eq!(&message[..], b"x");
    }

    #[test]
    fn test_error_keeps_buffer() {
        let mut deframer = Deframer::new(4);
        deframer.append(frame(b"too big"));

        assert!(deframer.decode_next().is_err());
        // The stream is terminal, but the buffer state is retained
        assert!(deframer.has_pending());
        assert_eq!(deframer.pending_len(), frame(b"too big").len());
    }

    #[test]
    fn test_drain_into_stops_at_error() {
        let mut deframer = Deframer::new(4);
        let mut data = frame(b"ok");
        data.extend(frame(b"too big"));
        deframer.append(data);

        let mut frames = Vec::new();
        let err = deframer.drain_into(&mut frames).unwrap_err();
        assert!(matches!(err, DeframeError::MessageTooLarge { .. }));
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"ok");
    }

    #[test]
    fn test_compaction_bounds_buffer_growth() {
        let payload = [0x5Au8; 32];
        let mut stream = Vec::new();
        for _ in 0..10_000 {
            stream.extend(frame(&payload));
        }

        // Chunk size misaligned with the 37-byte frames: the buffer almost
        // always holds a partial frame, so the consumed prefix keeps
        // growing until the compaction trigger fires
        let mut deframer = Deframer::new(1024);
        let mut decoded = 0usize;
        let mut peak_capacity = 0;
        for chunk in stream.chunks(31) {
            deframer.append(chunk.to_vec());
            while let Some(message) = deframer.decode_next().unwrap() {
                assert_eq!(&message[..], &payload[..]);
                decoded += 1;
            }
            let capacity = deframer.buffer.as_ref().map_or(0, |b| b.capacity());
            peak_capacity = peak_capacity.max(capacity);
        }

        // The consumed prefix is discarded once it passes the floor and
        // half the capacity, so capacity settles just past the floor
        // instead of growing with the stream
        assert_eq!(decoded, 10_000);
        assert!(
            peak_capacity < 4 * 1024,
            "peak capacity {} not bounded",
            peak_capacity
        );
        assert!(!deframer.has_pending());
    }

    #[test]
    fn test_compaction_preserves_frames() {
        let mut deframer = Deframer::new(64 * 1024);

        // One chunk holding a frame bigger than the floor plus the start of
        // the next frame, so the consumed prefix ends up larger than half
        // the capacity while a partial frame is still pending
        let big = frame(&[0xAAu8; 3000]);
        let tail = frame(b"after compaction");
        let mut chunk = Vec::with_capacity(big.len() + 3);
        chunk.extend_from_slice(&big);
        chunk.extend_from_slice(&tail[..3]);
        deframer.append(chunk);

        let first = deframer.decode_next().unwrap().unwrap();
        assert_eq!(first.len(), 3000);

        // This append triggers the discard; the partial frame must survive
        deframer.append(tail[3..].to_vec());
        assert_eq!(deframer.buffer.as_ref().unwrap().reader_index(), 0);

        let second = deframer.decode_next().unwrap().unwrap();
        assert_eq!(&second[..], b"after compaction");
    }
}
