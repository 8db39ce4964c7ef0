//! 受信バッファ
//!
//! デフレーマが所有するローリングバッファ。書き込みは末尾への追記、
//! 読み取りはカーソル（reader index）の前進で表現します。
//! カーソルより前のバイトは消費済みで、`discard_read_bytes` により
//! memmove で破棄できます（コンパクション）。

/// Rolling byte buffer with an explicit read cursor
///
/// Bytes before the cursor are consumed; bytes at or after it are pending.
/// Appending never moves the cursor, so a decoder that only peeks at the
/// readable region and advances on success gets clean "no progress"
/// semantics on a short read.
#[derive(Debug, Default)]
pub struct ReadBuffer {
    data: Vec<u8>,
    read_pos: usize,
}

impl ReadBuffer {
    /// Create a buffer that takes ownership of `data` with the cursor at 0
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, read_pos: 0 }
    }

    /// Number of readable (pending) bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.read_pos
    }

    /// Check if all appended bytes have been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The pending region, from the cursor to the end of the buffer
    pub fn readable(&self) -> &[u8] {
        &self.data[self.read_pos..]
    }

    /// Current cursor position (size of the consumed prefix)
    pub fn reader_index(&self) -> usize {
        self.read_pos
    }

    /// Total capacity of the underlying allocation
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Advance the cursor past `n` consumed bytes
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the number of readable bytes.
    pub fn advance(&mut self, n: usize) {
        assert!(n <= self.remaining());
        self.read_pos += n;
    }

    /// Append a chunk after the readable region
    pub fn extend_from_slice(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    /// Discard the consumed prefix and rewind the cursor to 0
    ///
    /// Moves the readable region to offset 0 and shrinks the buffer length.
    /// Readable bytes are unchanged.
    pub fn discard_read_bytes(&mut self) {
        if self.read_pos == 0 {
            return;
        }
        let remaining = self.remaining();
        self.data.copy_within(self.read_pos.., 0);
        self.data.truncate(remaining);
        self.read_pos = 0;
    }
}
