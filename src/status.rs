//! gRPC Status Codes
//!
//! デフレーミングエラーを gRPC ステータスへ対応付けます。
//! フレーミングエラーはストリームに対して致命的なので、呼び出し側は
//! ここで得た数値を `grpc-status` トレーラに載せて RPC を終了します。
//! See: https://grpc.github.io/grpc/core/md_doc_statuscodes.html

use std::fmt;

/// gRPC status codes the deframing error taxonomy maps onto
///
/// Only the codes the read path can produce are represented: an oversized
/// message (declared or decompressed) terminates the RPC with
/// `ResourceExhausted`; protocol and decompression failures terminate it
/// with `Internal`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrpcStatusCode {
    /// Resource has been exhausted (code 8)
    ResourceExhausted = 8,
    /// Internal error (code 13)
    Internal = 13,
}

impl GrpcStatusCode {
    /// Numeric value for the grpc-status trailer
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for GrpcStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
