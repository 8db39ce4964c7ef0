//! kasumi: Streaming gRPC Message Deframer
//!
//! gRPC の length-prefixed メッセージフレーミングを、トランスポートから
//! 任意のチャンク境界で届くバイトストリームから復元します。
//! HTTP/2 接続管理やサービスディスパッチには依存しない、
//! ストリーム毎の純粋なデコーダとして動作します。
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
//! ## 機能
//!
//! - **Framing**: 5-byte gRPC メッセージフレーミングの単段デコード
//! - **Deframing**: チャンク蓄積と読み取り済みプレフィックスのコンパクション
//! - **Compression**: gzip/deflate 解凍サポート（出力サイズ上限付き）
//! - **Limits**: ペイロード確保前のメッセージサイズ上限チェック
//!
//! ## 使用例
//!
//! ```rust
//! use kasumi::Deframer;
//!
//! let mut deframer = Deframer::new(4 * 1024 * 1024);
//! deframer.append(vec![0, 0, 0, 0, 5, b'H', b'e', b'l', b'l', b'o']);
//!
//! let message = deframer.decode_next().unwrap().unwrap();
//! assert_eq!(&message[..], b"Hello");
//! assert!(deframer.decode_next().unwrap().is_none());
//! ```

pub mod buffer;
pub mod compression;
pub mod config;
pub mod deframer;
pub mod framing;
pub mod status;

// Re-exports
pub use buffer::ReadBuffer;
pub use compression::{CompressionEncoding, Decompressor, DeflateDecompressor, GzipDecompressor};
pub use config::DeframerConfig;
pub use deframer::Deframer;
pub use framing::{DeframeError, FrameDecoder, DEFAULT_MAX_MESSAGE_SIZE, FRAME_HEADER_SIZE};
pub use status::GrpcStatusCode;
