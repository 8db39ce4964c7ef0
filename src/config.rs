//! デフレーマ設定
//!
//! TOML 設定からストリーム毎のデフレーマを構築します。
//! 圧縮アルゴリズムのネゴシエーション自体は上位層の責務で、
//! ここでは選択済みのエンコーディング名だけを受け取ります。

use serde::Deserialize;

use crate::compression::CompressionEncoding;
use crate::deframer::Deframer;
use crate::framing::DEFAULT_MAX_MESSAGE_SIZE;

/// デフォルト値関数
fn default_max_message_size() -> usize {
    DEFAULT_MAX_MESSAGE_SIZE
}

/// Per-stream deframer configuration
///
/// ```toml
/// max_message_size = 4194304
/// encoding = "gzip"
/// ```
#[derive(Deserialize, Clone, Debug)]
pub struct DeframerConfig {
    /// 1 メッセージの最大サイズ（バイト）
    ///
    /// 宣言長がこの値を超えるフレームはペイロード確保前に
    /// ResourceExhausted で失敗します。
    ///
    /// デフォルト: 4MB
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,

    /// 受信メッセージのエンコーディング
    ///
    /// - `"identity"`: 非圧縮（デフォルト）。圧縮フラグ付きフレームは
    ///   Internal エラーになります。
    /// - `"gzip"` / `"deflate"`: flate2 による解凍
    #[serde(default)]
    pub encoding: CompressionEncoding,
}

impl Default for DeframerConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            encoding: CompressionEncoding::default(),
        }
    }
}

impl DeframerConfig {
    /// Build a deframer for one stream from this configuration
    pub fn build(&self) -> Deframer {
        ftlog::debug!(
            "[gRPC] deframer configured: max {} bytes, encoding {}",
            self.max_message_size,
            self.encoding
        );
        match self.encoding.decompressor() {
            Some(decompressor) => {
                Deframer::with_decompressor(self.max_message_size, decompressor)
            }
            None => Deframer::new(self.max_message_size),
        }
    }
}
