use crate::charset::Charset;
use crate::error::Error;
use crate::policy::ErrorPolicy;

/// デフォルトのチャンクサイズ (4KB)
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// デフォルトの文字コード
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// デコーダーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// 1 回の読み込みで要求するバイト数 (デフォルト: 4096)
    pub chunk_size: usize,
    /// 文字コード名 (デフォルト: UTF-8)
    pub encoding: String,
    /// 不正入力 / マッピング不能文字の扱い (デフォルト: replace)
    pub on_encoding_error: ErrorPolicy,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            encoding: DEFAULT_ENCODING.to_string(),
            on_encoding_error: ErrorPolicy::Replace,
        }
    }
}

impl DecoderConfig {
    /// デフォルト設定を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// チャンクサイズを設定
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// 文字コード名を設定
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// 不正入力の扱いを設定
    pub fn on_encoding_error(mut self, policy: ErrorPolicy) -> Self {
        self.on_encoding_error = policy;
        self
    }

    /// 不正入力の扱いを名前 (`report` / `ignore` / `replace`) で設定
    pub fn on_encoding_error_str(self, symbol: &str) -> Result<Self, Error> {
        Ok(self.on_encoding_error(ErrorPolicy::resolve(symbol)?))
    }

    /// 設定を検証して文字コードを解決する
    pub fn resolve_charset(&self) -> Result<Charset, Error> {
        if self.chunk_size == 0 {
            return Err(Error::Configuration(
                "chunk size must be positive".to_string(),
            ));
        }
        Charset::for_label(&self.encoding)
    }
}
