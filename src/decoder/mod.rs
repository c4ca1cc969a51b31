//! ストリーミングデコーダーモジュール
//!
//! Sans I/O の文字コードデコーダーを、バイトソースからの読み込みと組み合わせて
//! 文字チャンクを 1 つずつ生成する。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_lazy_text::{DecoderConfig, ErrorPolicy, SliceSource, StreamingDecoder};
//!
//! let config = DecoderConfig::new()
//!     .chunk_size(1)
//!     .on_encoding_error(ErrorPolicy::Report);
//! let mut decoder = StreamingDecoder::new(SliceSource::new("あい".as_bytes()), &config).unwrap();
//!
//! let mut text = String::new();
//! while let Some(chunk) = decoder.next_chunk().unwrap() {
//!     text.push_str(&chunk.to_string());
//! }
//! assert_eq!(text, "あい");
//! assert!(decoder.is_finished());
//! ```

mod engine;
mod phase;

// 公開 API
pub use engine::{MIN_CHAR_BUFFER_CAPACITY, StreamingDecoder};
