//! # shiguredo_lazy_text
//!
//! バイトソースから遅延デコードする文字列ビュー
//!
//! ## 特徴
//!
//! - **遅延評価**: 参照された位置に必要な分だけ読み込んでデコードする
//! - **メモ化**: 一度デコードしたチャンクは保持し、再デコードしない
//! - **文字コード**: `encoding_rs` が対応する WHATWG Encoding Standard の文字コード
//! - **Sans I/O**: デコーダー本体は I/O を行わず、読み込みはバイトソースに任せる
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_lazy_text::{CharSequence, DecoderConfig, ErrorPolicy, LazyText};
//!
//! let config = DecoderConfig::new()
//!     .chunk_size(2)
//!     .on_encoding_error(ErrorPolicy::Replace);
//!
//! // std::io::Read から読み込む
//! let reader = std::io::Cursor::new("héllo".as_bytes().to_vec());
//! let text = LazyText::from_reader(reader, &config).unwrap();
//!
//! assert_eq!(text.char_at(0).unwrap(), 'h');
//! assert_eq!(text.length().unwrap(), 5);
//! assert_eq!(text.to_text().unwrap(), "héllo");
//! text.close();
//! ```

mod buffer;
mod charset;
mod config;
mod decoder;
mod error;
mod policy;
mod sequence;
mod source;
mod view;

pub use buffer::{ByteChunk, CharBuffer, CharChunk};
pub use charset::{Charset, CharsetDecoder, CoderResult, RawOutcome, classify};
pub use config::{DEFAULT_CHUNK_SIZE, DEFAULT_ENCODING, DecoderConfig};
pub use decoder::{MIN_CHAR_BUFFER_CAPACITY, StreamingDecoder};
pub use error::Error;
pub use policy::ErrorPolicy;
pub use sequence::LazyChunks;
pub use source::{ByteSource, CloseHandle, FnSource, ReadSource, SliceSource};
pub use view::{CharSequence, Chars, LazyText};
