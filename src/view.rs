//! 文字単位でアクセスできる読み取り専用ビュー

use std::cell::RefCell;
use std::io::Read;

use crate::config::DecoderConfig;
use crate::decoder::StreamingDecoder;
use crate::error::Error;
use crate::sequence::LazyChunks;
use crate::source::{ByteSource, CloseHandle, ReadSource};

/// 文字列のように扱える値
///
/// どの操作も、必要なだけバイトソースから読み込んでデコードする。
pub trait CharSequence {
    /// `index` 番目の文字
    ///
    /// 範囲外の場合はすべてデコードしてから `Error::IndexOutOfRange` を返す
    fn char_at(&self, index: usize) -> Result<char, Error>;

    /// 全体の文字数 (すべてデコードする)
    fn length(&self) -> Result<usize, Error>;

    /// 全体を文字列にする (すべてデコードする)
    fn to_text(&self) -> Result<String, Error>;

    /// クローズコールバックを実行する (2 回目以降は何もしない)
    fn close(&self);
}

/// 遅延チャンク列を連結したビュー
///
/// 単一スレッドからの利用を前提とする (`Sync` ではない)。
///
/// ```rust
/// use shiguredo_lazy_text::{CharSequence, DecoderConfig, LazyText, SliceSource};
///
/// let config = DecoderConfig::new().chunk_size(2);
/// let text = LazyText::new(SliceSource::new("héllo".as_bytes()), &config).unwrap();
///
/// assert_eq!(text.char_at(1).unwrap(), 'é');
/// assert_eq!(text.length().unwrap(), 5);
/// assert_eq!(text.to_text().unwrap(), "héllo");
/// ```
#[derive(Debug)]
pub struct LazyText<S> {
    chunks: RefCell<LazyChunks<S>>,
}

impl<S: ByteSource> LazyText<S> {
    /// バイトソースからビューを作成
    pub fn new(source: S, config: &DecoderConfig) -> Result<Self, Error> {
        Ok(Self::from_decoder(StreamingDecoder::new(source, config)?))
    }

    /// クローズコールバック付きでビューを作成
    pub fn with_close(
        source: S,
        config: &DecoderConfig,
        on_close: impl FnOnce() + 'static,
    ) -> Result<Self, Error> {
        let decoder = StreamingDecoder::new(source, config)?
            .with_close_handle(CloseHandle::new(on_close));
        Ok(Self::from_decoder(decoder))
    }

    /// デコーダーからビューを作成
    pub fn from_decoder(decoder: StreamingDecoder<S>) -> Self {
        Self {
            chunks: RefCell::new(LazyChunks::new(decoder)),
        }
    }

    /// `[start, end)` の範囲をコピーして返す
    ///
    /// `end` までしかデコードしない。
    /// `start > end` の場合は `index: start, length: end` の `Error::IndexOutOfRange`、
    /// `end` が全体の文字数を超える場合は `index: end` の `Error::IndexOutOfRange`。
    pub fn sub_sequence(&self, start: usize, end: usize) -> Result<String, Error> {
        if start > end {
            return Err(Error::IndexOutOfRange {
                index: start,
                length: end,
            });
        }

        let mut chunks = self.chunks.borrow_mut();
        let mut text = String::new();
        let mut position = 0;
        let mut i = 0;
        while position < end {
            match chunks.get(i)? {
                Some(chunk) => {
                    let len = chunk.len();
                    let from = start.saturating_sub(position).min(len);
                    let to = (end - position).min(len);
                    text.extend(&chunk.as_chars()[from..to]);
                    position += len;
                    i += 1;
                }
                None => {
                    return Err(Error::IndexOutOfRange {
                        index: end,
                        length: position,
                    });
                }
            }
        }
        Ok(text)
    }

    /// 先頭から 1 文字ずつ返すイテレーター
    pub fn chars(&self) -> Chars<'_, S> {
        Chars {
            text: self,
            chunk: 0,
            offset: 0,
            done: false,
        }
    }

    /// これまでに生成したチャンク数
    pub fn realized_chunks(&self) -> usize {
        self.chunks.borrow().realized().len()
    }

    /// すべてデコードし終えたかどうか
    pub fn is_exhausted(&self) -> bool {
        self.chunks.borrow().is_exhausted()
    }
}

impl<R: Read> LazyText<ReadSource<R>> {
    /// `std::io::Read` からビューを作成
    pub fn from_reader(reader: R, config: &DecoderConfig) -> Result<Self, Error> {
        Self::new(ReadSource::new(reader), config)
    }
}

impl<S: ByteSource> CharSequence for LazyText<S> {
    fn char_at(&self, index: usize) -> Result<char, Error> {
        let mut chunks = self.chunks.borrow_mut();
        let mut remaining = index;
        let mut i = 0;
        loop {
            match chunks.get(i)? {
                Some(chunk) => {
                    if let Some(c) = chunk.get(remaining) {
                        return Ok(c);
                    }
                    remaining -= chunk.len();
                    i += 1;
                }
                None => {
                    return Err(Error::IndexOutOfRange {
                        index,
                        length: index - remaining,
                    });
                }
            }
        }
    }

    fn length(&self) -> Result<usize, Error> {
        let mut chunks = self.chunks.borrow_mut();
        Ok(chunks.force_all()?.iter().map(|chunk| chunk.len()).sum())
    }

    fn to_text(&self) -> Result<String, Error> {
        let mut chunks = self.chunks.borrow_mut();
        Ok(chunks
            .force_all()?
            .iter()
            .flat_map(|chunk| chunk.iter())
            .collect())
    }

    fn close(&self) {
        self.chunks.borrow_mut().close();
    }
}

/// [`LazyText::chars`] のイテレーター
///
/// デコードエラーは 1 度だけ返し、その後は `None`
#[derive(Debug)]
pub struct Chars<'a, S> {
    text: &'a LazyText<S>,
    chunk: usize,
    offset: usize,
    done: bool,
}

impl<S: ByteSource> Iterator for Chars<'_, S> {
    type Item = Result<char, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut chunks = self.text.chunks.borrow_mut();
        loop {
            match chunks.get(self.chunk) {
                Ok(Some(chunk)) => {
                    if let Some(c) = chunk.get(self.offset) {
                        self.offset += 1;
                        return Some(Ok(c));
                    }
                    self.chunk += 1;
                    self.offset = 0;
                }
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::policy::ErrorPolicy;
    use crate::source::SliceSource;

    fn text(s: &str, chunk_size: usize) -> LazyText<SliceSource> {
        LazyText::new(
            SliceSource::new(s),
            &DecoderConfig::new().chunk_size(chunk_size),
        )
        .unwrap()
    }

    #[test]
    fn test_char_at_walks_chunks() {
        let t = text("héllo", 2);
        assert_eq!(t.char_at(0).unwrap(), 'h');
        assert_eq!(t.char_at(1).unwrap(), 'é');
        assert_eq!(t.char_at(4).unwrap(), 'o');
        assert_eq!(t.length().unwrap(), 5);
        assert_eq!(t.to_text().unwrap(), "héllo");
    }

    #[test]
    fn test_char_at_is_lazy() {
        let t = text("abcdefgh", 2);
        assert_eq!(t.char_at(2).unwrap(), 'c');
        assert_eq!(t.realized_chunks(), 2);
        assert!(!t.is_exhausted());
    }

    #[test]
    fn test_char_at_out_of_range() {
        let t = text("héllo", 2);
        assert_eq!(
            t.char_at(5).unwrap_err(),
            Error::IndexOutOfRange {
                index: 5,
                length: 5
            }
        );
        assert_eq!(
            t.char_at(usize::MAX).unwrap_err(),
            Error::IndexOutOfRange {
                index: usize::MAX,
                length: 5
            }
        );
        assert!(t.is_exhausted());
    }

    #[test]
    fn test_empty() {
        let t = text("", 4);
        assert_eq!(t.length().unwrap(), 0);
        assert_eq!(t.to_text().unwrap(), "");
        assert!(t.char_at(0).is_err());
    }

    #[test]
    fn test_sub_sequence() {
        let t = text("héllo wörld", 3);
        assert_eq!(t.sub_sequence(1, 4).unwrap(), "éll");
        assert_eq!(t.sub_sequence(6, 11).unwrap(), "wörld");
        assert_eq!(t.sub_sequence(3, 3).unwrap(), "");
        assert_eq!(
            t.sub_sequence(4, 2).unwrap_err(),
            Error::IndexOutOfRange {
                index: 4,
                length: 2
            }
        );
        assert_eq!(
            t.sub_sequence(0, 12).unwrap_err(),
            Error::IndexOutOfRange {
                index: 12,
                length: 11
            }
        );
    }

    #[test]
    fn test_sub_sequence_is_lazy() {
        let t = text("abcdefgh", 2);
        assert_eq!(t.sub_sequence(0, 3).unwrap(), "abc");
        assert_eq!(t.realized_chunks(), 2);
    }

    #[test]
    fn test_chars() {
        let t = text("héllo", 1);
        let chars: Result<String, Error> = t.chars().collect();
        assert_eq!(chars.unwrap(), "héllo");
    }

    #[test]
    fn test_chars_error() {
        let t = LazyText::new(
            SliceSource::new(b"ab\x80".to_vec()),
            &DecoderConfig::new()
                .chunk_size(2)
                .on_encoding_error(ErrorPolicy::Report),
        )
        .unwrap();
        let mut chars = t.chars();
        assert_eq!(chars.next(), Some(Ok('a')));
        assert_eq!(chars.next(), Some(Ok('b')));
        assert!(matches!(chars.next(), Some(Err(Error::MalformedInput { .. }))));
        assert_eq!(chars.next(), None);
    }

    #[test]
    fn test_close_idempotent() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let t = LazyText::with_close(SliceSource::new("abc"), &DecoderConfig::new(), move || {
            c.set(c.get() + 1)
        })
        .unwrap();
        t.close();
        t.close();
        assert_eq!(count.get(), 1);
        // 明示的に閉じた後にデコードし終えても再実行されない
        assert_eq!(t.to_text().unwrap(), "abc");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_from_reader() {
        let reader = std::io::Cursor::new("こんにちは".as_bytes().to_vec());
        let t = LazyText::from_reader(reader, &DecoderConfig::new().chunk_size(4)).unwrap();
        assert_eq!(t.length().unwrap(), 5);
        assert_eq!(t.char_at(4).unwrap(), 'は');
    }
}
