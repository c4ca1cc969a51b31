//! バイトチャンクと文字チャンク

use std::fmt;

/// 読み込み位置を持つバイト列
///
/// `position` より前は消費済み。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteChunk {
    data: Vec<u8>,
    position: usize,
}

impl ByteChunk {
    /// 新しいバイトチャンクを作成
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// 空のバイトチャンクを作成
    pub fn empty() -> Self {
        Self::default()
    }

    /// 未読バイト数
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// 未読バイトがあるかどうか
    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// 読み込み位置
    pub fn position(&self) -> usize {
        self.position
    }

    /// 未読バイトを取得
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.position..]
    }

    /// 読み込み位置を進める
    ///
    /// 未読バイト数を超える場合は末尾で止まる
    pub fn advance(&mut self, n: usize) {
        self.position = self.position.saturating_add(n).min(self.data.len());
    }

    /// 前回の残りバイトと新しく読み込んだバイトを連結する
    ///
    /// `leftover` の未読部分が先、`fresh` の未読部分が後になる。
    /// 戻り値の読み込み位置は先頭。
    pub fn merge(leftover: &ByteChunk, fresh: &ByteChunk) -> ByteChunk {
        let mut data = Vec::with_capacity(leftover.remaining() + fresh.remaining());
        data.extend_from_slice(leftover.as_slice());
        data.extend_from_slice(fresh.as_slice());
        ByteChunk::new(data)
    }
}

impl From<Vec<u8>> for ByteChunk {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for ByteChunk {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

/// 書き込み中の文字バッファ
///
/// 容量は UTF-8 のバイト数で数える。
/// 書き込み領域はあらかじめ NUL で埋めておき、デコーダーがその上に書き込む。
#[derive(Debug)]
pub struct CharBuffer {
    buf: String,
    written: usize,
}

impl CharBuffer {
    /// 指定した容量 (UTF-8 バイト数) のバッファを作成
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: "\0".repeat(capacity),
            written: 0,
        }
    }

    /// 容量
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// 書き込み済みバイト数
    pub fn written(&self) -> usize {
        self.written
    }

    /// 空き容量
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.written
    }

    /// 書き込み済みの文字列
    pub fn as_str(&self) -> &str {
        &self.buf[..self.written]
    }

    /// 空き領域
    ///
    /// `written` は常に文字境界、空き領域は NUL のみなのでスライスは失敗しない
    pub(crate) fn spare_mut(&mut self) -> &mut str {
        &mut self.buf[self.written..]
    }

    /// 書き込み位置を進める
    pub(crate) fn advance(&mut self, n: usize) {
        self.written = (self.written + n).min(self.buf.len());
    }

    /// 空き容量が `additional` バイト以上になるよう拡張する
    pub(crate) fn reserve_remaining(&mut self, additional: usize) {
        let remaining = self.remaining();
        if remaining < additional {
            self.buf
                .extend(std::iter::repeat_n('\0', additional - remaining));
        }
    }

    /// 読み取り可能な文字チャンクに変換する
    pub fn flip(self) -> CharChunk {
        CharChunk::from(self.as_str())
    }
}

/// デコード済みの文字チャンク (読み取り専用)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharChunk {
    chars: Box<[char]>,
}

impl CharChunk {
    /// 文字数
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// 指定位置の文字
    pub fn get(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// 文字のスライス
    pub fn as_chars(&self) -> &[char] {
        &self.chars
    }

    /// 文字のイテレーター
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }
}

impl From<&str> for CharChunk {
    fn from(s: &str) -> Self {
        Self {
            chars: s.chars().collect(),
        }
    }
}

impl fmt::Display for CharChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars.iter() {
            fmt::Write::write_char(f, *c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_chunk_advance() {
        let mut chunk = ByteChunk::new(b"abcdef".to_vec());
        assert_eq!(chunk.remaining(), 6);
        chunk.advance(2);
        assert_eq!(chunk.position(), 2);
        assert_eq!(chunk.as_slice(), b"cdef");
        chunk.advance(100);
        assert_eq!(chunk.remaining(), 0);
        assert!(!chunk.has_remaining());
    }

    #[test]
    fn test_merge_order() {
        let mut leftover = ByteChunk::new(vec![0x01, 0xE3, 0x81]);
        leftover.advance(1);
        let fresh = ByteChunk::new(vec![0x82, b'x']);

        let merged = ByteChunk::merge(&leftover, &fresh);
        assert_eq!(merged.position(), 0);
        assert_eq!(merged.as_slice(), &[0xE3, 0x81, 0x82, b'x']);
        // 元のチャンクは変更されない
        assert_eq!(leftover.remaining(), 2);
        assert_eq!(fresh.remaining(), 2);
    }

    #[test]
    fn test_merge_empty_fresh() {
        let leftover = ByteChunk::new(vec![0xC3]);
        let merged = ByteChunk::merge(&leftover, &ByteChunk::empty());
        assert_eq!(merged.as_slice(), &[0xC3]);
    }

    #[test]
    fn test_char_buffer_fill_and_flip() {
        let mut buf = CharBuffer::with_capacity(8);
        assert_eq!(buf.capacity(), 8);
        let spare = buf.spare_mut();
        assert_eq!(spare.len(), 8);

        // NUL 埋めの領域に書き込んだ想定
        buf.buf.replace_range(0..3, "hé");
        buf.advance(3);
        assert_eq!(buf.as_str(), "hé");
        assert_eq!(buf.remaining(), 5);

        let chunk = buf.flip();
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.get(1), Some('é'));
        assert_eq!(chunk.get(2), None);
        assert_eq!(chunk.to_string(), "hé");
    }

    #[test]
    fn test_char_buffer_reserve() {
        let mut buf = CharBuffer::with_capacity(2);
        buf.advance(2);
        assert_eq!(buf.remaining(), 0);
        buf.reserve_remaining(4);
        assert_eq!(buf.remaining(), 4);
        assert_eq!(buf.capacity(), 6);
        // 十分な空きがあれば何もしない
        buf.reserve_remaining(1);
        assert_eq!(buf.capacity(), 6);
    }
}
