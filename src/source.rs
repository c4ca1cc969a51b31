//! バイトソースとクローズコールバック

use std::fmt;
use std::io::{ErrorKind, Read};

use crate::buffer::ByteChunk;
use crate::error::Error;

/// 読み込み要求に応じてバイト列を返すソース
///
/// バイトの順序は呼び出しをまたいで保たれなければならない。
pub trait ByteSource {
    /// 最大 `max_bytes` バイトを読み込む
    ///
    /// # 戻り値
    /// - `Some(chunk)`: 読み込んだバイト列 (空でもよい)
    /// - `None`: 終端
    fn pull(&mut self, max_bytes: usize) -> Result<Option<ByteChunk>, Error>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn pull(&mut self, max_bytes: usize) -> Result<Option<ByteChunk>, Error> {
        (**self).pull(max_bytes)
    }
}

/// クロージャーをバイトソースとして使う
///
/// ```rust
/// use shiguredo_lazy_text::{ByteSource, FnSource};
///
/// let mut data = Some(b"hello".to_vec());
/// let mut source = FnSource::new(move |_max| data.take());
/// assert_eq!(source.pull(16).unwrap().unwrap().as_slice(), b"hello");
/// assert!(source.pull(16).unwrap().is_none());
/// ```
pub struct FnSource<F> {
    f: F,
}

impl<F> FnSource<F>
where
    F: FnMut(usize) -> Option<Vec<u8>>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ByteSource for FnSource<F>
where
    F: FnMut(usize) -> Option<Vec<u8>>,
{
    fn pull(&mut self, max_bytes: usize) -> Result<Option<ByteChunk>, Error> {
        Ok((self.f)(max_bytes).map(ByteChunk::new))
    }
}

impl<F> fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}

/// `std::io::Read` をバイトソースとして使う
#[derive(Debug)]
pub struct ReadSource<R> {
    reader: R,
}

impl<R: Read> ReadSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// 内部のリーダーを取り出す
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for ReadSource<R> {
    fn pull(&mut self, max_bytes: usize) -> Result<Option<ByteChunk>, Error> {
        let mut buf = vec![0u8; max_bytes];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Some(ByteChunk::new(buf)));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// メモリ上のバイト列を返すソース
///
/// 読み込みサイズの列を指定すると、要求サイズとの小さい方ずつ返す。
/// 列は使い切ったら先頭に戻る。
#[derive(Debug, Clone, Default)]
pub struct SliceSource {
    data: Vec<u8>,
    position: usize,
    pull_sizes: Vec<usize>,
    pulls: usize,
}

impl SliceSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// 1 回ごとの読み込みサイズを指定する
    ///
    /// 0 は 1 として扱う
    pub fn with_pull_sizes(mut self, pull_sizes: Vec<usize>) -> Self {
        self.pull_sizes = pull_sizes;
        self
    }

    /// これまでの pull 回数 (終端の通知を含む)
    pub fn pulls(&self) -> usize {
        self.pulls
    }
}

impl ByteSource for SliceSource {
    fn pull(&mut self, max_bytes: usize) -> Result<Option<ByteChunk>, Error> {
        let index = self.pulls;
        self.pulls += 1;

        if self.position >= self.data.len() {
            return Ok(None);
        }

        let mut len = max_bytes;
        if !self.pull_sizes.is_empty() {
            len = len.min(self.pull_sizes[index % self.pull_sizes.len()].max(1));
        }
        let end = self.data.len().min(self.position + len);
        let chunk = ByteChunk::from(&self.data[self.position..end]);
        self.position = end;
        Ok(Some(chunk))
    }
}

/// クローズコールバック
///
/// 何度 `close()` を呼んでも実行されるのは最初の 1 回だけ。
#[derive(Default)]
pub struct CloseHandle {
    callback: Option<Box<dyn FnOnce()>>,
}

impl CloseHandle {
    pub fn new(callback: impl FnOnce() + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// 何もしないコールバック
    pub fn noop() -> Self {
        Self::default()
    }

    /// まだ実行されていなければ実行する
    ///
    /// 実行した場合は `true` を返す
    pub fn close(&mut self) -> bool {
        match self.callback.take() {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// 既に閉じられているかどうか (noop は常に閉じられている扱い)
    pub fn is_closed(&self) -> bool {
        self.callback.is_none()
    }
}

impl fmt::Debug for CloseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}
