//! 遅延評価される文字チャンク列

use crate::buffer::CharChunk;
use crate::decoder::StreamingDecoder;
use crate::error::Error;
use crate::source::ByteSource;

/// 一度生成したチャンクを保持し続ける遅延チャンク列
///
/// 要素は初めて参照されたときに生成され、以降は再デコードせずに保持しているものを返す。
#[derive(Debug)]
pub struct LazyChunks<S> {
    realized: Vec<CharChunk>,
    producer: StreamingDecoder<S>,
}

impl<S: ByteSource> LazyChunks<S> {
    pub fn new(producer: StreamingDecoder<S>) -> Self {
        Self {
            realized: Vec::new(),
            producer,
        }
    }

    /// 生成済みのチャンク
    pub fn realized(&self) -> &[CharChunk] {
        &self.realized
    }

    /// すべてのチャンクを生成し終えたかどうか
    pub fn is_exhausted(&self) -> bool {
        self.producer.is_finished()
    }

    /// 内部のデコーダー
    pub fn producer(&self) -> &StreamingDecoder<S> {
        &self.producer
    }

    /// `index` 番目のチャンクを返す
    ///
    /// まだ生成されていなければ `index` 番目まで生成する。
    /// 列がそれより短ければ `None`。
    pub fn get(&mut self, index: usize) -> Result<Option<&CharChunk>, Error> {
        while self.realized.len() <= index {
            if !self.realize_next()? {
                return Ok(None);
            }
        }
        Ok(self.realized.get(index))
    }

    /// チャンクを 1 つ生成する
    ///
    /// 既に終端に達していれば `false`
    pub fn realize_next(&mut self) -> Result<bool, Error> {
        match self.producer.next_chunk()? {
            Some(chunk) => {
                self.realized.push(chunk);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 終端まですべて生成する
    pub fn force_all(&mut self) -> Result<&[CharChunk], Error> {
        while self.realize_next()? {}
        Ok(&self.realized)
    }

    /// クローズコールバックを実行する
    pub fn close(&mut self) {
        self.producer.close();
    }
}
