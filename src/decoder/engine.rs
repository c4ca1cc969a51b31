//! ストリーミングデコーダー

use std::iter::FusedIterator;

use crate::buffer::{ByteChunk, CharBuffer, CharChunk};
use crate::charset::{Charset, CharsetDecoder};
use crate::config::DecoderConfig;
use crate::error::Error;
use crate::source::{ByteSource, CloseHandle};

use super::phase::DecodePhase;

/// 出力バッファの最小容量 (UTF-8 バイト数)
///
/// どの文字コードでも 1 ステップで少なくとも 1 文字は書き込める大きさ
pub const MIN_CHAR_BUFFER_CAPACITY: usize = 16;

/// バイトソースから文字チャンクを 1 つずつ生成するデコーダー
///
/// 前回のステップで消費しきれなかったバイト (leftover) は、
/// 新しいバイトを読む前に必ず先にデコードする。
/// そのため読み込みの境界がマルチバイト文字の途中に来ても正しくデコードできる。
///
/// ```rust
/// use shiguredo_lazy_text::{DecoderConfig, SliceSource, StreamingDecoder};
///
/// let config = DecoderConfig::new().chunk_size(2);
/// let source = SliceSource::new("héllo".as_bytes());
/// let decoder = StreamingDecoder::new(source, &config).unwrap();
///
/// let mut text = String::new();
/// for chunk in decoder {
///     text.push_str(&chunk.unwrap().to_string());
/// }
/// assert_eq!(text, "héllo");
/// ```
#[derive(Debug)]
pub struct StreamingDecoder<S> {
    source: S,
    state: CharsetDecoder,
    chunk_size: usize,
    leftover: Option<ByteChunk>,
    on_close: CloseHandle,
    phase: DecodePhase,
}

impl<S: ByteSource> StreamingDecoder<S> {
    /// 新しいデコーダーを作成
    ///
    /// 文字コード名やチャンクサイズが不正な場合は `Error::Configuration`
    pub fn new(source: S, config: &DecoderConfig) -> Result<Self, Error> {
        let charset = config.resolve_charset()?;
        Ok(Self {
            source,
            state: CharsetDecoder::new(charset, config.on_encoding_error),
            chunk_size: config.chunk_size,
            leftover: None,
            on_close: CloseHandle::noop(),
            phase: DecodePhase::Running,
        })
    }

    /// クローズコールバックを設定
    pub fn with_close_handle(mut self, on_close: CloseHandle) -> Self {
        self.on_close = on_close;
        self
    }

    /// クローズコールバックをクロージャーで設定
    pub fn on_close(self, f: impl FnOnce() + 'static) -> Self {
        self.with_close_handle(CloseHandle::new(f))
    }

    /// 文字コード
    pub fn charset(&self) -> Charset {
        self.state.charset()
    }

    /// 1 回の読み込みで要求するバイト数
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// デコーダーが消費したバイト数
    pub fn consumed(&self) -> usize {
        self.state.consumed()
    }

    /// 持ち越し中のバイト数
    pub fn leftover_len(&self) -> usize {
        self.leftover.as_ref().map_or(0, ByteChunk::remaining)
    }

    /// 終端のチャンクを返し終えたかどうか
    pub fn is_finished(&self) -> bool {
        self.phase == DecodePhase::Finished
    }

    /// エラーで停止しているかどうか
    pub fn is_failed(&self) -> bool {
        matches!(self.phase, DecodePhase::Failed(_))
    }

    /// 次の文字チャンクを生成する
    ///
    /// # 戻り値
    /// - `Ok(Some(chunk))`: 次のチャンク (空のこともある)
    /// - `Ok(None)`: 終端のチャンクを返し終えた
    /// - `Err(e)`: エラー。以降は同じエラーを返し続ける
    pub fn next_chunk(&mut self) -> Result<Option<CharChunk>, Error> {
        match &self.phase {
            DecodePhase::Running => {}
            DecodePhase::Finished => return Ok(None),
            DecodePhase::Failed(e) => return Err(e.clone()),
        }

        match self.step() {
            Ok(chunk) => Ok(Some(chunk)),
            Err(e) => {
                tracing::debug!(error = %e, consumed = self.state.consumed(), "decode failed");
                self.phase = DecodePhase::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// クローズコールバックを実行する (2 回目以降は何もしない)
    pub fn close(&mut self) {
        if self.on_close.close() {
            tracing::debug!(consumed = self.state.consumed(), "byte source closed");
        }
    }

    fn step(&mut self) -> Result<CharChunk, Error> {
        let mut output = CharBuffer::with_capacity(self.output_capacity());

        // leftover だけで出力バッファが埋まった場合は、そこまでを返して次の呼び出しで続きを処理する
        if let Some(leftover) = self.leftover.as_mut() {
            if self.state.decode_step(leftover, &mut output)?.is_overflow() {
                tracing::trace!(
                    leftover = leftover.remaining(),
                    written = output.written(),
                    "output full while decoding leftover"
                );
                return Ok(output.flip());
            }
        }

        match self.source.pull(self.chunk_size)? {
            Some(fresh) => {
                tracing::trace!(bytes = fresh.remaining(), "pulled");
                let mut input = match self.leftover.take() {
                    Some(leftover) if leftover.has_remaining() => {
                        ByteChunk::merge(&leftover, &fresh)
                    }
                    _ => fresh,
                };
                self.state.decode_step(&mut input, &mut output)?;
                self.leftover = input.has_remaining().then_some(input);
                Ok(output.flip())
            }
            None => {
                let mut leftover = self.leftover.take();
                self.state.flush(leftover.as_mut(), &mut output)?;
                self.phase = DecodePhase::Finished;
                self.close();
                Ok(output.flip())
            }
        }
    }

    /// ceil((leftover + chunk_size) / 平均文字数) を出力バッファの容量とする
    ///
    /// あくまで見積もりなので、足りない分は leftover として次に持ち越す
    fn output_capacity(&self) -> usize {
        let bytes = self.leftover_len().saturating_add(self.chunk_size);
        let estimated = (bytes as f64 / f64::from(self.charset().average_chars_per_byte())).ceil();
        (estimated as usize).max(MIN_CHAR_BUFFER_CAPACITY)
    }
}

impl<S: ByteSource> Iterator for StreamingDecoder<S> {
    type Item = Result<CharChunk, Error>;

    /// エラーは 1 度だけ返し、その後は `None`
    fn next(&mut self) -> Option<Self::Item> {
        if self.is_failed() {
            return None;
        }
        self.next_chunk().transpose()
    }
}

impl<S: ByteSource> FusedIterator for StreamingDecoder<S> {}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::policy::ErrorPolicy;
    use crate::source::{FnSource, SliceSource};

    fn collect(decoder: StreamingDecoder<impl ByteSource>) -> Result<String, Error> {
        let mut text = String::new();
        for chunk in decoder {
            text.push_str(&chunk?.to_string());
        }
        Ok(text)
    }

    #[test]
    fn test_hello_with_small_chunks() {
        // h=1, é=2, l=1, l=1, o=1
        for chunk_size in 1..=7 {
            let config = DecoderConfig::new().chunk_size(chunk_size);
            let decoder = StreamingDecoder::new(SliceSource::new("héllo"), &config).unwrap();
            assert_eq!(collect(decoder).unwrap(), "héllo", "chunk_size={}", chunk_size);
        }
    }

    #[test]
    fn test_split_three_byte_char() {
        // "あ" = E3 81 82 を 1 + 2 で読み込む
        let source = SliceSource::new("あ").with_pull_sizes(vec![1, 2]);
        let decoder = StreamingDecoder::new(source, &DecoderConfig::new()).unwrap();
        assert_eq!(collect(decoder).unwrap(), "あ");
    }

    #[test]
    fn test_empty_source_yields_single_terminal_chunk() {
        let mut decoder =
            StreamingDecoder::new(SliceSource::new(Vec::new()), &DecoderConfig::new()).unwrap();
        let chunk = decoder.next_chunk().unwrap().unwrap();
        assert!(chunk.is_empty());
        assert!(decoder.is_finished());
        assert_eq!(decoder.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_close_called_once_on_exhaustion() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let mut decoder = StreamingDecoder::new(SliceSource::new("abc"), &DecoderConfig::new())
            .unwrap()
            .on_close(move || c.set(c.get() + 1));

        while decoder.next_chunk().unwrap().is_some() {}
        assert_eq!(count.get(), 1);

        // 終端後の呼び出しや明示的な close でも再実行されない
        assert_eq!(decoder.next_chunk().unwrap(), None);
        decoder.close();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_requests_chunk_size() {
        let requested = Rc::new(RefCell::new(Vec::new()));
        let r = requested.clone();
        let mut data = vec![b"abc".to_vec()];
        let source = FnSource::new(move |max| {
            r.borrow_mut().push(max);
            data.pop()
        });
        let config = DecoderConfig::new().chunk_size(7);
        let decoder = StreamingDecoder::new(source, &config).unwrap();
        assert_eq!(collect(decoder).unwrap(), "abc");
        assert_eq!(*requested.borrow(), vec![7, 7]);
    }

    #[test]
    fn test_leftover_overflow_retry() {
        // latin1 の 0xE9 は UTF-8 で 2 バイトになるので見積もりが足りず leftover が残る
        let config = DecoderConfig::new().chunk_size(32).encoding("latin1");
        let mut decoder =
            StreamingDecoder::new(SliceSource::new(vec![0xE9; 64]), &config).unwrap();

        let first = decoder.next_chunk().unwrap().unwrap();
        assert!(!first.is_empty());
        assert!(decoder.leftover_len() > 0);

        let mut text = first.to_string();
        while let Some(chunk) = decoder.next_chunk().unwrap() {
            text.push_str(&chunk.to_string());
        }
        assert_eq!(text, "é".repeat(64));
        assert_eq!(decoder.consumed(), 64);
    }

    #[test]
    fn test_malformed_report_is_sticky() {
        let config = DecoderConfig::new()
            .chunk_size(2)
            .on_encoding_error(ErrorPolicy::Report);
        let mut decoder =
            StreamingDecoder::new(SliceSource::new(b"ab\x80cd".to_vec()), &config).unwrap();

        assert_eq!(decoder.next_chunk().unwrap().unwrap().to_string(), "ab");
        let expected = Error::MalformedInput {
            offset: 2,
            length: 1,
        };
        assert_eq!(decoder.next_chunk().unwrap_err(), expected);
        assert_eq!(decoder.next_chunk().unwrap_err(), expected);
        assert!(decoder.is_failed());
    }

    #[test]
    fn test_iterator_fused_after_error() {
        let config = DecoderConfig::new().on_encoding_error(ErrorPolicy::Report);
        let mut decoder =
            StreamingDecoder::new(SliceSource::new(vec![0x80]), &config).unwrap();
        assert!(matches!(decoder.next(), Some(Err(Error::MalformedInput { .. }))));
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_policy_replace_and_ignore() {
        let replace = StreamingDecoder::new(
            SliceSource::new(b"a\x80b".to_vec()),
            &DecoderConfig::new().on_encoding_error(ErrorPolicy::Replace),
        )
        .unwrap();
        assert_eq!(collect(replace).unwrap(), "a\u{FFFD}b");

        let ignore = StreamingDecoder::new(
            SliceSource::new(b"a\x80b".to_vec()),
            &DecoderConfig::new().on_encoding_error(ErrorPolicy::Ignore),
        )
        .unwrap();
        assert_eq!(collect(ignore).unwrap(), "ab");
    }

    #[test]
    fn test_truncated_tail_flushed() {
        let decoder = StreamingDecoder::new(
            SliceSource::new(b"ok\xE3\x81".to_vec()),
            &DecoderConfig::new().chunk_size(1),
        )
        .unwrap();
        assert_eq!(collect(decoder).unwrap(), "ok\u{FFFD}");
    }

    #[test]
    fn test_source_error_is_sticky() {
        let mut calls = 0;
        let source = FnSourceWithError(move || {
            calls += 1;
            calls
        });
        let mut decoder = StreamingDecoder::new(source, &DecoderConfig::new()).unwrap();
        assert_eq!(decoder.next_chunk().unwrap().unwrap().to_string(), "x");
        assert_eq!(
            decoder.next_chunk().unwrap_err(),
            Error::Source("broken pipe".to_string())
        );
        assert_eq!(
            decoder.next_chunk().unwrap_err(),
            Error::Source("broken pipe".to_string())
        );
    }

    struct FnSourceWithError<F>(F);

    impl<F: FnMut() -> usize> ByteSource for FnSourceWithError<F> {
        fn pull(&mut self, _max_bytes: usize) -> Result<Option<ByteChunk>, Error> {
            if (self.0)() == 1 {
                Ok(Some(ByteChunk::from(&b"x"[..])))
            } else {
                Err(Error::Source("broken pipe".to_string()))
            }
        }
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            StreamingDecoder::new(SliceSource::new("a"), &DecoderConfig::new().encoding("nope")),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            StreamingDecoder::new(SliceSource::new("a"), &DecoderConfig::new().chunk_size(0)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_utf16le() {
        let bytes: Vec<u8> = "日本語"
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        let config = DecoderConfig::new().chunk_size(3).encoding("utf-16le");
        let decoder = StreamingDecoder::new(SliceSource::new(bytes), &config).unwrap();
        assert_eq!(collect(decoder).unwrap(), "日本語");
    }
}
