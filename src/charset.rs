//! 文字コードデコーダー (Sans I/O)
//!
//! `encoding_rs` のデコーダーをラップし、バッファからバッファへの変換だけを行う。
//! バイトソースからの読み込みはここでは行わない。

use std::fmt;

use encoding_rs::{CoderResult as RawCoderResult, Decoder, DecoderResult, Encoding};

use crate::buffer::{ByteChunk, CharBuffer};
use crate::error::Error;
use crate::policy::ErrorPolicy;

/// 文字コード
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    encoding: &'static Encoding,
}

impl Charset {
    /// ラベルから文字コードを解決する
    ///
    /// WHATWG Encoding Standard のラベル (`utf-8`, `shift_jis`, `latin1` など) を受け付ける
    pub fn for_label(label: &str) -> Result<Self, Error> {
        Encoding::for_label(label.trim().as_bytes())
            .map(|encoding| Self { encoding })
            .ok_or_else(|| Error::Configuration(format!("unknown encoding: {}", label)))
    }

    /// 正規化された名前
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// 入力 1 バイトあたりの平均文字数 (見積もり)
    ///
    /// 出力バッファの大きさを決めるためだけに使う。
    pub fn average_chars_per_byte(&self) -> f32 {
        if self.encoding == encoding_rs::UTF_8 || self.encoding.is_single_byte() {
            1.0
        } else {
            // UTF-16 と CJK 系のマルチバイト文字コード
            0.5
        }
    }

    pub(crate) fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
        }
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.name()).finish()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// デコード 1 ステップの生の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOutcome {
    /// 入力をすべて消費した
    InputEmpty,
    /// 出力バッファが満杯
    OutputFull,
    /// 不正なバイト列
    Malformed { offset: usize, length: usize },
}

/// デコード 1 ステップの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoderResult {
    /// 入力が足りない (入力はすべて消費済み)
    Underflow,
    /// 出力バッファが満杯 (入力が残っている)
    Overflow,
}

impl CoderResult {
    /// Overflow かどうか
    #[inline]
    pub fn is_overflow(&self) -> bool {
        matches!(self, CoderResult::Overflow)
    }
}

/// 生の結果を Underflow / Overflow に分類する
///
/// それ以外はすべて `Error::MalformedInput`
pub fn classify(outcome: RawOutcome) -> Result<CoderResult, Error> {
    match outcome {
        RawOutcome::InputEmpty => Ok(CoderResult::Underflow),
        RawOutcome::OutputFull => Ok(CoderResult::Overflow),
        RawOutcome::Malformed { offset, length } => Err(Error::MalformedInput { offset, length }),
    }
}

/// デコーダーの状態
///
/// ステップ間でマルチバイト文字の途中の状態を保持する。
pub struct CharsetDecoder {
    charset: Charset,
    policy: ErrorPolicy,
    decoder: Decoder,
    /// これまでに消費したバイト数
    consumed: usize,
    finished: bool,
}

impl CharsetDecoder {
    /// 新しいデコーダーを作成
    ///
    /// BOM は取り除かずにそのまま文字として扱う
    pub fn new(charset: Charset, policy: ErrorPolicy) -> Self {
        Self {
            charset,
            policy,
            decoder: charset.encoding().new_decoder_without_bom_handling(),
            consumed: 0,
            finished: false,
        }
    }

    /// 文字コード
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// 不正入力の扱い
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// これまでに消費したバイト数
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// flush 済みかどうか
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 入力を出力バッファに入るだけデコードする
    ///
    /// `input` の読み込み位置は消費した分だけ進む。
    pub fn decode_step(
        &mut self,
        input: &mut ByteChunk,
        output: &mut CharBuffer,
    ) -> Result<CoderResult, Error> {
        if self.finished {
            return Err(Error::AlreadyFinished);
        }
        classify(self.decode_raw(input, output, false))
    }

    /// 入力の終端を通知して残りをすべて出力する
    ///
    /// 途中で切れたマルチバイト文字はポリシーに従って扱う。
    /// 出力バッファは最悪ケースの長さまで拡張するので Overflow にはならない。
    pub fn flush(
        &mut self,
        input: Option<&mut ByteChunk>,
        output: &mut CharBuffer,
    ) -> Result<(), Error> {
        if self.finished {
            return Err(Error::AlreadyFinished);
        }

        let mut empty = ByteChunk::empty();
        let input = input.unwrap_or(&mut empty);

        let max = match self.policy {
            ErrorPolicy::Replace => self.decoder.max_utf8_buffer_length(input.remaining()),
            ErrorPolicy::Report | ErrorPolicy::Ignore => self
                .decoder
                .max_utf8_buffer_length_without_replacement(input.remaining()),
        }
        .ok_or_else(|| Error::Configuration("input too large to flush".to_string()))?;
        output.reserve_remaining(max);

        loop {
            match classify(self.decode_raw(input, output, true))? {
                CoderResult::Underflow => break,
                CoderResult::Overflow => output.reserve_remaining(output.remaining() + 16),
            }
        }

        tracing::debug!(
            charset = self.charset.name(),
            consumed = self.consumed,
            "charset decoder flushed"
        );
        self.finished = true;
        Ok(())
    }

    fn decode_raw(
        &mut self,
        input: &mut ByteChunk,
        output: &mut CharBuffer,
        last: bool,
    ) -> RawOutcome {
        match self.policy {
            ErrorPolicy::Replace => {
                let (result, read, written, _) =
                    self.decoder
                        .decode_to_str(input.as_slice(), output.spare_mut(), last);
                self.advance(input, output, read, written);
                match result {
                    RawCoderResult::InputEmpty => RawOutcome::InputEmpty,
                    RawCoderResult::OutputFull => RawOutcome::OutputFull,
                }
            }
            ErrorPolicy::Report => {
                let (result, read, written) = self.decoder.decode_to_str_without_replacement(
                    input.as_slice(),
                    output.spare_mut(),
                    last,
                );
                self.advance(input, output, read, written);
                self.raw_outcome(result)
            }
            ErrorPolicy::Ignore => loop {
                let (result, read, written) = self.decoder.decode_to_str_without_replacement(
                    input.as_slice(),
                    output.spare_mut(),
                    last,
                );
                self.advance(input, output, read, written);
                match self.raw_outcome(result) {
                    RawOutcome::Malformed { offset, length } => {
                        tracing::trace!(offset, length, "malformed input ignored");
                    }
                    outcome => break outcome,
                }
            },
        }
    }

    fn advance(
        &mut self,
        input: &mut ByteChunk,
        output: &mut CharBuffer,
        read: usize,
        written: usize,
    ) {
        input.advance(read);
        output.advance(written);
        self.consumed += read;
    }

    fn raw_outcome(&self, result: DecoderResult) -> RawOutcome {
        match result {
            DecoderResult::InputEmpty => RawOutcome::InputEmpty,
            DecoderResult::OutputFull => RawOutcome::OutputFull,
            DecoderResult::Malformed(bad, after) => {
                let length = usize::from(bad);
                RawOutcome::Malformed {
                    offset: self
                        .consumed
                        .saturating_sub(usize::from(after))
                        .saturating_sub(length),
                    length,
                }
            }
        }
    }
}

impl fmt::Debug for CharsetDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharsetDecoder")
            .field("charset", &self.charset)
            .field("policy", &self.policy)
            .field("consumed", &self.consumed)
            .field("finished", &self.finished)
            .finish()
    }
}
