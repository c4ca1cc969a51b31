#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_lazy_text::{DecoderConfig, ErrorPolicy, SliceSource, StreamingDecoder};

const ENCODINGS: &[&str] = &[
    "UTF-8",
    "UTF-16LE",
    "UTF-16BE",
    "Shift_JIS",
    "EUC-JP",
    "ISO-2022-JP",
    "GB18030",
    "windows-1252",
];

#[derive(Arbitrary, Debug)]
struct FuzzDecoder {
    data: Vec<u8>,
    chunk_hint: u8,
    pull_sizes: Vec<u8>,
    encoding_hint: u8,
}

fn decode(input: &FuzzDecoder, encoding: &str, policy: ErrorPolicy) -> Option<String> {
    let config = DecoderConfig::new()
        .chunk_size((input.chunk_hint as usize % 64) + 1)
        .encoding(encoding)
        .on_encoding_error(policy);
    let sizes = input.pull_sizes.iter().map(|s| *s as usize).collect();
    let source = SliceSource::new(input.data.clone()).with_pull_sizes(sizes);

    let mut text = String::new();
    for chunk in StreamingDecoder::new(source, &config).ok()? {
        text.push_str(&chunk.ok()?.to_string());
    }
    Some(text)
}

fn decode_whole(data: &[u8], encoding: &str) -> String {
    let config = DecoderConfig::new().chunk_size(data.len().max(1)).encoding(encoding);
    let mut text = String::new();
    if let Ok(decoder) = StreamingDecoder::new(SliceSource::new(data), &config) {
        for chunk in decoder.flatten() {
            text.push_str(&chunk.to_string());
        }
    }
    text
}

fuzz_target!(|input: FuzzDecoder| {
    let encoding = ENCODINGS[input.encoding_hint as usize % ENCODINGS.len()];

    // replace は失敗せず、読み込みの分割に依存しない
    let replaced = decode(&input, encoding, ErrorPolicy::Replace);
    assert_eq!(replaced.as_deref(), Some(decode_whole(&input.data, encoding).as_str()));

    // ignore も失敗しない
    assert!(decode(&input, encoding, ErrorPolicy::Ignore).is_some());

    // report が成功したときは replace と同じ結果
    if let Some(reported) = decode(&input, encoding, ErrorPolicy::Report) {
        assert_eq!(Some(reported), replaced);
    }
});
