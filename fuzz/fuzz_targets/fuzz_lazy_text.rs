#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_lazy_text::{CharSequence, DecoderConfig, Error, LazyText, SliceSource};

#[derive(Arbitrary, Debug)]
enum Access {
    CharAt(u16),
    Length,
    ToText,
    SubSequence(u16, u16),
    Close,
}

#[derive(Arbitrary, Debug)]
struct FuzzLazyText {
    data: Vec<u8>,
    chunk_hint: u8,
    accesses: Vec<Access>,
}

fuzz_target!(|input: FuzzLazyText| {
    let expected: Vec<char> = String::from_utf8_lossy(&input.data).chars().collect();
    let config = DecoderConfig::new().chunk_size((input.chunk_hint as usize % 16) + 1);
    let Ok(text) = LazyText::new(SliceSource::new(input.data.clone()), &config) else {
        return;
    };

    for access in input.accesses.iter().take(64) {
        match access {
            Access::CharAt(i) => {
                let i = *i as usize;
                match expected.get(i) {
                    Some(c) => assert_eq!(text.char_at(i), Ok(*c)),
                    None => assert_eq!(
                        text.char_at(i),
                        Err(Error::IndexOutOfRange {
                            index: i,
                            length: expected.len()
                        })
                    ),
                }
            }
            Access::Length => assert_eq!(text.length(), Ok(expected.len())),
            Access::ToText => {
                assert_eq!(text.to_text(), Ok(expected.iter().collect::<String>()))
            }
            Access::SubSequence(a, b) => {
                let (start, end) = (*a as usize, *b as usize);
                let result = text.sub_sequence(start, end);
                if start <= end && end <= expected.len() {
                    assert_eq!(result, Ok(expected[start..end].iter().collect::<String>()));
                } else {
                    assert!(result.is_err());
                }
            }
            Access::Close => text.close(),
        }
    }
});
