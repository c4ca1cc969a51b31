//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// テキスト生成
// ========================================

/// UTF-8 で 1 / 2 / 3 / 4 バイトになる文字を混ぜる
pub fn mixed_width_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('\u{00C0}', '\u{00FF}'),
        prop::char::range('\u{3041}', '\u{3093}'),
        prop::char::range('\u{1F600}', '\u{1F64F}'),
    ]
}

/// 任意の文字を含むテキスト
pub fn text(max_len: usize) -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::collection::vec(mixed_width_char(), 0..=max_len)
            .prop_map(|chars| chars.into_iter().collect()),
        proptest::collection::vec(any::<char>(), 0..=max_len)
            .prop_map(|chars| chars.into_iter().collect()),
    ]
}

// ========================================
// 読み込みサイズ生成
// ========================================

/// 1 回の pull で要求するバイト数
pub fn chunk_size() -> impl Strategy<Value = usize> {
    prop_oneof![1usize..=8, 9usize..=64, Just(4096usize)]
}

/// バイトソースが実際に返すバイト数の列
pub fn pull_sizes() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(1usize..=16, 0..8)
}
