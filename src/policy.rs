//! 不正入力の扱い

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// 不正なバイト列 / マッピングできない文字を見つけたときの動作
///
/// 不正入力とマッピング不能文字の両方に同じ動作を適用する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// エラーとして報告する
    Report,
    /// 読み飛ばす
    Ignore,
    /// U+FFFD に置き換える
    #[default]
    Replace,
}

impl ErrorPolicy {
    /// 設定値から動作を決定する
    ///
    /// `report` / `ignore` / `replace` のいずれか (ASCII の大文字小文字は区別しない)
    pub fn resolve(symbol: &str) -> Result<Self, Error> {
        if symbol.eq_ignore_ascii_case("report") {
            Ok(ErrorPolicy::Report)
        } else if symbol.eq_ignore_ascii_case("ignore") {
            Ok(ErrorPolicy::Ignore)
        } else if symbol.eq_ignore_ascii_case("replace") {
            Ok(ErrorPolicy::Replace)
        } else {
            Err(Error::Configuration(format!(
                "unknown encoding error policy: {}",
                symbol
            )))
        }
    }

    /// 設定値としての名前
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicy::Report => "report",
            ErrorPolicy::Ignore => "ignore",
            ErrorPolicy::Replace => "replace",
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
