use std::fmt;

/// デコードエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 設定が不正 (文字コード名、エラーポリシー、チャンクサイズ)
    Configuration(String),
    /// 不正なバイト列
    ///
    /// `offset` はバイトソースから読み込んだ位置 (先頭からのバイト数)、
    /// `length` は不正と判定されたバイト数
    MalformedInput { offset: usize, length: usize },
    /// インデックスが範囲外
    IndexOutOfRange { index: usize, length: usize },
    /// バイトソースの読み込みエラー
    Source(String),
    /// flush 済みのデコーダーを再度使用した
    AlreadyFinished,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => write!(f, "configuration error: {}", msg),
            Error::MalformedInput { offset, length } => {
                write!(
                    f,
                    "malformed input: {} byte(s) at offset {}",
                    length, offset
                )
            }
            Error::IndexOutOfRange { index, length } => {
                write!(f, "index out of range: {} >= {}", index, length)
            }
            Error::Source(msg) => write!(f, "source error: {}", msg),
            Error::AlreadyFinished => write!(f, "decoder already finished"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Source(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::Configuration("unknown encoding: foo".to_string()).to_string(),
            "configuration error: unknown encoding: foo"
        );
        assert_eq!(
            Error::MalformedInput {
                offset: 3,
                length: 1
            }
            .to_string(),
            "malformed input: 1 byte(s) at offset 3"
        );
        assert_eq!(
            Error::IndexOutOfRange {
                index: 5,
                length: 5
            }
            .to_string(),
            "index out of range: 5 >= 5"
        );
        assert_eq!(
            Error::AlreadyFinished.to_string(),
            "decoder already finished"
        );
    }

    #[test]
    fn test_from_io_error() {
        let e = std::io::Error::other("connection reset");
        assert_eq!(Error::from(e), Error::Source("connection reset".to_string()));
    }
}
