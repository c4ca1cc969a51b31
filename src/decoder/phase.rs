//! デコード状態の定義

use crate::error::Error;

/// デコード状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DecodePhase {
    /// チャンク生成中
    Running,
    /// 終端のチャンクを返した
    Finished,
    /// エラーで停止した (以降は同じエラーを返し続ける)
    Failed(Error),
}
