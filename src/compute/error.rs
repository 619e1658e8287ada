//! 错误类型
//!
//! 定义执行引擎的错误种类。前置条件违规在任何状态变更之前被拒绝。

use thiserror::Error;

/// 执行引擎错误。
#[derive(Debug, Error)]
pub enum ComputeError {
    /// 参数非法：长度不匹配、负值、过期截止时间、未知 trace 格式等。
    /// 调用方修正参数后可重试。
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// 请求无法推进：所有剩余工作的授予速率为零且没有截止时间约束。
    #[error("no progress: zero granted rate on all remaining work and no deadline bound")]
    NoProgress,
}
