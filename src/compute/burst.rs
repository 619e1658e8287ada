//! 运行请求
//!
//! 一次 burst 请求：每个目标核心的剩余工作量与速率上限，加一个截止时间。
//! 由调用方在每个挂起点之前创建，引擎在解析步骤中原地消耗。

use super::error::ComputeError;
use super::id::RunId;
use crate::sim::SimTime;

/// Burst 请求。`burst[i]` 为核心 i 的剩余工作量（MHz·s），
/// `max_usage[i]` 为对应的速率上限（MHz）。`SimTime::MAX` 表示无截止时间。
#[derive(Debug, Clone)]
pub struct BurstRequest {
    pub(crate) burst: Vec<f64>,
    pub(crate) max_usage: Vec<f64>,
    pub(crate) deadline: SimTime,
}

impl BurstRequest {
    pub fn new(
        burst: Vec<f64>,
        max_usage: Vec<f64>,
        deadline: SimTime,
    ) -> Result<Self, ComputeError> {
        if burst.len() != max_usage.len() {
            return Err(ComputeError::InvalidArgument(format!(
                "burst and max_usage must have the same length, got {} and {}",
                burst.len(),
                max_usage.len()
            )));
        }
        if let Some(v) = burst.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(ComputeError::InvalidArgument(format!(
                "burst entries must be non-negative finite values, got {v}"
            )));
        }
        if let Some(v) = max_usage.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(ComputeError::InvalidArgument(format!(
                "max_usage entries must be non-negative finite values, got {v}"
            )));
        }
        Ok(Self {
            burst,
            max_usage,
            deadline,
        })
    }

    /// 无截止时间的请求
    pub fn without_deadline(burst: Vec<f64>, max_usage: Vec<f64>) -> Result<Self, ComputeError> {
        Self::new(burst, max_usage, SimTime::MAX)
    }

    pub fn core_count(&self) -> usize {
        self.burst.len()
    }

    pub fn burst(&self) -> &[f64] {
        &self.burst
    }

    pub fn max_usage(&self) -> &[f64] {
        &self.max_usage
    }

    pub fn deadline(&self) -> SimTime {
        self.deadline
    }
}

/// 运行请求的状态机：`Pending → Running → {Completed, DeadlineExpired, Failed}`。
/// `Completed` 表示恢复由核心完成触发（较慢核心可能仍有剩余量，调用方检视续段）；
/// `DeadlineExpired` 是正常结果，调用方用新截止时间重新提交剩余部分即可。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    DeadlineExpired,
    Failed,
}

/// 解析后的运行结果：更新后的剩余 burst 向量交还给调用方。
/// 为零的条目表示对应核心完成；非零条目表示先到达了截止时间。
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run: RunId,
    pub remaining: Vec<f64>,
    pub state: RunState,
    pub resolved_at: SimTime,
}
