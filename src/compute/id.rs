//! 标识符类型
//!
//! 定义机器和运行请求的唯一标识符。

/// 机器标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MachineId(pub usize);

/// 运行请求标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub u64);
