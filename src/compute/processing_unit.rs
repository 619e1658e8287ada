//! 处理单元
//!
//! 单个模拟 CPU 核心的能力描述：主频、核心数与静态能耗额定值。
//! 构造后不可变；被机器持有，运行请求只读引用。

use super::error::ComputeError;

/// 处理单元描述符。`cores` 对单核对象恒为 1，仅聚合单元大于 1。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingUnit {
    clock_rate_mhz: u32,
    cores: u32,
    energy_consumption_w: f64,
}

impl ProcessingUnit {
    pub fn new(
        clock_rate_mhz: u32,
        cores: u32,
        energy_consumption_w: f64,
    ) -> Result<Self, ComputeError> {
        if clock_rate_mhz == 0 {
            return Err(ComputeError::InvalidArgument(
                "clock rate must be positive".into(),
            ));
        }
        if cores == 0 {
            return Err(ComputeError::InvalidArgument(
                "core count must be positive".into(),
            ));
        }
        if !energy_consumption_w.is_finite() || energy_consumption_w < 0.0 {
            return Err(ComputeError::InvalidArgument(format!(
                "energy consumption must be a non-negative finite value, got {energy_consumption_w}"
            )));
        }
        Ok(Self {
            clock_rate_mhz,
            cores,
            energy_consumption_w,
        })
    }

    /// 单核处理单元
    pub fn single(clock_rate_mhz: u32, energy_consumption_w: f64) -> Result<Self, ComputeError> {
        Self::new(clock_rate_mhz, 1, energy_consumption_w)
    }

    pub fn clock_rate_mhz(&self) -> u32 {
        self.clock_rate_mhz
    }

    pub fn cores(&self) -> u32 {
        self.cores
    }

    pub fn energy_consumption_w(&self) -> f64 {
        self.energy_consumption_w
    }
}
