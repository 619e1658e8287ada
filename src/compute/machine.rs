//! 模拟机器
//!
//! 固定的处理单元集合加功耗模型与能耗账户。负责速率授予、
//! 完成时间计算和剩余工作量推进；每个利用率变化点采样一次能耗。

use std::collections::HashMap;

use tracing::{debug, trace};

use super::burst::{BurstRequest, RunState};
use super::energy::EnergyAccountant;
use super::error::ComputeError;
use super::id::RunId;
use super::processing_unit::ProcessingUnit;
use crate::power::PowerModel;
use crate::sim::SimTime;

/// 一台模拟机器。burst 向量按位置一一映射到机器的可寻址核心。
pub struct SimMachine {
    units: Vec<ProcessingUnit>,
    /// 每个可寻址核心的主频（MHz）；聚合单元按核心数展开。
    core_clock_mhz: Vec<f64>,
    power_model: PowerModel,
    accountant: EnergyAccountant,
    /// 当前在途请求的授予速率总和（MHz）
    granted_mhz: f64,
    runs: HashMap<RunId, PendingRun>,
}

/// 在途运行请求：提交时刻确定速率与解析时间，解析时刻据此推进剩余量。
struct PendingRun {
    burst: Vec<f64>,
    rates: Vec<f64>,
    completes: Vec<bool>,
    started_at: SimTime,
    deadline: SimTime,
}

/// 提交时刻计算出的执行计划。
pub(crate) struct RunPlan {
    rates: Vec<f64>,
    completes: Vec<bool>,
    pub(crate) resolve_at: SimTime,
}

impl SimMachine {
    pub fn new(units: Vec<ProcessingUnit>, power_model: PowerModel) -> Result<Self, ComputeError> {
        if units.is_empty() {
            return Err(ComputeError::InvalidArgument(
                "a machine needs at least one processing unit".into(),
            ));
        }
        let mut core_clock_mhz = Vec::new();
        for u in &units {
            for _ in 0..u.cores() {
                core_clock_mhz.push(f64::from(u.clock_rate_mhz()));
            }
        }
        Ok(Self {
            units,
            core_clock_mhz,
            power_model,
            accountant: EnergyAccountant::new(SimTime::ZERO),
            granted_mhz: 0.0,
            runs: HashMap::new(),
        })
    }

    pub fn units(&self) -> &[ProcessingUnit] {
        &self.units
    }

    /// 可寻址核心数（聚合单元展开后）
    pub fn core_count(&self) -> usize {
        self.core_clock_mhz.len()
    }

    /// 总容量（MHz）
    pub fn capacity_mhz(&self) -> f64 {
        self.core_clock_mhz.iter().sum()
    }

    pub fn power_model(&self) -> &PowerModel {
        &self.power_model
    }

    /// 当前利用率：授予速率总和 / 总容量，夹到 [0, 1]。
    pub fn utilization(&self) -> f64 {
        (self.granted_mhz / self.capacity_mhz()).clamp(0.0, 1.0)
    }

    pub fn cumulative_energy_j(&self) -> f64 {
        self.accountant.cumulative_energy_j()
    }

    pub fn in_flight_runs(&self) -> usize {
        self.runs.len()
    }

    /// 为一次请求计算执行计划。只读：任何校验失败都不改变机器状态。
    ///
    /// 授予速率 `rate_i = min(max_usage_i, clock_i)`；burst 为零的核心视为已完成，
    /// 不参与完成时间计算，速率记零。`delta = min(min_i(burst_i / rate_i), deadline - now)`。
    /// 所有剩余工作速率为零且无截止时间约束时返回 `NoProgress`。
    pub(crate) fn plan(&self, req: &BurstRequest, now: SimTime) -> Result<RunPlan, ComputeError> {
        if req.core_count() != self.core_count() {
            return Err(ComputeError::InvalidArgument(format!(
                "burst targets {} cores but the machine has {}",
                req.core_count(),
                self.core_count()
            )));
        }
        if req.deadline < now {
            return Err(ComputeError::InvalidArgument(format!(
                "deadline {:?} is earlier than the current simulated time {:?}",
                req.deadline, now
            )));
        }

        let mut rates = vec![0.0; self.core_count()];
        let mut min_ttc: Option<f64> = None;
        for i in 0..self.core_count() {
            if req.burst[i] <= 0.0 {
                continue;
            }
            let rate = req.max_usage[i].min(self.core_clock_mhz[i]);
            rates[i] = rate;
            if rate > 0.0 {
                let ttc = req.burst[i] / rate;
                min_ttc = Some(min_ttc.map_or(ttc, |m: f64| m.min(ttc)));
            }
        }

        let horizon_secs = if req.deadline == SimTime::MAX {
            None
        } else {
            Some(req.deadline.saturating_sub(now).as_secs_f64())
        };

        // 无完成事件且无截止时间：时间将被无限推进，属于失速配置。
        let delta_secs = match (min_ttc, horizon_secs) {
            (None, None) => return Err(ComputeError::NoProgress),
            (Some(t), None) => t,
            (None, Some(h)) => h,
            (Some(t), Some(h)) => t.min(h),
        };

        // 在量化到纳秒之前判定哪些核心到点完成，避免舍入破坏“恰好为零”。
        let completes = (0..self.core_count())
            .map(|i| rates[i] > 0.0 && req.burst[i] > 0.0 && req.burst[i] / rates[i] <= delta_secs)
            .collect();

        let resolve_at = if horizon_secs.is_some_and(|h| delta_secs >= h) {
            req.deadline
        } else {
            now.saturating_add(SimTime::from_secs_f64(delta_secs))
                .min(req.deadline)
        };

        trace!(
            now = ?now,
            resolve_at = ?resolve_at,
            delta_secs,
            "运行计划已确定"
        );

        Ok(RunPlan {
            rates,
            completes,
            resolve_at,
        })
    }

    /// 登记一个在途请求：先在旧利用率下采样能耗，再提高授予速率。
    pub(crate) fn begin_run(&mut self, run: RunId, req: BurstRequest, plan: RunPlan, now: SimTime) {
        self.sample_energy(now);
        self.granted_mhz += plan.rates.iter().sum::<f64>();
        debug!(
            run = ?run,
            granted_mhz = self.granted_mhz,
            utilization = self.utilization(),
            "请求进入在途状态"
        );
        self.runs.insert(
            run,
            PendingRun {
                burst: req.burst,
                rates: plan.rates,
                completes: plan.completes,
                started_at: now,
                deadline: req.deadline,
            },
        );
    }

    /// 解析一个在途请求：推进剩余工作量并返还。完成核心精确置零，
    /// 其余核心按 `burst_i - delta * rate_i` 扣减并夹到零以吸收浮点过冲。
    pub(crate) fn resolve_run(&mut self, run: RunId, now: SimTime) -> (Vec<f64>, RunState) {
        // 该请求在区间内仍占用速率，先采样再降额。
        self.sample_energy(now);

        let pending = self.runs.remove(&run).expect("pending run exists");
        let delta_secs = now.saturating_sub(pending.started_at).as_secs_f64();

        let mut remaining = pending.burst;
        for i in 0..remaining.len() {
            if pending.completes[i] {
                remaining[i] = 0.0;
            } else if pending.rates[i] > 0.0 {
                remaining[i] = (remaining[i] - delta_secs * pending.rates[i]).max(0.0);
            }
        }

        self.granted_mhz = (self.granted_mhz - pending.rates.iter().sum::<f64>()).max(0.0);

        // 状态记录哪个界限触发了恢复：截止时间先到为 DeadlineExpired，
        // 否则为核心完成（全零或最快核心先完成，调用方检视剩余量续段）。
        let all_zero = remaining.iter().all(|b| *b == 0.0);
        let state = if !all_zero && now >= pending.deadline {
            RunState::DeadlineExpired
        } else {
            RunState::Completed
        };

        // 进度保证：要么某个条目恰好为零，要么时钟已到截止时间。
        debug_assert!(
            remaining.iter().any(|b| *b == 0.0) || now >= pending.deadline,
            "a resolved run must complete a core or hit its deadline"
        );

        debug!(
            run = ?run,
            state = ?state,
            granted_mhz = self.granted_mhz,
            "请求已解析"
        );

        (remaining, state)
    }

    /// 把能耗账户推进到 `now`，按当前利用率下的瞬时功率积分。
    /// 空闲机器同样积累静态功耗底线。
    pub(crate) fn sample_energy(&mut self, now: SimTime) {
        let power_w = self.power_model.power_clamped(self.utilization());
        self.accountant.advance(now, power_w);
    }
}
