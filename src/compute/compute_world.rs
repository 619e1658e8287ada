//! 计算世界
//!
//! 持有全部模拟机器，提供 `submit`（挂起点）与解析管线。
//! 多个在途请求各自独立计算解析时刻，由事件队列按
//! 时间（相同时间按提交顺序）恢复。

use std::any::Any;

use tracing::debug;

use super::burst::{BurstRequest, RunResult};
use super::error::ComputeError;
use super::id::{MachineId, RunId};
use super::machine::SimMachine;
use super::resolve_run::ResolveRun;
use crate::sim::{SimTime, Simulator, World};

/// 请求解析后恢复调用方的回调。可在其中立即提交续段请求。
pub type RunDoneCallback = Box<dyn FnOnce(RunResult, &mut Simulator, &mut ComputeWorld) + Send>;

/// 计算世界实现：机器注册表 + 运行请求编号。
#[derive(Default)]
pub struct ComputeWorld {
    machines: Vec<SimMachine>,
    next_run: u64,
}

impl ComputeWorld {
    /// 注册一台机器
    pub fn add_machine(&mut self, machine: SimMachine) -> MachineId {
        let id = MachineId(self.machines.len());
        self.machines.push(machine);
        id
    }

    pub fn machine(&self, id: MachineId) -> &SimMachine {
        &self.machines[id.0]
    }

    pub fn machines(&self) -> &[SimMachine] {
        &self.machines
    }

    /// 提交一次 burst 请求（挂起点）。
    ///
    /// 前置条件（违规则原子拒绝，时钟、burst、能耗均不变）：
    /// burst 与 max_usage 等长且等于机器核心数，条目非负有限，
    /// 截止时间不早于当前仿真时间。成功后请求进入在途状态，
    /// 并在计算出的解析时刻恢复 `done` 回调。
    #[tracing::instrument(skip(self, req, done, sim), fields(machine = ?machine))]
    pub fn submit(
        &mut self,
        machine: MachineId,
        req: BurstRequest,
        done: RunDoneCallback,
        sim: &mut Simulator,
    ) -> Result<RunId, ComputeError> {
        let m = self
            .machines
            .get_mut(machine.0)
            .ok_or_else(|| ComputeError::InvalidArgument(format!("unknown machine {machine:?}")))?;

        let plan = m.plan(&req, sim.now())?;
        let resolve_at = plan.resolve_at;

        let run = RunId(self.next_run);
        self.next_run = self.next_run.wrapping_add(1);

        m.begin_run(run, req, plan, sim.now());
        debug!(run = ?run, resolve_at = ?resolve_at, "请求已提交，调用方挂起");

        sim.schedule(resolve_at, ResolveRun { machine, run, done });
        Ok(run)
    }

    /// 把所有机器的能耗账户推进到 `now`，空闲机器也按静态功耗底线积分。
    pub fn settle(&mut self, now: SimTime) {
        for m in &mut self.machines {
            m.sample_energy(now);
        }
    }

    /// 由 [`ResolveRun`] 事件调用：推进机器状态并产出运行结果。
    pub(crate) fn resolve(&mut self, machine: MachineId, run: RunId, now: SimTime) -> RunResult {
        let m = &mut self.machines[machine.0];
        let (remaining, state) = m.resolve_run(run, now);
        RunResult {
            run,
            remaining,
            state,
            resolved_at: now,
        }
    }
}

impl World for ComputeWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    /// 每个事件之后把所有机器的能耗账户推进到当前时间。
    fn on_tick(&mut self, sim: &mut Simulator) {
        self.settle(sim.now());
    }
}
