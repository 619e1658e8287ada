//! 解析运行请求事件
//!
//! 在计算出的解析时刻恢复一个挂起的运行请求：推进其 burst 状态、
//! 采样能耗，并把结果交给回调（即恢复调用方）。

use tracing::debug;

use super::compute_world::{ComputeWorld, RunDoneCallback};
use super::id::{MachineId, RunId};
use crate::sim::{Event, Simulator, World};

/// 解析事件：每个在途请求持有一个，按解析时刻排入事件队列。
pub struct ResolveRun {
    pub(crate) machine: MachineId,
    pub(crate) run: RunId,
    pub(crate) done: RunDoneCallback,
}

impl Event for ResolveRun {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let ResolveRun { machine, run, done } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<ComputeWorld>()
            .expect("world must be ComputeWorld");

        let result = w.resolve(machine, run, sim.now());
        debug!(run = ?run, state = ?result.state, at = ?result.resolved_at, "恢复调用方");

        // 回调可立即提交续段请求（continuation）。
        done(result, sim, w);
    }
}
