//! 演示和示例代码
//!
//! 包含机器构建辅助函数和共享工具，供可执行程序与测试使用。

use std::sync::{Arc, Mutex};

use crate::compute::{
    BurstRequest, ComputeError, ComputeWorld, MachineId, ProcessingUnit, RunId, RunResult,
    SimMachine,
};
use crate::power::PowerModel;
use crate::sim::{FragmentSpec, MachineSpec, Simulator, TaskSpec, WorkloadSpec};
use crate::trace::{
    TABLE_TASKS, TASK_BURST, TASK_DEADLINE_MS, TASK_ID, TASK_MAX_USAGE, TASK_SUBMIT_TIME_MS, Trace,
};

/// 机器构建配置选项
#[derive(Debug, Clone)]
pub struct MachineOpts {
    pub clock_mhz: u32,
    pub cores: u32,
    /// 每核静态能耗额定值（W）
    pub core_power_w: f64,
    pub power_model: PowerModel,
}

impl Default for MachineOpts {
    fn default() -> Self {
        Self {
            clock_mhz: 2600,
            cores: 1,
            core_power_w: 0.0,
            power_model: PowerModel::square(200.0, 0.1).expect("valid default power model"),
        }
    }
}

/// 构建一台同构机器并注册到世界中
pub fn build_machine(
    world: &mut ComputeWorld,
    opts: &MachineOpts,
) -> Result<MachineId, ComputeError> {
    let mut units = Vec::with_capacity(opts.cores as usize);
    for _ in 0..opts.cores {
        units.push(ProcessingUnit::single(opts.clock_mhz, opts.core_power_w)?);
    }
    Ok(world.add_machine(SimMachine::new(units, opts.power_model)?))
}

/// 按工作负载规格构建全部机器。未给出功耗模型的机器
/// 退化为处理单元静态额定值之和的恒定模型。
pub fn build_spec_machines(
    world: &mut ComputeWorld,
    spec: &WorkloadSpec,
) -> Result<Vec<MachineId>, ComputeError> {
    let mut ids = Vec::with_capacity(spec.machines.len());
    for m in &spec.machines {
        ids.push(build_spec_machine(world, m)?);
    }
    Ok(ids)
}

fn build_spec_machine(
    world: &mut ComputeWorld,
    spec: &MachineSpec,
) -> Result<MachineId, ComputeError> {
    let mut units = Vec::new();
    let mut rated_power_w = 0.0;
    for cpu in &spec.cpus {
        let count = cpu.count.unwrap_or(1);
        let power_w = cpu.power_w.unwrap_or(0.0);
        units.push(ProcessingUnit::new(cpu.clock_mhz, count, power_w)?);
        rated_power_w += power_w * f64::from(count);
    }
    let model = match &spec.power_model {
        Some(s) => PowerModel::from_spec(s)?,
        None => PowerModel::constant(rated_power_w)?,
    };
    Ok(world.add_machine(SimMachine::new(units, model)?))
}

/// 提交一次请求并捕获其结果，供顺序驱动的调用方使用。
/// 返回的槽在对应的解析事件执行后填充。
pub fn submit_captured(
    world: &mut ComputeWorld,
    sim: &mut Simulator,
    machine: MachineId,
    req: BurstRequest,
) -> Result<(RunId, Arc<Mutex<Option<RunResult>>>), ComputeError> {
    let slot = Arc::new(Mutex::new(None));
    let out = Arc::clone(&slot);
    let run = world.submit(
        machine,
        req,
        Box::new(move |result, _sim, _world| {
            *out.lock().expect("run result slot lock") = Some(result);
        }),
        sim,
    )?;
    Ok((run, slot))
}

/// 从 trace 的任务表生成单核任务规格。缺失 burst 列的行被拒绝；
/// 缺失速率上限的行不限速（上限取核心主频）。
pub fn tasks_from_trace(trace: &dyn Trace, machine: usize) -> Result<Vec<TaskSpec>, ComputeError> {
    let table = trace.table(TABLE_TASKS).ok_or_else(|| {
        ComputeError::InvalidArgument(format!("trace does not define a {TABLE_TASKS:?} table"))
    })?;
    let mut reader = table.new_reader(None)?;

    let mut tasks = Vec::new();
    let mut row_idx = 0usize;
    while reader.next_row() {
        let burst = reader.get_f64(TASK_BURST).ok_or_else(|| {
            ComputeError::InvalidArgument(format!(
                "task row {row_idx} has no numeric {TASK_BURST:?} column"
            ))
        })?;
        let max_usage = reader.get_f64(TASK_MAX_USAGE).unwrap_or(f64::MAX);
        tasks.push(TaskSpec {
            name: reader.get_str(TASK_ID).map(str::to_string),
            machine,
            submit_time_ms: reader.get_f64(TASK_SUBMIT_TIME_MS),
            fragments: vec![FragmentSpec {
                burst: vec![burst],
                max_usage: vec![max_usage],
                deadline_offset_ms: reader.get_f64(TASK_DEADLINE_MS),
            }],
        });
        row_idx += 1;
    }
    Ok(tasks)
}
