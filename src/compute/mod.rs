//! 资源执行与能耗核算引擎
//!
//! 把 burst 请求复用到异构处理单元上，推进仿真时间，
//! 在每个挂起点保持速率、利用率与剩余工作量的数值不变量。

mod burst;
mod compute_world;
mod energy;
mod error;
mod id;
mod machine;
mod processing_unit;
mod resolve_run;

pub use burst::{BurstRequest, RunResult, RunState};
pub use compute_world::{ComputeWorld, RunDoneCallback};
pub use energy::EnergyAccountant;
pub use error::ComputeError;
pub use id::{MachineId, RunId};
pub use machine::SimMachine;
pub use processing_unit::ProcessingUnit;
pub use resolve_run::ResolveRun;
