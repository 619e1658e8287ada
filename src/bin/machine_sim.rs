use clap::Parser;
use dcsim_rs::compute::{BurstRequest, ComputeError, ComputeWorld, MachineId, RunState};
use dcsim_rs::demo::{build_spec_machines, tasks_from_trace};
use dcsim_rs::sim::{Event, SimTime, Simulator, TaskSpec, WorkloadSpec, World};
use dcsim_rs::trace::FormatRegistry;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Parser)]
#[command(
    name = "machine-sim",
    about = "Run a workload.json on the dcsim-rs machine simulator"
)]
struct Args {
    /// Path to workload.json
    #[arg(long)]
    workload: PathBuf,

    /// Run until this time (ms); defaults to running until completion
    #[arg(long)]
    until_ms: Option<u64>,

    /// Write a machine-readable summary to this path
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Load additional single-core tasks from a trace file
    #[arg(long)]
    tasks_trace: Option<PathBuf>,

    /// Format name for --tasks-trace
    #[arg(long, default_value = "json")]
    trace_format: String,

    /// Machine index the trace tasks target
    #[arg(long, default_value_t = 0)]
    trace_machine: usize,
}

/// 任务驱动器的共享状态：每个任务一段 fragment 序列，顺序执行。
struct DriverState {
    tasks: Vec<TaskState>,
}

struct TaskState {
    name: String,
    machine: MachineId,
    task: TaskSpec,
    next_fragment: usize,
    /// 上一 fragment 截止时间到期后的剩余量（续段请求）
    carry: Option<Vec<f64>>,
    fragments_run: u32,
    outcome: Option<TaskOutcome>,
}

#[derive(Debug, Clone)]
enum TaskOutcome {
    Done { finished_ms: f64 },
    Stalled,
    Failed(String),
}

/// 在提交时刻启动一个任务（首个 fragment）。
struct StartTask {
    task: usize,
    state: Arc<Mutex<DriverState>>,
}

impl Event for StartTask {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let StartTask { task, state } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<ComputeWorld>()
            .expect("world must be ComputeWorld");
        submit_next_fragment(&state, task, w, sim);
    }
}

/// 提交任务的下一个（或续段）fragment。结果回调里直接链到再下一段。
fn submit_next_fragment(
    state: &Arc<Mutex<DriverState>>,
    task: usize,
    world: &mut ComputeWorld,
    sim: &mut Simulator,
) {
    let (machine, req, submitted_burst) = {
        let mut st = state.lock().expect("driver state lock");
        let ts = &mut st.tasks[task];
        if ts.outcome.is_some() || ts.next_fragment >= ts.task.fragments.len() {
            return;
        }
        let core_count = world.machine(ts.machine).core_count();
        let frag = &ts.task.fragments[ts.next_fragment];

        let mut burst = match ts.carry.take() {
            Some(carry) => carry,
            None => frag.burst.clone(),
        };
        let mut max_usage = frag.max_usage.clone();
        if burst.len() > core_count || max_usage.len() > core_count {
            ts.outcome = Some(TaskOutcome::Failed(format!(
                "fragment targets {} cores but the machine has {core_count}",
                burst.len().max(max_usage.len())
            )));
            return;
        }
        // 短向量按零补齐：零 burst 的核心不参与完成时间计算。
        burst.resize(core_count, 0.0);
        max_usage.resize(core_count, 0.0);

        let deadline = match frag.deadline_offset_ms {
            Some(ms) => sim.now().saturating_add(SimTime::from_secs_f64(ms / 1e3)),
            None => SimTime::MAX,
        };
        let req = match BurstRequest::new(burst.clone(), max_usage, deadline) {
            Ok(req) => req,
            Err(e) => {
                ts.outcome = Some(TaskOutcome::Failed(e.to_string()));
                return;
            }
        };
        (ts.machine, req, burst)
    };

    let cb_state = Arc::clone(state);
    let submitted = world.submit(
        machine,
        req,
        Box::new(move |result, sim, world| {
            let resume = {
                let mut st = cb_state.lock().expect("driver state lock");
                let ts = &mut st.tasks[task];
                ts.fragments_run = ts.fragments_run.saturating_add(1);
                match result.state {
                    // 最快核心先完成时带着剩余量续段，直到 fragment 全零。
                    RunState::Completed if result.remaining.iter().any(|b| *b > 0.0) => {
                        ts.carry = Some(result.remaining);
                        true
                    }
                    RunState::Completed => {
                        ts.next_fragment += 1;
                        ts.carry = None;
                        if ts.next_fragment >= ts.task.fragments.len() {
                            ts.outcome = Some(TaskOutcome::Done {
                                finished_ms: result.resolved_at.as_secs_f64() * 1e3,
                            });
                            false
                        } else {
                            true
                        }
                    }
                    RunState::DeadlineExpired => {
                        // 无进展的到期续段只会原样重复，标记失速而不是空转。
                        if result.remaining == submitted_burst {
                            ts.outcome = Some(TaskOutcome::Stalled);
                            false
                        } else {
                            ts.carry = Some(result.remaining);
                            true
                        }
                    }
                    _ => {
                        ts.outcome =
                            Some(TaskOutcome::Failed(format!("unexpected {:?}", result.state)));
                        false
                    }
                }
            };
            if resume {
                submit_next_fragment(&cb_state, task, world, sim);
            }
        }),
        sim,
    );

    if let Err(e) = submitted {
        let mut st = state.lock().expect("driver state lock");
        st.tasks[task].outcome = Some(TaskOutcome::Failed(e.to_string()));
    }
}

#[derive(Serialize)]
struct Report {
    tasks: Vec<TaskReport>,
    machines: Vec<MachineReport>,
}

#[derive(Serialize)]
struct TaskReport {
    name: String,
    machine: usize,
    state: String,
    finished_ms: Option<f64>,
    fragments_run: u32,
}

#[derive(Serialize)]
struct MachineReport {
    machine: usize,
    energy_j: f64,
    final_utilization: f64,
}

fn load_tasks(args: &Args, spec: &WorkloadSpec) -> Result<Vec<TaskSpec>, ComputeError> {
    let mut tasks = spec.tasks.clone();
    if let Some(path) = &args.tasks_trace {
        let registry = FormatRegistry::default();
        let trace = registry.open(path, &args.trace_format)?;
        tasks.extend(tasks_from_trace(trace.as_ref(), args.trace_machine)?);
    }
    Ok(tasks)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    let raw = fs::read_to_string(&args.workload).expect("read workload.json");
    let workload: WorkloadSpec = serde_json::from_str(&raw).expect("parse workload.json");

    let mut sim = Simulator::default();
    let mut world = ComputeWorld::default();

    let machine_ids = build_spec_machines(&mut world, &workload).expect("build machines");
    let tasks = load_tasks(&args, &workload).expect("load tasks");

    let mut task_states = Vec::with_capacity(tasks.len());
    for (idx, task) in tasks.into_iter().enumerate() {
        let machine = *machine_ids
            .get(task.machine)
            .unwrap_or_else(|| panic!("task {idx} targets unknown machine {}", task.machine));
        task_states.push(TaskState {
            name: task.name.clone().unwrap_or_else(|| format!("task-{idx}")),
            machine,
            task,
            next_fragment: 0,
            carry: None,
            fragments_run: 0,
            outcome: None,
        });
    }
    let state = Arc::new(Mutex::new(DriverState { tasks: task_states }));

    let task_count = state.lock().expect("driver state lock").tasks.len();
    for task in 0..task_count {
        let submit_at = {
            let st = state.lock().expect("driver state lock");
            st.tasks[task]
                .task
                .submit_time_ms
                .map_or(SimTime::ZERO, |ms| SimTime::from_secs_f64(ms / 1e3))
        };
        sim.schedule(
            submit_at,
            StartTask {
                task,
                state: Arc::clone(&state),
            },
        );
    }

    match args.until_ms {
        Some(ms) => sim.run_until(SimTime::from_millis(ms), &mut world),
        None => sim.run(&mut world),
    }
    world.settle(sim.now());

    let st = state.lock().expect("driver state lock");
    let mut task_reports = Vec::with_capacity(st.tasks.len());
    for ts in &st.tasks {
        let (label, finished_ms) = match &ts.outcome {
            Some(TaskOutcome::Done { finished_ms }) => {
                println!(
                    "task_done name={} machine={} finished_ms={:.6} fragments={}",
                    ts.name, ts.machine.0, finished_ms, ts.fragments_run
                );
                ("done", Some(*finished_ms))
            }
            Some(TaskOutcome::Stalled) => {
                println!("task_stalled name={} machine={}", ts.name, ts.machine.0);
                ("stalled", None)
            }
            Some(TaskOutcome::Failed(e)) => {
                println!(
                    "task_failed name={} machine={} error={:?}",
                    ts.name, ts.machine.0, e
                );
                ("failed", None)
            }
            None => {
                println!("task_pending name={} machine={}", ts.name, ts.machine.0);
                ("pending", None)
            }
        };
        task_reports.push(TaskReport {
            name: ts.name.clone(),
            machine: ts.machine.0,
            state: label.to_string(),
            finished_ms,
            fragments_run: ts.fragments_run,
        });
    }

    let mut machine_reports = Vec::with_capacity(world.machines().len());
    for (idx, m) in world.machines().iter().enumerate() {
        println!(
            "machine_energy machine={} joules={:.6} utilization={:.6}",
            idx,
            m.cumulative_energy_j(),
            m.utilization()
        );
        machine_reports.push(MachineReport {
            machine: idx,
            energy_j: m.cumulative_energy_j(),
            final_utilization: m.utilization(),
        });
    }

    if let Some(path) = args.report_json {
        let report = Report {
            tasks: task_reports,
            machines: machine_reports,
        };
        let json = serde_json::to_string_pretty(&report).expect("serialize report");
        fs::write(&path, json).expect("write report json");
        eprintln!("wrote report to {}", path.display());
    }
}
