use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub meta: Option<WorkloadMeta>,
    pub machines: Vec<MachineSpec>,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadMeta {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub cpus: Vec<CpuSpec>,
    #[serde(default)]
    pub power_model: Option<PowerModelSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuSpec {
    pub clock_mhz: u32,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub power_w: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PowerModelSpec {
    Constant {
        power_w: f64,
    },
    Linear {
        max_power_w: f64,
        static_power_percent: f64,
    },
    Square {
        max_power_w: f64,
        static_power_percent: f64,
    },
    Cubic {
        max_power_w: f64,
        static_power_percent: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub machine: usize,
    #[serde(default)]
    pub submit_time_ms: Option<f64>,
    pub fragments: Vec<FragmentSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentSpec {
    pub burst: Vec<f64>,
    pub max_usage: Vec<f64>,
    #[serde(default)]
    pub deadline_offset_ms: Option<f64>,
}
