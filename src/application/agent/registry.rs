//! Fixed set of metric names the agent tracks and reports.

use crate::domain::types::MetricKind;

pub const POLL_COUNT: &str = "PollCount";
pub const RANDOM_VALUE: &str = "RandomValue";

pub const PROCESS_RESIDENT_MEMORY: &str = "ProcessResidentMemory";
pub const PROCESS_VIRTUAL_MEMORY: &str = "ProcessVirtualMemory";
pub const PROCESS_CPU_USAGE: &str = "ProcessCPUUsage";
pub const PROCESS_RUN_TIME: &str = "ProcessRunTime";
pub const PROCESS_DISK_READ: &str = "ProcessDiskRead";
pub const PROCESS_DISK_WRITTEN: &str = "ProcessDiskWritten";

pub const TOTAL_MEMORY: &str = "TotalMemory";
pub const FREE_MEMORY: &str = "FreeMemory";
pub const USED_MEMORY: &str = "UsedMemory";
pub const AVAILABLE_MEMORY: &str = "AvailableMemory";
pub const TOTAL_SWAP: &str = "TotalSwap";
pub const FREE_SWAP: &str = "FreeSwap";
pub const CPU_UTILIZATION_1: &str = "CPUutilization1";
pub const GLOBAL_CPU_UTILIZATION: &str = "GlobalCPUutilization";
pub const LOAD_AVERAGE_1: &str = "LoadAverage1";
pub const HOST_UPTIME: &str = "HostUptime";

pub static TRACKED_METRICS: &[(&str, MetricKind)] = &[
    (PROCESS_RESIDENT_MEMORY, MetricKind::Gauge),
    (PROCESS_VIRTUAL_MEMORY, MetricKind::Gauge),
    (PROCESS_CPU_USAGE, MetricKind::Gauge),
    (PROCESS_RUN_TIME, MetricKind::Gauge),
    (PROCESS_DISK_READ, MetricKind::Gauge),
    (PROCESS_DISK_WRITTEN, MetricKind::Gauge),
    (TOTAL_MEMORY, MetricKind::Gauge),
    (FREE_MEMORY, MetricKind::Gauge),
    (USED_MEMORY, MetricKind::Gauge),
    (AVAILABLE_MEMORY, MetricKind::Gauge),
    (TOTAL_SWAP, MetricKind::Gauge),
    (FREE_SWAP, MetricKind::Gauge),
    (CPU_UTILIZATION_1, MetricKind::Gauge),
    (GLOBAL_CPU_UTILIZATION, MetricKind::Gauge),
    (LOAD_AVERAGE_1, MetricKind::Gauge),
    (HOST_UPTIME, MetricKind::Gauge),
    (POLL_COUNT, MetricKind::Counter),
    (RANDOM_VALUE, MetricKind::Gauge),
];
