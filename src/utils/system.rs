// src/utils/system.rs: System functions

use std::time::Duration;

use anyhow::Result;
use sysinfo::{CpuRefreshKind, RefreshKind, System};
use tokio::time::sleep;

/// Determines how many download workers can run, capped at the physical
/// core count, and samples the current CPU load.
///
/// # Arguments
///
/// * `args_jobs` - Requested worker count from the command line.
///
/// # Returns
///
/// Result<(usize, f32)> maximum workers, current cpu usage
pub async fn detect_cores_and_load(args_jobs: usize) -> Result<(usize, f32)> {
    let refresh_kind = RefreshKind::nothing().with_cpu(Default::default());
    let mut system = System::new_with_specifics(refresh_kind);
    system.refresh_cpu_all();
    let physical_cores = System::physical_core_count().unwrap_or(1);
    system.refresh_cpu_specifics(CpuRefreshKind::nothing().with_cpu_usage());
    sleep(Duration::from_millis(100)).await;
    let cpu_load = system.global_cpu_usage();
    let max_workers = physical_cores.min(args_jobs.max(1));
    Ok((max_workers, cpu_load))
}
