//! Platform probes: where the numbers come from.
//!
//! One [`PlatformProbe::probe`] call captures the whole machine at a single
//! instant: global CPU/RAM/GPU percentages plus the per-process list. The
//! trait is object-safe so the sampler can run against the real system or a
//! scripted stand-in without caring which.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::clock::{epoch_now, round2};

/// One process as seen by a probe at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    pub pid: Option<u32>,
    /// Lowercased executable name.
    pub name: String,
    /// May exceed 100 on multi-core hosts; reported as received.
    pub cpu_percent: f64,
    pub ram_mb: f64,
}

/// Everything a probe captures in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// Fractional seconds since the Unix epoch.
    pub timestamp: f64,
    pub cpu_percent: f64,
    pub ram_percent: f64,
    /// 0.0 on hosts without a GPU counter.
    pub gpu_percent: f64,
    pub processes: Vec<ProcessSample>,
}

/// Probe failure. Always transient: the sampler skips the tick and retries
/// on the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    Unavailable(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Unavailable(reason) => write!(f, "probe unavailable: {reason}"),
        }
    }
}

impl std::error::Error for ProbeError {}

/// A source of system snapshots.
///
/// `probe` must return within the sampling budget (300 ms target, 1 s hard
/// ceiling). Missing counters are zero-filled, never reported as errors;
/// `Err` means the whole reading failed and the tick should be skipped.
pub trait PlatformProbe: Send {
    /// Short stable name, for logs.
    fn name(&self) -> &str;

    /// Capture the machine now.
    fn probe(&mut self) -> Result<RawSnapshot, ProbeError>;
}

/// Probe backed by [`sysinfo`].
///
/// GPU utilization is reported as 0.0: sysinfo exposes no portable GPU
/// counter. CPU percentages are delta-based, so the very first tick after
/// construction reads 0 and settles from the second tick on.
pub struct SystemProbe {
    sys: System,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            sys: System::new_all(),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProbe for SystemProbe {
    fn name(&self) -> &str {
        "sysinfo"
    }

    fn probe(&mut self) -> Result<RawSnapshot, ProbeError> {
        self.sys.refresh_all();

        let total = self.sys.total_memory();
        if total == 0 {
            return Err(ProbeError::Unavailable(
                "total memory reads as zero".to_string(),
            ));
        }
        let ram_percent = self.sys.used_memory() as f64 / total as f64 * 100.0;
        let cpu_percent = f64::from(self.sys.global_cpu_usage());

        let mut processes: Vec<ProcessSample> = self
            .sys
            .processes()
            .values()
            .map(|p| ProcessSample {
                pid: Some(p.pid().as_u32()),
                name: p.name().to_string_lossy().to_lowercase(),
                cpu_percent: round2(f64::from(p.cpu_usage())),
                ram_mb: round2(p.memory() as f64 / (1024.0 * 1024.0)),
            })
            .collect();
        processes.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));

        Ok(RawSnapshot {
            timestamp: epoch_now(),
            cpu_percent: round2(cpu_percent),
            ram_percent: round2(ram_percent),
            gpu_percent: 0.0,
            processes,
        })
    }
}

/// Replays a fixed script of snapshots. `Err` entries simulate outages; an
/// exhausted script keeps returning `Unavailable`. The primary deterministic
/// stand-in for tests.
pub struct ScriptedProbe {
    script: VecDeque<Result<RawSnapshot, ProbeError>>,
}

impl ScriptedProbe {
    pub fn new(snapshots: Vec<RawSnapshot>) -> Self {
        Self {
            script: snapshots.into_iter().map(Ok).collect(),
        }
    }

    /// Script with explicit failures interleaved.
    pub fn from_results(script: Vec<Result<RawSnapshot, ProbeError>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl PlatformProbe for ScriptedProbe {
    fn name(&self) -> &str {
        "scripted"
    }

    fn probe(&mut self) -> Result<RawSnapshot, ProbeError> {
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(ProbeError::Unavailable("script exhausted".to_string())))
    }
}

/// Static host facts, collected once. For banners and summaries, not for
/// the sampling path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineInfo {
    pub os: String,
    pub os_version: String,
    pub arch: String,
    pub cpu_model: String,
    pub cpu_cores: usize,
    pub total_ram_mb: u64,
}

impl MachineInfo {
    pub fn collect() -> Self {
        let sys = System::new_all();
        Self {
            os: System::name().unwrap_or_else(|| "unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
            arch: std::env::consts::ARCH.to_string(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|c| c.brand().trim().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            total_ram_mb: sys.total_memory() / (1024 * 1024),
        }
    }
}
