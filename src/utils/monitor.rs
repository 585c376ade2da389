//! 各階段的列數與行程資源用量。
//!
//! 每個階段結束時呼叫 `record_phase`，記下該階段輸出的列數，
//! 啟用時一併取樣 CPU 與記憶體。`log_final_stats` 輸出整體的列數流向。

use std::sync::Mutex;
use std::time::Duration;
#[cfg(feature = "cli")]
use std::time::Instant;
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSample {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
}

/// 一個階段結束時的快照
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSample {
    pub phase: String,
    pub rows: usize,
    pub elapsed: Duration,
    pub resources: Option<ResourceSample>,
}

/// `Extract 3 → Transform 1 → Load 1`
pub fn row_flow(phases: &[PhaseSample]) -> String {
    phases
        .iter()
        .map(|p| format!("{} {}", p.phase, p.rows))
        .collect::<Vec<_>>()
        .join(" → ")
}

/// 前後兩個階段之間減少的列數
pub fn rows_lost(phases: &[PhaseSample]) -> Vec<(String, usize)> {
    phases
        .windows(2)
        .filter(|w| w[1].rows < w[0].rows)
        .map(|w| (w[1].phase.clone(), w[0].rows - w[1].rows))
        .collect()
}

#[cfg(feature = "cli")]
struct ProcessProbe {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl ProcessProbe {
    fn new() -> Option<Self> {
        // 取不到 PID 時只記錄列數
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("Process monitoring unavailable: {}", e);
                return None;
            }
        };
        let mut system = System::new_with_specifics(RefreshKind::everything());
        system.refresh_all();
        Some(Self {
            system,
            pid,
            peak_memory_mb: 0,
        })
    }

    fn sample(&mut self) -> Option<ResourceSample> {
        self.system.refresh_all();
        let process = self.system.process(self.pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        self.peak_memory_mb = self.peak_memory_mb.max(memory_mb);

        Some(ResourceSample {
            cpu_usage: process.cpu_usage(),
            memory_usage_mb: memory_mb,
            peak_memory_mb: self.peak_memory_mb,
        })
    }
}

pub struct SystemMonitor {
    enabled: bool,
    phases: Mutex<Vec<PhaseSample>>,
    #[cfg(feature = "cli")]
    probe: Option<Mutex<ProcessProbe>>,
    #[cfg(feature = "cli")]
    start_time: Instant,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            phases: Mutex::new(Vec::new()),
            #[cfg(feature = "cli")]
            probe: if enabled {
                ProcessProbe::new().map(Mutex::new)
            } else {
                None
            },
            #[cfg(feature = "cli")]
            start_time: Instant::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(feature = "cli")]
    fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    #[cfg(not(feature = "cli"))]
    fn elapsed(&self) -> Duration {
        Duration::ZERO
    }

    #[cfg(feature = "cli")]
    fn sample_resources(&self) -> Option<ResourceSample> {
        self.probe.as_ref()?.lock().ok()?.sample()
    }

    #[cfg(not(feature = "cli"))]
    fn sample_resources(&self) -> Option<ResourceSample> {
        None
    }

    /// 記錄某階段輸出的列數。未啟用時不做事
    pub fn record_phase(&self, phase: &str, rows: usize) {
        if !self.enabled {
            return;
        }

        let sample = PhaseSample {
            phase: phase.to_string(),
            rows,
            elapsed: self.elapsed(),
            resources: self.sample_resources(),
        };

        match &sample.resources {
            Some(r) => tracing::info!(
                "📊 {} - {} rows, CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                sample.phase,
                sample.rows,
                r.cpu_usage,
                r.memory_usage_mb,
                r.peak_memory_mb,
                sample.elapsed
            ),
            None => tracing::info!(
                "📊 {} - {} rows, Time: {:?}",
                sample.phase,
                sample.rows,
                sample.elapsed
            ),
        }

        if let Ok(mut phases) = self.phases.lock() {
            phases.push(sample);
        }
    }

    pub fn phases(&self) -> Vec<PhaseSample> {
        self.phases
            .lock()
            .map(|phases| phases.clone())
            .unwrap_or_default()
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }

        let phases = self.phases();
        let peak = phases
            .iter()
            .filter_map(|p| p.resources.as_ref().map(|r| r.peak_memory_mb))
            .max();

        tracing::info!("📊 Row flow: {}", row_flow(&phases));
        for (phase, lost) in rows_lost(&phases) {
            tracing::info!("📊 {} removed {} rows", phase, lost);
        }
        match peak {
            Some(peak) => tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                self.elapsed(),
                peak
            ),
            None => tracing::info!("📊 Final Stats - Total Time: {:?}", self.elapsed()),
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
