#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub phase_time: Duration,
    pub total_time: Duration,
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
}

/// Per-phase resource sampling for pipeline runs (`--monitor`).
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    inner: Option<Mutex<MonitorState>>,
    started: Instant,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    pid: Pid,
    phase_started: Instant,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let inner = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => {
                    let mut system = System::new();
                    system.refresh_processes_specifics(
                        ProcessesToUpdate::Some(&[pid]),
                        true,
                        ProcessRefreshKind::everything(),
                    );
                    Some(Mutex::new(MonitorState {
                        system,
                        pid,
                        phase_started: Instant::now(),
                        peak_memory_mb: 0,
                    }))
                }
                Err(e) => {
                    tracing::warn!("System monitoring unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            inner,
            started: Instant::now(),
        }
    }

    /// Samples the process and resets the phase clock.
    pub fn finish_phase(&self, phase: &str) -> Option<PhaseStats> {
        let mut state = self.inner.as_ref()?.lock().ok()?;
        let pid = state.pid;
        state.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::everything(),
        );

        let (cpu_usage, memory_mb) = {
            let process = state.system.process(pid)?;
            (process.cpu_usage(), process.memory() / 1024 / 1024)
        };
        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);

        let stats = PhaseStats {
            phase: phase.to_string(),
            phase_time: state.phase_started.elapsed(),
            total_time: self.started.elapsed(),
            cpu_usage,
            memory_mb,
            peak_memory_mb: state.peak_memory_mb,
        };
        state.phase_started = Instant::now();
        Some(stats)
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.finish_phase(phase) {
            tracing::info!(
                "📊 {} took {:?} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB",
                stats.phase,
                stats.phase_time,
                stats.cpu_usage,
                stats.memory_mb,
                stats.peak_memory_mb
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(stats) = self.finish_phase("total") {
            tracing::info!(
                "📊 Finished in {:?}, peak memory {}MB",
                stats.total_time,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 建置沒有 sysinfo，提供空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_phase(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
