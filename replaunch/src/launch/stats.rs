//! Point-in-time statistics for the spawned runtime process.

use sysinfo::{Pid, System};

/// Resource snapshot of a running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStats {
    /// CPU usage in percent since the last refresh. A single snapshot
    /// has no baseline, so this is usually zero; it is reported for
    /// completeness.
    pub cpu_percent: f32,

    /// Resident memory in bytes.
    pub memory_bytes: u64,
}

impl ProcessStats {
    pub fn memory_mib(&self) -> u64 {
        self.memory_bytes / 1024 / 1024
    }
}

/// Sample the process with the given pid.
///
/// Returns `None` when the process no longer exists.
pub fn sample(pid: u32) -> Option<ProcessStats> {
    let mut sys = System::new();
    let pid = Pid::from_u32(pid);
    sys.refresh_process(pid);

    sys.process(pid).map(|proc_info| ProcessStats {
        cpu_percent: proc_info.cpu_usage(),
        memory_bytes: proc_info.memory(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_current_process() {
        let stats = sample(std::process::id()).expect("current process should exist");
        assert!(stats.memory_bytes > 0);
    }

    #[test]
    fn test_sample_missing_process() {
        assert!(sample(999_999_999).is_none());
    }
}
