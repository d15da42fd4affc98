use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{Disks, System};

/// Free space below this share of the data volume triggers a warning.
pub const LOW_DISK_PERCENT: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct HealthStats {
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub load_one: f64,
    pub disk_free_mb: Option<u64>,
    pub disk_free_percent: Option<f64>,
    pub elapsed_time: Duration,
}

impl HealthStats {
    pub fn disk_is_low(&self) -> bool {
        self.disk_free_percent
            .map(|p| p < LOW_DISK_PERCENT)
            .unwrap_or(false)
    }
}

/// Snapshots memory and free space on the volume holding the data directory.
pub struct HealthMonitor {
    system: Mutex<System>,
    data_path: PathBuf,
    start_time: Instant,
    enabled: bool,
}

impl HealthMonitor {
    pub fn new(data_path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            system: Mutex::new(System::new()),
            data_path: data_path.into(),
            start_time: Instant::now(),
            enabled,
        }
    }

    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), false)
    }

    pub fn get_stats(&self) -> Option<HealthStats> {
        if !self.enabled {
            return None;
        }

        let mut system = self.system.lock().ok()?;
        system.refresh_memory();

        let disks = Disks::new_with_refreshed_list();
        let volume = volume_for(
            &self.data_path,
            disks
                .list()
                .iter()
                .map(|d| (d.mount_point(), d.available_space(), d.total_space())),
        );

        Some(HealthStats {
            memory_used_mb: system.used_memory() / 1024 / 1024,
            memory_total_mb: system.total_memory() / 1024 / 1024,
            load_one: System::load_average().one,
            disk_free_mb: volume.map(|(free, _)| free / 1024 / 1024),
            disk_free_percent: volume.and_then(|(free, total)| {
                (total > 0).then(|| free as f64 / total as f64 * 100.0)
            }),
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 {} - Memory: {}/{}MB, Load: {:.2}, Disk free: {}, Uptime: {:?}",
                phase,
                stats.memory_used_mb,
                stats.memory_total_mb,
                stats.load_one,
                match (stats.disk_free_mb, stats.disk_free_percent) {
                    (Some(mb), Some(pct)) => format!("{}MB ({:.1}%)", mb, pct),
                    _ => "unknown".to_string(),
                },
                stats.elapsed_time
            );
            if stats.disk_is_low() {
                tracing::warn!(
                    "⚠️ Data volume below {}% free, photos may stop saving soon",
                    LOW_DISK_PERCENT
                );
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Picks the mount with the longest mount point that prefixes `path`.
fn volume_for<'a>(
    path: &Path,
    mounts: impl Iterator<Item = (&'a Path, u64, u64)>,
) -> Option<(u64, u64)> {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    mounts
        .filter(|(mount, _, _)| path.starts_with(mount))
        .max_by_key(|(mount, _, _)| mount.as_os_str().len())
        .map(|(_, free, total)| (free, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_for_picks_deepest_mount() {
        let mounts = vec![
            (Path::new("/"), 10, 100),
            (Path::new("/usr/local"), 1, 50),
            (Path::new("/boot"), 5, 5),
        ];
        let found = volume_for(
            Path::new("/usr/local/gpsdata/does-not-exist"),
            mounts.into_iter(),
        );
        assert_eq!(found, Some((1, 50)));
    }

    #[test]
    fn test_disk_is_low() {
        let stats = HealthStats {
            memory_used_mb: 100,
            memory_total_mb: 1000,
            load_one: 0.1,
            disk_free_mb: Some(10),
            disk_free_percent: Some(2.5),
            elapsed_time: Duration::from_secs(1),
        };
        assert!(stats.disk_is_low());
    }

    #[test]
    fn test_disabled_monitor_has_no_stats() {
        let monitor = HealthMonitor::disabled();
        assert!(!monitor.is_enabled());
        assert!(monitor.get_stats().is_none());
    }
}
