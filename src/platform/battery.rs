//! Battery status via Linux sysfs
//!
//! Reads the first `power_supply` entry whose `type` is `Battery`:
//! `capacity` (0-100) and `status` (Charging, Discharging, Full, ...).
//! Acquiring a [`BatteryManager`] starts a poll task that reports charging
//! and level changes as separate events, only when the value changes.

use super::round_half_up;
use crate::capability::Capability;
use crate::config::BatteryConfig;
use crate::error::CapabilityError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Charging state and charge level (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryStatus {
    pub charging: bool,
    pub level: f64,
}

impl BatteryStatus {
    /// Level as a whole percentage
    pub fn percent(&self) -> i64 {
        round_half_up(self.level * 100.0)
    }
}

/// A change reported by the battery
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatteryEvent {
    ChargingChange(BatteryStatus),
    LevelChange(BatteryStatus),
}

impl BatteryEvent {
    /// Battery state after the change
    pub fn status(&self) -> BatteryStatus {
        match self {
            BatteryEvent::ChargingChange(s) | BatteryEvent::LevelChange(s) => *s,
        }
    }
}

/// An acquired battery: its state at acquisition and a stream of changes.
///
/// The stream ends when the source stops; dropping the receiver stops the
/// source.
#[derive(Debug)]
pub struct BatteryManager {
    pub status: BatteryStatus,
    pub events: mpsc::Receiver<BatteryEvent>,
}

/// Trait for battery status sources
#[async_trait::async_trait]
pub trait BatterySource: Send + Sync {
    /// Check if a battery can be read at all
    async fn is_supported(&self) -> bool;

    /// Read the current state and start watching for changes
    async fn acquire(&self) -> Result<BatteryManager, CapabilityError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Polls /sys/class/power_supply
pub struct SysfsBattery {
    root: PathBuf,
    interval: Duration,
}

impl SysfsBattery {
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            root: config.sysfs_root.clone(),
            interval: Duration::from_millis(config.poll_interval_ms.max(10)),
        }
    }

    /// First supply of type Battery, by name order
    fn find_battery(&self) -> Option<PathBuf> {
        let mut supplies: Vec<PathBuf> = std::fs::read_dir(&self.root)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        supplies.sort();

        supplies.into_iter().find(|dir| {
            std::fs::read_to_string(dir.join("type"))
                .map(|t| t.trim() == "Battery")
                .unwrap_or(false)
        })
    }
}

fn read_status(dir: &Path) -> std::io::Result<BatteryStatus> {
    let capacity = std::fs::read_to_string(dir.join("capacity"))?;
    let capacity: f64 = capacity.trim().parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("bad capacity {:?}: {}", capacity.trim(), e),
        )
    })?;

    let status = std::fs::read_to_string(dir.join("status"))?;
    let charging = matches!(status.trim(), "Charging" | "Full");

    Ok(BatteryStatus {
        charging,
        level: (capacity / 100.0).clamp(0.0, 1.0),
    })
}

async fn poll(
    dir: PathBuf,
    interval: Duration,
    mut last: BatteryStatus,
    tx: mpsc::Sender<BatteryEvent>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tx.closed() => return,
        }

        let current = match read_status(&dir) {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Failed to read battery {:?}: {}", dir, e);
                continue;
            }
        };

        let mut events = Vec::new();
        if current.charging != last.charging {
            events.push(BatteryEvent::ChargingChange(current));
        }
        if current.percent() != last.percent() {
            events.push(BatteryEvent::LevelChange(current));
        }
        last = current;

        for event in events {
            if tx.send(event).await.is_err() {
                return;
            }
        }
    }
}

#[async_trait::async_trait]
impl BatterySource for SysfsBattery {
    async fn is_supported(&self) -> bool {
        self.find_battery().is_some()
    }

    async fn acquire(&self) -> Result<BatteryManager, CapabilityError> {
        let dir = self
            .find_battery()
            .ok_or(CapabilityError::Unsupported(Capability::Battery))?;
        let status = read_status(&dir)
            .map_err(|e| CapabilityError::platform(Capability::Battery, e.to_string()))?;

        tracing::debug!("Battery {:?}: {:?}", dir, status);

        let (tx, events) = mpsc::channel(16);
        tokio::spawn(poll(dir, self.interval, status, tx));

        Ok(BatteryManager { status, events })
    }

    fn name(&self) -> &'static str {
        "sysfs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn supply(root: &Path, name: &str, kind: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), format!("{}\n", kind)).unwrap();
        dir
    }

    fn battery(root: &Path, capacity: u32, status: &str) -> PathBuf {
        let dir = supply(root, "BAT0", "Battery");
        fs::write(dir.join("capacity"), format!("{}\n", capacity)).unwrap();
        fs::write(dir.join("status"), format!("{}\n", status)).unwrap();
        dir
    }

    fn source(root: &Path) -> SysfsBattery {
        SysfsBattery::new(&BatteryConfig {
            sysfs_root: root.to_path_buf(),
            poll_interval_ms: 10,
        })
    }

    #[test]
    fn test_percent_rounds_half_up() {
        let status = BatteryStatus {
            charging: false,
            level: 0.125,
        };
        assert_eq!(status.percent(), 13);
    }

    #[tokio::test]
    async fn test_no_battery_is_unsupported() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "AC", "Mains");

        let source = source(root.path());
        assert!(!source.is_supported().await);
        assert!(matches!(
            source.acquire().await,
            Err(CapabilityError::Unsupported(Capability::Battery))
        ));
    }

    #[tokio::test]
    async fn test_acquire_reads_current_state() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "AC", "Mains");
        battery(root.path(), 73, "Charging");

        let manager = source(root.path()).acquire().await.unwrap();
        assert!(manager.status.charging);
        assert_eq!(manager.status.percent(), 73);
    }

    #[tokio::test]
    async fn test_level_change_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let dir = battery(root.path(), 50, "Discharging");

        let mut manager = source(root.path()).acquire().await.unwrap();
        fs::write(dir.join("capacity"), "49\n").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), manager.events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            BatteryEvent::LevelChange(BatteryStatus {
                charging: false,
                level: 0.49
            })
        );
    }

    #[tokio::test]
    async fn test_unreadable_capacity_fails_acquire() {
        let root = tempfile::tempdir().unwrap();
        let dir = battery(root.path(), 50, "Full");
        fs::write(dir.join("capacity"), "lots\n").unwrap();

        assert!(matches!(
            source(root.path()).acquire().await,
            Err(CapabilityError::Platform { .. })
        ));
    }
}
