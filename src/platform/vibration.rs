//! Vibration motor via the Linux timed_output class
//!
//! Writing N to `/sys/class/timed_output/vibrator/enable` runs the motor
//! for N milliseconds; writing 0 stops it. Patterns alternate on and off
//! durations, starting with on. A new pattern replaces one still playing.

use crate::capability::Capability;
use crate::config::VibrationConfig;
use crate::error::CapabilityError;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// SOS in Morse: three short, three long, three short, with gaps
pub const SOS: [u32; 17] = [
    200, 200, 200, 200, 200, 200, // ...
    500, 200, 500, 200, 500, // ---
    200, 200, 200, 200, 200, 200, // ...
];

/// Alternating on/off durations in milliseconds, starting with on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VibrationPattern(Vec<u32>);

impl VibrationPattern {
    pub fn new(durations: Vec<u32>) -> Self {
        Self(durations)
    }

    /// One pulse
    pub fn single(ms: u32) -> Self {
        Self(vec![ms])
    }

    pub fn sos() -> Self {
        Self(SOS.to_vec())
    }

    pub fn durations(&self) -> &[u32] {
        &self.0
    }

    /// Time from first pulse to end of the pattern
    pub fn total(&self) -> Duration {
        Duration::from_millis(self.0.iter().map(|&d| u64::from(d)).sum())
    }
}

/// Trait for vibration actuators
#[async_trait::async_trait]
pub trait Vibrator: Send + Sync {
    /// Check if an actuator exists
    async fn is_supported(&self) -> bool;

    /// Start playing `pattern`, replacing any pattern in progress.
    /// Returns once the first pulse has started.
    async fn vibrate(&self, pattern: &VibrationPattern) -> Result<(), CapabilityError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// timed_output vibrator
pub struct TimedOutputVibrator {
    device: PathBuf,
    playing: Mutex<Option<JoinHandle<()>>>,
}

impl TimedOutputVibrator {
    pub fn new(config: &VibrationConfig) -> Self {
        Self {
            device: config.device.clone(),
            playing: Mutex::new(None),
        }
    }

    fn stop_current(&self) {
        let mut playing = self
            .playing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = playing.take() {
            task.abort();
        }
    }
}

fn pulse(device: &Path, ms: u32) -> std::io::Result<()> {
    std::fs::write(device, ms.to_string())
}

async fn play(device: PathBuf, durations: Vec<u32>) {
    for (i, &ms) in durations.iter().enumerate() {
        // Even slots are pulses; slot 0 was started by the caller
        if i > 0 && i % 2 == 0 {
            if let Err(e) = pulse(&device, ms) {
                tracing::warn!("Vibration stopped: {}", e);
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(u64::from(ms))).await;
    }
}

#[async_trait::async_trait]
impl Vibrator for TimedOutputVibrator {
    async fn is_supported(&self) -> bool {
        self.device.exists()
    }

    async fn vibrate(&self, pattern: &VibrationPattern) -> Result<(), CapabilityError> {
        self.stop_current();

        let Some(&first) = pattern.durations().first() else {
            // An empty pattern just cancels
            return pulse(&self.device, 0)
                .map_err(|e| CapabilityError::platform(Capability::Vibration, e.to_string()));
        };

        pulse(&self.device, first)
            .map_err(|e| CapabilityError::platform(Capability::Vibration, e.to_string()))?;

        if pattern.durations().len() > 1 {
            let task = tokio::spawn(play(self.device.clone(), pattern.durations().to_vec()));
            *self
                .playing
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(task);
        }

        tracing::debug!(
            "Vibrating {} segments ({:?})",
            pattern.durations().len(),
            pattern.total()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "timed_output"
    }
}

impl Drop for TimedOutputVibrator {
    fn drop(&mut self) {
        self.stop_current();
    }
}
