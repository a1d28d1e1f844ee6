//! Device orientation from Linux IIO sensors
//!
//! Tilt (beta, gamma) comes from the accelerometer's gravity vector.
//! Heading (alpha) comes from an IIO compass when one is present and is
//! reported as missing otherwise, like a browser without a magnetometer.

use super::round_half_up;
use crate::capability::Capability;
use crate::config::OrientationConfig;
use crate::error::CapabilityError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// One orientation reading in degrees. Missing axes are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OrientationSample {
    /// Rotation around Z (heading)
    pub alpha: Option<f64>,
    /// Rotation around X (front-back tilt)
    pub beta: Option<f64>,
    /// Rotation around Y (left-right tilt)
    pub gamma: Option<f64>,
}

/// Whole-degree rotation applied to the indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rotation {
    pub alpha: i64,
    pub beta: i64,
    pub gamma: i64,
}

impl Rotation {
    /// Round each axis, treating a missing axis as 0
    pub fn from_sample(sample: &OrientationSample) -> Self {
        let round = |v: Option<f64>| v.map(round_half_up).unwrap_or(0);
        Self {
            alpha: round(sample.alpha),
            beta: round(sample.beta),
            gamma: round(sample.gamma),
        }
    }

    /// CSS transform for a 3-axis rotation (X, then Y, then Z)
    pub fn css_transform(&self) -> String {
        format!(
            "rotateX({}deg) rotateY({}deg) rotateZ({}deg)",
            self.beta, self.gamma, self.alpha
        )
    }
}

/// Trait for orientation event sources
#[async_trait::async_trait]
pub trait OrientationSource: Send + Sync {
    /// Check if orientation events can be produced
    async fn is_supported(&self) -> bool;

    /// Start delivering samples. Dropping the receiver stops the source.
    async fn listen(&self) -> Result<mpsc::Receiver<OrientationSample>, CapabilityError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

const COMPASS_RAW: &str = "in_rot_from_north_magnetic_tilt_comp_raw";
const COMPASS_SCALE: &str = "in_rot_from_north_magnetic_tilt_comp_scale";

/// Polls an IIO accelerometer (and compass, if any)
pub struct IioOrientation {
    root: PathBuf,
    interval: Duration,
}

impl IioOrientation {
    pub fn new(config: &OrientationConfig) -> Self {
        Self {
            root: config.iio_root.clone(),
            interval: Duration::from_millis(config.poll_interval_ms.max(10)),
        }
    }

    fn find_device(&self, marker: &str) -> Option<PathBuf> {
        let mut devices: Vec<PathBuf> = std::fs::read_dir(&self.root)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        devices.sort();
        devices.into_iter().find(|dir| dir.join(marker).exists())
    }
}

fn read_number(path: &Path) -> std::io::Result<f64> {
    let text = std::fs::read_to_string(path)?;
    text.trim().parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{:?}: {}", path, e),
        )
    })
}

/// Gravity vector to (beta, gamma) tilt in degrees
fn tilt(x: f64, y: f64, z: f64) -> (f64, f64) {
    let beta = y.atan2(z).to_degrees();
    let gamma = (-x).atan2(y.hypot(z)).to_degrees();
    (beta, gamma)
}

struct Sensors {
    accel: PathBuf,
    compass: Option<PathBuf>,
}

impl Sensors {
    fn read(&self) -> std::io::Result<OrientationSample> {
        let x = read_number(&self.accel.join("in_accel_x_raw"))?;
        let y = read_number(&self.accel.join("in_accel_y_raw"))?;
        let z = read_number(&self.accel.join("in_accel_z_raw"))?;
        let (beta, gamma) = tilt(x, y, z);

        let alpha = self.compass.as_ref().and_then(|dir| {
            let raw = read_number(&dir.join(COMPASS_RAW)).ok()?;
            let scale = read_number(&dir.join(COMPASS_SCALE)).unwrap_or(1.0);
            Some((raw * scale).rem_euclid(360.0))
        });

        Ok(OrientationSample {
            alpha,
            beta: Some(beta),
            gamma: Some(gamma),
        })
    }
}

async fn poll(sensors: Sensors, interval: Duration, tx: mpsc::Sender<OrientationSample>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last: Option<OrientationSample> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tx.closed() => return,
        }

        let sample = match sensors.read() {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!("Failed to read orientation: {}", e);
                continue;
            }
        };

        // Unchanged readings mean the sensor produced no new sample
        if last == Some(sample) {
            continue;
        }
        last = Some(sample);

        if tx.send(sample).await.is_err() {
            return;
        }
    }
}

#[async_trait::async_trait]
impl OrientationSource for IioOrientation {
    async fn is_supported(&self) -> bool {
        self.find_device("in_accel_x_raw").is_some()
    }

    async fn listen(&self) -> Result<mpsc::Receiver<OrientationSample>, CapabilityError> {
        let accel = self
            .find_device("in_accel_x_raw")
            .ok_or(CapabilityError::Unsupported(Capability::Orientation))?;
        let compass = self.find_device(COMPASS_RAW);
        tracing::debug!("Orientation: accel={:?}, compass={:?}", accel, compass);

        let sensors = Sensors { accel, compass };
        // Fail now rather than in the poll loop if the sensor is unreadable
        sensors
            .read()
            .map_err(|e| CapabilityError::platform(Capability::Orientation, e.to_string()))?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(poll(sensors, self.interval, tx));
        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "iio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn accel(root: &Path, x: i32, y: i32, z: i32) -> PathBuf {
        let dir = root.join("iio:device0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("in_accel_x_raw"), format!("{}\n", x)).unwrap();
        fs::write(dir.join("in_accel_y_raw"), format!("{}\n", y)).unwrap();
        fs::write(dir.join("in_accel_z_raw"), format!("{}\n", z)).unwrap();
        dir
    }

    fn source(root: &Path) -> IioOrientation {
        IioOrientation::new(&OrientationConfig {
            iio_root: root.to_path_buf(),
            poll_interval_ms: 10,
        })
    }

    #[test]
    fn test_rotation_rounding() {
        let rotation = Rotation::from_sample(&OrientationSample {
            alpha: Some(359.5),
            beta: Some(-12.5),
            gamma: None,
        });
        assert_eq!(
            rotation,
            Rotation {
                alpha: 360,
                beta: -12,
                gamma: 0
            }
        );
    }

    #[test]
    fn test_css_transform_order() {
        let rotation = Rotation {
            alpha: 30,
            beta: 10,
            gamma: -20,
        };
        assert_eq!(
            rotation.css_transform(),
            "rotateX(10deg) rotateY(-20deg) rotateZ(30deg)"
        );
    }

    #[test]
    fn test_tilt_flat_and_upright() {
        let (beta, gamma) = tilt(0.0, 0.0, 1000.0);
        assert!(beta.abs() < 1e-9);
        assert!(gamma.abs() < 1e-9);

        let (beta, gamma) = tilt(0.0, 1000.0, 0.0);
        assert!((beta - 90.0).abs() < 1e-9);
        assert!(gamma.abs() < 1e-9);

        let (_, gamma) = tilt(-1000.0, 0.0, 1000.0);
        assert!((gamma - 45.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_no_accelerometer_is_unsupported() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("iio:device0")).unwrap();

        let source = source(root.path());
        assert!(!source.is_supported().await);
        assert!(matches!(
            source.listen().await,
            Err(CapabilityError::Unsupported(Capability::Orientation))
        ));
    }

    #[tokio::test]
    async fn test_listen_delivers_samples() {
        let root = tempfile::tempdir().unwrap();
        accel(root.path(), 0, 0, 1000);
        let compass = root.path().join("iio:device1");
        fs::create_dir_all(&compass).unwrap();
        fs::write(compass.join(COMPASS_RAW), "9000\n").unwrap();
        fs::write(compass.join(COMPASS_SCALE), "0.01\n").unwrap();

        let mut samples = source(root.path()).listen().await.unwrap();
        let sample = tokio::time::timeout(Duration::from_secs(5), samples.recv())
            .await
            .unwrap()
            .unwrap();

        let rotation = Rotation::from_sample(&sample);
        assert_eq!(rotation.alpha, 90);
        assert_eq!(rotation.beta, 0);
        assert_eq!(rotation.gamma, 0);
    }
}
