//! One-shot position requests
//!
//! GeoClue is queried through its `where-am-i` demo agent: the agent prints
//! a "New location" block for every fix, so we read until we have both
//! coordinates and stop it. A fixed provider from config serves machines
//! without GeoClue.

use crate::config::{GeolocationConfig, GeolocationProvider};
use crate::error::PositionError;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};

/// A geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Trait for position providers
#[async_trait::async_trait]
pub trait Geolocator: Send + Sync {
    /// Request a single fix. Never retried.
    async fn current_position(&self) -> Result<Position, PositionError>;

    /// Check if this provider can be used
    async fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

pub fn create_locator(config: &GeolocationConfig) -> Arc<dyn Geolocator> {
    let fixed = FixedLocator::from_config(config);
    match (config.provider, fixed) {
        (GeolocationProvider::Fixed, fixed) => Arc::new(fixed.unwrap_or_else(FixedLocator::unset)),
        (GeolocationProvider::Auto, Some(fixed)) => Arc::new(fixed),
        _ => Arc::new(GeoclueLocator::new(config)),
    }
}

/// Always reports the configured coordinates
pub struct FixedLocator {
    position: Option<Position>,
}

impl FixedLocator {
    pub fn new(position: Position) -> Self {
        Self {
            position: Some(position),
        }
    }

    fn unset() -> Self {
        Self { position: None }
    }

    fn from_config(config: &GeolocationConfig) -> Option<Self> {
        match (config.latitude, config.longitude) {
            (Some(latitude), Some(longitude)) => Some(Self::new(Position {
                latitude,
                longitude,
            })),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl Geolocator for FixedLocator {
    async fn current_position(&self) -> Result<Position, PositionError> {
        self.position.ok_or_else(|| {
            PositionError::PositionUnavailable("No fixed position configured".to_string())
        })
    }

    async fn is_available(&self) -> bool {
        self.position.is_some()
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Common install locations of the GeoClue demo agent
const AGENT_PATHS: &[&str] = &[
    "/usr/libexec/geoclue-2.0/demos/where-am-i",
    "/usr/lib/geoclue-2.0/demos/where-am-i",
    "/usr/lib/geoclue/demos/where-am-i",
];

/// GeoClue position via the where-am-i agent
pub struct GeoclueLocator {
    agent: Option<PathBuf>,
    timeout: Duration,
}

impl GeoclueLocator {
    pub fn new(config: &GeolocationConfig) -> Self {
        let agent = config
            .agent
            .clone()
            .or_else(|| which::which("where-am-i").ok())
            .or_else(|| {
                AGENT_PATHS
                    .iter()
                    .map(PathBuf::from)
                    .find(|p| p.exists())
            });
        Self {
            agent,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        }
    }

    async fn locate(&self, agent: &Path) -> Result<Position, PositionError> {
        let child = Command::new(agent)
            .args(["-t", &self.timeout.as_secs().to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PositionError::PositionUnavailable(e.to_string()))?;

        read_fix(child).await
    }
}

/// Read agent output until both coordinates arrive, then stop the agent
async fn read_fix(mut child: Child) -> Result<Position, PositionError> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| PositionError::PositionUnavailable("agent has no stdout".to_string()))?;

    // Drained alongside stdout so a chatty agent never blocks on a full pipe
    let stderr_task = child.stderr.take().map(|mut pipe| {
        tokio::spawn(async move {
            let mut stderr = String::new();
            let _ = pipe.read_to_string(&mut stderr).await;
            stderr
        })
    });

    let mut fix = PartialFix::default();
    let mut lines = BufReader::new(stdout).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                if let Some(task) = &stderr_task {
                    task.abort();
                }
                return Err(PositionError::PositionUnavailable(e.to_string()));
            }
        };
        if let Some(position) = fix.feed(&line) {
            if let Err(e) = child.kill().await {
                tracing::debug!("Failed to stop where-am-i: {}", e);
            }
            if let Some(task) = stderr_task {
                task.abort();
            }
            return Ok(position);
        }
    }

    // Agent ended without a fix; its stderr says why
    let _ = child.wait().await;
    let stderr = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => String::new(),
    };
    Err(classify_failure(stderr.trim()))
}

#[async_trait::async_trait]
impl Geolocator for GeoclueLocator {
    async fn current_position(&self) -> Result<Position, PositionError> {
        let agent = self.agent.as_deref().ok_or_else(|| {
            PositionError::PositionUnavailable("GeoClue agent not found".to_string())
        })?;

        // The agent's own -t also bounds it; this guards a hung D-Bus call
        match tokio::time::timeout(self.timeout, self.locate(agent)).await {
            Ok(result) => result,
            Err(_) => Err(PositionError::Timeout("Timeout expired".to_string())),
        }
    }

    async fn is_available(&self) -> bool {
        self.agent.is_some()
    }

    fn name(&self) -> &'static str {
        "geoclue"
    }
}

/// Coordinates collected from agent output, line by line
#[derive(Default)]
struct PartialFix {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl PartialFix {
    fn feed(&mut self, line: &str) -> Option<Position> {
        static COORD: OnceLock<Regex> = OnceLock::new();
        let re = COORD.get_or_init(|| {
            Regex::new(r"^\s*(Latitude|Longitude):\s*(-?\d+(?:\.\d+)?)").expect("valid regex")
        });

        if let Some(caps) = re.captures(line) {
            let value = caps[2].parse::<f64>().ok();
            match &caps[1] {
                "Latitude" => self.latitude = value,
                _ => self.longitude = value,
            }
        }

        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Position {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

fn classify_failure(stderr: &str) -> PositionError {
    let lower = stderr.to_lowercase();
    if lower.contains("denied") || lower.contains("not authorized") || lower.contains("disabled") {
        PositionError::PermissionDenied(stderr.to_string())
    } else if lower.contains("timeout") || lower.contains("timed out") {
        PositionError::Timeout(stderr.to_string())
    } else if stderr.is_empty() {
        PositionError::PositionUnavailable("No position fix received".to_string())
    } else {
        PositionError::PositionUnavailable(stderr.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_agent_output() {
        let output = "Client object: /org/freedesktop/GeoClue2/Client/3\n\
                      \n\
                      New location:\n\
                      Latitude:    -23.550500°\n\
                      Longitude:   -46.633300°\n\
                      Accuracy:    25000.000000 meters\n";

        let mut fix = PartialFix::default();
        let position = output.lines().find_map(|line| fix.feed(line)).unwrap();
        assert_eq!(position.latitude, -23.5505);
        assert_eq!(position.longitude, -46.6333);
    }

    #[test]
    fn test_incomplete_output_has_no_fix() {
        let mut fix = PartialFix::default();
        assert!(fix.feed("Latitude:    10.0°").is_none());
        assert!(fix.feed("Accuracy:    5 meters").is_none());
        assert_eq!(
            fix.feed("Longitude:   20.0°"),
            Some(Position {
                latitude: 10.0,
                longitude: 20.0
            })
        );
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure("Failed to start client: Access denied"),
            PositionError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify_failure("Operation timed out"),
            PositionError::Timeout(_)
        ));
        assert!(matches!(
            classify_failure(""),
            PositionError::PositionUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_fixed_locator() {
        let locator = FixedLocator::new(Position {
            latitude: 10.0,
            longitude: 20.0,
        });
        assert!(locator.is_available().await);
        assert_eq!(locator.current_position().await.unwrap().latitude, 10.0);

        let unset = FixedLocator::unset();
        assert!(!unset.is_available().await);
        assert!(unset.current_position().await.is_err());
    }

    fn shell(script: &str) -> Child {
        Command::new("sh")
            .args(["-c", script])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[tokio::test]
    async fn test_chatty_stderr_does_not_block_fix() {
        let child = shell(
            "head -c 200000 /dev/zero | tr '\\0' x >&2; \
             echo 'Latitude: 1.5'; echo 'Longitude: 2.5'; exec sleep 30",
        );
        let position = tokio::time::timeout(Duration::from_secs(5), read_fix(child))
            .await
            .expect("fix read while stderr was busy")
            .unwrap();
        assert_eq!(
            position,
            Position {
                latitude: 1.5,
                longitude: 2.5
            }
        );
    }

    #[tokio::test]
    async fn test_agent_failure_reads_stderr() {
        let child = shell("echo 'Access denied' >&2; exit 1");
        assert!(matches!(
            read_fix(child).await,
            Err(PositionError::PermissionDenied(message)) if message == "Access denied"
        ));
    }

    #[test]
    fn test_auto_prefers_configured_position() {
        let config = GeolocationConfig {
            latitude: Some(1.0),
            longitude: Some(2.0),
            ..Default::default()
        };
        assert_eq!(create_locator(&config).name(), "fixed");
    }
}
