//! Platform capability backends
//!
//! One trait per capability, each with an availability probe and a
//! human-readable name for logging. Native implementations drive desktop
//! tools (speech-dispatcher, notify-send, wl-clipboard, ...) or read
//! Linux sysfs directly.
//!
//! `Backends::detect` picks an implementation for every capability from
//! the configuration and the running session.

pub mod battery;
pub mod clipboard;
pub mod geolocation;
pub mod notification;
pub mod orientation;
pub mod speech;
pub mod vibration;

use crate::config::Config;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

pub use battery::{BatteryEvent, BatteryManager, BatterySource, BatteryStatus};
pub use clipboard::Clipboard;
pub use geolocation::{Geolocator, Position};
pub use notification::{NotificationRequest, Notifier, Permission};
pub use orientation::{OrientationSample, OrientationSource, Rotation};
pub use speech::{SpeechEngine, Utterance};
pub use vibration::{VibrationPattern, Vibrator};

/// The set of backends the façade dispatches to
#[derive(Clone)]
pub struct Backends {
    pub speech: Arc<dyn SpeechEngine>,
    pub geolocation: Arc<dyn Geolocator>,
    pub notification: Arc<dyn Notifier>,
    pub battery: Arc<dyn BatterySource>,
    pub clipboard: Arc<dyn Clipboard>,
    pub vibration: Arc<dyn Vibrator>,
    pub orientation: Arc<dyn OrientationSource>,
}

impl Backends {
    /// Choose a native backend for every capability
    pub fn detect(config: &Config) -> Self {
        let backends = Self {
            speech: speech::create_engine(&config.speech),
            geolocation: geolocation::create_locator(&config.geolocation),
            notification: Arc::new(notification::DesktopNotifier::new(&config.notification)),
            battery: Arc::new(battery::SysfsBattery::new(&config.battery)),
            clipboard: clipboard::create_clipboard(&config.clipboard),
            vibration: Arc::new(vibration::TimedOutputVibrator::new(&config.vibration)),
            orientation: Arc::new(orientation::IioOrientation::new(&config.orientation)),
        };

        tracing::debug!(
            "Backends: speech={}, geolocation={}, notification={}, battery={}, clipboard={}, vibration={}, orientation={}",
            backends.speech.name(),
            backends.geolocation.name(),
            backends.notification.name(),
            backends.battery.name(),
            backends.clipboard.name(),
            backends.vibration.name(),
            backends.orientation.name(),
        );

        backends
    }
}

/// Round to the nearest integer with halves going up (-2.5 → -2, 2.5 → 3)
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Check whether an executable is on PATH
pub(crate) fn command_available(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Run a command to completion, feeding `input` on stdin.
///
/// Returns stdout on success, or stderr (or the exit status) as the error
/// message.
pub(crate) async fn run_command(
    program: &str,
    args: &[&str],
    input: Option<&str>,
) -> Result<String, String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("{} not found in PATH", program)
            } else {
                format!("failed to start {}: {}", program, e)
            }
        })?;

    if let (Some(text), Some(mut stdin)) = (input, child.stdin.take()) {
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| format!("failed to write to {}: {}", program, e))?;

        // Close stdin to signal EOF
        drop(stdin);
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| format!("{} failed: {}", program, e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            Err(format!("{} exited with {}", program, output.status))
        } else {
            Err(stderr)
        }
    }
}

/// Feed `input` to a tool that may leave a background child running (wl-copy,
/// xclip), and wait for the tool itself to exit.
///
/// Stdout is discarded and only the exit status is awaited, since a forked
/// child keeps inherited pipes open. Stderr is read only after a failure.
pub(crate) async fn run_detaching(
    program: &str,
    args: &[&str],
    input: &str,
) -> Result<(), String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("{} not found in PATH", program)
            } else {
                format!("failed to start {}: {}", program, e)
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .await
            .map_err(|e| format!("failed to write to {}: {}", program, e))?;

        // Close stdin to signal EOF
        drop(stdin);
    }

    let status = child
        .wait()
        .await
        .map_err(|e| format!("{} failed: {}", program, e))?;

    if status.success() {
        return Ok(());
    }

    let mut stderr = Vec::new();
    if let Some(mut pipe) = child.stderr.take() {
        // A leftover child may still hold the pipe open
        let read = pipe.read_to_end(&mut stderr);
        let _ = tokio::time::timeout(Duration::from_millis(500), read).await;
    }
    let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
    if stderr.is_empty() {
        Err(format!("{} exited with {}", program, status))
    } else {
        Err(stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
        assert_eq!(round_half_up(85.49), 85);
        assert_eq!(round_half_up(0.0), 0);
    }

    #[tokio::test]
    async fn test_run_command_missing_program() {
        let err = run_command("capdeck-no-such-program", &[], None)
            .await
            .unwrap_err();
        assert!(err.contains("not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_pipes_stdin() {
        let out = run_command("cat", &[], Some("olá")).await.unwrap();
        assert_eq!(out, "olá");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_reports_failure() {
        let err = run_command("sh", &["-c", "echo boom >&2; exit 3"], None)
            .await
            .unwrap_err();
        assert_eq!(err, "boom");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_detaching_ignores_background_child() {
        // The backgrounded sleep keeps the inherited pipes open
        let result = tokio::time::timeout(
            Duration::from_secs(3),
            run_detaching("sh", &["-c", "cat >/dev/null; sleep 20 & exit 0"], "x"),
        )
        .await
        .expect("should return once the tool exits");
        assert_eq!(result, Ok(()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_detaching_reports_stderr() {
        let err = run_detaching(
            "sh",
            &["-c", "cat >/dev/null; echo 'Error: Cannot open display' >&2; exit 1"],
            "x",
        )
        .await
        .unwrap_err();
        assert_eq!(err, "Error: Cannot open display");
    }
}
