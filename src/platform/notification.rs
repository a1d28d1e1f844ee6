//! Desktop notifications and their permission state
//!
//! Sends notifications on different platforms:
//! - Linux: notify-send (libnotify)
//! - macOS: osascript (AppleScript)
//!
//! Permission starts as `Default`. Requesting it grants when a notification
//! agent is installed and denies otherwise; once decided, the answer sticks
//! for the life of the process.

use super::{command_available, run_command};
use crate::capability::Capability;
use crate::config::NotificationConfig;
use crate::error::CapabilityError;
use serde::Serialize;
use std::sync::Mutex;

/// Notification permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Not asked yet
    Default,
    Granted,
    Denied,
}

impl Permission {
    pub fn is_granted(&self) -> bool {
        matches!(self, Permission::Granted)
    }
}

/// What to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub icon: String,
}

/// Trait for notification backends
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Current permission, without prompting
    fn permission(&self) -> Permission;

    /// Resolve the user's decision
    async fn request_permission(&self) -> Result<Permission, CapabilityError>;

    /// Display a notification. Callers check permission first.
    async fn show(&self, request: &NotificationRequest) -> Result<(), CapabilityError>;

    /// Check if a notification agent exists
    async fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// notify-send / osascript notifier
pub struct DesktopNotifier {
    permission: Mutex<Permission>,
    expire_ms: u32,
}

impl DesktopNotifier {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            permission: Mutex::new(Permission::Default),
            expire_ms: config.expire_ms,
        }
    }

    fn agent() -> &'static str {
        if cfg!(target_os = "macos") {
            "osascript"
        } else {
            "notify-send"
        }
    }
}

#[async_trait::async_trait]
impl Notifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        *self
            .permission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn request_permission(&self) -> Result<Permission, CapabilityError> {
        let current = self.permission();
        if current != Permission::Default {
            return Ok(current);
        }

        let decision = if self.is_available().await {
            Permission::Granted
        } else {
            Permission::Denied
        };

        *self
            .permission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = decision;
        tracing::debug!("Notification permission: {:?}", decision);
        Ok(decision)
    }

    async fn show(&self, request: &NotificationRequest) -> Result<(), CapabilityError> {
        let result = if cfg!(target_os = "macos") {
            send_macos(request).await
        } else {
            send_linux(request, self.expire_ms).await
        };
        result.map_err(|e| CapabilityError::platform(Capability::Notification, e))
    }

    async fn is_available(&self) -> bool {
        command_available(Self::agent())
    }

    fn name(&self) -> &'static str {
        Self::agent()
    }
}

/// Send a notification on Linux using notify-send
async fn send_linux(request: &NotificationRequest, expire_ms: u32) -> Result<(), String> {
    let expire = format!("--expire-time={}", expire_ms);
    let icon = format!("--icon={}", request.icon);
    run_command(
        "notify-send",
        &[
            "--app-name=Capdeck",
            &expire,
            &icon,
            "--",
            &request.title,
            &request.body,
        ],
        None,
    )
    .await
    .map(|_| ())
}

/// Send a notification on macOS (no custom icon support)
async fn send_macos(request: &NotificationRequest) -> Result<(), String> {
    let script = applescript(&request.title, &request.body);
    run_command("osascript", &["-e", &script], None)
        .await
        .map(|_| ())
}

fn applescript(title: &str, body: &str) -> String {
    let escaped_title = title.replace('\\', "\\\\").replace('"', "\\\"");
    let escaped_body = body.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        r#"display notification "{}" with title "{}""#,
        escaped_body, escaped_title
    )
}
