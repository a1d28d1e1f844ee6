//! The capability façade
//!
//! One async operation per capability action. Every operation follows the
//! same contract:
//!
//! 1. Probe availability. If missing, show the capability's unsupported
//!    message and return `Unsupported` without touching the platform.
//! 2. Invoke the backend with fixed parameters.
//! 3. Report the outcome through the presenter (panel text or alert) and
//!    return it as a typed result.
//!
//! Operations share no state with each other apart from the presenter.

use crate::capability::{Capability, CapabilityReport, ProbeEntry};
use crate::config::Config;
use crate::error::CapabilityError;
use crate::feedback::CopyButton;
use crate::messages;
use crate::platform::{
    Backends, NotificationRequest, OrientationSample, Permission, Position, Rotation, Utterance,
    VibrationPattern,
};
use crate::presenter::{Field, Panel, Presenter};
use crate::subscription::Subscription;
use std::sync::Arc;
use std::time::Duration;

pub struct Capabilities {
    backends: Backends,
    presenter: Arc<dyn Presenter>,
    copy_button: CopyButton,
    lang: String,
    notification_icon: String,
    short_ms: u32,
    long_ms: u32,
}

impl Capabilities {
    pub fn new(config: &Config, backends: Backends, presenter: Arc<dyn Presenter>) -> Self {
        let copy_button = CopyButton::new(
            presenter.clone(),
            Duration::from_millis(config.clipboard.feedback_ms),
            messages::COPY_LABEL,
            messages::COPIED_LABEL,
        );

        Self {
            backends,
            presenter,
            copy_button,
            lang: config.speech.lang.clone(),
            notification_icon: config.notification.icon.clone(),
            short_ms: config.vibration.short_ms,
            long_ms: config.vibration.long_ms,
        }
    }

    pub fn presenter(&self) -> &Arc<dyn Presenter> {
        &self.presenter
    }

    pub fn copy_button(&self) -> &CopyButton {
        &self.copy_button
    }

    fn unsupported(&self, capability: Capability, message: &str) -> CapabilityError {
        tracing::info!("{} not available", capability);
        self.presenter.alert(message);
        CapabilityError::Unsupported(capability)
    }

    fn failed(&self, error: CapabilityError, alert: String) -> CapabilityError {
        tracing::warn!("{}", error);
        self.presenter.alert(&alert);
        error
    }

    // === Speech ===

    /// Queue `text` for speaking in the configured locale
    pub async fn speak(&self, text: &str) -> Result<(), CapabilityError> {
        if text.trim().is_empty() {
            tracing::debug!("Nothing to speak");
            return Ok(());
        }

        let engine = &self.backends.speech;
        if !engine.is_available().await {
            return Err(self.unsupported(Capability::Speech, messages::SPEECH_UNSUPPORTED));
        }

        let utterance = Utterance {
            text: text.to_string(),
            lang: self.lang.clone(),
        };
        match engine.speak(&utterance).await {
            Ok(()) => {
                tracing::info!("Speaking {} chars via {}", text.chars().count(), engine.name());
                Ok(())
            }
            Err(e) => {
                let alert = e.user_message();
                Err(self.failed(e, alert))
            }
        }
    }

    /// Cancel everything queued or speaking. Idempotent.
    pub async fn stop_speaking(&self) -> Result<(), CapabilityError> {
        let engine = &self.backends.speech;
        if !engine.is_available().await {
            tracing::debug!("No speech engine, nothing to stop");
            return Ok(());
        }
        engine.cancel().await.inspect_err(|e| {
            tracing::warn!("{}", e);
        })
    }

    /// Wait for queued speech to finish
    pub async fn finish_speaking(&self) {
        self.backends.speech.wait_until_done().await;
    }

    // === Geolocation ===

    /// One-shot position fix, rendered to the location panel
    pub async fn get_location(&self) -> Result<Position, CapabilityError> {
        let locator = &self.backends.geolocation;
        if !locator.is_available().await {
            tracing::info!("geolocation not available");
            self.presenter.render(Panel::Location, messages::GEOLOCATION_UNSUPPORTED);
            return Err(CapabilityError::Unsupported(Capability::Geolocation));
        }

        self.presenter.render(Panel::Location, messages::LOCATING);

        match locator.current_position().await {
            Ok(position) => {
                tracing::info!("Position fix via {}", locator.name());
                self.presenter.render(Panel::Location, &messages::location(&position));
                Ok(position)
            }
            Err(e) => {
                tracing::warn!("Position request failed: {}", e);
                self.presenter.render(Panel::Location, &messages::location_error(e.message()));
                Err(e.into())
            }
        }
    }

    // === Notifications ===

    /// Ask for notification permission and return the decision.
    ///
    /// Presenting the decision is left to the caller.
    pub async fn request_notification_permission(&self) -> Result<Permission, CapabilityError> {
        let notifier = &self.backends.notification;
        if !notifier.is_available().await {
            return Err(self.unsupported(
                Capability::Notification,
                messages::NOTIFICATION_UNSUPPORTED,
            ));
        }

        let permission = notifier.request_permission().await?;
        tracing::info!("Notification permission: {:?}", permission);
        Ok(permission)
    }

    /// Show the test notification if permission was granted earlier
    pub async fn show_notification(&self) -> Result<(), CapabilityError> {
        let notifier = &self.backends.notification;
        if !notifier.is_available().await {
            return Err(self.unsupported(
                Capability::Notification,
                messages::NOTIFICATION_UNSUPPORTED,
            ));
        }

        if !notifier.permission().is_granted() {
            self.presenter.alert(messages::NOTIFICATION_NEEDS_PERMISSION);
            return Err(CapabilityError::PermissionRequired(Capability::Notification));
        }

        let request = NotificationRequest {
            title: messages::NOTIFICATION_TITLE.to_string(),
            body: messages::NOTIFICATION_BODY.to_string(),
            icon: self.notification_icon.clone(),
        };
        match notifier.show(&request).await {
            Ok(()) => {
                tracing::info!("Notification shown via {}", notifier.name());
                Ok(())
            }
            Err(e) => {
                let alert = e.user_message();
                Err(self.failed(e, alert))
            }
        }
    }

    // === Battery ===

    /// Render the battery state now and again on every change.
    ///
    /// Rendering continues until the returned subscription is dropped or
    /// unsubscribed.
    pub async fn get_battery_status(&self) -> Result<Subscription, CapabilityError> {
        self.presenter.render(Panel::Battery, messages::BATTERY_LOADING);

        let source = &self.backends.battery;
        if !source.is_supported().await {
            tracing::info!("battery not available");
            self.presenter.render(Panel::Battery, messages::BATTERY_UNSUPPORTED);
            return Err(CapabilityError::Unsupported(Capability::Battery));
        }

        let manager = match source.acquire().await {
            Ok(manager) => manager,
            Err(e) => {
                tracing::warn!("Battery acquisition failed: {}", e);
                self.presenter.render(Panel::Battery, &messages::battery_error(&e.user_message()));
                return Err(e);
            }
        };

        self.presenter.render(Panel::Battery, &messages::battery(&manager.status));

        let presenter = self.presenter.clone();
        let mut events = manager.events;
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                tracing::trace!("Battery event: {:?}", event);
                presenter.render(Panel::Battery, &messages::battery(&event.status()));
            }
            tracing::debug!("Battery event stream ended");
        });

        Ok(Subscription::new(Capability::Battery, task))
    }

    // === Clipboard ===

    /// Copy `text` and flash the copy button
    pub async fn copy_to_clipboard(&self, text: &str) -> Result<(), CapabilityError> {
        let clipboard = &self.backends.clipboard;
        if !clipboard.is_available().await {
            return Err(self.unsupported(Capability::Clipboard, messages::CLIPBOARD_UNSUPPORTED));
        }

        match clipboard.write_text(text).await {
            Ok(()) => {
                self.copy_button.trigger();
                Ok(())
            }
            Err(e) => {
                let alert = messages::copy_error(&e.user_message());
                Err(self.failed(e, alert))
            }
        }
    }

    /// Read the clipboard into the clipboard field
    pub async fn paste_from_clipboard(&self) -> Result<String, CapabilityError> {
        let clipboard = &self.backends.clipboard;
        if !clipboard.is_available().await {
            return Err(self.unsupported(Capability::Clipboard, messages::CLIPBOARD_UNSUPPORTED));
        }

        match clipboard.read_text().await {
            Ok(text) => {
                self.presenter.set_field(Field::Clipboard, &text);
                Ok(text)
            }
            Err(e) => {
                let alert = messages::paste_error(&e.user_message());
                Err(self.failed(e, alert))
            }
        }
    }

    // === Vibration ===

    pub async fn vibrate_short(&self) -> Result<(), CapabilityError> {
        self.vibrate(VibrationPattern::single(self.short_ms)).await
    }

    pub async fn vibrate_long(&self) -> Result<(), CapabilityError> {
        self.vibrate(VibrationPattern::single(self.long_ms)).await
    }

    /// SOS in Morse code
    pub async fn vibrate_pattern(&self) -> Result<(), CapabilityError> {
        self.vibrate(VibrationPattern::sos()).await
    }

    async fn vibrate(&self, pattern: VibrationPattern) -> Result<(), CapabilityError> {
        let vibrator = &self.backends.vibration;
        if !vibrator.is_supported().await {
            return Err(self.unsupported(Capability::Vibration, messages::VIBRATION_UNSUPPORTED));
        }

        vibrator.vibrate(&pattern).await.map_err(|e| {
            let alert = e.user_message();
            self.failed(e, alert)
        })
    }

    // === Orientation ===

    /// Render every orientation sample until the subscription ends
    pub async fn start_orientation_tracking(&self) -> Result<Subscription, CapabilityError> {
        let source = &self.backends.orientation;
        if !source.is_supported().await {
            return Err(self.unsupported(
                Capability::Orientation,
                messages::ORIENTATION_UNSUPPORTED,
            ));
        }

        let mut samples = source.listen().await.map_err(|e| {
            let alert = e.user_message();
            self.failed(e, alert)
        })?;

        self.presenter.render(Panel::Orientation, messages::ORIENTATION_PROMPT);

        let presenter = self.presenter.clone();
        let task = tokio::spawn(async move {
            while let Some(sample) = samples.recv().await {
                apply_orientation(presenter.as_ref(), &sample);
            }
            tracing::debug!("Orientation stream ended");
        });

        Ok(Subscription::new(Capability::Orientation, task))
    }

    /// Render one orientation sample and rotate the indicator
    pub fn handle_orientation(&self, sample: &OrientationSample) -> Rotation {
        apply_orientation(self.presenter.as_ref(), sample)
    }

    // === Probe ===

    /// Availability of every capability, without invoking any of them
    pub async fn probe(&self) -> CapabilityReport {
        let b = &self.backends;
        let entries = vec![
            ProbeEntry {
                capability: Capability::Speech,
                available: b.speech.is_available().await,
                backend: b.speech.name(),
            },
            ProbeEntry {
                capability: Capability::Geolocation,
                available: b.geolocation.is_available().await,
                backend: b.geolocation.name(),
            },
            ProbeEntry {
                capability: Capability::Notification,
                available: b.notification.is_available().await,
                backend: b.notification.name(),
            },
            ProbeEntry {
                capability: Capability::Battery,
                available: b.battery.is_supported().await,
                backend: b.battery.name(),
            },
            ProbeEntry {
                capability: Capability::Clipboard,
                available: b.clipboard.is_available().await,
                backend: b.clipboard.name(),
            },
            ProbeEntry {
                capability: Capability::Vibration,
                available: b.vibration.is_supported().await,
                backend: b.vibration.name(),
            },
            ProbeEntry {
                capability: Capability::Orientation,
                available: b.orientation.is_supported().await,
                backend: b.orientation.name(),
            },
        ];
        CapabilityReport { entries }
    }
}

fn apply_orientation(presenter: &dyn Presenter, sample: &OrientationSample) -> Rotation {
    let rotation = Rotation::from_sample(sample);
    presenter.render(Panel::Orientation, &messages::orientation(&rotation));
    presenter.set_indicator(&rotation);
    rotation
}
