//! In-memory backends and a recording presenter for façade tests

#![allow(dead_code)]

use capdeck::config::Config;
use capdeck::error::{CapabilityError, PositionError};
use capdeck::platform::{
    BatteryEvent, BatteryManager, BatterySource, BatteryStatus, Backends, Clipboard, Geolocator,
    NotificationRequest, Notifier, OrientationSample, OrientationSource, Permission, Position,
    Rotation, SpeechEngine, Utterance, VibrationPattern, Vibrator,
};
use capdeck::presenter::{Field, Panel, Presenter, UiEvent};
use capdeck::{Capabilities, CapabilityReport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Keeps every UI event in order
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<UiEvent>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Alert { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn panel(&self, wanted: Panel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Render { panel, text } if panel == wanted => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn button_labels(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::CopyButton { label, .. } => Some(label),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Presenter for Recorder {
    fn render(&self, panel: Panel, text: &str) {
        self.push(UiEvent::Render {
            panel,
            text: text.to_string(),
        });
    }

    fn alert(&self, message: &str) {
        self.push(UiEvent::Alert {
            message: message.to_string(),
        });
    }

    fn set_field(&self, field: Field, text: &str) {
        self.push(UiEvent::Field {
            field,
            text: text.to_string(),
        });
    }

    fn set_copy_button(&self, label: &str, highlighted: bool) {
        self.push(UiEvent::CopyButton {
            label: label.to_string(),
            highlighted,
        });
    }

    fn set_indicator(&self, rotation: &Rotation) {
        self.push(UiEvent::Indicator {
            rotation: *rotation,
            transform: rotation.css_transform(),
        });
    }

    fn show_report(&self, report: &CapabilityReport) {
        self.push(UiEvent::Report {
            entries: report.entries.clone(),
        });
    }
}

// ============================================================================
// Fake backends
// ============================================================================

pub struct FakeSpeech {
    pub available: bool,
    pub spoken: Mutex<Vec<Utterance>>,
    pub cancels: AtomicUsize,
}

#[async_trait::async_trait]
impl SpeechEngine for FakeSpeech {
    async fn speak(&self, utterance: &Utterance) -> Result<(), CapabilityError> {
        self.spoken.lock().unwrap().push(utterance.clone());
        Ok(())
    }

    async fn cancel(&self) -> Result<(), CapabilityError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.spoken.lock().unwrap().clear();
        Ok(())
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeLocator {
    pub available: bool,
    pub result: Result<Position, PositionError>,
    pub calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Geolocator for FakeLocator {
    async fn current_position(&self) -> Result<Position, PositionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeNotifier {
    pub available: bool,
    pub permission: Mutex<Permission>,
    pub decision: Result<Permission, CapabilityError>,
    pub shown: Mutex<Vec<NotificationRequest>>,
}

#[async_trait::async_trait]
impl Notifier for FakeNotifier {
    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> Result<Permission, CapabilityError> {
        let decision = self.decision.clone()?;
        *self.permission.lock().unwrap() = decision;
        Ok(decision)
    }

    async fn show(&self, request: &NotificationRequest) -> Result<(), CapabilityError> {
        self.shown.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeBattery {
    pub supported: bool,
    pub initial: BatteryStatus,
    pub failure: Option<String>,
    pub acquires: AtomicUsize,
    /// Sender for the stream handed out by the last acquire
    pub events: Mutex<Option<mpsc::Sender<BatteryEvent>>>,
}

impl FakeBattery {
    pub fn sender(&self) -> mpsc::Sender<BatteryEvent> {
        self.events.lock().unwrap().clone().expect("battery acquired")
    }

    /// Drop the stream so listeners see it end
    pub fn close(&self) {
        self.events.lock().unwrap().take();
    }
}

#[async_trait::async_trait]
impl BatterySource for FakeBattery {
    async fn is_supported(&self) -> bool {
        self.supported
    }

    async fn acquire(&self) -> Result<BatteryManager, CapabilityError> {
        self.acquires.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(CapabilityError::platform(
                capdeck::Capability::Battery,
                message.clone(),
            ));
        }
        let (tx, rx) = mpsc::channel(8);
        *self.events.lock().unwrap() = Some(tx);
        Ok(BatteryManager {
            status: self.initial,
            events: rx,
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeClipboard {
    pub available: bool,
    pub contents: Mutex<String>,
    pub failure: Option<String>,
    pub calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Clipboard for FakeClipboard {
    async fn write_text(&self, text: &str) -> Result<(), CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(CapabilityError::platform(
                capdeck::Capability::Clipboard,
                message.clone(),
            ));
        }
        *self.contents.lock().unwrap() = text.to_string();
        Ok(())
    }

    async fn read_text(&self) -> Result<String, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(CapabilityError::platform(
                capdeck::Capability::Clipboard,
                message.clone(),
            ));
        }
        Ok(self.contents.lock().unwrap().clone())
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeVibrator {
    pub supported: bool,
    pub patterns: Mutex<Vec<Vec<u32>>>,
}

#[async_trait::async_trait]
impl Vibrator for FakeVibrator {
    async fn is_supported(&self) -> bool {
        self.supported
    }

    async fn vibrate(&self, pattern: &VibrationPattern) -> Result<(), CapabilityError> {
        self.patterns
            .lock()
            .unwrap()
            .push(pattern.durations().to_vec());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeOrientation {
    pub supported: bool,
    pub listens: AtomicUsize,
    pub samples: Mutex<Option<mpsc::Sender<OrientationSample>>>,
}

impl FakeOrientation {
    pub fn sender(&self) -> mpsc::Sender<OrientationSample> {
        self.samples.lock().unwrap().clone().expect("orientation listening")
    }

    pub fn close(&self) {
        self.samples.lock().unwrap().take();
    }
}

#[async_trait::async_trait]
impl OrientationSource for FakeOrientation {
    async fn is_supported(&self) -> bool {
        self.supported
    }

    async fn listen(&self) -> Result<mpsc::Receiver<OrientationSample>, CapabilityError> {
        self.listens.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(8);
        *self.samples.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub caps: Capabilities,
    pub ui: Arc<Recorder>,
    pub speech: Arc<FakeSpeech>,
    pub locator: Arc<FakeLocator>,
    pub notifier: Arc<FakeNotifier>,
    pub battery: Arc<FakeBattery>,
    pub clipboard: Arc<FakeClipboard>,
    pub vibrator: Arc<FakeVibrator>,
    pub orientation: Arc<FakeOrientation>,
}

/// Availability of each fake, plus canned platform answers
pub struct Setup {
    pub available: bool,
    pub position: Result<Position, PositionError>,
    pub permission: Permission,
    pub decision: Result<Permission, CapabilityError>,
    pub battery: BatteryStatus,
    pub battery_failure: Option<String>,
    pub clipboard_failure: Option<String>,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            available: true,
            position: Ok(Position {
                latitude: 10.0,
                longitude: 20.0,
            }),
            permission: Permission::Default,
            decision: Ok(Permission::Granted),
            battery: BatteryStatus {
                charging: true,
                level: 0.8,
            },
            battery_failure: None,
            clipboard_failure: None,
        }
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with(Setup::default())
    }

    pub fn unsupported() -> Self {
        Self::with(Setup {
            available: false,
            ..Setup::default()
        })
    }

    pub fn with(setup: Setup) -> Self {
        let ui = Arc::new(Recorder::default());
        let speech = Arc::new(FakeSpeech {
            available: setup.available,
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        });
        let locator = Arc::new(FakeLocator {
            available: setup.available,
            result: setup.position,
            calls: AtomicUsize::new(0),
        });
        let notifier = Arc::new(FakeNotifier {
            available: setup.available,
            permission: Mutex::new(setup.permission),
            decision: setup.decision,
            shown: Mutex::new(Vec::new()),
        });
        let battery = Arc::new(FakeBattery {
            supported: setup.available,
            initial: setup.battery,
            failure: setup.battery_failure,
            acquires: AtomicUsize::new(0),
            events: Mutex::new(None),
        });
        let clipboard = Arc::new(FakeClipboard {
            available: setup.available,
            contents: Mutex::new(String::new()),
            failure: setup.clipboard_failure,
            calls: AtomicUsize::new(0),
        });
        let vibrator = Arc::new(FakeVibrator {
            supported: setup.available,
            patterns: Mutex::new(Vec::new()),
        });
        let orientation = Arc::new(FakeOrientation {
            supported: setup.available,
            listens: AtomicUsize::new(0),
            samples: Mutex::new(None),
        });

        let backends = Backends {
            speech: speech.clone(),
            geolocation: locator.clone(),
            notification: notifier.clone(),
            battery: battery.clone(),
            clipboard: clipboard.clone(),
            vibration: vibrator.clone(),
            orientation: orientation.clone(),
        };
        let caps = Capabilities::new(&Config::default(), backends, ui.clone());

        Self {
            caps,
            ui,
            speech,
            locator,
            notifier,
            battery,
            clipboard,
            vibrator,
            orientation,
        }
    }
}

/// Let spawned listener and timer tasks run
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
