//! Output sink for capability results
//!
//! The façade never prints. Every result, alert and widget change goes
//! through a [`Presenter`], so the console session, the one-shot CLI
//! commands and tests can each decide how to show it.

use crate::capability::{CapabilityReport, ProbeEntry};
use crate::platform::orientation::Rotation;
use serde::Serialize;
use std::io::Write;

/// Result panels that receive formatted text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Location,
    Battery,
    Orientation,
}

/// Input fields the façade can write into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Clipboard,
}

/// One observable change produced by a capability call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    Render { panel: Panel, text: String },
    Alert { message: String },
    Field { field: Field, text: String },
    CopyButton { label: String, highlighted: bool },
    Indicator { rotation: Rotation, transform: String },
    Report { entries: Vec<ProbeEntry> },
}

/// Receiver of capability output
///
/// Implementations are shared with listener tasks and timers, so they must
/// be thread-safe.
pub trait Presenter: Send + Sync {
    /// Overwrite the text of a result panel
    fn render(&self, panel: Panel, text: &str);

    /// Show a blocking-style alert
    fn alert(&self, message: &str);

    /// Replace the contents of an input field
    fn set_field(&self, field: Field, text: &str);

    /// Update the copy button label and highlight
    fn set_copy_button(&self, label: &str, highlighted: bool);

    /// Apply a rotation to the orientation indicator
    fn set_indicator(&self, rotation: &Rotation);

    /// Show which capabilities are available
    fn show_report(&self, report: &CapabilityReport);
}

impl UiEvent {
    fn describe(&self) -> String {
        match self {
            UiEvent::Render { panel, text } => {
                let label = match panel {
                    Panel::Location => "localização",
                    Panel::Battery => "bateria",
                    Panel::Orientation => "orientação",
                };
                format!("[{}] {}", label, text.replace('\n', " | "))
            }
            UiEvent::Alert { message } => format!("(!) {}", message),
            UiEvent::Field { text, .. } => format!("[texto] {}", text),
            UiEvent::CopyButton { label, highlighted } => {
                if *highlighted {
                    format!("[botão] {} *", label)
                } else {
                    format!("[botão] {}", label)
                }
            }
            UiEvent::Indicator { transform, .. } => format!("[indicador] {}", transform),
            UiEvent::Report { entries } => entries
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Prints events to stdout, either as text lines or as JSON objects
pub struct ConsolePresenter {
    json: bool,
}

impl ConsolePresenter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit(&self, event: UiEvent) {
        let line = if self.json {
            match serde_json::to_string(&event) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Failed to serialize event: {}", e);
                    return;
                }
            }
        } else {
            event.describe()
        };

        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line) {
            tracing::debug!("Failed to write event: {}", e);
        }
    }
}

impl Presenter for ConsolePresenter {
    fn render(&self, panel: Panel, text: &str) {
        self.emit(UiEvent::Render {
            panel,
            text: text.to_string(),
        });
    }

    fn alert(&self, message: &str) {
        self.emit(UiEvent::Alert {
            message: message.to_string(),
        });
    }

    fn set_field(&self, field: Field, text: &str) {
        self.emit(UiEvent::Field {
            field,
            text: text.to_string(),
        });
    }

    fn set_copy_button(&self, label: &str, highlighted: bool) {
        self.emit(UiEvent::CopyButton {
            label: label.to_string(),
            highlighted,
        });
    }

    fn set_indicator(&self, rotation: &Rotation) {
        self.emit(UiEvent::Indicator {
            rotation: *rotation,
            transform: rotation.css_transform(),
        });
    }

    fn show_report(&self, report: &CapabilityReport) {
        self.emit(UiEvent::Report {
            entries: report.entries.clone(),
        });
    }
}
