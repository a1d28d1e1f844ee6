//! Capdeck: device capability console
//!
//! This library exposes independent platform capabilities behind one
//! invocation and error-reporting contract:
//! - Speaking text and cancelling speech (speech-dispatcher, espeak-ng, say)
//! - One-shot geolocation (GeoClue, or a fixed position)
//! - Desktop notifications behind a permission check
//! - Battery status with change tracking (sysfs)
//! - Clipboard copy/paste with timed button feedback
//! - Vibration pulses and patterns (timed_output)
//! - Device orientation tracking (IIO accelerometer/compass)
//!
//! # Architecture
//!
//! ```text
//!          ┌──────────────────────────────────────────────┐
//!          │   Session / CLI (buttons, fields, panels)    │
//!          └──────────────────────────────────────────────┘
//!                 │ operation                 ▲ UiEvent
//!                 ▼                           │
//!          ┌──────────────────────────────────────────────┐
//!          │              Capabilities façade             │
//!          │  probe ─▶ invoke ─▶ render / alert / result  │
//!          └──────────────────────────────────────────────┘
//!                 │                           │
//!                 ▼                           ▼
//!          ┌──────────────┐           ┌──────────────┐
//!          │   Backends   │           │ Subscription │
//!          │ (one trait   │──events──▶│  / CopyButton│
//!          │ per platform)│           │    tasks     │
//!          └──────────────┘           └──────────────┘
//! ```

pub mod capability;
pub mod cli;
pub mod config;
pub mod error;
pub mod facade;
pub mod feedback;
pub mod messages;
pub mod platform;
pub mod presenter;
pub mod session;
pub mod subscription;

pub use capability::{Capability, CapabilityReport};
pub use cli::{Cli, Commands, VibrationKind};
pub use config::Config;
pub use error::{CapabilityError, CapdeckError, Result};
pub use facade::Capabilities;
pub use presenter::{ConsolePresenter, Presenter, UiEvent};
pub use subscription::Subscription;
