//! Configuration loading and types for capdeck
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/capdeck/config.toml)
//! 3. Environment variables (CAPDECK_*)
//! 4. CLI arguments (highest priority)

use crate::error::CapdeckError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Capdeck Configuration
#
# Location: ~/.config/capdeck/config.toml
# Every section is optional; missing keys use the defaults shown here.

[speech]
# Locale attached to every utterance
lang = "pt-BR"

# Speech backend: "auto", "speech_dispatcher", "espeak", or "say" (macOS)
# auto prefers spd-say, then espeak-ng, then say
backend = "auto"

[geolocation]
# Position provider: "auto", "geoclue", or "fixed"
# - geoclue: asks the GeoClue demo agent (where-am-i) for one fix
# - fixed: always reports latitude/longitude below
provider = "auto"

# Seconds to wait for a fix before reporting a timeout
timeout_secs = 30

# Path to the GeoClue where-am-i agent (omit to search common locations)
# agent = "/usr/libexec/geoclue-2.0/demos/where-am-i"

# Coordinates for the fixed provider
# latitude = -23.5505
# longitude = -46.6333

[notification]
# Icon name or path passed to the notification daemon
icon = "dialog-information"

# How long the notification stays on screen, in milliseconds
expire_ms = 5000

[battery]
# Linux power supply class directory
sysfs_root = "/sys/class/power_supply"

# How often to check for charging/level changes, in milliseconds
poll_interval_ms = 2000

[clipboard]
# Clipboard backend: "auto", "wayland" (wl-copy), "x11" (xclip), or "macos" (pbcopy)
backend = "auto"

# How long the copy button shows "Copiado!", in milliseconds
feedback_ms = 2000

[vibration]
# timed_output vibrator control file
device = "/sys/class/timed_output/vibrator/enable"

# Durations for the short and long buttons, in milliseconds
short_ms = 200
long_ms = 1000

[orientation]
# Linux IIO devices directory (an accelerometer is required)
iio_root = "/sys/bus/iio/devices"

# How often to sample orientation, in milliseconds
poll_interval_ms = 100
"#;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub geolocation: GeolocationConfig,

    #[serde(default)]
    pub notification: NotificationConfig,

    #[serde(default)]
    pub battery: BatteryConfig,

    #[serde(default)]
    pub clipboard: ClipboardConfig,

    #[serde(default)]
    pub vibration: VibrationConfig,

    #[serde(default)]
    pub orientation: OrientationConfig,
}

/// Speech backend selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeechBackend {
    #[default]
    Auto,
    /// spd-say (speech-dispatcher keeps its own queue)
    SpeechDispatcher,
    /// espeak-ng, queued locally
    Espeak,
    /// macOS say, queued locally
    Say,
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Locale attached to every utterance (BCP 47)
    pub lang: String,

    pub backend: SpeechBackend,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            lang: "pt-BR".to_string(),
            backend: SpeechBackend::Auto,
        }
    }
}

/// Position provider selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationProvider {
    #[default]
    Auto,
    Geoclue,
    Fixed,
}

/// Geolocation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub provider: GeolocationProvider,

    /// Seconds to wait for a fix
    pub timeout_secs: u64,

    /// Explicit path to the GeoClue where-am-i agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<PathBuf>,

    /// Latitude reported by the fixed provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Longitude reported by the fixed provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            provider: GeolocationProvider::Auto,
            timeout_secs: 30,
            agent: None,
            latitude: None,
            longitude: None,
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Icon name or path
    pub icon: String,

    /// Display time in milliseconds
    pub expire_ms: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            icon: "dialog-information".to_string(),
            expire_ms: 5000,
        }
    }
}

/// Battery status configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatteryConfig {
    pub sysfs_root: PathBuf,
    pub poll_interval_ms: u64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys/class/power_supply"),
            poll_interval_ms: 2000,
        }
    }
}

/// Clipboard backend selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardBackend {
    #[default]
    Auto,
    Wayland,
    X11,
    Macos,
}

/// Clipboard configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClipboardConfig {
    pub backend: ClipboardBackend,

    /// Copy button feedback window in milliseconds
    pub feedback_ms: u64,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            backend: ClipboardBackend::Auto,
            feedback_ms: 2000,
        }
    }
}

/// Vibration configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VibrationConfig {
    /// timed_output control file
    pub device: PathBuf,

    pub short_ms: u32,
    pub long_ms: u32,
}

impl Default for VibrationConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/sys/class/timed_output/vibrator/enable"),
            short_ms: 200,
            long_ms: 1000,
        }
    }
}

/// Device orientation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrientationConfig {
    pub iio_root: PathBuf,
    pub poll_interval_ms: u64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            iio_root: PathBuf::from("/sys/bus/iio/devices"),
            poll_interval_ms: 100,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "capdeck")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, CapdeckError> {
    // Start with defaults
    let mut config = Config::default();

    // Determine config file path
    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    // Load from file if it exists
    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| CapdeckError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| CapdeckError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    Ok(config)
}

/// Override from environment variables
fn apply_env_overrides(
    config: &mut Config,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), CapdeckError> {
    if let Some(lang) = var("CAPDECK_SPEECH_LANG") {
        config.speech.lang = lang;
    }
    if let Some(backend) = var("CAPDECK_CLIPBOARD_BACKEND") {
        config.clipboard.backend = match backend.to_lowercase().as_str() {
            "wayland" => ClipboardBackend::Wayland,
            "x11" => ClipboardBackend::X11,
            "macos" => ClipboardBackend::Macos,
            _ => ClipboardBackend::Auto,
        };
    }
    if let Some(position) = var("CAPDECK_FIXED_POSITION") {
        let (lat, lon) = parse_position(&position).ok_or_else(|| {
            CapdeckError::Config(format!(
                "CAPDECK_FIXED_POSITION must be \"<lat>,<lon>\", got {:?}",
                position
            ))
        })?;
        config.geolocation.provider = GeolocationProvider::Fixed;
        config.geolocation.latitude = Some(lat);
        config.geolocation.longitude = Some(lon);
    }
    Ok(())
}

fn parse_position(value: &str) -> Option<(f64, f64)> {
    let (lat, lon) = value.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

/// Write the commented default config to `path` unless a file is already there.
///
/// Returns false when an existing file was left alone.
pub fn write_default_config(path: &Path) -> Result<bool, CapdeckError> {
    if path.exists() {
        return Ok(false);
    }

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CapdeckError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| CapdeckError::Config(format!("Failed to write config: {}", e)))?;

    Ok(true)
}
