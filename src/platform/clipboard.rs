//! System clipboard through the session's clipboard tools
//!
//! - Wayland: wl-copy / wl-paste (wl-clipboard package)
//! - X11: xclip
//! - macOS: pbcopy / pbpaste

use super::{command_available, run_command, run_detaching};
use crate::capability::Capability;
use crate::config::{ClipboardBackend, ClipboardConfig};
use crate::error::CapabilityError;
use std::sync::Arc;

/// Trait for clipboard access
#[async_trait::async_trait]
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `text`
    async fn write_text(&self, text: &str) -> Result<(), CapabilityError>;

    /// Read the clipboard as text
    async fn read_text(&self) -> Result<String, CapabilityError>;

    /// Check if the clipboard tools are installed
    async fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Pick a clipboard from config, or from the session type for `auto`
pub fn create_clipboard(config: &ClipboardConfig) -> Arc<dyn Clipboard> {
    let backend = match config.backend {
        ClipboardBackend::Auto => detect_backend(|key| std::env::var_os(key).is_some()),
        explicit => explicit,
    };

    Arc::new(match backend {
        ClipboardBackend::X11 => CommandClipboard::xclip(),
        ClipboardBackend::Macos => CommandClipboard::pasteboard(),
        _ => CommandClipboard::wayland(),
    })
}

fn detect_backend(has_var: impl Fn(&str) -> bool) -> ClipboardBackend {
    if cfg!(target_os = "macos") {
        ClipboardBackend::Macos
    } else if has_var("WAYLAND_DISPLAY") {
        ClipboardBackend::Wayland
    } else if has_var("DISPLAY") {
        ClipboardBackend::X11
    } else {
        ClipboardBackend::Wayland
    }
}

/// A program pair that copies from stdin and pastes to stdout
pub struct CommandClipboard {
    name: &'static str,
    copy: (&'static str, &'static [&'static str]),
    paste: (&'static str, &'static [&'static str]),
}

impl CommandClipboard {
    pub fn wayland() -> Self {
        Self {
            name: "wl-clipboard",
            copy: ("wl-copy", &[]),
            paste: ("wl-paste", &["--no-newline"]),
        }
    }

    pub fn xclip() -> Self {
        Self {
            name: "xclip",
            copy: ("xclip", &["-selection", "clipboard"]),
            paste: ("xclip", &["-selection", "clipboard", "-o"]),
        }
    }

    pub fn pasteboard() -> Self {
        Self {
            name: "pbcopy",
            copy: ("pbcopy", &[]),
            paste: ("pbpaste", &[]),
        }
    }
}

#[async_trait::async_trait]
impl Clipboard for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<(), CapabilityError> {
        let (program, args) = self.copy;
        run_detaching(program, args, text)
            .await
            .map_err(|e| CapabilityError::platform(Capability::Clipboard, e))?;

        tracing::info!("Text copied to clipboard ({} chars)", text.chars().count());
        Ok(())
    }

    async fn read_text(&self) -> Result<String, CapabilityError> {
        let (program, args) = self.paste;
        run_command(program, args, None)
            .await
            .map_err(|e| CapabilityError::platform(Capability::Clipboard, e))
    }

    async fn is_available(&self) -> bool {
        command_available(self.copy.0) && command_available(self.paste.0)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
