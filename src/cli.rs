// Command-line interface definitions for capdeck
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "capdeck")]
#[command(author, version, about = "Device capability console")]
#[command(long_about = "
Capdeck exposes the device capabilities of this machine from one console:
speech, location, notifications, battery, clipboard, vibration and
orientation.

Run without a command to open the interactive session, where each line is
a button press (type 'help' for the list). Every command is also
available one-shot, e.g. `capdeck speak \"Olá\"` or `capdeck battery --follow`.

Run `capdeck probe` to see which capabilities this machine supports.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Override the speech locale (e.g., pt-BR, en-US)
    #[arg(long, value_name = "LOCALE")]
    pub lang: Option<String>,

    /// Print output events as JSON lines
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive session (default if no command specified)
    Session,

    /// Speak text aloud
    Speak {
        /// Text to speak
        text: String,
    },

    /// Stop all speech
    Stop,

    /// Show the current position
    Locate,

    /// Ask for notification permission
    Permission,

    /// Show a test notification (asks for permission first)
    Notify,

    /// Show battery status
    Battery {
        /// Keep running and print every change
        #[arg(long)]
        follow: bool,
    },

    /// Copy text to the clipboard
    Copy {
        /// Text to copy
        text: String,
    },

    /// Print the clipboard contents
    Paste,

    /// Vibrate the device
    Vibrate {
        #[arg(value_enum, default_value_t = VibrationKind::Short)]
        kind: VibrationKind,
    },

    /// Track device orientation until interrupted
    Orientation,

    /// Show which capabilities are available
    Probe,

    /// Show current configuration
    Config {
        /// Write the default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Vibration buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VibrationKind {
    /// One short pulse
    Short,
    /// One long pulse
    Long,
    /// SOS in Morse code
    Sos,
}
