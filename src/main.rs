//! Capdeck - device capability console
//!
//! Run with `capdeck` or `capdeck session` for the interactive session.
//! Use `capdeck probe` to list the capabilities this machine supports.
//! Every session button is also a one-shot command (`capdeck speak "Olá"`).

use capdeck::cli::{Cli, Commands};
use capdeck::config::{self, Config};
use capdeck::platform::Backends;
use capdeck::session::{Action, Session};
use capdeck::{Capabilities, ConsolePresenter};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("capdeck={},warn", log_level))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(lang) = cli.lang {
        config.speech.lang = lang;
    }

    let command = cli.command.unwrap_or(Commands::Session);
    let presenter = Arc::new(ConsolePresenter::new(cli.json));
    let caps = Capabilities::new(&config, Backends::detect(&config), presenter);
    let mut session = Session::new(caps);

    // Listeners keep the process alive until Ctrl+C
    let follow = matches!(
        command,
        Commands::Battery { follow: true } | Commands::Orientation
    );

    let action = match command {
        Commands::Session => {
            session.run().await?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Config { init } => {
            if init {
                init_config(cli.config.as_deref())?;
            } else {
                show_config(&config, cli.config.as_deref())?;
            }
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Speak { text } => Action::Speak(Some(text)),
        Commands::Stop => Action::Stop,
        Commands::Locate => Action::Locate,
        Commands::Permission => Action::Permission,
        Commands::Notify => {
            // Permission does not outlive the process, so ask first
            if session.request_permission().await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
            Action::Notify
        }
        Commands::Battery { .. } => Action::Battery,
        Commands::Copy { text } => Action::Copy(Some(text)),
        Commands::Paste => Action::Paste,
        Commands::Vibrate { kind } => Action::Vibrate(kind),
        Commands::Orientation => Action::Orientation,
        Commands::Probe => Action::Probe,
    };

    let speaking = matches!(action, Action::Speak(_));
    let result = session.dispatch(action).await;

    if result.is_ok() && speaking {
        // Locally queued engines stop when the process exits
        tokio::select! {
            _ = session.capabilities().finish_speaking() => {}
            _ = tokio::signal::ctrl_c() => {
                let _ = session.capabilities().stop_speaking().await;
            }
        }
    }

    if result.is_ok() && follow {
        tokio::select! {
            _ = session.join_subscriptions() => {}
            _ = tokio::signal::ctrl_c() => tracing::debug!("Interrupted"),
        }
        session.teardown();
    }

    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Create the config file with commented defaults
fn init_config(path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let path = path
        .map(std::path::PathBuf::from)
        .or_else(Config::default_path)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    if config::write_default_config(&path)? {
        println!("Wrote default config to {}", path.display());
    } else {
        println!("Config already exists at {}", path.display());
    }
    Ok(())
}

/// Print the effective configuration as TOML
fn show_config(config: &Config, path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let source = path
        .map(std::path::PathBuf::from)
        .or_else(Config::default_path);
    match source {
        Some(path) if path.exists() => println!("# Loaded from {}\n", path.display()),
        _ => println!("# Built-in defaults (no config file)\n"),
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
