//! Interactive console session
//!
//! Plays the part of the demo page: each input line is a button press, the
//! session keeps the two text fields (speech and clipboard) and owns the
//! battery/orientation subscriptions, which it tears down on exit.

use crate::cli::VibrationKind;
use crate::error::CapabilityError;
use crate::facade::Capabilities;
use crate::messages;
use crate::subscription::Subscription;
use tokio::io::{AsyncBufReadExt, BufReader};

pub const HELP: &str = "\
Comandos:
  speak [texto]        falar (sem texto: repete o campo de fala)
  stop                 parar de falar
  locate               obter localização
  permission           pedir permissão de notificação
  notify               mostrar notificação
  battery              acompanhar a bateria
  copy [texto]         copiar (sem texto: copia o campo da área de transferência)
  paste                colar
  vibrate short|long|sos
  orientation          acompanhar a orientação
  probe                listar recursos disponíveis
  help                 esta ajuda
  quit                 sair";

/// A button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Speak(Option<String>),
    Stop,
    Locate,
    Permission,
    Notify,
    Battery,
    Copy(Option<String>),
    Paste,
    Vibrate(VibrationKind),
    Orientation,
    Probe,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_action(line: &str) -> Result<Option<Action>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let text = (!rest.is_empty()).then(|| rest.to_string());

    let action = match command.to_lowercase().as_str() {
        "speak" => Action::Speak(text),
        "stop" => Action::Stop,
        "locate" | "location" => Action::Locate,
        "permission" => Action::Permission,
        "notify" => Action::Notify,
        "battery" => Action::Battery,
        "copy" => Action::Copy(text),
        "paste" => Action::Paste,
        "vibrate" => Action::Vibrate(match rest.to_lowercase().as_str() {
            "" | "short" => VibrationKind::Short,
            "long" => VibrationKind::Long,
            "sos" | "pattern" => VibrationKind::Sos,
            other => return Err(format!("unknown vibration '{}'", other)),
        }),
        "orientation" => Action::Orientation,
        "probe" => Action::Probe,
        "help" | "?" => Action::Help,
        "quit" | "exit" => Action::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(action))
}

/// Whether the session keeps reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    caps: Capabilities,
    speech_text: String,
    clipboard_text: String,
    battery: Option<Subscription>,
    orientation: Option<Subscription>,
}

impl Session {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            speech_text: String::new(),
            clipboard_text: String::new(),
            battery: None,
            orientation: None,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Contents of the clipboard field
    pub fn clipboard_text(&self) -> &str {
        &self.clipboard_text
    }

    /// True while battery changes are being rendered
    pub fn tracking_battery(&self) -> bool {
        self.battery.as_ref().is_some_and(|s| s.is_active())
    }

    /// True while orientation samples are being rendered
    pub fn tracking_orientation(&self) -> bool {
        self.orientation.as_ref().is_some_and(|s| s.is_active())
    }

    /// Run one button press.
    ///
    /// Failures have already been shown by the façade; they are returned so
    /// one-shot commands can set an exit status.
    pub async fn dispatch(&mut self, action: Action) -> Result<Flow, CapabilityError> {
        match action {
            Action::Speak(text) => {
                if let Some(text) = text {
                    self.speech_text = text;
                }
                self.caps.speak(&self.speech_text).await?;
            }
            Action::Stop => self.caps.stop_speaking().await?,
            Action::Locate => {
                self.caps.get_location().await?;
            }
            Action::Permission => {
                self.request_permission().await?;
            }
            Action::Notify => self.caps.show_notification().await?,
            Action::Battery => {
                // Pressing again replaces the listener instead of stacking one
                if let Some(previous) = self.battery.take() {
                    previous.unsubscribe();
                }
                self.battery = Some(self.caps.get_battery_status().await?);
            }
            Action::Copy(text) => {
                if let Some(text) = text {
                    self.clipboard_text = text;
                }
                self.caps.copy_to_clipboard(&self.clipboard_text).await?;
            }
            Action::Paste => {
                self.clipboard_text = self.caps.paste_from_clipboard().await?;
            }
            Action::Vibrate(kind) => match kind {
                VibrationKind::Short => self.caps.vibrate_short().await?,
                VibrationKind::Long => self.caps.vibrate_long().await?,
                VibrationKind::Sos => self.caps.vibrate_pattern().await?,
            },
            Action::Orientation => {
                if let Some(previous) = self.orientation.take() {
                    previous.unsubscribe();
                }
                self.orientation = Some(self.caps.start_orientation_tracking().await?);
            }
            Action::Probe => {
                let report = self.caps.probe().await;
                self.caps.presenter().show_report(&report);
            }
            Action::Help => println!("{}", HELP),
            Action::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Request permission and show the decision
    pub async fn request_permission(&self) -> Result<(), CapabilityError> {
        let presenter = self.caps.presenter();
        match self.caps.request_notification_permission().await {
            Ok(permission) => {
                presenter.alert(&messages::permission_result(permission.is_granted()));
                Ok(())
            }
            // Already shown by the façade
            Err(e @ CapabilityError::Unsupported(_)) => Err(e),
            Err(e) => {
                presenter.alert(&messages::permission_error(&e.user_message()));
                Err(e)
            }
        }
    }

    /// Wait for the active subscriptions to end on their own
    pub async fn join_subscriptions(&mut self) {
        if let Some(battery) = self.battery.take() {
            battery.join().await;
        }
        if let Some(orientation) = self.orientation.take() {
            orientation.join().await;
        }
    }

    /// Unsubscribe every listener
    pub fn teardown(&mut self) {
        if let Some(battery) = self.battery.take() {
            battery.unsubscribe();
        }
        if let Some(orientation) = self.orientation.take() {
            orientation.unsubscribe();
        }
    }

    /// Read button presses from stdin until quit, EOF or Ctrl+C
    pub async fn run(mut self) -> std::io::Result<()> {
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match parse_action(&line) {
                        Ok(Some(action)) => {
                            match self.dispatch(action).await {
                                Ok(Flow::Quit) => break,
                                Ok(Flow::Continue) => {}
                                Err(e) => tracing::debug!("{}", e),
                            }
                        }
                        Ok(None) => {}
                        Err(e) => eprintln!("{}", e),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::debug!("Interrupted");
                    break;
                }
            }
        }

        self.teardown();
        Ok(())
    }
}
