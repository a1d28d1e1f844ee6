//! Speech synthesis backends
//!
//! - speech-dispatcher (`spd-say`): the daemon owns the utterance queue,
//!   `spd-say -C` cancels everything queued or speaking
//! - espeak-ng / macOS `say`: one process per utterance, queued here in
//!   FIFO order; cancelling clears the queue and kills the active process

use super::{command_available, run_command};
use crate::capability::Capability;
use crate::config::{SpeechBackend, SpeechConfig};
use crate::error::CapabilityError;
use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::watch;

/// A request to speak `text` in locale `lang`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
}

/// Trait for speech synthesis engines
#[async_trait::async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Add an utterance to the engine queue. Returns once queued.
    async fn speak(&self, utterance: &Utterance) -> Result<(), CapabilityError>;

    /// Drop every pending utterance and stop the one speaking.
    /// Safe to call with nothing queued.
    async fn cancel(&self) -> Result<(), CapabilityError>;

    /// Wait until nothing is queued or speaking in this process.
    /// Engines whose queue lives in a daemon return at once.
    async fn wait_until_done(&self) {}

    /// Check if this engine can be used
    async fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Pick an engine from config, probing PATH for `auto`
pub fn create_engine(config: &SpeechConfig) -> Arc<dyn SpeechEngine> {
    match config.backend {
        SpeechBackend::SpeechDispatcher => Arc::new(SpeechDispatcher),
        SpeechBackend::Espeak => Arc::new(QueuedEngine::espeak()),
        SpeechBackend::Say => Arc::new(QueuedEngine::say()),
        SpeechBackend::Auto => {
            if command_available("spd-say") {
                Arc::new(SpeechDispatcher)
            } else if command_available("espeak-ng") {
                Arc::new(QueuedEngine::espeak())
            } else if cfg!(target_os = "macos") {
                Arc::new(QueuedEngine::say())
            } else {
                tracing::debug!("No speech engine found, speech will report unsupported");
                Arc::new(SpeechDispatcher)
            }
        }
    }
}

/// speech-dispatcher client via spd-say
pub struct SpeechDispatcher;

#[async_trait::async_trait]
impl SpeechEngine for SpeechDispatcher {
    async fn speak(&self, utterance: &Utterance) -> Result<(), CapabilityError> {
        let lang = utterance.lang.to_lowercase();
        run_command("spd-say", &["-l", &lang, "--", &utterance.text], None)
            .await
            .map(|_| ())
            .map_err(|e| CapabilityError::platform(Capability::Speech, e))
    }

    async fn cancel(&self) -> Result<(), CapabilityError> {
        run_command("spd-say", &["-C"], None)
            .await
            .map(|_| ())
            .map_err(|e| CapabilityError::platform(Capability::Speech, e))
    }

    async fn is_available(&self) -> bool {
        command_available("spd-say")
    }

    fn name(&self) -> &'static str {
        "speech-dispatcher"
    }
}

struct Queue {
    pending: VecDeque<Utterance>,
    /// A worker task is draining `pending`
    running: bool,
}

/// Runs one process per utterance, strictly in order
pub struct QueuedEngine {
    name: &'static str,
    program: &'static str,
    args: fn(&Utterance) -> Vec<String>,
    queue: Arc<Mutex<Queue>>,
    /// Bumped on cancel; the worker kills its current process when it changes
    epoch: watch::Sender<u64>,
}

impl QueuedEngine {
    pub fn new(
        name: &'static str,
        program: &'static str,
        args: fn(&Utterance) -> Vec<String>,
    ) -> Self {
        let (epoch, _) = watch::channel(0);
        Self {
            name,
            program,
            args,
            queue: Arc::new(Mutex::new(Queue {
                pending: VecDeque::new(),
                running: false,
            })),
            epoch,
        }
    }

    /// espeak-ng with the utterance locale as voice
    pub fn espeak() -> Self {
        Self::new("espeak-ng", "espeak-ng", |u| {
            vec![
                "-v".to_string(),
                u.lang.to_lowercase(),
                "--".to_string(),
                u.text.clone(),
            ]
        })
    }

    /// macOS say (voice follows the system language)
    pub fn say() -> Self {
        Self::new("say", "say", |u| vec![u.text.clone()])
    }

    /// Utterances waiting behind the one speaking
    pub fn pending(&self) -> usize {
        lock(&self.queue).pending.len()
    }

    /// True while an utterance is being spoken or waiting
    pub fn is_busy(&self) -> bool {
        lock(&self.queue).running
    }

    async fn drain(
        program: &'static str,
        args: fn(&Utterance) -> Vec<String>,
        queue: Arc<Mutex<Queue>>,
        mut epoch: watch::Receiver<u64>,
    ) {
        while let Some(utterance) = next_utterance(&queue, &mut epoch) {
            let mut child = match Command::new(program)
                .args(args(&utterance))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
            {
                Ok(child) => child,
                Err(e) => {
                    tracing::warn!("Failed to start {}: {}", program, e);
                    continue;
                }
            };

            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if !status.success() => {
                        tracing::warn!("{} exited with {}", program, status);
                    }
                    Err(e) => tracing::warn!("{} failed: {}", program, e),
                    Ok(_) => {}
                },
                _ = epoch.changed() => {
                    if let Err(e) = child.kill().await {
                        tracing::debug!("Failed to stop {}: {}", program, e);
                    }
                    tracing::debug!("Utterance cancelled");
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl SpeechEngine for QueuedEngine {
    async fn speak(&self, utterance: &Utterance) -> Result<(), CapabilityError> {
        let mut queue = lock(&self.queue);
        queue.pending.push_back(utterance.clone());

        if !queue.running {
            queue.running = true;
            tokio::spawn(Self::drain(
                self.program,
                self.args,
                self.queue.clone(),
                self.epoch.subscribe(),
            ));
        }
        Ok(())
    }

    async fn cancel(&self) -> Result<(), CapabilityError> {
        let dropped = {
            let mut queue = lock(&self.queue);
            let dropped = queue.pending.len();
            queue.pending.clear();
            dropped
        };
        self.epoch.send_modify(|epoch| *epoch += 1);
        tracing::debug!("Speech queue cleared ({} pending dropped)", dropped);
        Ok(())
    }

    async fn wait_until_done(&self) {
        while self.is_busy() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn is_available(&self) -> bool {
        command_available(self.program)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Pop the next utterance, or mark the worker stopped when none is left.
///
/// Cancels issued before the pop only concern utterances already dropped,
/// so they are marked seen here and cannot stop the new one.
fn next_utterance(queue: &Mutex<Queue>, epoch: &mut watch::Receiver<u64>) -> Option<Utterance> {
    let mut queue = lock(queue);
    let next = queue.pending.pop_front();
    match next {
        Some(_) => {
            epoch.borrow_and_update();
        }
        None => queue.running = false,
    }
    next
}

fn lock(queue: &Mutex<Queue>) -> std::sync::MutexGuard<'_, Queue> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
