//! Timed feedback on the copy button
//!
//! Two states: Idle → Feedback → Idle
//!
//! A successful copy puts the button into `Feedback` for a fixed window.
//! The button owns at most one revert timer; triggering again while in
//! `Feedback` aborts that timer and arms a fresh one, so the button reverts
//! exactly once, a full window after the last copy.

use crate::presenter::Presenter;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Button state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Idle,
    Feedback { since: Instant },
}

struct Inner {
    state: ButtonState,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every trigger so a stale timer never reverts a newer one
    generation: u64,
}

/// Copy button with a single owned revert timer
pub struct CopyButton {
    inner: Arc<Mutex<Inner>>,
    presenter: Arc<dyn Presenter>,
    window: Duration,
    idle_label: Arc<str>,
    feedback_label: Arc<str>,
}

impl CopyButton {
    pub fn new(
        presenter: Arc<dyn Presenter>,
        window: Duration,
        idle_label: &str,
        feedback_label: &str,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: ButtonState::Idle,
                timer: None,
                generation: 0,
            })),
            presenter,
            window,
            idle_label: idle_label.into(),
            feedback_label: feedback_label.into(),
        }
    }

    /// Current state
    pub fn state(&self) -> ButtonState {
        lock(&self.inner).state
    }

    /// Label currently shown on the button
    pub fn label(&self) -> &str {
        match self.state() {
            ButtonState::Idle => &self.idle_label,
            ButtonState::Feedback { .. } => &self.feedback_label,
        }
    }

    /// Enter (or restart) the feedback window
    pub fn trigger(&self) {
        let mut inner = lock(&self.inner);

        if let Some(timer) = inner.timer.take() {
            timer.abort();
            tracing::debug!("Copy feedback restarted");
        }

        let since = Instant::now();
        let deadline = since + self.window;
        inner.generation += 1;
        inner.state = ButtonState::Feedback { since };
        self.presenter.set_copy_button(&self.feedback_label, true);

        let generation = inner.generation;
        let shared = self.inner.clone();
        let presenter = self.presenter.clone();
        let idle_label = self.idle_label.clone();

        // The window counts from the copy, not from when the task first runs
        inner.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let mut inner = lock(&shared);
            if inner.generation != generation {
                return;
            }
            inner.state = ButtonState::Idle;
            inner.timer = None;
            presenter.set_copy_button(&idle_label, false);
        }));
    }
}

impl Drop for CopyButton {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.inner).timer.take() {
            timer.abort();
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> std::sync::MutexGuard<'_, Inner> {
    // A panic while holding the lock leaves the state consistent enough to reuse
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
