//! Transient user-facing messages.
//!
//! Only one message is visible at a time: a new `notify` replaces the current
//! one and restarts its lifetime. Expiry is computed from the caller's clock,
//! so the notifier never needs a timer of its own.

use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Default lifetime of a notification.
pub const DEFAULT_NOTIFY_DURATION: Duration = Duration::from_secs(3);

/// Visual kind of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// A message together with the instant it was shown.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    current: Option<Toast>,
    duration: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Notifier::new(DEFAULT_NOTIFY_DURATION)
    }
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Notifier {
            current: None,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Shows `message` now, replacing whatever was visible.
    pub fn notify(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.notify_at(message, kind, Instant::now());
    }

    /// Same as [`Notifier::notify`] with an explicit clock.
    pub fn notify_at(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) {
        let message = message.into();
        match kind {
            ToastKind::Error => warn!("notify: {message}"),
            ToastKind::Info | ToastKind::Success => info!("notify: {message}"),
        }

        self.current = Some(Toast {
            message,
            kind,
            shown_at: now,
        });
    }

    /// The message visible at `now`, if it has not expired.
    pub fn visible_at(&self, now: Instant) -> Option<&Toast> {
        self.current
            .as_ref()
            .filter(|toast| now.saturating_duration_since(toast.shown_at) < self.duration)
    }

    /// Time left before the visible message expires. Used to schedule a repaint.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.visible_at(now)
            .map(|toast| self.duration - now.saturating_duration_since(toast.shown_at))
    }

    /// The last message shown, expired or not.
    pub fn last(&self) -> Option<&Toast> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
