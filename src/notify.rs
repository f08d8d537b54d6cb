//! Transient Notifications
//!
//! A single message slot. Showing a message replaces whatever was there;
//! a message stops being visible once `dismiss_after` has elapsed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// How long a message stays up
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_secs(5);

/// Message severity, doubling as the display class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl Severity {
    pub fn class(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

/// A message as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub text: String,
    pub severity: Severity,
    shown_at: Instant,
}

/// The notification slot
pub struct Notifier {
    dismiss_after: Duration,
    slot: RwLock<Option<Notification>>,
    next_id: AtomicU64,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_DISMISS_AFTER)
    }
}

impl Notifier {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            dismiss_after,
            slot: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn show(&self, text: impl Into<String>, severity: Severity) -> Notification {
        self.show_at(text, severity, Instant::now())
    }

    pub fn show_at(&self, text: impl Into<String>, severity: Severity, now: Instant) -> Notification {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            text: text.into(),
            severity,
            shown_at: now,
        };

        match severity {
            Severity::Error => tracing::debug!(text = %notification.text, "Showing error message"),
            _ => tracing::debug!(text = %notification.text, "Showing message"),
        }

        // A poisoned slot only ever held a finished write; keep using it
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(notification.clone());
        notification
    }

    /// The visible message, if any
    pub fn current(&self) -> Option<Notification> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<Notification> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|n| now.saturating_duration_since(n.shown_at) < self.dismiss_after)
            .cloned()
    }

    pub fn dismiss(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
