//! User-visible transient messages.
//!
//! Services report the outcome of failed writes through a [`Notifier`]. The
//! rendering (a toast, a status line) is up to the front end, which drains
//! the [`NotificationLog`].

use std::{
    fmt,
    sync::{Mutex, PoisonError},
    time::Duration,
};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Level {
    /// Something completed.
    #[default]
    Success,
    /// Something completed, but not entirely.
    Warning,
    /// Neutral information.
    Info,
    /// Something failed.
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The kind of operation a failure notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Creating an entity.
    Creation,
    /// Reading a list or a detail.
    Load,
    /// Updating an entity.
    Update,
    /// Deleting an entity.
    Deletion,
}

impl Operation {
    const fn title(self) -> &'static str {
        match self {
            Self::Creation => "Creation error",
            Self::Load => "Load error",
            Self::Update => "Update error",
            Self::Deletion => "Deletion error",
        }
    }

    const fn noun(self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Load => "loading",
            Self::Update => "update",
            Self::Deletion => "deletion",
        }
    }
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short heading, e.g. "Creation error".
    pub title: String,
    /// Body text.
    pub message: String,
    /// Severity.
    pub level: Level,
}

impl Notification {
    /// A notification with the given parts.
    #[must_use]
    pub fn new(level: Level, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level,
        }
    }

    /// The error shown when `operation` on `subject` (e.g. "the news item")
    /// failed.
    #[must_use]
    pub fn failed(operation: Operation, subject: &str) -> Self {
        Self::new(
            Level::Error,
            operation.title(),
            format!(
                "An unexpected error occurred during {} of {subject}. Please try again later.",
                operation.noun()
            ),
        )
    }
}

/// Receives notifications from the services.
pub trait Notifier: Send + Sync {
    /// Shows `notification` to the user.
    fn notify(&self, notification: Notification);
}

fn trace(notification: &Notification) {
    let Notification {
        title,
        message,
        level,
    } = notification;
    match level {
        Level::Error => tracing::error!(%title, "{message}"),
        Level::Warning => tracing::warn!(%title, "{message}"),
        Level::Success | Level::Info => tracing::info!(%title, "{message}"),
    }
}

/// A notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        trace(&notification);
    }
}

/// A notifier that keeps notifications until the front end drains them.
#[derive(Debug)]
pub struct NotificationLog {
    timeout: Option<Duration>,
    pending: Mutex<Vec<Notification>>,
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new(3500)
    }
}

impl NotificationLog {
    /// A log whose notifications should close themselves after
    /// `timeout_ms`; zero keeps them open until dismissed.
    #[must_use]
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            pending: Mutex::default(),
        }
    }

    /// How long a notification stays visible, `None` for no auto-close.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Takes every notification received since the last drain.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// A copy of the pending notifications.
    #[must_use]
    pub fn pending(&self) -> Vec<Notification> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        tracing::debug!(title = %notification.title, level = %notification.level, "Queued notification");
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(Operation::Creation, "Creation error", "during creation of"; "creation")]
    #[test_case(Operation::Update, "Update error", "during update of"; "update")]
    #[test_case(Operation::Deletion, "Deletion error", "during deletion of"; "deletion")]
    #[test_case(Operation::Load, "Load error", "during loading of"; "load")]
    fn failure_wording(operation: Operation, title: &str, phrase: &str) {
        let notification = Notification::failed(operation, "the news item");
        assert_eq!(notification.level, Level::Error);
        assert_eq!(notification.title, title);
        assert!(notification.message.contains(phrase));
        assert!(notification.message.ends_with("Please try again later."));
    }

    #[test]
    fn log_keeps_notifications_until_drained() {
        let log = NotificationLog::default();
        log.notify(Notification::new(Level::Info, "Saved", "All good"));
        log.notify(Notification::failed(Operation::Update, "the article"));

        assert_eq!(log.pending().len(), 2);
        let drained = log.drain();
        assert_eq!(drained[0].title, "Saved");
        assert!(log.drain().is_empty());
    }

    #[test]
    fn zero_timeout_disables_auto_close() {
        assert_eq!(NotificationLog::new(0).timeout(), None);
        assert_eq!(
            NotificationLog::default().timeout(),
            Some(Duration::from_millis(3500))
        );
    }
}
