//! Transient user-facing notifications.
//!
//! Every handler reports its result to the user through a [`Notifier`]:
//! successes, domain errors, validation warnings, and informational notes.
//! Notifications go to **stderr** so stdout stays parseable for scripts
//! (document ids, answers, listings).
//!
//! Notifications are not logs. Diagnostics go through `tracing`.

use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Warning,
    Info,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification::new(Level::Success, message));
    }

    fn error(&self, message: &str) {
        self.notify(Notification::new(Level::Error, message));
    }

    fn warning(&self, message: &str) {
        self.notify(Notification::new(Level::Warning, message));
    }

    fn info(&self, message: &str) {
        self.notify(Notification::new(Level::Info, message));
    }
}

/// Human-friendly line on stderr: `[success] Login successful!`.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notification: Notification) {
        let line = format!("[{}] {}\n", notification.level.as_str(), notification.message);
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable notifications: one JSON object per line on stderr.
pub struct JsonNotifier;

impl Notifier for JsonNotifier {
    fn notify(&self, notification: Notification) {
        let obj = serde_json::json!({
            "event": "notification",
            "level": notification.level,
            "message": notification.message,
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

/// Drops everything.
pub struct NoNotifier;

impl Notifier for NoNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Keeps every notification in memory. Clones share the same buffer, so a
/// test can hand one clone to the context and inspect the other.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen.lock().ok().and_then(|v| v.last().cloned())
    }

    pub fn clear(&self) {
        if let Ok(mut v) = self.seen.lock() {
            v.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut v) = self.seen.lock() {
            v.push(notification);
        }
    }
}

/// Notification mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotifyMode {
    Off,
    Human,
    Json,
}

impl NotifyMode {
    /// Default: human notifications when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            NotifyMode::Human
        } else {
            NotifyMode::Off
        }
    }

    pub fn notifier(&self) -> Box<dyn Notifier> {
        match self {
            NotifyMode::Off => Box::new(NoNotifier),
            NotifyMode::Human => Box::new(StderrNotifier),
            NotifyMode::Json => Box::new(JsonNotifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_clones_share_buffer() {
        let rec = RecordingNotifier::new();
        let handle = rec.clone();
        let boxed: Box<dyn Notifier> = Box::new(rec);
        boxed.warning("Please enter a question");
        boxed.success("ok");

        let seen = handle.notifications();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].level, Level::Warning);
        assert_eq!(seen[0].message, "Please enter a question");
        assert_eq!(handle.last().unwrap().level, Level::Success);

        handle.clear();
        assert!(handle.notifications().is_empty());
    }

    #[test]
    fn level_serializes_lowercase() {
        let n = Notification::new(Level::Error, "Upload failed");
        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["level"], "error");
    }
}
