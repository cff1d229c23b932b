// 🔔 Notifier Seam - Host Platform Dialogs
// The chat platform supplies toasts and confirm dialogs; the engine only
// sees this two-operation interface

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn label(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Opaque handle to the hosting shell's notification facilities.
pub trait Notifier {
    /// Non-blocking, user-visible message.
    fn notify(&mut self, message: &str, level: Level);

    /// Modal yes/no question; `true` means the user confirmed.
    fn confirm(&mut self, message: &str) -> bool;
}

/// Notifier that swallows messages and confirms everything. For tests and
/// headless runs.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, _message: &str, _level: Level) {}

    fn confirm(&mut self, _message: &str) -> bool {
        true
    }
}

/// Notifier that forwards to the tracing subscriber. Useful when no real
/// shell is attached but messages should still land somewhere.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, message: &str, level: Level) {
        match level {
            Level::Info => tracing::info!("{message}"),
            Level::Warn => tracing::warn!("{message}"),
            Level::Error => tracing::error!("{message}"),
        }
    }

    fn confirm(&mut self, message: &str) -> bool {
        tracing::info!(prompt = message, "auto-confirming without a shell");
        true
    }
}
