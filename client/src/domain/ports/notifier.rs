//! Port for non-blocking user notifications.
//!
//! Every fail-soft path in the favorites core reports through this port so
//! the UI can show a dismissible message without the operation failing.

use std::fmt;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// Informational message.
    Info,
    /// A feature is degraded but the session continues.
    Warning,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// A dismissible, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text suitable for display.
    pub message: String,
}

impl Notice {
    /// Build a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// Build an informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// Port for surfacing notices to the user.
///
/// Implementations must not block and must not fail.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Queue a notice for display.
    fn notify(&self, notice: Notice);
}

/// Notifier that discards everything. Use it where notices are not under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notice: Notice) {}
}
