//! Transient user-facing notices (toasts, banners, console lines).
//!
//! Components that want to tell the user something take an
//! `Option<SharedNotifier>` at construction. There is no global hook.

use std::sync::Arc;

use serde::Serialize;

use crate::ErrorKind;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A single transient message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Classification, present for error notices.
    pub kind: Option<ErrorKind>,
    /// Human-readable text.
    pub message: String,
}

impl Notice {
    /// Informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            kind: None,
            message: message.into(),
        }
    }

    /// Success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            kind: None,
            message: message.into(),
        }
    }

    /// Error notice with its classification.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            kind: Some(kind),
            message: message.into(),
        }
    }
}

/// Receiver of user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Shared notifier handle.
pub type SharedNotifier = Arc<dyn Notifier>;

/// Deliver a notice if a notifier was provided.
pub fn notify(notifier: Option<&SharedNotifier>, notice: Notice) {
    if let Some(notifier) = notifier {
        notifier.notify(notice);
    }
}

/// Notifier that writes notices to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::error!(
                kind = notice.kind.map(ErrorKind::as_str).unwrap_or("unknown"),
                "{}",
                notice.message
            ),
            NoticeLevel::Success | NoticeLevel::Info => tracing::info!("{}", notice.message),
        }
    }
}

impl<F> Notifier for F
where
    F: Fn(Notice) + Send + Sync,
{
    fn notify(&self, notice: Notice) {
        self(notice)
    }
}
