use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Notification Types
// ============================================================================

/// Severity attached to a notification event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum NotificationSeverity {
    /// Informational event
    Info,
    /// Client-caused failure (4xx)
    Warn,
    /// Server-side failure requiring attention (5xx)
    Error,
}

/// A notification event emitted for every failed request, independent of
/// the HTTP response sent to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: String,
    pub severity: NotificationSeverity,
    pub message: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        severity: NotificationSeverity,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            severity,
            message: message.into(),
            source: source.into(),
            created_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(NotificationSeverity::Error, message, source)
    }

    pub fn warn(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(NotificationSeverity::Warn, message, source)
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.created_at).num_minutes()
    }
}

/// Observability collaborator receiving notification events.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default notifier backed by tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            NotificationSeverity::Info => tracing::info!(
                source = %notification.source,
                "{}", notification.message
            ),
            NotificationSeverity::Warn => tracing::warn!(
                source = %notification.source,
                "{}", notification.message
            ),
            NotificationSeverity::Error => tracing::error!(
                source = %notification.source,
                "{}", notification.message
            ),
        }
    }
}
