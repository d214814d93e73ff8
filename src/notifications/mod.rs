use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Notification service errors. These never cross into `ServiceError`:
/// the workflow logs and swallows them after the state change commits.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outbound notification seam. The real transport (mailer, messaging
/// gateway) lives outside this crate; the workflow only depends on this
/// trait.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        status: &str,
        reason: Option<&str>,
    ) -> Result<(), NotificationError>;
}

/// Transport that only writes to the log. Useful as a default wiring and
/// in environments without an outbound channel.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        status: &str,
        reason: Option<&str>,
    ) -> Result<(), NotificationError> {
        if to.is_empty() {
            return Err(NotificationError::InvalidRecipient(
                "empty recipient address".to_string(),
            ));
        }

        info!(
            to = %to,
            subject = %subject,
            status = %status,
            reason = reason.unwrap_or(""),
            "notification sent"
        );
        Ok(())
    }
}
