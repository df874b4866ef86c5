//! Logging notifier and detached dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use slotbook_core::result::AppResult;
use slotbook_core::traits::{Notification, Notifier};

/// Writes notifications to the log instead of delivering them.
///
/// Codes are logged at debug level only.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        match &notification {
            Notification::CodeIssued {
                reservation_id,
                user_id,
                code,
                expires_at,
            } => {
                tracing::debug!(reservation_id = %reservation_id, code = %code, "Confirmation code");
                info!(
                    reservation_id = %reservation_id,
                    user_id = %user_id,
                    expires_at = %expires_at,
                    "Confirmation code issued"
                );
            }
            other => {
                info!(
                    reservation_id = %other.reservation_id(),
                    notification = %serde_json::to_string(other)?,
                    "Notification"
                );
            }
        }
        Ok(())
    }
}

/// Deliver without waiting; a failed delivery is logged and dropped.
pub fn dispatch(notifier: &Arc<dyn Notifier>, notification: Notification) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        let reservation_id = notification.reservation_id();
        if let Err(e) = notifier.notify(notification).await {
            warn!(reservation_id = %reservation_id, error = %e, "Notification delivery failed");
        }
    });
}
