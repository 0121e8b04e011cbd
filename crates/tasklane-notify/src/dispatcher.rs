//! Notification dispatchers.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::NotifyError;
use crate::notification::Notification;

/// Notification delivery trait.
///
/// Dispatch is fire-and-forget from the engine's perspective: the engine
/// logs failures and never retries on the dispatcher's behalf.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver a notification.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Dispatcher that logs notifications instead of delivering them.
///
/// Used when no webhook endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            kind = %notification.kind,
            task_id = %notification.task_id,
            client_id = %notification.client_id,
            "{}",
            notification.title
        );
        Ok(())
    }
}

/// Dispatcher that POSTs notifications as JSON to a webhook endpoint.
pub struct WebhookDispatcher {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookDispatcher {
    /// Create a dispatcher targeting the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        debug!(
            kind = %notification.kind,
            task_id = %notification.task_id,
            "delivered notification to {}",
            self.endpoint
        );
        Ok(())
    }
}

/// In-memory dispatcher that records notifications for testing.
#[derive(Default)]
pub struct MemoryDispatcher {
    sent: tokio::sync::RwLock<Vec<Notification>>,
}

impl MemoryDispatcher {
    /// Create a new memory dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications recorded so far, in dispatch order.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for MemoryDispatcher {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut sent = self.sent.write().await;
        sent.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reminder() -> Notification {
        Notification::new(
            NotificationKind::TaskReminder,
            Uuid::new_v4(),
            "acme-corp",
            "Task Reminder: Prepare proposal",
            "This is a reminder for the task: Prepare proposal",
        )
    }

    #[tokio::test]
    async fn test_log_dispatcher_succeeds() {
        LogDispatcher.notify(&reminder()).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_dispatcher_records_in_order() {
        let dispatcher = MemoryDispatcher::new();
        let first = reminder();
        let second = reminder();

        dispatcher.notify(&first).await.unwrap();
        dispatcher.notify(&second).await.unwrap();

        let sent = dispatcher.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].task_id, first.task_id);
        assert_eq!(sent[1].task_id, second.task_id);
    }

    #[tokio::test]
    async fn test_webhook_dispatcher_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notifications"))
            .and(body_partial_json(serde_json::json!({
                "type": "task_reminder",
                "client_id": "acme-corp",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = WebhookDispatcher::new(format!("{}/api/notifications", server.uri()));
        dispatcher.notify(&reminder()).await.unwrap();
    }

    #[tokio::test]
    async fn test_webhook_dispatcher_surfaces_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dispatcher = WebhookDispatcher::new(server.uri());
        let result = dispatcher.notify(&reminder()).await;
        assert!(matches!(result, Err(NotifyError::Status(500))));
    }
}
