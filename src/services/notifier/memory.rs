use super::Notifier;
use crate::error::AppError;
use crate::types::MessageId;
use dashmap::DashMap;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tracing::info;

/// A message captured by [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMessage {
    pub id: MessageId,
    pub text: String,
    pub reply_to: Option<MessageId>,
    pub edits: u32,
    pub deleted: bool,
}

/// Sink that keeps messages in memory and logs them.
///
/// Backs dry runs and tests.
pub struct MemoryNotifier {
    messages: DashMap<MessageId, RecordedMessage>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl Default for MemoryNotifier {
    fn default() -> Self {
        Self {
            messages: DashMap::new(),
            next_id: AtomicI64::new(1),
            failing: AtomicBool::new(false),
        }
    }
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a `Notification` error until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All messages ever sent, in send order (deleted ones included).
    pub fn messages(&self) -> Vec<RecordedMessage> {
        let mut messages: Vec<RecordedMessage> =
            self.messages.iter().map(|m| m.value().clone()).collect();
        messages.sort_by_key(|m| m.id);
        messages
    }

    pub fn get(&self, id: MessageId) -> Option<RecordedMessage> {
        self.messages.get(&id).map(|m| m.clone())
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Notification("memory sink offline".to_string()));
        }
        Ok(())
    }
}

impl Notifier for MemoryNotifier {
    fn name(&self) -> &str {
        "memory"
    }

    fn send<'a>(
        &'a self,
        text: &'a str,
        reply_to: Option<MessageId>,
    ) -> Pin<Box<dyn Future<Output = Result<MessageId, AppError>> + Send + 'a>> {
        Box::pin(async move {
            self.check_online()?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            info!("[notify #{}] {}", id, text);
            self.messages.insert(
                id,
                RecordedMessage {
                    id,
                    text: text.to_string(),
                    reply_to,
                    edits: 0,
                    deleted: false,
                },
            );
            Ok(id)
        })
    }

    fn edit<'a>(
        &'a self,
        message_id: MessageId,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, AppError>> + Send + 'a>> {
        Box::pin(async move {
            self.check_online()?;
            let Some(mut message) = self.messages.get_mut(&message_id) else {
                return Ok(false);
            };
            if message.deleted {
                return Ok(false);
            }
            message.text = text.to_string();
            message.edits += 1;
            info!("[edit #{}] {}", message_id, text);
            Ok(true)
        })
    }

    fn delete(
        &self,
        message_id: MessageId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, AppError>> + Send + '_>> {
        Box::pin(async move {
            self.check_online()?;
            let Some(mut message) = self.messages.get_mut(&message_id) else {
                return Ok(false);
            };
            let was_live = !message.deleted;
            message.deleted = true;
            Ok(was_live)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_assigns_increasing_ids() {
        let notifier = MemoryNotifier::new();
        let first = notifier.send("one", None).await.unwrap();
        let second = notifier.send("two", Some(first)).await.unwrap();

        assert!(second > first);
        let messages = notifier.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].reply_to, Some(first));
    }

    #[tokio::test]
    async fn test_edit_and_delete() {
        let notifier = MemoryNotifier::new();
        let id = notifier.send("draft", None).await.unwrap();

        assert!(notifier.edit(id, "final").await.unwrap());
        assert_eq!(notifier.get(id).unwrap().text, "final");
        assert_eq!(notifier.get(id).unwrap().edits, 1);

        assert!(notifier.delete(id).await.unwrap());
        assert!(!notifier.delete(id).await.unwrap());
        assert!(!notifier.edit(id, "again").await.unwrap());
        assert!(!notifier.edit(999, "missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_sink() {
        let notifier = MemoryNotifier::new();
        notifier.set_failing(true);
        assert!(matches!(
            notifier.send("lost", None).await,
            Err(AppError::Notification(_))
        ));
        assert!(notifier.messages().is_empty());
    }
}
