//! Notification sinks for signals, outcomes and reports.

mod memory;
mod telegram;

pub use memory::{MemoryNotifier, RecordedMessage};
pub use telegram::TelegramNotifier;

use crate::error::AppError;
use crate::types::MessageId;
use std::future::Future;
use std::pin::Pin;

/// A reply-capable message sink.
///
/// Failures are reported as errors; callers treat them as non-fatal.
pub trait Notifier: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Send `text`, optionally threaded under `reply_to`, returning the new message id.
    fn send<'a>(
        &'a self,
        text: &'a str,
        reply_to: Option<MessageId>,
    ) -> Pin<Box<dyn Future<Output = Result<MessageId, AppError>> + Send + 'a>>;

    /// Replace the text of a sent message.
    fn edit<'a>(
        &'a self,
        message_id: MessageId,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, AppError>> + Send + 'a>>;

    /// Delete a sent message.
    fn delete(
        &self,
        message_id: MessageId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, AppError>> + Send + '_>>;
}
