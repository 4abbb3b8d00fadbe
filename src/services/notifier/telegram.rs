use super::Notifier;
use crate::config::TelegramConfig;
use crate::error::AppError;
use crate::types::MessageId;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Bot API envelope.
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

/// Telegram Bot API sink. Messages are sent with HTML formatting.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Vigil/1.0")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: format!("{}/bot{}", TELEGRAM_API_URL, config.bot_token),
            chat_id: config.chat_id.clone(),
        }
    }

    fn send_payload(&self, text: &str, reply_to: Option<MessageId>) -> Value {
        let mut payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(id) = reply_to {
            payload["reply_to_message_id"] = json!(id);
        }
        payload
    }

    fn edit_payload(&self, message_id: MessageId, text: &str) -> Value {
        json!({
            "chat_id": self.chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML",
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self.client.post(&url).json(payload).send().await?;

        let status = response.status();
        let body: TelegramResponse<T> = response.json().await?;
        if !body.ok {
            let description = body.description.unwrap_or_default();
            warn!("Telegram {} failed ({}): {}", method, status, description);
            return Err(AppError::Notification(format!("{}: {}", method, description)));
        }

        body.result
            .ok_or_else(|| AppError::Notification(format!("{}: empty result", method)))
    }
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    fn send<'a>(
        &'a self,
        text: &'a str,
        reply_to: Option<MessageId>,
    ) -> Pin<Box<dyn Future<Output = Result<MessageId, AppError>> + Send + 'a>> {
        Box::pin(async move {
            let payload = self.send_payload(text, reply_to);
            let sent: SentMessage = self.call("sendMessage", &payload).await?;
            debug!("Telegram message {} sent", sent.message_id);
            Ok(sent.message_id)
        })
    }

    fn edit<'a>(
        &'a self,
        message_id: MessageId,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, AppError>> + Send + 'a>> {
        Box::pin(async move {
            let payload = self.edit_payload(message_id, text);
            // Result is the edited Message, or `true` for inline messages
            let _: Value = self.call("editMessageText", &payload).await?;
            debug!("Telegram message {} edited", message_id);
            Ok(true)
        })
    }

    fn delete(
        &self,
        message_id: MessageId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, AppError>> + Send + '_>> {
        Box::pin(async move {
            let payload = json!({ "chat_id": self.chat_id, "message_id": message_id });
            let deleted: bool = self.call("deleteMessage", &payload).await?;
            Ok(deleted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> TelegramNotifier {
        TelegramNotifier::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            chat_id: "-100200".to_string(),
        })
    }

    #[test]
    fn test_base_url_embeds_token() {
        assert_eq!(notifier().base_url, "https://api.telegram.org/bot123:abc");
    }

    #[test]
    fn test_send_payload() {
        let n = notifier();
        let payload = n.send_payload("hi", None);
        assert_eq!(payload["chat_id"], "-100200");
        assert_eq!(payload["parse_mode"], "HTML");
        assert!(payload.get("reply_to_message_id").is_none());

        let reply = n.send_payload("result", Some(77));
        assert_eq!(reply["reply_to_message_id"], 77);
    }

    #[test]
    fn test_edit_payload() {
        let payload = notifier().edit_payload(5, "done");
        assert_eq!(payload["message_id"], 5);
        assert_eq!(payload["text"], "done");
    }

    #[test]
    fn test_envelope_parsing() {
        let ok: TelegramResponse<SentMessage> =
            serde_json::from_str(r#"{"ok":true,"result":{"message_id":12,"chat":{}}}"#).unwrap();
        assert!(ok.ok);
        assert_eq!(ok.result.unwrap().message_id, 12);

        let err: TelegramResponse<SentMessage> =
            serde_json::from_str(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
                .unwrap();
        assert!(!err.ok);
        assert_eq!(err.description.unwrap(), "Bad Request: chat not found");
    }
}
