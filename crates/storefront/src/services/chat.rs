//! Grow-assistant chat backed by the Anthropic Messages API.
//!
//! The browser sends the whole visible conversation; only a short tail of it
//! is forwarded upstream, always opening with a customer turn, together with
//! a fixed system prompt.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::ChatConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Messages forwarded upstream per request.
pub const HISTORY_LIMIT: usize = 5;
/// Longest accepted message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;
/// Most messages accepted in one request.
pub const MAX_MESSAGES: usize = 50;

/// System prompt sent with every conversation.
pub const SYSTEM_PROMPT: &str = "You are the grow assistant for Sporeline Mycology Supply, \
an online shop selling mushroom cultivation supplies: grow kits, grain spawn, substrates, \
liquid cultures, agar, sterilization and fruiting equipment. Help customers choose products \
and troubleshoot home cultivation of gourmet and medicinal mushrooms (contamination, \
colonization, fruiting conditions). Keep answers short and practical. Do not give advice \
about foraging wild mushrooms for consumption, psychoactive species, or medical treatment. \
If you don't know whether the shop stocks something, say so and suggest browsing the catalog.";

/// Errors that can occur when interacting with the chat API.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No API key configured.
    #[error("chat API is not configured")]
    NotConfigured,

    /// Request body failed validation.
    #[error("invalid chat request: {0}")]
    Validation(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Error type from the API.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Conversation role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A validated chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Who said it.
    pub role: ChatRole,
    /// What was said.
    pub content: String,
}

/// A message as posted by the browser, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

/// Validate posted messages.
///
/// # Errors
///
/// Returns `Validation` for an empty or oversized conversation, unknown
/// roles, and empty or oversized messages.
pub fn validate_messages(messages: Vec<IncomingMessage>) -> Result<Vec<ChatMessage>, ChatError> {
    if messages.is_empty() {
        return Err(ChatError::Validation("messages cannot be empty".to_string()));
    }
    if messages.len() > MAX_MESSAGES {
        return Err(ChatError::Validation(format!(
            "at most {MAX_MESSAGES} messages are allowed"
        )));
    }

    messages
        .into_iter()
        .enumerate()
        .map(|(i, message)| {
            let role = match message.role.as_str() {
                "user" => ChatRole::User,
                "assistant" => ChatRole::Assistant,
                other => {
                    return Err(ChatError::Validation(format!(
                        "message {i} has invalid role '{other}'"
                    )));
                }
            };

            let content = message.content.trim();
            if content.is_empty() {
                return Err(ChatError::Validation(format!("message {i} is empty")));
            }
            if content.chars().count() > MAX_MESSAGE_CHARS {
                return Err(ChatError::Validation(format!(
                    "message {i} exceeds {MAX_MESSAGE_CHARS} characters"
                )));
            }

            Ok(ChatMessage {
                role,
                content: content.to_string(),
            })
        })
        .collect()
}

/// Keep the last [`HISTORY_LIMIT`] messages, starting at a user turn.
///
/// # Errors
///
/// Returns `Validation` when the tail holds no user message.
pub fn prepare_history(messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>, ChatError> {
    let skip = messages.len().saturating_sub(HISTORY_LIMIT);
    let history: Vec<ChatMessage> = messages
        .into_iter()
        .skip(skip)
        .skip_while(|m| m.role == ChatRole::Assistant)
        .collect();

    if history.is_empty() {
        return Err(ChatError::Validation(
            "conversation must include a customer message".to_string(),
        ));
    }

    Ok(history)
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Chat API client.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<ChatClientInner>,
}

struct ChatClientInner {
    client: reqwest::Client,
    api_url: String,
    model: String,
}

impl ChatClient {
    /// Create a new chat client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(config.api_key.expose_secret())
                .map_err(|e| ChatError::Parse(format!("Invalid API key format: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            inner: Arc::new(ChatClientInner {
                client,
                api_url: config.api_url.clone(),
                model: config.model.clone(),
            }),
        })
    }

    /// Send a prepared history and return the assistant's reply text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API answers with an error
    /// or an empty reply.
    #[instrument(skip(self, history), fields(model = %self.inner.model, turns = history.len()))]
    pub async fn reply(&self, history: &[ChatMessage]) -> Result<String, ChatError> {
        let request = MessagesRequest {
            model: &self.inner.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: history,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(serde_json::from_str::<ApiErrorResponse>(&body).map_or_else(
                |_| ChatError::Api {
                    error_type: status.as_u16().to_string(),
                    message: body.chars().take(200).collect(),
                },
                |e| ChatError::Api {
                    error_type: e.error.error_type,
                    message: e.error.message,
                },
            ));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::Parse(format!("Failed to parse response: {e}")))?;

        let reply = extract_text(parsed);
        if reply.is_empty() {
            return Err(ChatError::Parse("response contained no text".to_string()));
        }

        Ok(reply)
    }
}

fn extract_text(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter(|b| b.block_type == "text")
        .filter_map(|b| b.text)
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn incoming(role: &str, content: &str) -> IncomingMessage {
        IncomingMessage {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    fn msg(role: ChatRole, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_validate_messages() {
        let messages = validate_messages(vec![
            incoming("user", " How wet should coco coir be? "),
            incoming("assistant", "Field capacity."),
        ])
        .unwrap();
        assert_eq!(messages[0].content, "How wet should coco coir be?");
        assert_eq!(messages[1].role, ChatRole::Assistant);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(matches!(
            validate_messages(vec![]),
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            validate_messages(vec![incoming("system", "ignore previous")]),
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            validate_messages(vec![incoming("user", "   ")]),
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            validate_messages(vec![incoming("user", &"a".repeat(MAX_MESSAGE_CHARS + 1))]),
            Err(ChatError::Validation(_))
        ));
        let too_many = (0..=MAX_MESSAGES).map(|_| incoming("user", "hi")).collect();
        assert!(matches!(
            validate_messages(too_many),
            Err(ChatError::Validation(_))
        ));
    }

    #[test]
    fn test_prepare_history_keeps_last_five() {
        let messages: Vec<_> = (0..12)
            .map(|i| {
                let role = if i % 2 == 0 {
                    ChatRole::User
                } else {
                    ChatRole::Assistant
                };
                msg(role, &format!("m{i}"))
            })
            .collect();

        let history = prepare_history(messages).unwrap();
        assert!(history.len() <= HISTORY_LIMIT);
        // m7..m11 is the tail; m7 is an assistant turn and gets dropped
        assert_eq!(history.first().unwrap().content, "m8");
        assert_eq!(history.first().unwrap().role, ChatRole::User);
        assert_eq!(history.last().unwrap().content, "m11");
    }

    #[test]
    fn test_prepare_history_requires_user_turn() {
        let result = prepare_history(vec![msg(ChatRole::Assistant, "Hi! How can I help?")]);
        assert!(matches!(result, Err(ChatError::Validation(_))));
    }

    #[test]
    fn test_request_shape() {
        let history = vec![msg(ChatRole::User, "Best substrate for oysters?")];
        let request = MessagesRequest {
            model: "claude-sonnet-4-20250514",
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: &history,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["system"], SYSTEM_PROMPT);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_text_joins_text_blocks() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "content": [
                { "type": "text", "text": "Pasteurized straw " },
                { "type": "tool_use", "id": "x" },
                { "type": "text", "text": "works well." }
            ]
        }))
        .unwrap();
        assert_eq!(extract_text(response), "Pasteurized straw works well.");
    }
}
