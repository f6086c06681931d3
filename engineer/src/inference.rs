//! HTTP client for the inference collaborator.
//!
//! Every supported provider speaks the OpenAI-compatible chat-completions
//! wire format; routing (endpoint + credential) is resolved by `config`
//! before a query is dispatched. The orchestrator does not care which model
//! answers - it sends role-tagged messages and expects prose back.

use crate::config::RequestRoute;
use crate::error::EngineerError;
use serde::{Deserialize, Serialize};

/// One role-tagged message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> ChatMessage {
        ChatMessage {
            role: "system".to_owned(),
            content: content.to_owned(),
        }
    }

    pub fn user(content: &str) -> ChatMessage {
        ChatMessage {
            role: "user".to_owned(),
            content: content.to_owned(),
        }
    }

    pub fn assistant(content: &str) -> ChatMessage {
        ChatMessage {
            role: "assistant".to_owned(),
            content: content.to_owned(),
        }
    }
}

/// Thin wrapper around a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct InferenceClient {
    client: reqwest::Client,
}

impl InferenceClient {
    pub fn new() -> InferenceClient {
        InferenceClient {
            client: reqwest::Client::new(),
        }
    }

    /// complete sends one chat-completion request and returns the assistant
    /// message text.
    pub async fn complete(
        &self,
        route: &RequestRoute,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, EngineerError> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "max_tokens": max_tokens,
        });

        let mut request = self
            .client
            .post(&route.url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = &route.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| EngineerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(EngineerError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EngineerError::MalformedResponse(e.to_string()))?;

        extract_assistant_content(&json)
    }
}

/// Extract the text content from a chat-completions response.
fn extract_assistant_content(json: &serde_json::Value) -> Result<String, EngineerError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            EngineerError::MalformedResponse(
                "response missing choices[0].message.content".to_owned(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_content_valid() {
        let json = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "Actions: VER pit soft; VER push"
                }
            }]
        });
        let result = extract_assistant_content(&json);
        assert!(result.unwrap().contains("pit soft"));
    }

    #[test]
    fn extract_content_missing_choices() {
        let json = serde_json::json!({"error": {"message": "rate limited"}});
        assert!(extract_assistant_content(&json).is_err());
    }

    #[test]
    fn extract_content_null_content() {
        let json = serde_json::json!({
            "choices": [{ "message": { "content": null } }]
        });
        assert!(extract_assistant_content(&json).is_err());
    }

    #[test]
    fn chat_messages_serialize_with_role_tags() {
        let message = ChatMessage::assistant("box box");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], "box box");
    }
}
