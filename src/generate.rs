//! Generative-model client and the single-call fast path.
//!
//! [`ChatProvider`] is the seam to the text-generation backend: one blocking
//! call per invocation, no retry beyond transport-level backoff. The
//! OpenAI-compatible implementation covers both api.openai.com and local
//! gateways via `generation.base_url`.
//!
//! [`fast_answer`] is the low-latency alternative to the multi-stage
//! pipeline: one prompt embedding the source-tagged context and the query,
//! one completion, the model text returned verbatim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::CagError;
use crate::models::{context_block, ContextEntry};

/// Fixed system instruction for the fast path.
pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are a helpful restaurant assistant.";

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A text-generation backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one completion and return the model's text output verbatim.
    async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, CagError>;
}

// ============ OpenAI-compatible provider ============

/// Chat provider for the OpenAI chat-completions API.
pub struct OpenAiChat {
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
    timeout: Duration,
}

impl OpenAiChat {
    /// # Errors
    ///
    /// [`CagError::Configuration`] if `OPENAI_API_KEY` is not set.
    pub fn new(config: &GenerationConfig) -> Result<Self, CagError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            CagError::Configuration("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            max_retries: config.max_retries,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, CagError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| CagError::Generation(e.to_string()))?;

        let mut wire_messages = Vec::with_capacity(messages.len() + 1);
        wire_messages.push(WireMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
        wire_messages.extend(messages.iter().map(|m| WireMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        }));

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: wire_messages,
            temperature,
            max_tokens,
        };

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let parsed: ChatCompletionResponse = response
                            .json()
                            .await
                            .map_err(|e| CagError::Generation(e.to_string()))?;
                        return parsed
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.message)
                            .map(|m| m.content)
                            .ok_or_else(|| {
                                CagError::Generation("no content in model response".to_string())
                            });
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(CagError::Generation(format!(
                            "chat API error {status}: {body_text}"
                        )));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    return Err(CagError::Generation(format!(
                        "chat API error {status}: {body_text}"
                    )));
                }
                Err(e) => {
                    last_err = Some(CagError::Generation(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| CagError::Generation("completion failed after retries".to_string())))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<WireMessage>,
}

// ============ Fast path ============

/// Build the single fast-path prompt from the retrieved context.
pub fn fast_prompt(restaurant: &str, query: &str, context: &[ContextEntry]) -> String {
    format!(
        "You are an AI assistant for {restaurant} restaurant. Using the following context \
         from the restaurant's menus, answer the customer's question.\n\n\
         Context:\n{context}\n\n\
         Customer Question: {query}\n\n\
         Provide a helpful, accurate response based on the menu information. \
         If prices are mentioned, include them. Be friendly and informative.",
        context = context_block(context),
    )
}

/// Answer `query` with one model call over the retrieved context.
pub async fn fast_answer(
    chat: &dyn ChatProvider,
    config: &GenerationConfig,
    query: &str,
    context: &[ContextEntry],
) -> Result<String, CagError> {
    let prompt = fast_prompt(&config.restaurant, query, context);
    chat.complete(
        ASSISTANT_SYSTEM_PROMPT,
        &[ChatMessage::user(prompt)],
        config.temperature,
        config.max_tokens,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_prompt_embeds_context_and_query() {
        let context = vec![ContextEntry {
            content: "Pinot Noir £8, pairs with pasta.".to_string(),
            source: "wine.md".to_string(),
        }];
        let prompt = fast_prompt("Bella Terra", "wine pasta pairing", &context);

        assert!(prompt.contains("Bella Terra"));
        assert!(prompt.contains("From wine.md:"));
        assert!(prompt.contains("Pinot Noir £8"));
        assert!(prompt.contains("Customer Question: wine pasta pairing"));
    }

    #[test]
    fn test_chat_completion_response_parses() {
        let json = r#"{
            "choices": [
                { "message": { "role": "assistant", "content": "Try the Pinot Noir." },
                  "finish_reason": "stop" }
            ],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.as_ref().unwrap().content,
            "Try the Pinot Noir."
        );
    }
}
