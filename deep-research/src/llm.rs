//! Chat model abstraction and HTTP providers.
//!
//! The text-generation boundary is a trait so the workflow can run against
//! any provider (or a mock in tests). The concrete implementation speaks the
//! OpenAI-compatible chat completions protocol, which every provider in the
//! table below exposes.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::config::Config;

/// Role tag on one conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Text-generation capability: an ordered list of role-tagged messages in,
/// generated text out. No schema enforcement is assumed reliable at this
/// boundary; the extractor exists for that reason.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// OpenAI-compatible chat completions client.
pub struct HttpChatModel {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
}

impl HttpChatModel {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: Option<u32>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("chat completion request to {} failed", self.model))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "model {} returned status {}: {}",
                self.model,
                status,
                detail
            ));
        }

        let payload: serde_json::Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("model {} returned no message content", self.model))
    }
}

/// Resolve a provider name to a configured chat model.
///
/// Mirrors the provider table the service runs in production: DeepSeek for
/// planning and writing, Qwen and Kimi as alternates. Unknown names are an
/// error rather than a silent default.
pub fn get_chat_model(name: &str, config: &Config) -> Result<Arc<dyn ChatModel>> {
    let require = |key: &Option<String>, var: &str| -> Result<String> {
        key.clone()
            .ok_or_else(|| anyhow!("{} must be set to use model {}", var, name))
    };

    let model: Arc<dyn ChatModel> = match name {
        "deepseek-chat" => Arc::new(HttpChatModel::new(
            "https://api.deepseek.com/v1",
            require(&config.deepseek_api_key, "DEEPSEEK_API_KEY")?,
            "deepseek-chat",
            None,
        )),
        "deepseek-reasoner" => Arc::new(HttpChatModel::new(
            "https://api.deepseek.com/v1",
            require(&config.deepseek_api_key, "DEEPSEEK_API_KEY")?,
            "deepseek-reasoner",
            None,
        )),
        "qwen" => Arc::new(HttpChatModel::new(
            "https://dashscope.aliyuncs.com/compatible-mode/v1",
            require(&config.alibaba_api_key, "ALIBABA_API_KEY")?,
            "qwen3-235b-a22b-instruct-2507",
            None,
        )),
        "kimi" => Arc::new(HttpChatModel::new(
            "https://api.moonshot.cn/v1",
            require(&config.moonshot_api_key, "MOONSHOT_API_KEY")?,
            "kimi-k2-0905-preview",
            Some(20_000),
        )),
        other => return Err(anyhow!("unsupported model: {}", other)),
    };
    Ok(model)
}
